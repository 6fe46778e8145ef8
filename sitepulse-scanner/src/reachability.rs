use crate::error::{Result, ScanError};
use crate::transport::HttpTransport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pause after every probe.
pub const CHECK_DELAY: Duration = Duration::from_millis(300);

/// Outcome of probing a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reachability {
    Reachable,
    NotFound,
    /// The probe failed for a reason other than 404; the page is neither
    /// confirmed broken nor confirmed working.
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachabilityReport {
    pub checked: usize,
    pub reachable: Vec<String>,
    pub not_found: Vec<String>,
    pub unknown: Vec<String>,
}

impl ReachabilityReport {
    fn record(&mut self, url: String, outcome: Reachability) {
        self.checked += 1;
        match outcome {
            Reachability::Reachable => self.reachable.push(url),
            Reachability::NotFound => self.not_found.push(url),
            Reachability::Unknown => self.unknown.push(url),
        }
    }
}

/// Called after each probe with (index, url, outcome).
pub type CheckProgressCallback = Arc<dyn Fn(usize, &str, Reachability) + Send + Sync>;

pub struct ReachabilityChecker {
    transport: Arc<dyn HttpTransport>,
    delay: Duration,
    progress_callback: Option<CheckProgressCallback>,
}

impl ReachabilityChecker {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            delay: CHECK_DELAY,
            progress_callback: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_progress_callback(mut self, callback: CheckProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// `Ok(false)` for 404, `Ok(true)` for any 2xx/3xx, an error otherwise.
    pub async fn check_exists(&self, url: &str) -> Result<bool> {
        let response = self.transport.head(url).await?;

        match response.status {
            404 => Ok(false),
            200..=399 => Ok(true),
            status => Err(ScanError::UnexpectedStatus {
                url: url.to_string(),
                status,
            }),
        }
    }

    /// Probe each URL in turn. Failures other than 404 are logged and recorded as
    /// unknown; they never stop the scan.
    pub async fn scan(&self, urls: &[String]) -> ReachabilityReport {
        info!("Checking reachability of {} pages", urls.len());

        let mut report = ReachabilityReport::default();

        for (index, url) in urls.iter().enumerate() {
            let outcome = match self.check_exists(url).await {
                Ok(true) => Reachability::Reachable,
                Ok(false) => {
                    debug!("{} returned 404", url);
                    Reachability::NotFound
                }
                Err(e) => {
                    warn!("Could not check {}: {}", url, e);
                    Reachability::Unknown
                }
            };

            if let Some(ref callback) = self.progress_callback {
                callback(index, url, outcome);
            }
            report.record(url.clone(), outcome);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(
            "Reachability check complete: {} ok, {} not found, {} unknown",
            report.reachable.len(),
            report.not_found.len(),
            report.unknown.len()
        );

        report
    }
}
