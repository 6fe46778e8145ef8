use crate::error::{Result, ScanError, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

/// Timeout used for sitemap fetches and reachability probes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout applied to every load test request.
pub const LOAD_TEST_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT_VALUE: &str =
    "Mozilla/5.0 (compatible; Sitepulse/0.1; +https://github.com/sitepulse/sitepulse)";

/// A completed HTTP exchange. Any status code, including 4xx/5xx, lands here.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The HTTP capability the scanner needs. Implementations apply their own
/// timeout and header set to every request.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> std::result::Result<TransportResponse, TransportError>;

    /// Body is always empty for HEAD.
    async fn head(&self, url: &str) -> std::result::Result<TransportResponse, TransportError>;
}

pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .default_headers(default_headers())
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| ScanError::ClientBuild(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout.as_millis() as u64)
        } else if error.is_connect() {
            TransportError::Connect(error.to_string())
        } else {
            TransportError::Request(error.to_string())
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> std::result::Result<TransportResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        Ok(TransportResponse { status, body })
    }

    async fn head(&self, url: &str) -> std::result::Result<TransportResponse, TransportError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        Ok(TransportResponse {
            status: response.status().as_u16(),
            body: String::new(),
        })
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers
}
