use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of load test work: a URL and which repetition pass it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestQueueItem {
    pub url: String,
    pub repetition: usize,
}

/// Record of one completed load test request. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTestResult {
    pub url: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Milliseconds from dispatch to completion.
    pub response_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LoadTestResult {
    /// Any completed HTTP exchange; only 2xx and 3xx count as success.
    pub fn from_status(url: String, status_code: u16, response_time: u64) -> Self {
        Self {
            url,
            success: (200..400).contains(&status_code),
            status_code: Some(status_code),
            response_time,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn from_error(url: String, error: String, response_time: u64) -> Self {
        Self {
            url,
            success: false,
            status_code: None,
            response_time,
            error: Some(error),
            timestamp: Utc::now(),
        }
    }
}
