use crate::result::LoadTestResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTestSummary {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    /// Milliseconds.
    pub average_response_time: f64,
    pub min_response_time: u64,
    pub max_response_time: u64,
    pub requests_per_second: f64,
    /// Seconds of wall time the test ran for.
    pub total_duration: f64,
    pub status_code_distribution: BTreeMap<u16, usize>,
    pub errors: BTreeMap<String, usize>,
}

/// Reduce a complete result collection to its summary.
pub fn summarize(results: &[LoadTestResult], elapsed_seconds: f64) -> LoadTestSummary {
    let mut summary = LoadTestSummary {
        total_requests: results.len(),
        total_duration: elapsed_seconds,
        ..Default::default()
    };

    let mut total_response_time: u64 = 0;
    let mut min_response_time = u64::MAX;

    for result in results {
        if result.success {
            summary.successful_requests += 1;
        } else {
            summary.failed_requests += 1;
        }

        total_response_time += result.response_time;
        min_response_time = min_response_time.min(result.response_time);
        summary.max_response_time = summary.max_response_time.max(result.response_time);

        if let Some(status) = result.status_code {
            *summary.status_code_distribution.entry(status).or_insert(0) += 1;
        }

        // A failed response with a status code (e.g. a 500) is not an error here.
        if !result.success
            && let Some(ref error) = result.error
        {
            *summary.errors.entry(error.clone()).or_insert(0) += 1;
        }
    }

    if !results.is_empty() {
        summary.average_response_time = total_response_time as f64 / results.len() as f64;
        summary.min_response_time = min_response_time;
    }

    if elapsed_seconds > 0.0 {
        summary.requests_per_second = results.len() as f64 / elapsed_seconds;
    }

    summary
}
