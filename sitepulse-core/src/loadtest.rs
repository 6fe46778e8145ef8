use crate::output::{timestamp_slug, write_json_artifact};
use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use sitepulse_scanner::transport::LOAD_TEST_TIMEOUT;
use sitepulse_scanner::{
    LoadTestConfig, LoadTestOutcome, LoadTestResult, LoadTestResultCallback, LoadTester,
    ReqwestTransport,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options for configuring a load test run
pub struct LoadTestOptions {
    pub urls: Vec<String>,
    pub config: LoadTestConfig,
    pub show_progress_bars: bool,
}

#[derive(Debug, Clone)]
pub struct LoadTestArtifacts {
    pub summary_path: PathBuf,
    pub results_path: PathBuf,
}

/// Run a load test over `options.urls` with a bar tracking completed requests.
pub async fn execute_load_test(options: LoadTestOptions) -> Result<LoadTestOutcome> {
    let LoadTestOptions {
        urls,
        config,
        show_progress_bars,
    } = options;

    if urls.is_empty() {
        bail!("No URLs to load test");
    }

    let transport = Arc::new(ReqwestTransport::with_timeout(LOAD_TEST_TIMEOUT)?);
    let mut tester = LoadTester::new(transport, config)?;

    // The duration cap may cut the run short, so the bar length is an upper bound.
    let progress_bar = if show_progress_bars {
        let total = (urls.len() * tester.config().requests_per_url) as u64;
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {pos}/{len} requests {msg}")?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    if let Some(ref pb) = progress_bar {
        let pb = pb.clone();
        let callback: LoadTestResultCallback = Arc::new(move |result: &LoadTestResult| {
            pb.inc(1);
            if !result.success {
                pb.set_message(format!("(last failure: {})", result.url));
            }
        });
        tester = tester.with_result_callback(callback);
    }

    let outcome = tester.run(&urls).await?;

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "done, {} succeeded, {} failed",
            outcome.summary.successful_requests, outcome.summary.failed_requests
        ));
    }

    Ok(outcome)
}

/// Write `loadtest-summary-<ts>.json` and `loadtest-results-<ts>.json` into `dir`.
pub fn persist_load_test(
    outcome: &LoadTestOutcome,
    dir: &Path,
    finished_at: DateTime<Utc>,
) -> Result<LoadTestArtifacts> {
    let timestamp = timestamp_slug(finished_at);

    let summary_path = write_json_artifact(
        dir,
        &format!("loadtest-summary-{}.json", timestamp),
        &outcome.summary,
    )?;
    let results_path = write_json_artifact(
        dir,
        &format!("loadtest-results-{}.json", timestamp),
        outcome,
    )?;

    Ok(LoadTestArtifacts {
        summary_path,
        results_path,
    })
}
