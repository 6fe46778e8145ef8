use crate::output::{NOT_FOUND_FILE, URLS_FILE, write_json_artifact};
use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use sitepulse_scanner::reachability::CHECK_DELAY;
use sitepulse_scanner::sitemap::NESTED_SITEMAP_DELAY;
use sitepulse_scanner::{
    CheckProgressCallback, HttpTransport, Reachability, ReachabilityChecker, ReachabilityReport,
    ReqwestTransport, ResolveStats, ResolverProgressCallback, SitemapResolver,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Options for discovering pages from a sitemap
pub struct ScrapeOptions {
    pub sitemap_url: String,
    pub check_reachability: bool,
    pub show_progress_bars: bool,
    pub nested_delay: Duration,
    pub check_delay: Duration,
}

impl ScrapeOptions {
    pub fn new(sitemap_url: impl Into<String>) -> Self {
        Self {
            sitemap_url: sitemap_url.into(),
            check_reachability: true,
            show_progress_bars: false,
            nested_delay: NESTED_SITEMAP_DELAY,
            check_delay: CHECK_DELAY,
        }
    }
}

/// Callback for reporting scrape progress messages
pub type ScrapeProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    pub sitemap_url: String,
    pub pages: Vec<String>,
    pub stats: ResolveStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reachability: Option<ReachabilityReport>,
}

#[derive(Debug, Clone)]
pub struct ScrapeArtifacts {
    pub urls_path: PathBuf,
    pub not_found_path: Option<PathBuf>,
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    Ok(pb)
}

/// Resolve the sitemap into page URLs, then optionally probe each page.
pub async fn execute_scrape(
    options: ScrapeOptions,
    progress_callback: Option<ScrapeProgressCallback>,
) -> Result<ScrapeOutcome> {
    let ScrapeOptions {
        sitemap_url,
        check_reachability,
        show_progress_bars,
        nested_delay,
        check_delay,
    } = options;

    if sitemap_url.trim().is_empty() {
        bail!("A sitemap URL is required");
    }
    Url::parse(&sitemap_url).with_context(|| format!("Invalid sitemap URL '{}'", sitemap_url))?;

    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);

    let progress_bar = if show_progress_bars {
        Some(spinner("Resolving sitemap...")?)
    } else {
        None
    };

    let resolver_callback: ResolverProgressCallback = match progress_bar {
        Some(ref pb) => {
            let pb = pb.clone();
            Arc::new(move |url: String| pb.set_message(format!("Fetching sitemap {}", url)))
        }
        None => Arc::new(|_url: String| {}),
    };

    let resolver = SitemapResolver::new(transport.clone())
        .with_nested_delay(nested_delay)
        .with_progress_callback(resolver_callback);
    let (pages, stats) = resolver.resolve_with_stats(&sitemap_url).await;

    if let Some(ref callback) = progress_callback {
        callback(format!(
            "Found {} pages across {} sitemaps",
            pages.len(),
            stats.sitemaps_fetched
        ));
    }

    let reachability = if check_reachability && !pages.is_empty() {
        let total = pages.len();
        let check_callback: CheckProgressCallback = match progress_bar {
            Some(ref pb) => {
                let pb = pb.clone();
                Arc::new(move |index: usize, url: &str, outcome: Reachability| {
                    if outcome == Reachability::NotFound {
                        pb.println(format!("404: {}", url));
                    }
                    pb.set_message(format!("Checking pages... {}/{}", index + 1, total));
                })
            }
            None => Arc::new(|_index: usize, _url: &str, _outcome: Reachability| {}),
        };

        let checker = ReachabilityChecker::new(transport)
            .with_delay(check_delay)
            .with_progress_callback(check_callback);
        Some(checker.scan(&pages).await)
    } else {
        None
    };

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!("Scrape complete! {} pages found", pages.len()));
    }

    Ok(ScrapeOutcome {
        sitemap_url,
        pages,
        stats,
        reachability,
    })
}

/// Write `urls.json` and, when a reachability check ran, `404-pages.json`.
pub fn persist_scrape(outcome: &ScrapeOutcome, dir: &Path) -> Result<ScrapeArtifacts> {
    let urls_path = write_json_artifact(dir, URLS_FILE, &outcome.pages)?;

    let not_found_path = match outcome.reachability {
        Some(ref report) => Some(write_json_artifact(dir, NOT_FOUND_FILE, &report.not_found)?),
        None => None,
    };

    Ok(ScrapeArtifacts {
        urls_path,
        not_found_path,
    })
}
