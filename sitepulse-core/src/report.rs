// Plain-text reports for scrape and load test runs

use crate::scrape::ScrapeOutcome;
use colored::Colorize;
use sitepulse_scanner::LoadTestSummary;

const RULE: &str = "═══════════════════════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────────────────────";

fn status_label(status_code: u16) -> String {
    let code = status_code.to_string();
    match status_code {
        200..=299 => format!("[{}] Success", code.green()),
        300..=399 => format!("[{}] Redirect", code.cyan()),
        400..=499 => format!("[{}] Client Error", code.yellow()),
        500..=599 => format!("[{}] Server Error", code.red()),
        _ => format!("[{}]", code),
    }
}

pub fn generate_scrape_report(outcome: &ScrapeOutcome) -> String {
    let mut report = String::new();

    report.push_str(&format!("\n{}\n", RULE));
    report.push_str("                            SCRAPE RESULTS\n");
    report.push_str(&format!("{}\n\n", RULE));

    report.push_str(&format!("Sitemap: {}\n", outcome.sitemap_url));
    report.push_str(&format!("Sitemaps fetched: {}\n", outcome.stats.sitemaps_fetched));
    report.push_str(&format!("Sitemaps failed: {}\n", outcome.stats.sitemaps_failed));
    report.push_str(&format!("Pages found: {}\n", outcome.pages.len()));

    if let Some(ref reachability) = outcome.reachability {
        report.push_str(&format!("\nPages checked: {}\n", reachability.checked));
        report.push_str(&format!("  Reachable: {}\n", reachability.reachable.len()));
        report.push_str(&format!("  Not found (404): {}\n", reachability.not_found.len()));
        report.push_str(&format!("  Unknown: {}\n", reachability.unknown.len()));

        if !reachability.not_found.is_empty() {
            report.push_str(&format!("\nNot found\n{}\n", THIN_RULE));
            for url in &reachability.not_found {
                report.push_str(&format!("  {}\n", url));
            }
        }

        if !reachability.unknown.is_empty() {
            report.push_str(&format!("\nCould not be checked\n{}\n", THIN_RULE));
            for url in &reachability.unknown {
                report.push_str(&format!("  {}\n", url));
            }
        }
    }

    report.push_str(&format!("\n{}\n", RULE));
    report
}

pub fn generate_load_test_report(summary: &LoadTestSummary) -> String {
    let mut report = String::new();

    report.push_str(&format!("\n{}\n", RULE));
    report.push_str("                            LOAD TEST RESULTS\n");
    report.push_str(&format!("{}\n\n", RULE));

    report.push_str(&format!("Total requests: {}\n", summary.total_requests));
    report.push_str(&format!("Successful: {}\n", summary.successful_requests));
    report.push_str(&format!("Failed: {}\n", summary.failed_requests));
    report.push_str(&format!("Duration: {:.2}s\n", summary.total_duration));
    report.push_str(&format!("Requests/sec: {:.2}\n\n", summary.requests_per_second));

    report.push_str("Response times\n");
    report.push_str(&format!("{}\n", THIN_RULE));
    report.push_str(&format!("  Average: {:.2}ms\n", summary.average_response_time));
    report.push_str(&format!("  Min: {}ms\n", summary.min_response_time));
    report.push_str(&format!("  Max: {}ms\n\n", summary.max_response_time));

    if !summary.status_code_distribution.is_empty() {
        report.push_str("Status codes\n");
        report.push_str(&format!("{}\n", THIN_RULE));
        for (status_code, count) in &summary.status_code_distribution {
            report.push_str(&format!("  {} x {}\n", status_label(*status_code), count));
        }
        report.push('\n');
    }

    if !summary.errors.is_empty() {
        report.push_str("Errors\n");
        report.push_str(&format!("{}\n", THIN_RULE));
        for (error, count) in &summary.errors {
            report.push_str(&format!("  {} x {}\n", error, count));
        }
        report.push('\n');
    }

    report.push_str(&format!("{}\n", RULE));
    report
}
