pub mod loadtest;
pub mod output;
pub mod report;
pub mod scrape;

pub use loadtest::{LoadTestArtifacts, LoadTestOptions, execute_load_test, persist_load_test};
pub use output::{default_urls_path, load_url_list, timestamp_slug, write_json_artifact};
pub use report::{generate_load_test_report, generate_scrape_report};
pub use scrape::{
    ScrapeArtifacts, ScrapeOptions, ScrapeOutcome, ScrapeProgressCallback, execute_scrape,
    persist_scrape,
};
