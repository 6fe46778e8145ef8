use anyhow::Result;
use chrono::Utc;
use clap::ArgMatches;
use colored::Colorize;
use sitepulse_core::{
    LoadTestOptions, ScrapeOptions, execute_load_test, execute_scrape, generate_load_test_report,
    generate_scrape_report, load_url_list, persist_load_test, persist_scrape,
};
use sitepulse_scanner::LoadTestConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use url::Url;

// Argument parsing helpers

/// clap value parser for counts that must be at least 1
pub fn parse_positive_count(value: &str) -> Result<usize, String> {
    let count: usize = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a whole number", value))?;
    if count == 0 {
        return Err("must be at least 1".to_string());
    }
    Ok(count)
}

/// clap value parser for a positive number of seconds, fractions allowed
pub fn parse_duration_secs(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", value))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err("must be a positive number of seconds".to_string());
    }
    Ok(Duration::from_secs_f64(seconds))
}

/// Expand a leading `~` in a user-supplied path
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Build the load test configuration from parsed `loadtest` arguments
pub fn load_test_config_from_args(args: &ArgMatches) -> LoadTestConfig {
    let defaults = LoadTestConfig::default();
    LoadTestConfig {
        concurrency: args
            .get_one::<usize>("concurrency")
            .copied()
            .unwrap_or(defaults.concurrency),
        requests_per_url: args
            .get_one::<usize>("requests")
            .copied()
            .unwrap_or(defaults.requests_per_url),
        duration: args.get_one::<Duration>("duration").copied(),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    // A subscriber may already be installed when handlers run more than once in-process.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_artifact(label: &str, path: &Path) {
    println!(
        "{} {}: {}",
        "✓".green().bold(),
        label,
        path.display().to_string().bright_white()
    );
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", "✗".red().bold(), message);
    std::process::exit(1);
}

// Command handlers

pub async fn handle_scrape(sub_matches: &ArgMatches, quiet: bool, verbose: bool) {
    init_tracing(verbose);

    let url = sub_matches
        .get_one::<Url>("url")
        .expect("clap enforces --url");
    let output_dir = expand_path(
        sub_matches
            .get_one::<String>("output")
            .expect("--output has a default"),
    );
    let check_reachability = !sub_matches.get_flag("no-check");

    if let Err(e) = run_scrape(url, &output_dir, check_reachability, quiet).await {
        fail(format!("Scrape failed: {:#}", e));
    }
}

async fn run_scrape(url: &Url, output_dir: &Path, check_reachability: bool, quiet: bool) -> Result<()> {
    if !quiet {
        print_divider();
        println!("{}", "  SITEMAP SCRAPE".bright_white().bold());
        print_divider();
        println!("{} Sitemap: {}", "→".blue(), url.as_str().bright_white());
        println!(
            "{} Reachability check: {}",
            "→".blue(),
            if check_reachability { "enabled" } else { "disabled" }
        );
        println!();
    }

    let options = ScrapeOptions {
        check_reachability,
        show_progress_bars: !quiet,
        ..ScrapeOptions::new(url.as_str())
    };
    let progress_callback = Arc::new(move |msg: String| {
        if !quiet {
            println!("{} {}", "→".blue(), msg);
        }
    });

    let outcome = execute_scrape(options, Some(progress_callback)).await?;
    let artifacts = persist_scrape(&outcome, output_dir)?;

    print!("{}", generate_scrape_report(&outcome));
    println!();
    print_artifact("Page list", &artifacts.urls_path);
    if let Some(ref path) = artifacts.not_found_path {
        print_artifact("404 list", path);
    }

    Ok(())
}

pub async fn handle_loadtest(sub_matches: &ArgMatches, quiet: bool, verbose: bool) {
    init_tracing(verbose);

    let file = expand_path(
        sub_matches
            .get_one::<String>("file")
            .expect("--file has a default"),
    );
    let output_dir = expand_path(
        sub_matches
            .get_one::<String>("output")
            .expect("--output has a default"),
    );
    let config = load_test_config_from_args(sub_matches);

    if let Err(e) = run_loadtest(&file, &output_dir, config, quiet).await {
        fail(format!("Load test failed: {:#}", e));
    }
}

async fn run_loadtest(file: &Path, output_dir: &Path, config: LoadTestConfig, quiet: bool) -> Result<()> {
    let urls = load_url_list(file)?;

    if !quiet {
        print_divider();
        println!("{}", "  LOAD TEST".bright_white().bold());
        print_divider();
        println!(
            "{} URLs: {} (from {})",
            "→".blue(),
            urls.len().to_string().cyan(),
            file.display()
        );
        println!("{} Concurrency: {}", "→".blue(), config.concurrency.to_string().cyan());
        println!(
            "{} Requests per URL: {}",
            "→".blue(),
            config.requests_per_url.to_string().cyan()
        );
        match config.duration {
            Some(duration) => println!(
                "{} Duration cap: {}s",
                "→".blue(),
                duration.as_secs_f64().to_string().cyan()
            ),
            None => println!("{} Duration cap: none", "→".blue()),
        }
        println!();
    }

    let outcome = execute_load_test(LoadTestOptions {
        urls,
        config,
        show_progress_bars: !quiet,
    })
    .await?;
    let artifacts = persist_load_test(&outcome, output_dir, Utc::now())?;

    print!("{}", generate_load_test_report(&outcome.summary));
    println!();
    print_artifact("Summary", &artifacts.summary_path);
    print_artifact("Results", &artifacts.results_path);

    Ok(())
}
