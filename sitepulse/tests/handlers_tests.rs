use sitepulse::*;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_parse_positive_count() {
    assert_eq!(parse_positive_count("10"), Ok(10));
    assert_eq!(parse_positive_count(" 3 "), Ok(3));
    assert!(parse_positive_count("0").is_err());
    assert!(parse_positive_count("-2").is_err());
    assert!(parse_positive_count("many").is_err());
}

#[test]
fn test_parse_duration_secs() {
    assert_eq!(parse_duration_secs("30"), Ok(Duration::from_secs(30)));
    assert_eq!(parse_duration_secs("0.5"), Ok(Duration::from_millis(500)));
    assert!(parse_duration_secs("0").is_err());
    assert!(parse_duration_secs("-1").is_err());
    assert!(parse_duration_secs("inf").is_err());
    assert!(parse_duration_secs("soon").is_err());
}

#[test]
fn test_expand_path_plain() {
    assert_eq!(expand_path("output"), PathBuf::from("output"));
    assert_eq!(
        expand_path("/tmp/output/urls.json"),
        PathBuf::from("/tmp/output/urls.json")
    );
}

#[test]
fn test_expand_path_tilde() {
    let expanded = expand_path("~/sitepulse");
    assert!(!expanded.to_string_lossy().starts_with('~'));
    assert!(expanded.ends_with("sitepulse"));
}

#[test]
fn test_loadtest_defaults() {
    let matches = command_argument_builder()
        .try_get_matches_from(["sitepulse", "loadtest"])
        .unwrap();
    let (name, sub) = matches.subcommand().unwrap();
    assert_eq!(name, "loadtest");

    let config = load_test_config_from_args(sub);
    assert_eq!(config.concurrency, 10);
    assert_eq!(config.requests_per_url, 1);
    assert_eq!(config.duration, None);
    assert_eq!(
        sub.get_one::<String>("file").map(String::as_str),
        Some("output/urls.json")
    );
    assert_eq!(
        sub.get_one::<String>("output").map(String::as_str),
        Some("output")
    );
}

#[test]
fn test_loadtest_custom_arguments() {
    let matches = command_argument_builder()
        .try_get_matches_from([
            "sitepulse",
            "loadtest",
            "-c",
            "25",
            "-n",
            "4",
            "--duration",
            "2.5",
            "--file",
            "urls.json",
        ])
        .unwrap();
    let (_, sub) = matches.subcommand().unwrap();

    let config = load_test_config_from_args(sub);
    assert_eq!(config.concurrency, 25);
    assert_eq!(config.requests_per_url, 4);
    assert_eq!(config.duration, Some(Duration::from_millis(2500)));
}

#[test]
fn test_loadtest_rejects_zero_concurrency() {
    let result = command_argument_builder().try_get_matches_from(["sitepulse", "loadtest", "-c", "0"]);
    assert!(result.is_err());
}

#[test]
fn test_scrape_requires_url() {
    let result = command_argument_builder().try_get_matches_from(["sitepulse", "scrape"]);
    assert!(result.is_err());

    let result = command_argument_builder()
        .try_get_matches_from(["sitepulse", "scrape", "--url", "not a url"]);
    assert!(result.is_err());
}

#[test]
fn test_scrape_arguments() {
    let matches = command_argument_builder()
        .try_get_matches_from([
            "sitepulse",
            "scrape",
            "-u",
            "https://example.com/sitemap.xml",
            "--no-check",
            "-q",
        ])
        .unwrap();

    assert!(matches.get_flag("quiet"));
    let (name, sub) = matches.subcommand().unwrap();
    assert_eq!(name, "scrape");
    assert!(sub.get_flag("no-check"));
    assert_eq!(
        sub.get_one::<url::Url>("url").map(|u| u.as_str()),
        Some("https://example.com/sitemap.xml")
    );
}
