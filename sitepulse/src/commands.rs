use crate::handlers::{parse_duration_secs, parse_positive_count};
use clap::{arg, command};
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitepulse")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitepulse")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress progress bars and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Enable debug logging")
                .required(false)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("scrape")
                .about(
                    "Discover every page listed by a sitemap (following nested sitemaps) and \
                check each page for 404s.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The root sitemap URL")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-o --"output" <DIR>)
                        .required(false)
                        .help("Directory for urls.json and 404-pages.json")
                        .default_value("output"),
                )
                .arg(
                    arg!(--"no-check")
                        .required(false)
                        .help("Skip the reachability check of discovered pages")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("loadtest")
                .about("Run a concurrent load test against a JSON list of URLs.")
                .arg(
                    arg!(-f --"file" <PATH>)
                        .required(false)
                        .help("JSON array of URLs to test")
                        .default_value("output/urls.json"),
                )
                .arg(
                    arg!(-c --"concurrency" <NUM>)
                        .required(false)
                        .help("Maximum number of requests in flight at once")
                        .value_parser(parse_positive_count)
                        .default_value("10"),
                )
                .arg(
                    arg!(-n --"requests" <NUM>)
                        .required(false)
                        .help("Requests to send per URL")
                        .value_parser(parse_positive_count)
                        .default_value("1"),
                )
                .arg(
                    arg!(-d --"duration" <SECONDS>)
                        .required(false)
                        .help("Stop dispatching new requests after this many seconds")
                        .value_parser(parse_duration_secs),
                )
                .arg(
                    arg!(-o --"output" <DIR>)
                        .required(false)
                        .help("Directory for the summary and results JSON files")
                        .default_value("output"),
                ),
        )
}
