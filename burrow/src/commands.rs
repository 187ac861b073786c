use crate::CLAP_STYLING;
use burrow_core::report::DEFAULT_REPORT_PATH;
use clap::arg;

pub const DEFAULT_LOG_FILE: &str = "scan_log.txt";

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("burrow")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("burrow")
        .about(
            "Explore the paths beneath a web host with a wordlist, fingerprint what is found \
            and try default credentials on login pages.",
        )
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and progress spinner").required(false))
        .arg(
            arg!(-u --"url" <URL>)
                .required(true)
                .help("The base URL to scan (http:// is assumed when no scheme is given)"),
        )
        .arg(
            arg!(-w --"wordlist" <PATH>)
                .required(true)
                .help("Path to a newline-delimited wordlist"),
        )
        .arg(
            arg!(-t --"threads" <NUM_WORKERS>)
                .required(false)
                .help("The number of concurrent requests per batch")
                .value_parser(clap::value_parser!(usize))
                .default_value("5"),
        )
        .arg(
            arg!(-d --"max-depth" <DEPTH>)
                .required(false)
                .help("How many wordlist hops to explore beneath the base URL")
                .value_parser(clap::value_parser!(usize))
                .default_value("1"),
        )
        .arg(
            arg!(--"proxy" <PROXY_URL>)
                .required(false)
                .help("Proxy for both HTTP and HTTPS traffic, e.g. http://127.0.0.1:8080")
                .conflicts_with("use-tor"),
        )
        .arg(
            arg!(--"use-tor")
                .required(false)
                .help("Route traffic through the Tor SOCKS proxy at 127.0.0.1:9050")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(--"delay" <SECONDS>)
                .required(false)
                .help("Pause between batches; up to 20% random jitter is added")
                .value_parser(clap::value_parser!(f64))
                .default_value("1.0"),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Request timeout in seconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("5"),
        )
        .arg(
            arg!(-o --"output" <PATH>)
                .required(false)
                .help("Where to save the report")
                .value_parser(clap::value_parser!(std::path::PathBuf))
                .default_value(DEFAULT_REPORT_PATH),
        )
        .arg(
            arg!(-f --"format" <FORMAT>)
                .required(false)
                .help("Report format: csv, json")
                .value_parser(["csv", "json"])
                .default_value("csv"),
        )
        .arg(
            arg!(--"log-file" <PATH>)
                .required(false)
                .help("File receiving the scan log")
                .value_parser(clap::value_parser!(std::path::PathBuf))
                .default_value(DEFAULT_LOG_FILE),
        )
        .arg(
            arg!(-v --"verbose")
                .required(false)
                .help("Also print per-request activity and errors to the terminal")
                .action(clap::ArgAction::SetTrue),
        )
}
