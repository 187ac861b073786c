use anyhow::{Context, Result};
use burrow_core::error::ConfigError;
use burrow_core::proxy::{TOR_CHECK_URL, resolve_proxy, verify_tor};
use burrow_core::report::{ReportFormat, format_result_line, save_report, summarize};
use burrow_core::scan::{ScanOptions, ScanResultCallback, execute_scan, parse_target_url};
use burrow_core::wordlist::load_wordlist;
use burrow_scanner::fetcher::TOR_SOCKS_PROXY;
use burrow_scanner::result::ScanResult;
use burrow_scanner::ScanConfig;
use clap::ArgMatches;
use colored::Colorize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Parsed command line, before any validation against the filesystem or
/// network.
#[derive(Debug, Clone)]
pub struct ScanArgs {
    pub target: String,
    pub wordlist: PathBuf,
    pub threads: usize,
    pub max_depth: usize,
    pub proxy: Option<String>,
    pub use_tor: bool,
    pub delay: f64,
    pub timeout: u64,
    pub output: PathBuf,
    pub format: ReportFormat,
    pub log_file: PathBuf,
    pub verbose: bool,
    pub quiet: bool,
}

impl ScanArgs {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let format = matches
            .get_one::<String>("format")
            .and_then(|f| ReportFormat::from_str(f))
            .unwrap_or(ReportFormat::Csv);

        Self {
            target: matches.get_one::<String>("url").cloned().unwrap_or_default(),
            wordlist: matches
                .get_one::<String>("wordlist")
                .map(|p| expand_path(p))
                .unwrap_or_default(),
            threads: *matches.get_one::<usize>("threads").unwrap_or(&5),
            max_depth: *matches.get_one::<usize>("max-depth").unwrap_or(&1),
            proxy: matches.get_one::<String>("proxy").cloned(),
            use_tor: matches.get_flag("use-tor"),
            delay: *matches.get_one::<f64>("delay").unwrap_or(&1.0),
            timeout: *matches.get_one::<u64>("timeout").unwrap_or(&5),
            output: matches
                .get_one::<PathBuf>("output")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(burrow_core::report::DEFAULT_REPORT_PATH)),
            format,
            log_file: matches
                .get_one::<PathBuf>("log-file")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(crate::commands::DEFAULT_LOG_FILE)),
            verbose: matches.get_flag("verbose"),
            quiet: matches.get_flag("quiet"),
        }
    }
}

/// Expand a leading `~` in a user-supplied path.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Validate the arguments and combine them with the loaded wordlist.
pub fn build_scan_config(
    args: &ScanArgs,
    wordlist: Vec<String>,
) -> Result<ScanConfig, ConfigError> {
    let base_url = parse_target_url(&args.target)
        .ok_or_else(|| ConfigError::InvalidUrl(args.target.clone()))?;

    if args.threads == 0 {
        return Err(ConfigError::InvalidThreads);
    }
    if !args.delay.is_finite() || args.delay < 0.0 {
        return Err(ConfigError::InvalidDelay(args.delay));
    }

    Ok(ScanConfig::new(base_url, wordlist)
        .with_threads(args.threads)
        .with_max_depth(args.max_depth)
        .with_delay(Duration::from_secs_f64(args.delay))
        .with_timeout(Duration::from_secs(args.timeout))
        .with_proxy(resolve_proxy(args.use_tor, args.proxy.as_deref()))
        .with_verbose(args.verbose))
}

/// Install the log sinks: the log file always, the terminal only when
/// verbose. Only this crate's own targets log below WARN.
pub fn init_logging(log_file: &Path, verbose: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let targets = Targets::new()
        .with_target("burrow", level)
        .with_default(LevelFilter::WARN);

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_filter(targets.clone());
    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(targets)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to install logger")?;
    Ok(())
}

fn print_result(result: &ScanResult) {
    let line = format_result_line(result);
    let line = match result.status_code {
        200..=299 => line.green(),
        300..=399 => line.cyan(),
        400..=499 => line.yellow(),
        500..=599 => line.red(),
        _ => line.normal(),
    };
    println!("{}", line);
}

/// Run a full scan from parsed arguments: load inputs, preflight the
/// proxy, scan, and write the report.
pub async fn handle_scan(args: ScanArgs) -> Result<()> {
    let wordlist = load_wordlist(&args.wordlist)?;
    let config = build_scan_config(&args, wordlist)?;

    if args.use_tor {
        println!("{} Using Tor proxy at {}", "[*]".blue(), TOR_SOCKS_PROXY);
        if let Err(e) = verify_tor(&config.client_settings(), TOR_CHECK_URL).await {
            eprintln!(
                "{} Please make sure Tor is running and configured correctly.",
                "[!]".red().bold()
            );
            return Err(e.into());
        }
        println!("{} Tor proxy is working correctly.", "[✓]".green().bold());
    } else if let Some(ref proxy) = args.proxy {
        println!("{} Using proxy {}", "[*]".blue(), proxy);
    }

    println!(
        "{} Starting scan on {} with max-depth={} and threads={}",
        "[*]".blue(),
        config.base_url.as_str().bright_white(),
        config.max_depth,
        config.threads
    );
    info!(
        "Scanning {} with {} words from {}",
        config.base_url,
        config.wordlist.len(),
        args.wordlist.display()
    );

    let options = ScanOptions {
        config,
        show_progress_bars: !args.quiet,
    };
    let callback: ScanResultCallback = Arc::new(print_result);
    let results = execute_scan(options, Some(callback))
        .await
        .context("Scan failed")?;

    let rows = save_report(&results, &args.output, args.format)?;
    let summary = summarize(&results);

    println!();
    println!(
        "{} Scan finished. {} result(s) saved to {}",
        "[✓]".green().bold(),
        rows.to_string().cyan(),
        args.output.display().to_string().bright_white()
    );
    println!(
        "    {} requested, {} found, {} login page(s), {} default credential hit(s)",
        summary.total, summary.found, summary.login_pages, summary.credential_hits
    );

    Ok(())
}
