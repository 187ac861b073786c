use burrow_scanner::result::ScanResult;
use burrow_scanner::{ScanConfig, ScanError, Scheduler};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

/// Options for configuring a scan run
pub struct ScanOptions {
    pub config: ScanConfig,
    pub show_progress_bars: bool,
}

/// Callback for reporting individual scan results as they come in
pub type ScanResultCallback = Arc<dyn Fn(&ScanResult) + Send + Sync>;

/// Normalise a user-supplied target, adding `http://` when no scheme is given.
pub fn parse_target_url(target: &str) -> Option<Url> {
    let target = target.trim();
    if target.is_empty() {
        return None;
    }
    let candidate = if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!("http://{}", target)
    };
    Url::parse(&candidate)
        .ok()
        .filter(|url| url.host_str().is_some())
}

/// Execute a scan with the given options. Results are handed to
/// `result_callback` in completion order and returned in the same order.
pub async fn execute_scan(
    options: ScanOptions,
    result_callback: Option<ScanResultCallback>,
) -> Result<Vec<ScanResult>, ScanError> {
    let ScanOptions {
        config,
        show_progress_bars,
    } = options;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting scan...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let dispatched = Arc::new(AtomicUsize::new(0));
    let mut scheduler = Scheduler::new(config)?;

    if let Some(ref pb) = progress_bar {
        let pb_clone = pb.clone();
        let count_clone = dispatched.clone();
        scheduler = scheduler.with_progress_callback(Arc::new(move |queued: usize, url: String| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            pb_clone.set_message(format!(
                "Scanning... {} sent, {} queued | {}",
                count, queued, url
            ));
        }));
    }

    if let Some(cb) = result_callback {
        let pb_clone = progress_bar.clone();
        scheduler = scheduler.with_result_callback(Arc::new(move |result: &ScanResult| {
            // Keep result lines from tearing through the spinner
            match pb_clone {
                Some(ref pb) => pb.suspend(|| cb(result)),
                None => cb(result),
            }
        }));
    }

    let outcome = scheduler.run().await;

    if let Some(ref pb) = progress_bar {
        let total = dispatched.load(Ordering::Relaxed);
        pb.finish_and_clear();
        if outcome.is_ok() {
            pb.println(format!("Scan complete! {} paths requested", total));
        }
    }

    outcome
}
