use crate::analyzer::analyze_page;
use crate::directory::is_probably_directory;
use crate::error::{FetchError, Result, ScanError};
use crate::fetcher::{ClientSettings, DEFAULT_TIMEOUT_SECS, Fetcher, ProxyConfig};
use crate::frontier::{Frontier, FrontierEntry};
use crate::prober::CredentialProber;
use crate::result::ScanResult;
use futures::stream::{FuturesUnordered, StreamExt};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_THREADS: usize = 5;
pub const DEFAULT_MAX_DEPTH: usize = 1;
pub const DEFAULT_DELAY_SECS: f64 = 1.0;

/// Upper bound (exclusive) of the random extra pause, as a fraction of the delay.
pub const DELAY_JITTER: f64 = 0.2;

/// Called as each task is dispatched with (entries still queued, url).
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Called once per completed result, in completion order.
pub type ResultCallback = Arc<dyn Fn(&ScanResult) + Send + Sync>;

/// Everything a scan run needs, passed in once at construction.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub base_url: Url,
    pub wordlist: Arc<Vec<String>>,
    pub threads: usize,
    pub max_depth: usize,
    pub delay: Duration,
    pub timeout: Duration,
    pub proxy: Option<ProxyConfig>,
    pub verbose: bool,
}

impl ScanConfig {
    pub fn new(base_url: Url, wordlist: Vec<String>) -> Self {
        Self {
            base_url,
            wordlist: Arc::new(wordlist),
            threads: DEFAULT_THREADS,
            max_depth: DEFAULT_MAX_DEPTH,
            delay: Duration::from_secs_f64(DEFAULT_DELAY_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            proxy: None,
            verbose: false,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<ProxyConfig>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Log every completed result, not just the scan start and finish.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            timeout: self.timeout,
            proxy: self.proxy.clone(),
        }
    }
}

/// Pause before the next batch: `delay + uniform(0, 0.2 * delay)`, or
/// nothing when the delay is zero.
pub fn batch_pause<R: Rng + ?Sized>(delay: Duration, rng: &mut R) -> Option<Duration> {
    if delay.is_zero() {
        return None;
    }
    let jitter = rng.random_range(0.0..DELAY_JITTER);
    Some(delay + delay.mul_f64(jitter))
}

/// Fetch one frontier entry, classify it and, for login pages, probe it.
pub async fn scan_path(
    fetcher: &Fetcher,
    prober: &CredentialProber,
    entry: &FrontierEntry,
) -> std::result::Result<ScanResult, FetchError> {
    let page = fetcher.fetch(&entry.path).await?;
    debug!("Scanning: {}", page.url);

    let analysis = analyze_page(&page.body, &entry.path);

    let credentials = if analysis.is_login_page {
        match prober.probe(&page.url, &entry.path).await {
            Ok(found) if !found.is_empty() => Some(found),
            Ok(_) => None,
            Err(e) => {
                warn!("Credential probe aborted for {}: {}", page.url, e);
                None
            }
        }
    } else {
        None
    };

    let mut result = ScanResult::new(page.url.to_string(), entry.path.clone(), entry.depth);
    result.status_code = page.status_code;
    result.content_type = page.content_type;
    result.content_length = page.content_length;
    result.response_time = page.response_time;
    result.cms = analysis.cms.map(String::from);
    result.is_login_page = analysis.is_login_page;
    result.credentials = credentials;
    result.hidden_forms = analysis.hidden_forms;

    Ok(result)
}

/// Drives a depth-bounded, breadth-first scan beneath one base URL.
///
/// Work runs in batches of up to `threads` concurrent tasks. The frontier
/// is only touched between batches, after every task in the batch has
/// finished, so it needs no locking.
pub struct Scheduler {
    config: ScanConfig,
    fetcher: Arc<Fetcher>,
    prober: Arc<CredentialProber>,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
}

impl Scheduler {
    pub fn new(config: ScanConfig) -> Result<Self> {
        if config.base_url.cannot_be_a_base() || config.base_url.host_str().is_none() {
            return Err(ScanError::InvalidUrl(config.base_url.to_string()));
        }

        let settings = config.client_settings();
        let fetcher = Fetcher::new(&config.base_url, settings.clone())?;
        let prober = CredentialProber::new(settings);

        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
            prober: Arc::new(prober),
            progress_callback: None,
            result_callback: None,
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan until the frontier is exhausted. Per-task failures are logged
    /// and dropped; they never end the scan.
    pub async fn run(&self) -> Result<Vec<ScanResult>> {
        let threads = self.config.threads.max(1);
        info!(
            "Starting scan of {} with max depth {} and {} workers",
            self.fetcher.base_url(),
            self.config.max_depth,
            threads
        );

        let mut frontier = Frontier::new(self.config.max_depth);
        frontier.push(FrontierEntry::root());
        let mut results = Vec::new();

        while !frontier.is_empty() {
            let batch = frontier.pop_batch(threads);
            if batch.is_empty() {
                continue;
            }

            let queued = frontier.len();
            let mut in_flight: FuturesUnordered<_> = batch
                .into_iter()
                .map(|entry| {
                    let handle = self.spawn_task(&entry, queued);
                    async move { (entry, handle.await) }
                })
                .collect();

            while let Some((entry, joined)) = in_flight.next().await {
                let result = match joined {
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) => {
                        warn!("Dropping '{}': {}", entry.path, e);
                        continue;
                    }
                    Err(e) => {
                        warn!("Scan task for '{}' failed: {}", entry.path, e);
                        continue;
                    }
                };

                if self.config.verbose {
                    info!(
                        "[{}] {} in {:?}",
                        result.status_code, result.url, result.response_time
                    );
                }
                if let Some(ref callback) = self.result_callback {
                    callback(&result);
                }

                let content_type = result.content_type.as_deref();
                if is_probably_directory(&entry.path, content_type, result.status_code) {
                    self.expand(&mut frontier, &entry);
                }

                results.push(result);
            }

            if frontier.is_empty() {
                break;
            }
            let pause = batch_pause(self.config.delay, &mut rand::rng());
            if let Some(pause) = pause {
                debug!("Sleeping {:?} before next batch", pause);
                tokio::time::sleep(pause).await;
            }
        }

        info!(
            "Scan complete. {} results from {} visited paths",
            results.len(),
            frontier.visited_count()
        );
        Ok(results)
    }

    fn spawn_task(
        &self,
        entry: &FrontierEntry,
        queued: usize,
    ) -> JoinHandle<std::result::Result<ScanResult, FetchError>> {
        let fetcher = self.fetcher.clone();
        let prober = self.prober.clone();

        if let Some(ref callback) = self.progress_callback {
            if let Ok(url) = fetcher.url_for(&entry.path) {
                callback(queued, url.to_string());
            }
        }

        let entry = entry.clone();
        tokio::spawn(async move { scan_path(&fetcher, &prober, &entry).await })
    }

    fn expand(&self, frontier: &mut Frontier, parent: &FrontierEntry) {
        if parent.depth + 1 > frontier.max_depth() {
            return;
        }
        for word in self.config.wordlist.iter() {
            let child = parent.child(word);
            frontier.push(child);
        }
        debug!(
            "Expanded '{}' with {} words ({} queued)",
            parent.path,
            self.config.wordlist.len(),
            frontier.len()
        );
    }
}
