use std::path::PathBuf;
use thiserror::Error;

/// Problems with the scan's inputs. Fatal: raised before scanning begins.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read wordlist {}: {source}", .path.display())]
    WordlistRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Wordlist {} is empty or contains only comments", .path.display())]
    WordlistEmpty { path: PathBuf },

    #[error("Invalid target URL '{0}'")]
    InvalidUrl(String),

    #[error("Delay must be a finite, non-negative number of seconds (got {0})")]
    InvalidDelay(f64),

    #[error("Thread count must be at least 1")]
    InvalidThreads,

    #[error("Tor preflight failed: {0}")]
    TorPreflight(String),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
