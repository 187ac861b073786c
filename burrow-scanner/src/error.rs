use thiserror::Error;

/// Transport-level failure for a single request. Always recoverable: the
/// task that hit it is dropped and the scan continues.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Connection to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid proxy '{proxy}': {source}")]
    Proxy {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl FetchError {
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if err.is_connect() {
            FetchError::Connect {
                url: url.to_string(),
                source: err,
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// Failure in the form stage of credential probing. Aborts probing for one
/// URL only; the page is still recorded without credentials.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Could not open probe session: {0}")]
    Session(#[source] FetchError),

    #[error("Could not fetch login form at {url}: {source}")]
    FormFetch {
        url: String,
        #[source]
        source: FetchError,
    },
}

/// Scan-fatal conditions raised before or outside of per-task work.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Client(#[from] FetchError),
}

pub type Result<T> = std::result::Result<T, ScanError>;
