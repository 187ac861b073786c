pub mod analyzer;
pub mod directory;
pub mod error;
pub mod fetcher;
pub mod frontier;
pub mod prober;
pub mod result;
pub mod scheduler;

#[cfg(test)]
mod test_support;

pub use error::{FetchError, ProbeError, ScanError};
pub use fetcher::{ClientSettings, Fetcher, ProxyConfig};
pub use frontier::{Frontier, FrontierEntry};
pub use prober::{CredentialPair, CredentialProber};
pub use result::ScanResult;
pub use scheduler::{ProgressCallback, ResultCallback, ScanConfig, Scheduler};
