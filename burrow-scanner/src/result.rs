use crate::analyzer::HiddenForm;
use crate::prober::CredentialPair;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Status codes that count as a "found" path in reports.
pub const FOUND_STATUS_CODES: [u16; 3] = [200, 301, 302];

/// Classified outcome of one completed fetch. Built once by a worker and
/// never mutated after it reaches the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub url: String,
    pub path: String,
    pub depth: usize,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub response_time: Duration,
    pub cms: Option<String>,
    pub is_login_page: bool,
    pub credentials: Option<Vec<CredentialPair>>,
    pub hidden_forms: Vec<HiddenForm>,
}

impl ScanResult {
    pub fn new(url: String, path: String, depth: usize) -> Self {
        Self {
            url,
            path,
            depth,
            status_code: 0,
            content_type: None,
            content_length: None,
            response_time: Duration::from_secs(0),
            cms: None,
            is_login_page: false,
            credentials: None,
            hidden_forms: Vec::new(),
        }
    }

    pub fn is_found(&self) -> bool {
        FOUND_STATUS_CODES.contains(&self.status_code)
    }

    /// Credentials rendered as `user:pass` strings, in trial order.
    pub fn credential_strings(&self) -> Vec<String> {
        self.credentials
            .iter()
            .flatten()
            .map(|pair| pair.to_string())
            .collect()
    }
}
