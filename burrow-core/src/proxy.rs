// Proxy selection and Tor connectivity preflight

use crate::error::ConfigError;
use burrow_scanner::fetcher::{ClientSettings, ProxyConfig};
use serde::Deserialize;
use tracing::{info, warn};

pub const TOR_CHECK_URL: &str = "https://check.torproject.org/api/ip";

#[derive(Debug, Deserialize)]
struct TorCheck {
    #[serde(rename = "IsTor", default)]
    is_tor: bool,
}

/// Tor wins over an explicit proxy; neither means a direct connection.
pub fn resolve_proxy(use_tor: bool, proxy: Option<&str>) -> Option<ProxyConfig> {
    if use_tor {
        return Some(ProxyConfig::tor());
    }
    proxy
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ProxyConfig::all)
}

/// Ask the Tor check service whether traffic through `settings` exits via
/// Tor. Anything other than HTTP 200 with `IsTor: true` fails the preflight.
pub async fn verify_tor(settings: &ClientSettings, check_url: &str) -> Result<(), ConfigError> {
    let client = settings
        .build_client()
        .map_err(|e| ConfigError::TorPreflight(e.to_string()))?;

    let response = client
        .get(check_url)
        .send()
        .await
        .map_err(|e| ConfigError::TorPreflight(format!("request to {} failed: {}", check_url, e)))?;

    let status = response.status();
    if !status.is_success() {
        warn!("Tor check returned HTTP {}", status);
        return Err(ConfigError::TorPreflight(format!(
            "check service returned HTTP {}",
            status.as_u16()
        )));
    }

    let check: TorCheck = response
        .json()
        .await
        .map_err(|e| ConfigError::TorPreflight(format!("unreadable check response: {}", e)))?;

    if !check.is_tor {
        return Err(ConfigError::TorPreflight(
            "traffic is not routed through Tor".to_string(),
        ));
    }

    info!("Tor proxy verified via {}", check_url);
    Ok(())
}
