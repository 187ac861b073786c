use crate::error::FetchError;
use rand::seq::IndexedRandom;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Local Tor SOCKS endpoint. `socks5h` so that DNS also resolves through Tor.
pub const TOR_SOCKS_PROXY: &str = "socks5h://127.0.0.1:9050";

pub const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64)",
    "Mozilla/5.0 (X11; Linux x86_64)",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)",
];

/// Pick a client identity uniformly at random. Called once per request.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Independent proxy endpoints for plain and TLS traffic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub http: Option<String>,
    pub https: Option<String>,
}

impl ProxyConfig {
    /// Route both schemes through one proxy.
    pub fn all(proxy: impl Into<String>) -> Self {
        let proxy = proxy.into();
        Self {
            http: Some(proxy.clone()),
            https: Some(proxy),
        }
    }

    pub fn tor() -> Self {
        Self::all(TOR_SOCKS_PROXY)
    }

    pub fn is_empty(&self) -> bool {
        self.http.is_none() && self.https.is_none()
    }

    pub fn apply(&self, mut builder: ClientBuilder) -> Result<ClientBuilder, FetchError> {
        if let Some(ref http) = self.http {
            let proxy = reqwest::Proxy::http(http).map_err(|e| FetchError::Proxy {
                proxy: http.clone(),
                source: e,
            })?;
            builder = builder.proxy(proxy);
        }
        if let Some(ref https) = self.https {
            let proxy = reqwest::Proxy::https(https).map_err(|e| FetchError::Proxy {
                proxy: https.clone(),
                source: e,
            })?;
            builder = builder.proxy(proxy);
        }
        Ok(builder)
    }
}

/// Transport settings shared by the scan client and every probe session.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub timeout: Duration,
    pub proxy: Option<ProxyConfig>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            proxy: None,
        }
    }
}

impl ClientSettings {
    fn builder(&self) -> Result<ClientBuilder, FetchError> {
        let builder = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::limited(5));

        match self.proxy {
            Some(ref proxy) => proxy.apply(builder),
            None => Ok(builder),
        }
    }

    /// Stateless client used for the main path fetches.
    pub fn build_client(&self) -> Result<Client, FetchError> {
        self.builder()?.build().map_err(FetchError::ClientBuild)
    }

    /// Fresh cookie-carrying client. Each credential probe gets its own.
    pub fn session(&self) -> Result<Client, FetchError> {
        self.builder()?
            .cookie_store(true)
            .build()
            .map_err(FetchError::ClientBuild)
    }
}

/// Everything the analyzers and heuristics need from one response.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub response_time: Duration,
    pub body: String,
}

/// Ensure the base URL behaves like a directory so paths resolve beneath it.
pub fn normalize_base_url(url: &Url) -> Url {
    let mut base = url.clone();
    base.set_query(None);
    base.set_fragment(None);
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

/// Resolve a frontier path beneath a base URL.
pub fn resolve_path(base_url: &Url, path: &str) -> Result<Url, FetchError> {
    // "./" keeps words such as "a:b" from being parsed as a scheme
    let relative = format!("./{}", path.trim_start_matches('/'));
    base_url
        .join(&relative)
        .map_err(|e| FetchError::InvalidUrl(format!("{}{}: {}", base_url, path, e)))
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    base_url: Url,
}

impl Fetcher {
    pub fn new(base_url: &Url, settings: ClientSettings) -> Result<Self, FetchError> {
        Ok(Self {
            client: settings.build_client()?,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> Result<Url, FetchError> {
        resolve_path(&self.base_url, path)
    }

    /// One GET for `path` beneath the base URL. Transport failures come back
    /// as `FetchError`; HTTP error statuses are ordinary pages.
    pub async fn fetch(&self, path: &str) -> Result<FetchedPage, FetchError> {
        let url = self.url_for(path)?;
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, random_user_agent())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;
        let response_time = start.elapsed();

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let content_length = response.content_length();

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        Ok(FetchedPage {
            url,
            status_code,
            content_type,
            content_length,
            response_time,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::closed_port_uri;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header_exists, method, path},
    };

    #[test]
    fn test_normalize_base_url_adds_trailing_slash() {
        let url = Url::parse("http://example.test/app?x=1#top").unwrap();
        assert_eq!(normalize_base_url(&url).as_str(), "http://example.test/app/");

        let bare = Url::parse("http://example.test").unwrap();
        assert_eq!(normalize_base_url(&bare).as_str(), "http://example.test/");
    }

    #[test]
    fn test_resolve_path() {
        let base = normalize_base_url(&Url::parse("http://example.test/app").unwrap());
        assert_eq!(resolve_path(&base, "").unwrap().as_str(), "http://example.test/app/");
        assert_eq!(
            resolve_path(&base, "admin/login.php").unwrap().as_str(),
            "http://example.test/app/admin/login.php"
        );
        assert_eq!(
            resolve_path(&base, "/admin").unwrap().as_str(),
            "http://example.test/app/admin"
        );
        assert_eq!(
            resolve_path(&base, "a:b").unwrap().as_str(),
            "http://example.test/app/a:b"
        );
    }

    #[test]
    fn test_random_user_agent_from_pool() {
        for _ in 0..20 {
            assert!(USER_AGENTS.contains(&random_user_agent()));
        }
    }

    #[test]
    fn test_proxy_config_all() {
        let proxy = ProxyConfig::all("http://127.0.0.1:8080");
        assert_eq!(proxy.http.as_deref(), Some("http://127.0.0.1:8080"));
        assert_eq!(proxy.https.as_deref(), Some("http://127.0.0.1:8080"));
        assert!(!proxy.is_empty());
        assert!(ProxyConfig::default().is_empty());
        assert_eq!(ProxyConfig::tor().http.as_deref(), Some(TOR_SOCKS_PROXY));
    }

    #[test]
    fn test_invalid_proxy_is_rejected() {
        let settings = ClientSettings {
            proxy: Some(ProxyConfig::all("not a proxy url")),
            ..ClientSettings::default()
        };
        assert!(matches!(
            settings.build_client(),
            Err(FetchError::Proxy { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_records_status_content_type_and_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin"))
            .and(header_exists("user-agent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html>hello</html>", "text/html; charset=utf-8"),
            )
            .mount(&mock_server)
            .await;

        let base = Url::parse(&mock_server.uri()).unwrap();
        let fetcher = Fetcher::new(&base, ClientSettings::default()).unwrap();
        let page = fetcher.fetch("admin").await.unwrap();

        assert_eq!(page.status_code, 200);
        assert_eq!(page.url.path(), "/admin");
        assert_eq!(page.content_type.as_deref(), Some("text/html; charset=utf-8"));
        assert_eq!(page.body, "<html>hello</html>");
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_not_a_fetch_error() {
        let mock_server = MockServer::start().await;
        let base = Url::parse(&mock_server.uri()).unwrap();
        let fetcher = Fetcher::new(&base, ClientSettings::default()).unwrap();

        let page = fetcher.fetch("missing").await.unwrap();
        assert_eq!(page.status_code, 404);
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let base = Url::parse(&mock_server.uri()).unwrap();
        let settings = ClientSettings {
            timeout: Duration::from_millis(50),
            proxy: None,
        };
        let fetcher = Fetcher::new(&base, settings).unwrap();

        let err = fetcher.fetch("slow").await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let base = Url::parse(&closed_port_uri()).unwrap();
        let fetcher = Fetcher::new(&base, ClientSettings::default()).unwrap();

        let err = fetcher.fetch("anything").await.unwrap_err();
        assert!(matches!(err, FetchError::Connect { .. }), "got {:?}", err);
    }
}
