// Default credential probing against a detected login surface

use crate::analyzer::is_login_page;
use crate::error::{FetchError, ProbeError};
use crate::fetcher::{ClientSettings, random_user_agent};
use reqwest::Client;
use reqwest::header::USER_AGENT;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use url::Url;

/// Built-in pairs, tried in this order against every login surface.
pub const DEFAULT_CREDENTIALS: [(&str, &str); 5] = [
    ("admin", "admin"),
    ("admin", "password"),
    ("root", "root"),
    ("user", "user"),
    ("test", "test"),
];

/// Response body markers that mean a form login went through.
pub const SUCCESS_MARKERS: &[&str] = &["logout", "dashboard"];

const USERNAME_FIELD_KEYWORDS: &[&str] = &["user", "login", "email"];
const PASSWORD_FIELD_KEYWORDS: &[&str] = &["pass"];

static FORM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("form").expect("form selector is valid"));
static INPUT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input").expect("input selector is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialPair {
    pub username: String,
    pub password: String,
}

impl CredentialPair {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn defaults() -> Vec<Self> {
        DEFAULT_CREDENTIALS
            .iter()
            .map(|(user, pass)| Self::new(*user, *pass))
            .collect()
    }
}

impl fmt::Display for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.username, self.password)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    Post,
}

impl FormMethod {
    /// Login forms default to POST; anything other than "post" submits as GET.
    pub fn from_attr(method: Option<&str>) -> Self {
        match method {
            None => FormMethod::Post,
            Some(m) if m.trim().eq_ignore_ascii_case("post") => FormMethod::Post,
            Some(_) => FormMethod::Get,
        }
    }
}

/// The first form on a page, with its submission target and inferred
/// field roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub submit_url: Url,
    pub method: FormMethod,
    pub username_field: Option<String>,
    pub password_field: Option<String>,
}

impl LoginForm {
    /// Returns `None` when the page has no `<form>` at all.
    pub fn parse(html: &str, page_url: &Url) -> Option<Self> {
        let document = Html::parse_document(html);
        let form = document.select(&FORM_SELECTOR).next()?;

        let mut username_field = None;
        let mut password_field = None;
        for input in form.select(&INPUT_SELECTOR) {
            let Some(name) = input.value().attr("name") else {
                continue;
            };
            let lowered = name.to_lowercase();
            let matches_any = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));
            if username_field.is_none() && matches_any(USERNAME_FIELD_KEYWORDS) {
                username_field = Some(name.to_string());
            }
            if password_field.is_none() && matches_any(PASSWORD_FIELD_KEYWORDS) {
                password_field = Some(name.to_string());
            }
        }

        let submit_url = match form.value().attr("action").map(str::trim) {
            Some(action) if !action.is_empty() => {
                page_url.join(action).unwrap_or_else(|_| page_url.clone())
            }
            _ => page_url.clone(),
        };

        Some(Self {
            submit_url,
            method: FormMethod::from_attr(form.value().attr("method")),
            username_field,
            password_field,
        })
    }

    /// Both field names, if both roles were resolved.
    pub fn fields(&self) -> Option<(&str, &str)> {
        match (&self.username_field, &self.password_field) {
            (Some(user), Some(pass)) => Some((user, pass)),
            _ => None,
        }
    }
}

pub fn is_successful_login(body: &str) -> bool {
    let body = body.to_lowercase();
    SUCCESS_MARKERS.iter().any(|m| body.contains(m))
}

/// Trials the built-in credential list against one login surface.
///
/// Every pair is tried and every success is kept; a trial that fails in
/// transport is logged and skipped.
#[derive(Debug, Clone)]
pub struct CredentialProber {
    settings: ClientSettings,
    credentials: Vec<CredentialPair>,
}

impl CredentialProber {
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            settings,
            credentials: CredentialPair::defaults(),
        }
    }

    /// Probe `url`. `path` is the frontier path the page was requested as,
    /// used to re-check basic-auth responses for login likelihood.
    pub async fn probe(&self, url: &Url, path: &str) -> Result<Vec<CredentialPair>, ProbeError> {
        let session = self.settings.session().map_err(ProbeError::Session)?;

        let response = session
            .get(url.clone())
            .header(USER_AGENT, random_user_agent())
            .send()
            .await
            .map_err(|e| ProbeError::FormFetch {
                url: url.to_string(),
                source: FetchError::from_reqwest(url.as_str(), e),
            })?;
        let current_url = response.url().clone();
        let html = response.text().await.map_err(|e| ProbeError::FormFetch {
            url: url.to_string(),
            source: FetchError::from_reqwest(url.as_str(), e),
        })?;

        let form = LoginForm::parse(&html, &current_url);
        let found = match form {
            Some(ref form) => match form.fields() {
                Some((user_field, pass_field)) => {
                    self.try_form(&session, form, user_field, pass_field).await
                }
                None => {
                    debug!("Form at {} has no recognisable credential fields", url);
                    self.try_basic_auth(&session, url, path).await
                }
            },
            None => self.try_basic_auth(&session, url, path).await,
        };

        if !found.is_empty() {
            info!("{} default credential pair(s) accepted at {}", found.len(), url);
        }
        Ok(found)
    }

    async fn try_form(
        &self,
        session: &Client,
        form: &LoginForm,
        user_field: &str,
        pass_field: &str,
    ) -> Vec<CredentialPair> {
        let mut found = Vec::new();

        for pair in &self.credentials {
            debug!("Trying {} at {}", pair, form.submit_url);
            let data = [
                (user_field, pair.username.as_str()),
                (pass_field, pair.password.as_str()),
            ];
            let request = match form.method {
                FormMethod::Post => session.post(form.submit_url.clone()).form(&data),
                FormMethod::Get => session.get(form.submit_url.clone()).query(&data),
            };

            let body = match request.header(USER_AGENT, random_user_agent()).send().await {
                Ok(response) => response.text().await,
                Err(e) => Err(e),
            };

            match body {
                Ok(body) if is_successful_login(&body) => found.push(pair.clone()),
                Ok(_) => {}
                Err(e) => warn!(
                    "Login attempt error for {} at {}: {}",
                    pair, form.submit_url, e
                ),
            }
        }

        found
    }

    async fn try_basic_auth(&self, session: &Client, url: &Url, path: &str) -> Vec<CredentialPair> {
        let mut found = Vec::new();

        for pair in &self.credentials {
            debug!("Trying basic auth {} at {}", pair, url);
            let result = session
                .get(url.clone())
                .header(USER_AGENT, random_user_agent())
                .basic_auth(&pair.username, Some(&pair.password))
                .send()
                .await;

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    warn!("Basic auth error for {} at {}: {}", pair, url, e);
                    continue;
                }
            };

            let status = response.status().as_u16();
            match response.text().await {
                // A 200 that re-renders a login page is a challenge, not a success
                Ok(body) if status == 200 && !is_login_page(&body, path) => {
                    found.push(pair.clone())
                }
                Ok(_) => {}
                Err(e) => warn!("Basic auth error for {} at {}: {}", pair, url, e),
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed_port_uri, html};
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_string, header, method, path, query_param},
    };

    fn prober() -> CredentialProber {
        CredentialProber::new(ClientSettings::default())
    }

    #[test]
    fn test_default_credentials_order() {
        let pairs: Vec<String> = CredentialPair::defaults().iter().map(|p| p.to_string()).collect();
        assert_eq!(
            pairs,
            vec!["admin:admin", "admin:password", "root:root", "user:user", "test:test"]
        );
    }

    #[test]
    fn test_form_method_defaults_to_post() {
        assert_eq!(FormMethod::from_attr(None), FormMethod::Post);
        assert_eq!(FormMethod::from_attr(Some("POST")), FormMethod::Post);
        assert_eq!(FormMethod::from_attr(Some("get")), FormMethod::Get);
        assert_eq!(FormMethod::from_attr(Some("dialog")), FormMethod::Get);
    }

    #[test]
    fn test_parse_login_form_fields_and_action() {
        let page = Url::parse("http://example.test/admin/").unwrap();
        let form = LoginForm::parse(
            r#"<form action="session" method="get">
                <input name="Email">
                <input name="user_password" type="password">
                <input name="username">
            </form>"#,
            &page,
        )
        .unwrap();

        assert_eq!(form.submit_url.as_str(), "http://example.test/admin/session");
        assert_eq!(form.method, FormMethod::Get);
        assert_eq!(form.username_field.as_deref(), Some("Email"));
        // "user_password" matches the username keywords too, but Email came first
        assert_eq!(form.password_field.as_deref(), Some("user_password"));
        assert_eq!(form.fields(), Some(("Email", "user_password")));
    }

    #[test]
    fn test_parse_login_form_without_action_resubmits_to_page() {
        let page = Url::parse("http://example.test/login").unwrap();
        let form = LoginForm::parse(r#"<form><input name="uname"><input name="pwd"></form>"#, &page)
            .unwrap();

        assert_eq!(form.submit_url, page);
        assert_eq!(form.method, FormMethod::Post);
        assert_eq!(form.fields(), None);
    }

    #[test]
    fn test_parse_page_without_form() {
        let page = Url::parse("http://example.test/").unwrap();
        assert_eq!(LoginForm::parse("<p>no form</p>", &page), None);
    }

    #[test]
    fn test_success_markers() {
        assert!(is_successful_login("<a href=/logout>Log out</a>"));
        assert!(is_successful_login("Welcome to your DASHBOARD"));
        assert!(!is_successful_login("Invalid credentials"));
    }

    #[tokio::test]
    async fn test_form_probe_collects_every_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(html(
                r#"<form method="post" action="/session">
                    <input name="username"><input name="password" type="password">
                </form>"#,
            ))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .and(body_string("username=admin&password=admin"))
            .respond_with(html("<h1>Dashboard</h1>"))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .and(body_string("username=root&password=root"))
            .respond_with(html("<a>logout</a>"))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(html("Invalid credentials"))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/login", mock_server.uri())).unwrap();
        let found = prober().probe(&url, "login").await.unwrap();

        assert_eq!(
            found,
            vec![CredentialPair::new("admin", "admin"), CredentialPair::new("root", "root")]
        );
    }

    #[tokio::test]
    async fn test_get_form_submits_query_parameters() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .and(query_param("user", "test"))
            .and(query_param("pass", "test"))
            .respond_with(html("dashboard"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(html(
                r#"<form method="GET"><input name="user"><input name="pass"></form>"#,
            ))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/login", mock_server.uri())).unwrap();
        let found = prober().probe(&url, "login").await.unwrap();

        assert_eq!(found, vec![CredentialPair::new("test", "test")]);
    }

    #[tokio::test]
    async fn test_unresolved_fields_fall_back_to_basic_auth() {
        let mock_server = MockServer::start().await;
        // admin:admin
        Mock::given(method("GET"))
            .and(path("/panel"))
            .and(header("authorization", "Basic YWRtaW46YWRtaW4="))
            .respond_with(html("<h1>Control panel</h1>"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/panel"))
            .respond_with(html(
                r#"<h1>Login</h1><form><input name="uname"><input name="pwd"></form>"#,
            ))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/panel", mock_server.uri())).unwrap();
        let found = prober().probe(&url, "panel").await.unwrap();

        assert_eq!(found, vec![CredentialPair::new("admin", "admin")]);
    }

    #[tokio::test]
    async fn test_basic_auth_rejects_rerendered_login_page() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/secure"))
            .respond_with(html("<p>Please enter your password</p>"))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/secure", mock_server.uri())).unwrap();
        let found = prober().probe(&url, "secure").await.unwrap();

        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_basic_auth_requires_status_200() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/private"))
            .respond_with(ResponseTemplate::new(401).set_body_string("nope"))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/private", mock_server.uri())).unwrap();
        let found = prober().probe(&url, "private").await.unwrap();

        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_form_page_is_probe_error() {
        let url = Url::parse(&format!("{}/login", closed_port_uri())).unwrap();

        let err = prober().probe(&url, "login").await.unwrap_err();
        assert!(matches!(err, ProbeError::FormFetch { .. }));
    }

    #[tokio::test]
    async fn test_failed_trial_does_not_stop_the_rest() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(html(
                r#"<form method="post" action="/session">
                    <input name="username"><input name="password" type="password">
                </form>"#,
            ))
            .mount(&mock_server)
            .await;
        // The first pair times out, the third one logs in
        Mock::given(method("POST"))
            .and(path("/session"))
            .and(body_string("username=admin&password=admin"))
            .respond_with(html("<h1>Dashboard</h1>").set_delay(Duration::from_secs(3)))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .and(body_string("username=root&password=root"))
            .respond_with(html("<a>logout</a>"))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(html("Invalid credentials"))
            .mount(&mock_server)
            .await;

        let settings = ClientSettings {
            timeout: Duration::from_millis(500),
            proxy: None,
        };
        let url = Url::parse(&format!("{}/login", mock_server.uri())).unwrap();
        let found = CredentialProber::new(settings).probe(&url, "login").await.unwrap();

        assert_eq!(found, vec![CredentialPair::new("root", "root")]);
    }

    #[tokio::test]
    async fn test_unreachable_form_action_yields_no_credentials() {
        let mock_server = MockServer::start().await;
        let dead_action = format!("{}/session", closed_port_uri());
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(html(&format!(
                r#"<form method="post" action="{}">
                    <input name="username"><input name="password" type="password">
                </form>"#,
                dead_action
            )))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/login", mock_server.uri())).unwrap();
        let found = prober().probe(&url, "login").await.unwrap();

        assert!(found.is_empty());
    }
}
