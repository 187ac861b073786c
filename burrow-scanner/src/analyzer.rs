// Stateless page classifiers: CMS fingerprint, login likelihood, hidden forms

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Marker substrings and the CMS they identify. Order matters: the first
/// marker found in a body wins.
pub const CMS_SIGNATURES: &[(&str, &str)] = &[
    ("wp-content", "WordPress"),
    ("Joomla!", "Joomla"),
    ("Drupal.settings", "Drupal"),
    ("Magento", "Magento"),
    ("prestashop", "PrestaShop"),
    ("static/shopify.js", "Shopify"),
    ("data-drupal-selector", "Drupal"),
];

pub const LOGIN_PATH_KEYWORDS: &[&str] = &["login", "signin", "admin", "auth", "password"];
pub const LOGIN_BODY_KEYWORDS: &[&str] = &["password", "login"];

static FORM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("form").expect("form selector is valid"));
static HIDDEN_INPUT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"input[type="hidden"]"#).expect("hidden input selector is valid")
});

/// A form carrying at least one hidden input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenForm {
    pub action: Option<String>,
    pub method: String,
    pub hidden_inputs: BTreeMap<String, String>,
}

/// Combined classification of one fetched page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageAnalysis {
    pub cms: Option<&'static str>,
    pub is_login_page: bool,
    pub hidden_forms: Vec<HiddenForm>,
}

pub fn identify_cms(body: &str) -> Option<&'static str> {
    let body = body.to_lowercase();
    CMS_SIGNATURES
        .iter()
        .find(|(marker, _)| body.contains(&marker.to_lowercase()))
        .map(|(_, cms)| *cms)
}

/// Heuristic only: any page mentioning "password" counts.
pub fn is_login_page(body: &str, path: &str) -> bool {
    let path = path.to_lowercase();
    if LOGIN_PATH_KEYWORDS.iter().any(|k| path.contains(k)) {
        return true;
    }
    let body = body.to_lowercase();
    LOGIN_BODY_KEYWORDS.iter().any(|k| body.contains(k))
}

pub fn find_hidden_forms(body: &str) -> Vec<HiddenForm> {
    let document = Html::parse_document(body);
    let mut forms = Vec::new();

    for form in document.select(&FORM_SELECTOR) {
        let inputs: Vec<_> = form.select(&HIDDEN_INPUT_SELECTOR).collect();
        if inputs.is_empty() {
            continue;
        }

        // Nameless inputs share the "" key; a later one overwrites an earlier one
        let hidden_inputs: BTreeMap<String, String> = inputs
            .iter()
            .map(|input| {
                let name = input.value().attr("name").unwrap_or_default();
                let value = input.value().attr("value").unwrap_or_default();
                (name.to_string(), value.to_string())
            })
            .collect();

        forms.push(HiddenForm {
            action: form.value().attr("action").map(String::from),
            method: form
                .value()
                .attr("method")
                .map(|m| m.to_lowercase())
                .unwrap_or_else(|| "get".to_string()),
            hidden_inputs,
        });
    }

    forms
}

/// Run every classifier over a page. Hidden forms are only collected on
/// pages that look like login pages.
pub fn analyze_page(body: &str, path: &str) -> PageAnalysis {
    let is_login_page = is_login_page(body, path);
    PageAnalysis {
        cms: identify_cms(body),
        is_login_page,
        hidden_forms: if is_login_page {
            find_hidden_forms(body)
        } else {
            Vec::new()
        },
    }
}
