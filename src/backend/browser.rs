//! Browser sessions keyed by an opaque label.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::Mutex;

use crate::error::{Result, TillerError};
use crate::provider::http::shared_client;
use crate::util::timeout::with_timeout;

/// Page text returned by `get_content` is cut at this many characters.
pub const MAX_CONTENT_CHARS: usize = 5_000;

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

fn window_not_found() -> TillerError {
    TillerError::backend("Window not found")
}

/// A browser that can open pages and act on elements by CSS selector.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Open `url` in a new session and return its label.
    async fn spawn(&self, url: &str) -> Result<String>;
    async fn execute(&self, label: &str, script: &str) -> Result<()>;
    async fn click(&self, label: &str, selector: &str) -> Result<()>;
    async fn type_text(&self, label: &str, selector: &str, text: &str) -> Result<()>;
    async fn scroll(&self, label: &str, selector: &str) -> Result<()>;
    async fn hover(&self, label: &str, selector: &str) -> Result<()>;
    /// Visible page text, at most [`MAX_CONTENT_CHARS`] characters.
    async fn get_content(&self, label: &str) -> Result<String>;
    async fn close(&self, label: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
struct Page {
    url: String,
    html: String,
    inputs: HashMap<String, String>,
}

/// Script-less browser that fetches pages over HTTP.
///
/// Element actions check that the selector matches something in the fetched
/// markup; typed values are remembered per selector. Scripts are rejected.
#[derive(Debug, Clone, Default)]
pub struct FetchBrowser {
    pages: Arc<Mutex<HashMap<String, Page>>>,
}

impl FetchBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    async fn with_element<T>(
        &self,
        label: &str,
        selector: &str,
        act: impl FnOnce(&mut Page) -> T + Send,
    ) -> Result<T> {
        let mut pages = self.pages.lock().await;
        let page = pages.get_mut(label).ok_or_else(window_not_found)?;
        if !selector_matches(&page.html, selector) {
            return Err(TillerError::backend(format!(
                "Element not found: {selector} on {}",
                page.url
            )));
        }
        Ok(act(page))
    }

    /// Value typed into `selector` on the page, if any.
    pub async fn typed_value(&self, label: &str, selector: &str) -> Option<String> {
        self.pages
            .lock()
            .await
            .get(label)
            .and_then(|p| p.inputs.get(selector).cloned())
    }
}

#[async_trait]
impl BrowserDriver for FetchBrowser {
    async fn spawn(&self, url: &str) -> Result<String> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| TillerError::backend(format!("invalid url '{url}': {e}")))?;
        let html = with_timeout(PAGE_LOAD_TIMEOUT, async {
            let resp = shared_client().get(parsed.clone()).send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(TillerError::backend(format!(
                    "{url} responded with status {}",
                    status.as_u16()
                )));
            }
            Ok(resp.text().await?)
        })
        .await?;

        let label = format!("agent-{}", uuid::Uuid::new_v4());
        self.pages.lock().await.insert(
            label.clone(),
            Page {
                url: parsed.to_string(),
                html,
                inputs: HashMap::new(),
            },
        );
        tracing::debug!(%label, url, "opened browser session");
        Ok(label)
    }

    async fn execute(&self, label: &str, _script: &str) -> Result<()> {
        if !self.pages.lock().await.contains_key(label) {
            return Err(window_not_found());
        }
        Err(TillerError::backend(
            "this browser cannot run scripts; use click/type/read instead",
        ))
    }

    async fn click(&self, label: &str, selector: &str) -> Result<()> {
        self.with_element(label, selector, |_| ()).await
    }

    async fn type_text(&self, label: &str, selector: &str, text: &str) -> Result<()> {
        let text = text.to_string();
        self.with_element(label, selector, move |page| {
            page.inputs.insert(selector.to_string(), text);
        })
        .await
    }

    async fn scroll(&self, label: &str, selector: &str) -> Result<()> {
        self.with_element(label, selector, |_| ()).await
    }

    async fn hover(&self, label: &str, selector: &str) -> Result<()> {
        self.with_element(label, selector, |_| ()).await
    }

    async fn get_content(&self, label: &str) -> Result<String> {
        let pages = self.pages.lock().await;
        let page = pages.get(label).ok_or_else(window_not_found)?;
        Ok(page_text(&page.html).chars().take(MAX_CONTENT_CHARS).collect())
    }

    async fn close(&self, label: &str) -> Result<()> {
        self.pages
            .lock()
            .await
            .remove(label)
            .map(|_| ())
            .ok_or_else(window_not_found)
    }
}

static HIDDEN_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript|template)\b.*?</(?:script|style|noscript|template)\s*>")
        .expect("hidden block regex must compile")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex must compile"));
static WS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex must compile"));
static OPEN_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([a-zA-Z][\w-]*)((?:[^>'\x22]|'[^']*'|\x22[^\x22]*\x22)*)>")
        .expect("open tag regex must compile")
});
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([\w:-]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+)))?"#)
        .expect("attribute regex must compile")
});
static SIMPLE_SELECTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z][\w-]*|\*)?((?:[#.][\w-]+)*)((?:\[[^\]]+\])*)$")
        .expect("selector regex must compile")
});
static SELECTOR_PART_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([#.])([\w-]+)").expect("selector part regex must compile"));
static SELECTOR_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[\s*([\w:-]+)\s*(?:=\s*["']?([^"'\]]*)["']?\s*)?\]"#)
        .expect("selector attribute regex must compile")
});

/// Visible text of an HTML document, whitespace collapsed to single spaces.
pub fn page_text(html: &str) -> String {
    let without_hidden = HIDDEN_BLOCK_RE.replace_all(html, " ");
    let without_tags = TAG_RE.replace_all(&without_hidden, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    WS_RE.replace_all(&decoded, " ").trim().to_string()
}

/// Whether a CSS selector plausibly matches an element in `html`.
///
/// Supports `tag`, `#id`, `.class`, `[attr]`, `[attr=value]` and compounds
/// of those. For descendant or child selectors only the last compound is
/// checked; selector lists match if any entry does.
pub fn selector_matches(html: &str, selector: &str) -> bool {
    selector.split(',').any(|alternative| {
        let Some(last) = alternative
            .split(|c: char| c.is_whitespace() || c == '>' || c == '+' || c == '~')
            .filter(|s| !s.is_empty())
            .last()
        else {
            return false;
        };
        let last = last.split(':').next().unwrap_or(last);
        compound_matches(html, last)
    })
}

fn compound_matches(html: &str, compound: &str) -> bool {
    let Some(caps) = SIMPLE_SELECTOR_RE.captures(compound) else {
        return false;
    };
    let tag = caps
        .get(1)
        .map(|m| m.as_str())
        .filter(|t| *t != "*")
        .map(str::to_ascii_lowercase);
    let mut ids = Vec::new();
    let mut classes = Vec::new();
    for part in SELECTOR_PART_RE.captures_iter(caps.get(2).map_or("", |m| m.as_str())) {
        match &part[1] {
            "#" => ids.push(part[2].to_string()),
            _ => classes.push(part[2].to_string()),
        }
    }
    let wanted_attrs: Vec<(String, Option<String>)> = SELECTOR_ATTR_RE
        .captures_iter(caps.get(3).map_or("", |m| m.as_str()))
        .map(|c| (c[1].to_ascii_lowercase(), c.get(2).map(|v| v.as_str().to_string())))
        .collect();

    OPEN_TAG_RE.captures_iter(html).any(|el| {
        if let Some(tag) = &tag {
            if !el[1].eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        let attrs: HashMap<String, String> = ATTR_RE
            .captures_iter(&el[2])
            .map(|a| {
                let value = a
                    .get(2)
                    .or_else(|| a.get(3))
                    .or_else(|| a.get(4))
                    .map_or("", |m| m.as_str());
                (a[1].to_ascii_lowercase(), value.to_string())
            })
            .collect();

        let id_ok = ids
            .iter()
            .all(|id| attrs.get("id").is_some_and(|v| v == id));
        let class_ok = classes.iter().all(|class| {
            attrs
                .get("class")
                .is_some_and(|v| v.split_whitespace().any(|c| c == class))
        });
        let attr_ok = wanted_attrs.iter().all(|(name, value)| match value {
            Some(value) => attrs.get(name).is_some_and(|v| v == value),
            None => attrs.contains_key(name),
        });
        id_ok && class_ok && attr_ok
    })
}
