//! Captured page content and the script references discovered in it.

use scraper::{Html, Selector};
use url::Url;

pub mod locator;

pub use locator::locate_scripts;

/// A discovered script resource. The identity key used for de-duplication and
/// session bookkeeping is the absolute URL, or the literal body for inline
/// scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptRef {
    Url(String),
    Inline(String),
}

impl ScriptRef {
    pub fn identity(&self) -> &str {
        match self {
            ScriptRef::Url(url) => url,
            ScriptRef::Inline(text) => text,
        }
    }

    /// Short name shown in progress events: the last path segment of the URL,
    /// or a fixed label for inline bodies.
    pub fn display_name(&self) -> String {
        match self {
            ScriptRef::Url(raw) => Url::parse(raw)
                .ok()
                .and_then(|url| {
                    url.path_segments()
                        .and_then(|mut segments| segments.next_back().map(str::to_string))
                })
                .filter(|segment| !segment.is_empty())
                .unwrap_or_else(|| raw.clone()),
            ScriptRef::Inline(_) => "inline script".to_string(),
        }
    }
}

/// One `<script>` element captured from the page.
#[derive(Debug, Clone)]
pub struct PageScript {
    /// Whether the element carried a `src` attribute at all.
    pub has_src_attr: bool,
    /// The `src` attribute resolved to a valid absolute http(s) URL, if it was one.
    pub src: Option<String>,
    pub text: String,
}

/// A static capture of the inspected page: the raw HTML plus the element data
/// the discovery heuristics and the retrieval fallback chain need.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub url: Url,
    pub html: String,
    pub scripts: Vec<PageScript>,
    pub link_hrefs: Vec<String>,
    pub style_values: Vec<String>,
}

impl PageSnapshot {
    pub fn capture(url: Url, html: String) -> Self {
        let document = Html::parse_document(&html);

        let script_selector = Selector::parse("script").unwrap();
        let link_selector = Selector::parse("link").unwrap();
        let styled_selector = Selector::parse("[style]").unwrap();

        let scripts = document
            .select(&script_selector)
            .map(|element| {
                let src_attr = element.value().attr("src");
                PageScript {
                    has_src_attr: src_attr.is_some(),
                    src: src_attr.and_then(|src| resolve_http_url(&url, src)),
                    text: element.text().collect::<String>(),
                }
            })
            .collect();

        let link_hrefs = document
            .select(&link_selector)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| resolve_http_url(&url, href))
            .collect();

        let style_values = document
            .select(&styled_selector)
            .filter_map(|element| element.value().attr("style"))
            .map(str::to_string)
            .collect();

        Self {
            url,
            html,
            scripts,
            link_hrefs,
            style_values,
        }
    }

    /// Resolve a candidate against the page URL, keeping only absolute http(s)
    /// results. Malformed candidates yield `None` and are dropped silently.
    pub fn resolve(&self, candidate: &str) -> Option<String> {
        resolve_http_url(&self.url, candidate)
    }
}

fn resolve_http_url(base: &Url, candidate: &str) -> Option<String> {
    let resolved = base.join(candidate.trim()).ok()?;

    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}
