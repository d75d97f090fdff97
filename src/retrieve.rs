//! Script body retrieval with a fallback chain.
//!
//! Each step is attempted only when the previous one fails or comes back
//! empty: a page-like fetch, a lookup among the captured script elements, a
//! bare best-effort fetch, and finally the http downgrade of an https URL.

use std::time::Duration;

use reqwest::header::REFERER;
use thiserror::Error;
use tracing::debug;

use crate::page::PageSnapshot;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("no retrieval method succeeded for {url}")]
    Exhausted { url: String },
}

pub struct Retriever {
    client: reqwest::Client,
    timeout: Duration,
}

impl Default for Retriever {
    fn default() -> Self {
        Self::new()
    }
}

impl Retriever {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: FETCH_TIMEOUT,
        }
    }

    /// Fetch one script body, walking the fallback chain until a step returns
    /// non-empty text.
    pub async fn fetch_script(
        &self,
        url: &str,
        page: &PageSnapshot,
    ) -> Result<String, RetrieveError> {
        // 1. fetch as the page would, carrying its referer
        if let Some(body) = self.fetch_text(url, Some(page.url.as_str())).await {
            return Ok(body);
        }

        // 2. the page may already hold the body in a script element
        if let Some(body) = lookup_in_page(url, page) {
            return Ok(body);
        }

        // 3. bare fetch, best effort
        if let Some(body) = self.fetch_text(url, None).await {
            return Ok(body);
        }

        // 4. http downgrade
        if let Some(downgraded) = url.strip_prefix("https://") {
            let downgraded = format!("http://{downgraded}");
            if let Some(body) = self.fetch_text(&downgraded, None).await {
                return Ok(body);
            }
        }

        Err(RetrieveError::Exhausted {
            url: url.to_string(),
        })
    }

    async fn fetch_text(&self, url: &str, referer: Option<&str>) -> Option<String> {
        let mut request = self.client.get(url);

        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = match tokio::time::timeout(self.timeout, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => {
                debug!(%url, %error, "script fetch failed");
                return None;
            }
            Err(_) => {
                debug!(%url, "script fetch timed out");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(%url, status = %response.status(), "script fetch rejected");
            return None;
        }

        match response.text().await {
            Ok(body) if !body.is_empty() => Some(body),
            Ok(_) => None,
            Err(error) => {
                debug!(%url, %error, "script body read failed");
                None
            }
        }
    }
}

/// Mirror of the probe's element scan: a script whose resolved `src` matches,
/// or an inline script whose text mentions the URL.
fn lookup_in_page(url: &str, page: &PageSnapshot) -> Option<String> {
    for script in &page.scripts {
        if script.src.as_deref() == Some(url) && !script.text.is_empty() {
            return Some(script.text.clone());
        }
    }

    for script in &page.scripts {
        if !script.has_src_attr && script.text.contains(url) {
            return Some(script.text.clone());
        }
    }

    None
}
