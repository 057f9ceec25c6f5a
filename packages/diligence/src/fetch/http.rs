//! HTTP page fetcher.
//!
//! Fetches a page and reduces it to readable text: scripts, styles and
//! page chrome (nav, header, footer) are dropped, tags stripped, common
//! entities decoded and whitespace collapsed.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::text::collapse_whitespace;
use crate::traits::fetcher::{PageFetcher, PageText};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; DiligenceBot/1.0; +https://github.com/minnesota-digital-aid)";

static RE_CHROME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript|nav|header|footer|svg)\b[^>]*>.*?</(script|style|noscript|nav|header|footer|svg)\s*>")
        .expect("chrome regex")
});
static RE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex"));
static RE_BLOCK_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</(p|div|li|tr|h[1-6]|section|article)\s*>|<br\s*/?>").expect("block regex")
});
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag regex"));
static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title regex"));

/// Fetches pages over HTTP(S) and returns cleaned text.
///
/// Wrap in [`ValidatedFetcher`](super::ValidatedFetcher) before handing it
/// URLs from search results.
pub struct HttpPageFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for HttpPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpPageFetcher {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

/// Reduce an HTML document to plain text, one block element per line.
pub fn html_to_text(html: &str) -> String {
    let text = RE_COMMENT.replace_all(html, " ");
    let text = RE_CHROME.replace_all(&text, " ");
    let text = RE_BLOCK_END.replace_all(&text, "\n");
    let text = RE_TAG.replace_all(&text, " ");
    decode_entities(&text)
        .lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contents of the `<title>` element.
pub fn extract_title(html: &str) -> Option<String> {
    RE_TITLE
        .captures(html)
        .map(|c| collapse_whitespace(&decode_entities(&c[1])))
        .filter(|t| !t.is_empty())
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<PageText> {
        debug!(url = %url, "HTTP fetch starting");
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    warn!(url = %url, error = %e, "HTTP request failed");
                    FetchError::Http(Box::new(e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        let text = html_to_text(&html);
        if text.is_empty() {
            return Err(FetchError::Empty {
                url: url.to_string(),
            });
        }

        debug!(url = %url, chars = text.len(), "Page fetched");
        Ok(PageText {
            url: url.to_string(),
            title: extract_title(&html),
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>Leadership &amp; Board</title>
        <style>.x { color: red }</style><script>var a = "<p>no</p>";</script></head>
        <body><header>Site menu</header><nav><a href="/">Home</a></nav>
        <!-- hidden -->
        <h1>Our Leadership</h1><p>Jane Roe, Chief Executive Officer</p>
        <p>John Doe&nbsp;serves as CFO</p>
        <footer>Copyright</footer></body></html>"#;

    #[test]
    fn test_html_to_text_drops_chrome() {
        let text = html_to_text(PAGE);
        assert!(text.contains("Our Leadership"));
        assert!(text.contains("Jane Roe, Chief Executive Officer"));
        assert!(text.contains("John Doe serves as CFO"));
        for gone in ["Site menu", "Home", "Copyright", "color", "var a", "hidden"] {
            assert!(!text.contains(gone), "{} should be stripped", gone);
        }
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title(PAGE).as_deref(), Some("Leadership & Board"));
        assert_eq!(extract_title("<p>none</p>"), None);
    }
}
