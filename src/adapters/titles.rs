//! Best-effort page title lookup for research citations.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

/// Resolves a human-readable title for a URL
#[async_trait]
pub trait TitleFetcher: Send + Sync {
    /// Returns `None` when the title cannot be determined; never fails
    async fn fetch_title(&self, url: &str) -> Option<String>;
}

/// Fetches the page and reads its `<title>` element
pub struct HttpTitleFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTitleFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl TitleFetcher for HttpTitleFetcher {
    async fn fetch_title(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).timeout(self.timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Error fetching title for {}: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("Title lookup for {} returned HTTP {}", url, response.status());
            return None;
        }

        match response.text().await {
            Ok(html) => extract_title(&html),
            Err(e) => {
                warn!("Error reading page body for {}: {}", url, e);
                None
            }
        }
    }
}

/// Pull the text of the first `<title>` element out of an HTML page
pub fn extract_title(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let open = lower.find("<title")?;
    let start = open + lower[open..].find('>')? + 1;
    let end = start + lower[start..].find("</title")?;

    let title = collapse_whitespace(&decode_entities(&html[start..end]));
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title() {
        let html = "<html><head><TITLE lang=\"en\">\n  Rust &amp; Cargo\n  Docs </TITLE></head></html>";
        assert_eq!(extract_title(html), Some("Rust & Cargo Docs".to_string()));
    }

    #[test]
    fn test_missing_or_empty_title() {
        assert_eq!(extract_title("<html><body>no title</body></html>"), None);
        assert_eq!(extract_title("<title>   </title>"), None);
    }
}
