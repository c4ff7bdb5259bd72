// Page scraper: fetches a URL and reduces the HTML to visible text.

use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{info, warn};

use super::RetrievalError;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Most specific first; the first selector that yields text wins.
const CONTENT_SELECTORS: &[&str] = &[
    ".jobs-description__container",
    ".jobs-box__html-content",
    "[class*='job-description']",
    "[class*='description']",
    "main",
    "article",
    "body",
];

pub struct PageScraper {
    client: Client,
}

impl PageScraper {
    pub fn new(timeout: Duration) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub async fn page_text(&self, url: &str) -> Result<String, RetrievalError> {
        info!("Fetching page: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Api {
                status: status.as_u16(),
                message: format!("GET {url} failed"),
            });
        }

        let html = response.text().await?;
        let text = extract_visible_text(&html);
        if text.is_empty() {
            warn!("No readable text found at {}", url);
        }
        Ok(text)
    }
}

/// Visible text of the most specific content container, whitespace-collapsed.
pub fn extract_visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = collapse_whitespace(element.text());
            if !text.is_empty() {
                return text;
            }
        }
    }
    String::new()
}

fn collapse_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
