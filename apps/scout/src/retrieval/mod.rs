//! External Retrieval Adapter: search/scrape capability the generation step may
//! invoke while composing an answer.
//!
//! Retrieval is best-effort: every failure is logged as "retrieval degraded" and
//! replaced by a fixed "no additional context" result. It never aborts a stage.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::{ToolCall, ToolSpec};
use crate::rate_limit::RequestThrottle;

pub mod scrape;
pub mod serper;

pub use scrape::PageScraper;
pub use serper::SerperSearch;

pub const SEARCH_TOOL: &str = "web_search";
pub const SCRAPE_TOOL: &str = "scrape_page";

/// Returned to the model in place of a failed search/scrape.
pub const NO_ADDITIONAL_CONTEXT: &str =
    "No additional context is available for this request. Continue with the information you already have.";

const DEFAULT_MAX_RESULTS: usize = 8;
const DEFAULT_MAX_PAGE_CHARS: usize = 6_000;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Query must not be empty")]
    EmptyQuery,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    #[error("Invalid tool input: {0}")]
    InvalidInput(String),
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// The external retrieval backend seam.
#[async_trait]
pub trait RetrievalBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, RetrievalError>;
    async fn scrape(&self, url: &str) -> Result<String, RetrievalError>;
}

/// Production backend: Serper search plus direct page scraping.
pub struct WebRetrieval {
    search: SerperSearch,
    scraper: PageScraper,
}

impl WebRetrieval {
    pub fn new(search: SerperSearch, scraper: PageScraper) -> Self {
        Self { search, scraper }
    }
}

#[async_trait]
impl RetrievalBackend for WebRetrieval {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, RetrievalError> {
        self.search.search(query).await
    }

    async fn scrape(&self, url: &str) -> Result<String, RetrievalError> {
        self.scraper.page_text(url).await
    }
}

/// Wraps a backend with throttling, input checks and the degradation policy.
pub struct Retriever {
    backend: Arc<dyn RetrievalBackend>,
    throttle: Option<Arc<RequestThrottle>>,
    max_results: usize,
    max_page_chars: usize,
}

impl Retriever {
    pub fn new(backend: Arc<dyn RetrievalBackend>) -> Self {
        Self {
            backend,
            throttle: None,
            max_results: DEFAULT_MAX_RESULTS,
            max_page_chars: DEFAULT_MAX_PAGE_CHARS,
        }
    }

    pub fn with_throttle(mut self, throttle: Arc<RequestThrottle>) -> Self {
        self.throttle = Some(throttle);
        self
    }

    /// Tool definitions exposed to the model.
    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: SEARCH_TOOL,
                description: "Search the web. Returns ranked results with title, url and snippet.",
                input_schema: json!({
                    "type": "object",
                    "properties": { "query": { "type": "string", "description": "Search query" } },
                    "required": ["query"]
                }),
            },
            ToolSpec {
                name: SCRAPE_TOOL,
                description: "Fetch a web page (e.g. a job posting) and return its visible text.",
                input_schema: json!({
                    "type": "object",
                    "properties": { "url": { "type": "string", "description": "Absolute URL" } },
                    "required": ["url"]
                }),
            },
        ]
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, RetrievalError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RetrievalError::EmptyQuery);
        }
        self.wait_turn().await;
        let mut hits = self.backend.search(query).await?;
        hits.truncate(self.max_results);
        Ok(hits)
    }

    pub async fn scrape(&self, url: &str) -> Result<String, RetrievalError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(RetrievalError::EmptyQuery);
        }
        self.wait_turn().await;
        let text = self.backend.scrape(url).await?;
        Ok(truncate_chars(&text, self.max_page_chars))
    }

    /// Executes a model tool call. Never fails: errors degrade to
    /// [`NO_ADDITIONAL_CONTEXT`].
    pub async fn execute(&self, call: &ToolCall) -> String {
        match self.try_execute(call).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Retrieval degraded ({} {}): {e}", call.name, call.input);
                NO_ADDITIONAL_CONTEXT.to_string()
            }
        }
    }

    async fn try_execute(&self, call: &ToolCall) -> Result<String, RetrievalError> {
        match call.name.as_str() {
            SEARCH_TOOL => {
                let query = string_arg(&call.input, "query")?;
                let hits = self.search(query).await?;
                debug!("Search '{}' returned {} hits", query, hits.len());
                Ok(format_hits(&hits))
            }
            SCRAPE_TOOL => {
                let url = string_arg(&call.input, "url")?;
                self.scrape(url).await
            }
            other => Err(RetrievalError::UnknownTool(other.to_string())),
        }
    }

    async fn wait_turn(&self) {
        if let Some(throttle) = &self.throttle {
            throttle.acquire().await;
        }
    }
}

fn string_arg<'a>(input: &'a Value, key: &str) -> Result<&'a str, RetrievalError> {
    input
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| RetrievalError::InvalidInput(format!("missing string field '{key}'")))
}

/// Formats ranked hits as numbered plain text for the model.
pub fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No results found.".to_string();
    }
    hits.iter()
        .enumerate()
        .map(|(i, h)| format!("{}. {}\n   {}\n   {}", i + 1, h.title, h.url, h.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingRetrieval, StaticRetrieval};

    fn call(name: &str, input: Value) -> ToolCall {
        ToolCall {
            id: "tu_1".to_string(),
            name: name.to_string(),
            input,
        }
    }

    #[tokio::test]
    async fn test_search_tool_formats_ranked_hits() {
        let retriever = Retriever::new(Arc::new(StaticRetrieval::default()));
        let text = retriever
            .execute(&call(SEARCH_TOOL, json!({"query": "golang jobs"})))
            .await;
        assert!(text.starts_with("1. Backend Engineer (Go)"));
        assert!(text.contains("https://jobs.example.com/1"));
    }

    #[tokio::test]
    async fn test_backend_failure_degrades_to_no_context() {
        let retriever = Retriever::new(Arc::new(FailingRetrieval));
        let text = retriever
            .execute(&call(SEARCH_TOOL, json!({"query": "golang jobs"})))
            .await;
        assert_eq!(text, NO_ADDITIONAL_CONTEXT);
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_and_degrades() {
        let retriever = Retriever::new(Arc::new(StaticRetrieval::default()));
        assert!(matches!(
            retriever.search("   ").await,
            Err(RetrievalError::EmptyQuery)
        ));
        let text = retriever.execute(&call(SEARCH_TOOL, json!({"query": ""}))).await;
        assert_eq!(text, NO_ADDITIONAL_CONTEXT);
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_input_degrade() {
        let retriever = Retriever::new(Arc::new(StaticRetrieval::default()));
        let unknown = retriever.execute(&call("send_email", json!({}))).await;
        assert_eq!(unknown, NO_ADDITIONAL_CONTEXT);
        let bad = retriever.execute(&call(SCRAPE_TOOL, json!({"link": 3}))).await;
        assert_eq!(bad, NO_ADDITIONAL_CONTEXT);
    }

    #[tokio::test]
    async fn test_scrape_truncates_long_pages() {
        let backend = StaticRetrieval {
            page: "x".repeat(10_000),
            ..StaticRetrieval::default()
        };
        let retriever = Retriever::new(Arc::new(backend));
        let text = retriever.scrape("https://jobs.example.com/1").await.unwrap();
        assert_eq!(text.chars().count(), DEFAULT_MAX_PAGE_CHARS + 1);
    }

    #[test]
    fn test_tool_specs_names() {
        let retriever = Retriever::new(Arc::new(FailingRetrieval));
        let names: Vec<&str> = retriever.tool_specs().iter().map(|t| t.name).collect();
        assert_eq!(names, vec![SEARCH_TOOL, SCRAPE_TOOL]);
    }

    #[test]
    fn test_format_hits_empty() {
        assert_eq!(format_hits(&[]), "No results found.");
    }
}
