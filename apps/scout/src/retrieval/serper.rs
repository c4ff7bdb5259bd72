// Serper.dev Google search client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{RetrievalError, SearchHit};

pub const SERPER_SEARCH_URL: &str = "https://google.serper.dev/search";
const RESULTS_PER_QUERY: u32 = 10;

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: u32,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    position: Option<u32>,
}

pub struct SerperSearch {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl SerperSearch {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, RetrievalError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            endpoint: SERPER_SEARCH_URL.to_string(),
        })
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, RetrievalError> {
        info!("Searching: {}", query);

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&SerperRequest {
                q: query,
                num: RESULTS_PER_QUERY,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SerperResponse = response.json().await?;
        Ok(into_hits(body))
    }
}

fn into_hits(body: SerperResponse) -> Vec<SearchHit> {
    let mut organic = body.organic;
    organic.sort_by_key(|r| r.position.unwrap_or(u32::MAX));
    organic
        .into_iter()
        .filter(|r| !r.link.is_empty())
        .map(|r| SearchHit {
            title: r.title,
            url: r.link,
            snippet: r.snippet,
        })
        .collect()
}
