//! Tavily — AI research search; takes natural-language prompts.

use async_trait::async_trait;
use tracing::debug;

use fundscout_common::{SearchBackendKind, SearchResult};

use crate::error::{Result, SearchError};
use crate::types::{TavilyRequest, TavilyResponse};
use crate::SearchBackend;

const TAVILY_URL: &str = "https://api.tavily.com/search";

pub struct TavilyBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TavilyBackend {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: TAVILY_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }
}

#[async_trait]
impl SearchBackend for TavilyBackend {
    fn kind(&self) -> SearchBackendKind {
        SearchBackendKind::Tavily
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        debug!(query, "Tavily search");

        let resp = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&TavilyRequest {
                query: query.to_string(),
                max_results,
                search_depth: "basic",
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: TavilyResponse = resp.json().await?;
        Ok(body
            .results
            .into_iter()
            .filter(|r| !r.url.is_empty())
            .enumerate()
            .map(|(i, r)| SearchResult {
                url: r.url,
                title: r.title,
                description: r.content,
                backend: SearchBackendKind::Tavily,
                query: query.to_string(),
                position: i + 1,
            })
            .collect())
    }
}
