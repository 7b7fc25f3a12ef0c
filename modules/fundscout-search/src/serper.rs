//! Serper — keyword-style Google meta-search.

use async_trait::async_trait;
use tracing::debug;

use fundscout_common::{SearchBackendKind, SearchResult};

use crate::error::{Result, SearchError};
use crate::types::{SerperRequest, SerperResponse};
use crate::SearchBackend;

const SERPER_URL: &str = "https://google.serper.dev/search";

pub struct SerperBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SerperBackend {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: SERPER_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }
}

#[async_trait]
impl SearchBackend for SerperBackend {
    fn kind(&self) -> SearchBackendKind {
        SearchBackendKind::Serper
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        debug!(query, "Serper search");

        let resp = self
            .client
            .post(&self.base_url)
            .header("X-API-KEY", &self.api_key)
            .json(&SerperRequest {
                q: query.to_string(),
                num: max_results,
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

        let body: SerperResponse = resp.json().await?;
        Ok(body
            .organic
            .into_iter()
            .filter(|r| !r.link.is_empty())
            .enumerate()
            .map(|(i, r)| SearchResult {
                url: r.link,
                title: r.title,
                description: r.snippet,
                backend: SearchBackendKind::Serper,
                query: query.to_string(),
                position: i + 1,
            })
            .collect())
    }
}
