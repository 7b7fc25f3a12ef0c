//! Brave — general web meta-search.

use async_trait::async_trait;
use tracing::debug;

use fundscout_common::{SearchBackendKind, SearchResult};

use crate::error::{Result, SearchError};
use crate::types::BraveResponse;
use crate::SearchBackend;

const BRAVE_URL: &str = "https://api.search.brave.com/res/v1/web/search";

pub struct BraveBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl BraveBackend {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: BRAVE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }
}

#[async_trait]
impl SearchBackend for BraveBackend {
    fn kind(&self) -> SearchBackendKind {
        SearchBackendKind::Brave
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        debug!(query, "Brave search");

        let resp = self
            .client
            .get(&self.base_url)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .query(&[("q", query), ("count", &max_results.to_string())])
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

        let body: BraveResponse = resp.json().await?;
        Ok(body
            .web
            .unwrap_or_default()
            .results
            .into_iter()
            .filter(|r| !r.url.is_empty())
            .enumerate()
            .map(|(i, r)| SearchResult {
                url: r.url,
                title: r.title,
                description: r.description,
                backend: SearchBackendKind::Brave,
                query: query.to_string(),
                position: i + 1,
            })
            .collect())
    }
}
