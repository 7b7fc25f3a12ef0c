mod client;
mod types;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::traits::QueryWriter;
use client::ClaudeClient;
use types::{ChatMessage, ChatRequest};

/// Fast, cheap model; query writing is a short structured task.
const QUERY_MODEL: &str = "claude-haiku-4-5-20251001";
const MAX_TOKENS: u32 = 1024;

/// Claude-backed query writer. One chat turn per call; the response is
/// parsed as one query per line.
pub struct Claude {
    client: ClaudeClient,
    model: String,
}

impl Claude {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: ClaudeClient::new(api_key),
            model: QUERY_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

#[async_trait]
impl QueryWriter for Claude {
    async fn generate(
        &self,
        prompt: &str,
        max_results: usize,
        timeout: Duration,
    ) -> Result<Vec<String>> {
        let request = ChatRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: Some(
                "You write web search queries. Respond with one query per line, \
                 no numbering, no commentary."
                    .to_string(),
            ),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
        };

        let response = tokio::time::timeout(timeout, self.client.chat(&request))
            .await
            .context("LLM call timed out")??;

        let lines: Vec<String> = response
            .text()
            .lines()
            .map(|l| l.trim().trim_start_matches(&['-', '*', ' '][..]).to_string())
            .filter(|l| !l.is_empty())
            .take(max_results)
            .collect();

        debug!(requested = max_results, returned = lines.len(), "Claude query generation");
        Ok(lines)
    }
}
