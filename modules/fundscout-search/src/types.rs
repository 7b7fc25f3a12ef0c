//! Wire types for the search backend APIs.

use serde::{Deserialize, Serialize};

// --- Serper (google.serper.dev) ---

#[derive(Debug, Serialize)]
pub struct SerperRequest {
    pub q: String,
    pub num: usize,
}

#[derive(Debug, Deserialize)]
pub struct SerperResponse {
    #[serde(default)]
    pub organic: Vec<SerperOrganicResult>,
}

#[derive(Debug, Deserialize)]
pub struct SerperOrganicResult {
    pub link: String,
    pub title: Option<String>,
    pub snippet: Option<String>,
}

// --- Tavily (api.tavily.com) ---

#[derive(Debug, Serialize)]
pub struct TavilyRequest {
    pub query: String,
    pub max_results: usize,
    /// "basic" keeps latency bounded; "advanced" is for deep research.
    pub search_depth: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct TavilyResponse {
    #[serde(default)]
    pub results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
pub struct TavilyResult {
    pub url: String,
    pub title: Option<String>,
    pub content: Option<String>,
}

// --- Brave (api.search.brave.com) ---

#[derive(Debug, Deserialize)]
pub struct BraveResponse {
    #[serde(default)]
    pub web: Option<BraveWebResults>,
}

#[derive(Debug, Deserialize, Default)]
pub struct BraveWebResults {
    #[serde(default)]
    pub results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
pub struct BraveResult {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
}
