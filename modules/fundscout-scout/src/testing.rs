//! Test doubles for deterministic pipeline tests: no network, no database,
//! no Docker.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use ai_client::QueryWriter;
use fundscout_common::{Confidence, QueryRequest, SearchBackendKind, SearchResult};
use fundscout_search::{SearchBackend, SearchError};

use crate::judge::Judge;

/// Scripted search backend: canned results per query, optional scripted
/// failures.
pub struct MockBackend {
    kind: SearchBackendKind,
    results: HashMap<String, Vec<SearchResult>>,
    permanent_status: Option<u16>,
    transient_failures: AtomicU32,
}

impl MockBackend {
    pub fn new(kind: SearchBackendKind) -> Self {
        Self {
            kind,
            results: HashMap::new(),
            permanent_status: None,
            transient_failures: AtomicU32::new(0),
        }
    }

    /// Script bare-URL results for a query; metadata left empty.
    pub fn with_results(mut self, query: &str, urls: Vec<&str>) -> Self {
        let results = urls
            .into_iter()
            .enumerate()
            .map(|(i, url)| SearchResult {
                url: url.to_string(),
                title: None,
                description: None,
                backend: self.kind,
                query: query.to_string(),
                position: i + 1,
            })
            .collect();
        self.results.insert(query.to_string(), results);
        self
    }

    /// Script one full result (with metadata) for a query.
    pub fn with_result(mut self, query: &str, result: SearchResult) -> Self {
        self.results.entry(query.to_string()).or_default().push(result);
        self
    }

    /// Every call fails with this API status.
    pub fn failing_with_status(mut self, status: u16) -> Self {
        self.permanent_status = Some(status);
        self
    }

    /// The first `n` calls fail transiently (503), later calls succeed.
    pub fn failing_first(self, n: u32) -> Self {
        self.transient_failures.store(n, Ordering::Relaxed);
        self
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    fn kind(&self) -> SearchBackendKind {
        self.kind
    }

    async fn search(
        &self,
        query: &str,
        _max_results: usize,
    ) -> fundscout_search::Result<Vec<SearchResult>> {
        if self
            .transient_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(SearchError::Api {
                status: 503,
                message: "scripted transient failure".to_string(),
            });
        }
        if let Some(status) = self.permanent_status {
            return Err(SearchError::Api {
                status,
                message: "scripted failure".to_string(),
            });
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

/// Scripted LLM: fixed lines or guaranteed failure.
pub struct MockQueryWriter {
    lines: Vec<String>,
    fail: bool,
}

impl MockQueryWriter {
    pub fn returning(lines: Vec<String>) -> Self {
        Self { lines, fail: false }
    }

    pub fn failing() -> Self {
        Self {
            lines: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl QueryWriter for MockQueryWriter {
    async fn generate(
        &self,
        _prompt: &str,
        max_results: usize,
        _timeout: Duration,
    ) -> Result<Vec<String>> {
        if self.fail {
            return Err(anyhow!("scripted LLM failure"));
        }
        Ok(self.lines.iter().take(max_results).cloned().collect())
    }
}

/// Wraps a judge and counts scoring calls, so tests can prove the spam
/// gate and blacklist check short-circuit before any scoring.
pub struct CountingJudge {
    inner: Arc<dyn Judge>,
    score_calls: AtomicU32,
}

impl CountingJudge {
    pub fn new(inner: Arc<dyn Judge>) -> Self {
        Self {
            inner,
            score_calls: AtomicU32::new(0),
        }
    }

    pub fn score_calls(&self) -> u32 {
        self.score_calls.load(Ordering::Relaxed)
    }
}

impl Judge for CountingJudge {
    fn is_spam_tld(&self, host: &str) -> bool {
        self.inner.is_spam_tld(host)
    }

    fn score(&self, result: &SearchResult, request: &QueryRequest) -> Confidence {
        self.score_calls.fetch_add(1, Ordering::Relaxed);
        self.inner.score(result, request)
    }
}

/// A judge returning a fixed score, for threshold tests.
pub struct FixedJudge {
    score: Confidence,
    spam_tlds: std::collections::BTreeSet<String>,
}

impl FixedJudge {
    pub fn new(score: Confidence) -> Self {
        Self {
            score,
            spam_tlds: fundscout_common::spam_tld_set(&[".xyz"]),
        }
    }
}

impl Judge for FixedJudge {
    fn is_spam_tld(&self, host: &str) -> bool {
        crate::judge::credibility::is_spam_tld(host, &self.spam_tlds)
    }

    fn score(&self, _result: &SearchResult, _request: &QueryRequest) -> Confidence {
        self.score
    }
}

/// Shorthand for a full search result in tests.
pub fn search_result(url: &str, title: &str, description: &str) -> SearchResult {
    SearchResult {
        url: url.to_string(),
        title: (!title.is_empty()).then(|| title.to_string()),
        description: (!description.is_empty()).then(|| description.to_string()),
        backend: SearchBackendKind::Serper,
        query: "test query".to_string(),
        position: 1,
    }
}
