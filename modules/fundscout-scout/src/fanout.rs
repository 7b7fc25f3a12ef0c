//! SearchFanout — concurrent query dispatch across the configured backends.
//!
//! Concurrency is bounded twice: a semaphore per backend (rate limits) and
//! an overall `buffer_unordered` cap. Results stream into a bounded channel;
//! if the pipeline slows down, the fan-out blocks on send and backpressure
//! propagates naturally. Failures never cross the channel: transient errors
//! are retried per query, then counted and dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use rand::Rng;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, warn};

use fundscout_common::{DiscoveryConfig, QueryRequest, SearchBackendKind, SearchResult};
use fundscout_search::SearchBackend;

use crate::session::SessionControl;

/// Attempts per query before the failure is recorded and the query dropped.
const QUERY_MAX_ATTEMPTS: u32 = 3;
/// Base backoff between query retries. Actual delay is base * 2^attempt
/// plus jitter.
const QUERY_RETRY_BASE: Duration = Duration::from_millis(500);

/// One unit of fan-out work: a concrete query string plus the request it
/// was generated from.
#[derive(Debug, Clone)]
pub struct QueryJob {
    pub request: Arc<QueryRequest>,
    pub query: String,
}

/// One unit of pipeline work: a normalized result plus its originating
/// request (the judge needs the request for alignment).
#[derive(Debug, Clone)]
pub struct FanoutItem {
    pub result: SearchResult,
    pub request: Arc<QueryRequest>,
}

/// Per-backend health accounting for the run summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackendHealth {
    pub queries_succeeded: u32,
    pub queries_failed: u32,
    pub queries_timed_out: u32,
}

#[derive(Debug, Default)]
pub struct FanoutStats {
    pub per_backend: HashMap<SearchBackendKind, BackendHealth>,
}

impl std::fmt::Display for FanoutStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.per_backend.keys().collect();
        kinds.sort();
        for kind in kinds {
            let health = &self.per_backend[kind];
            writeln!(
                f,
                "{}: {} ok, {} failed, {} timed out",
                kind.label(),
                health.queries_succeeded,
                health.queries_failed,
                health.queries_timed_out
            )?;
        }
        Ok(())
    }
}

pub struct SearchFanout {
    backends: HashMap<SearchBackendKind, Arc<dyn SearchBackend>>,
    semaphores: HashMap<SearchBackendKind, Arc<Semaphore>>,
    per_query_timeout: Duration,
    overall_concurrency: usize,
    results_per_query: usize,
}

impl SearchFanout {
    pub fn new(backends: Vec<Arc<dyn SearchBackend>>, config: &DiscoveryConfig) -> Self {
        let mut backend_map = HashMap::new();
        let mut semaphores = HashMap::new();
        for backend in backends {
            let kind = backend.kind();
            semaphores.insert(kind, Arc::new(Semaphore::new(config.backend_concurrency(kind))));
            backend_map.insert(kind, backend);
        }
        Self {
            backends: backend_map,
            semaphores,
            per_query_timeout: config.per_query_timeout,
            overall_concurrency: config.fanout_concurrency,
            results_per_query: config.results_per_query,
        }
    }

    /// Run every job, streaming results into `tx`. The sender is dropped on
    /// return, which closes the pipeline's input. Results carry no global
    /// order; the pipeline is order-insensitive.
    pub async fn execute(
        &self,
        jobs: Vec<QueryJob>,
        tx: mpsc::Sender<FanoutItem>,
        control: &SessionControl,
    ) -> FanoutStats {
        let stats = Mutex::new(FanoutStats::default());

        stream::iter(jobs)
            .map(|job| self.run_query(job, &tx, &stats, control))
            .buffer_unordered(self.overall_concurrency)
            .collect::<Vec<()>>()
            .await;

        stats.into_inner().unwrap()
    }

    async fn run_query(
        &self,
        job: QueryJob,
        tx: &mpsc::Sender<FanoutItem>,
        stats: &Mutex<FanoutStats>,
        control: &SessionControl,
    ) {
        let kind = job.request.backend;
        if control.should_stop(chrono::Utc::now()) {
            return;
        }

        let backend = match self.backends.get(&kind) {
            Some(b) => b,
            None => {
                // Backend not configured or fully down: degraded, not fatal.
                warn!(backend = kind.label(), query = %job.query, "No backend available, skipping query");
                record(stats, kind, |h| h.queries_failed += 1);
                return;
            }
        };

        let semaphore = &self.semaphores[&kind];
        let _permit = semaphore.acquire().await.expect("semaphore never closed");

        let mut attempt = 0u32;
        loop {
            match tokio::time::timeout(
                self.per_query_timeout,
                backend.search(&job.query, self.results_per_query),
            )
            .await
            {
                Ok(Ok(results)) => {
                    debug!(backend = kind.label(), query = %job.query, results = results.len(), "Query complete");
                    record(stats, kind, |h| h.queries_succeeded += 1);
                    for result in results {
                        if result.url.is_empty() {
                            continue;
                        }
                        let item = FanoutItem {
                            result,
                            request: Arc::clone(&job.request),
                        };
                        if tx.send(item).await.is_err() {
                            // Pipeline gone; nothing left to feed.
                            return;
                        }
                    }
                    return;
                }
                Ok(Err(e)) if e.is_transient() && attempt + 1 < QUERY_MAX_ATTEMPTS => {
                    let backoff = QUERY_RETRY_BASE * 2u32.pow(attempt);
                    let jitter = Duration::from_millis(rand::rng().random_range(0..250));
                    warn!(
                        backend = kind.label(),
                        query = %job.query,
                        attempt = attempt + 1,
                        error = %e,
                        "Transient search error, retrying after backoff"
                    );
                    tokio::time::sleep(backoff + jitter).await;
                    attempt += 1;
                }
                Ok(Err(e)) => {
                    warn!(backend = kind.label(), query = %job.query, error = %e, "Search failed");
                    record(stats, kind, |h| h.queries_failed += 1);
                    return;
                }
                Err(_) => {
                    warn!(
                        backend = kind.label(),
                        query = %job.query,
                        timeout_s = self.per_query_timeout.as_secs(),
                        "Search timed out"
                    );
                    record(stats, kind, |h| h.queries_timed_out += 1);
                    return;
                }
            }
        }
    }
}

fn record(stats: &Mutex<FanoutStats>, kind: SearchBackendKind, update: impl FnOnce(&mut BackendHealth)) {
    let mut stats = stats.lock().unwrap();
    update(stats.per_backend.entry(kind).or_default());
}

#[cfg(test)]
mod tests {
    use super::*;

    use fundscout_common::{Country, FundingCategory, GeoScope};

    use crate::testing::MockBackend;

    fn request(backend: SearchBackendKind) -> Arc<QueryRequest> {
        Arc::new(
            QueryRequest::builder()
                .category(FundingCategory::Scholarships)
                .geographic_scope(GeoScope::Country(Country::Bulgaria))
                .backend(backend)
                .build(),
        )
    }

    fn config() -> DiscoveryConfig {
        DiscoveryConfig {
            per_query_timeout: Duration::from_millis(200),
            ..DiscoveryConfig::default()
        }
    }

    #[tokio::test]
    async fn results_flow_through_the_channel() {
        let backend = MockBackend::new(SearchBackendKind::Serper)
            .with_results("q1", vec!["https://a.org/x", "https://b.org/y"]);
        let fanout = SearchFanout::new(vec![Arc::new(backend)], &config());
        let control = SessionControl::new();

        let (tx, mut rx) = mpsc::channel(16);
        let jobs = vec![QueryJob {
            request: request(SearchBackendKind::Serper),
            query: "q1".to_string(),
        }];
        let stats = fanout.execute(jobs, tx, &control).await;

        let mut urls = Vec::new();
        while let Some(item) = rx.recv().await {
            urls.push(item.result.url);
        }
        urls.sort();
        assert_eq!(urls, vec!["https://a.org/x", "https://b.org/y"]);
        assert_eq!(
            stats.per_backend[&SearchBackendKind::Serper].queries_succeeded,
            1
        );
    }

    #[tokio::test]
    async fn failures_are_counted_not_propagated() {
        let backend = MockBackend::new(SearchBackendKind::Serper).failing_with_status(400);
        let fanout = SearchFanout::new(vec![Arc::new(backend)], &config());
        let control = SessionControl::new();

        let (tx, mut rx) = mpsc::channel(16);
        let jobs = vec![QueryJob {
            request: request(SearchBackendKind::Serper),
            query: "broken".to_string(),
        }];
        let stats = fanout.execute(jobs, tx, &control).await;

        assert!(rx.recv().await.is_none(), "no results on failure");
        assert_eq!(stats.per_backend[&SearchBackendKind::Serper].queries_failed, 1);
    }

    #[tokio::test]
    async fn transient_errors_are_retried_to_success() {
        let backend = MockBackend::new(SearchBackendKind::Serper)
            .with_results("flaky", vec!["https://works-eventually.org/"])
            .failing_first(2);
        let fanout = SearchFanout::new(vec![Arc::new(backend)], &config());
        let control = SessionControl::new();

        let (tx, mut rx) = mpsc::channel(16);
        let jobs = vec![QueryJob {
            request: request(SearchBackendKind::Serper),
            query: "flaky".to_string(),
        }];
        let stats = fanout.execute(jobs, tx, &control).await;

        assert!(rx.recv().await.is_some(), "retry must eventually deliver");
        assert_eq!(
            stats.per_backend[&SearchBackendKind::Serper].queries_succeeded,
            1
        );
    }

    #[tokio::test]
    async fn unconfigured_backend_degrades_gracefully() {
        // Only Serper is wired; a Tavily job has nowhere to go.
        let backend = MockBackend::new(SearchBackendKind::Serper);
        let fanout = SearchFanout::new(vec![Arc::new(backend)], &config());
        let control = SessionControl::new();

        let (tx, mut rx) = mpsc::channel(16);
        let jobs = vec![QueryJob {
            request: request(SearchBackendKind::Tavily),
            query: "nowhere".to_string(),
        }];
        let stats = fanout.execute(jobs, tx, &control).await;

        assert!(rx.recv().await.is_none());
        assert_eq!(stats.per_backend[&SearchBackendKind::Tavily].queries_failed, 1);
    }
}
