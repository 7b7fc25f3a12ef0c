//! CandidatePipeline — the per-result stage machine.
//!
//! Stage order is load-bearing: extract → spam gate → session dedup →
//! blacklist → score → threshold → persist. The spam gate runs before the
//! dedup insert so junk hosts never enter the session's seen-set, and the
//! blacklist read runs before scoring so blacklisted domains are never
//! judged. Every result reaches exactly one terminal outcome; terminal
//! outcomes update the shared statistics and, where a domain row exists,
//! append a processing-log entry.

pub mod stats;

use std::collections::HashSet;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use fundscout_common::{
    normalize_host, CandidateStatus, Confidence, DiscoveryConfig, ProcessingOutcome,
};
use fundscout_events::{CandidateCreated, EventPublisher};
use fundscout_registry::{
    CandidateStore, CheckResult, Domain, DomainRegistry, NewCandidate, RegistryError,
};

use crate::fanout::FanoutItem;
use crate::judge::Judge;
use crate::pipeline::stats::{bump, ProcessingStatistics, SessionCounters};
use crate::session::SessionControl;

pub struct CandidatePipeline {
    registry: Arc<dyn DomainRegistry>,
    candidates: Arc<dyn CandidateStore>,
    events: Arc<dyn EventPublisher>,
    judge: Arc<dyn Judge>,
    config: DiscoveryConfig,
    session_id: Uuid,
    worker_prefix: String,
    /// Session-local seen-set for in-session deduplication. Private to this
    /// session; the registry handles cross-session dedup.
    seen: Mutex<HashSet<String>>,
    pub counters: SessionCounters,
}

impl CandidatePipeline {
    pub fn new(
        registry: Arc<dyn DomainRegistry>,
        candidates: Arc<dyn CandidateStore>,
        events: Arc<dyn EventPublisher>,
        judge: Arc<dyn Judge>,
        config: DiscoveryConfig,
        session_id: Uuid,
    ) -> Self {
        Self {
            registry,
            candidates,
            events,
            judge,
            config,
            session_id,
            worker_prefix: format!("scout-{}", session_id.simple()),
            seen: Mutex::new(HashSet::new()),
            counters: SessionCounters::new(),
        }
    }

    /// Drain the fan-out channel with a fixed-size worker pool. On
    /// cancellation or deadline breach workers finish their current result
    /// and exit; the partial statistics snapshot is still returned.
    pub async fn run(
        &self,
        rx: mpsc::Receiver<FanoutItem>,
        control: &SessionControl,
    ) -> ProcessingStatistics {
        let items = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });

        items
            .for_each_concurrent(self.config.worker_count, |item| async move {
                if control.should_stop(Utc::now()) {
                    return;
                }
                self.process(item, Utc::now()).await;
            })
            .await;

        self.counters.snapshot()
    }

    /// Run one result through the ordered stages. Returns the terminal
    /// outcome, or `None` when the domain is operator-parked (INACTIVE).
    pub async fn process(&self, item: FanoutItem, now: DateTime<Utc>) -> Option<ProcessingOutcome> {
        bump(&self.counters.total_results);

        // Stage 1: extract and validate the domain.
        let host = match normalize_host(&item.result.url) {
            Some(host) => host,
            None => {
                debug!(url = %item.result.url, "Invalid URL");
                bump(&self.counters.invalid_urls_skipped);
                return Some(ProcessingOutcome::SkippedInvalidUrl);
            }
        };

        // Stage 2: spam-TLD gate. Before dedup, so spam never enters the
        // seen-set; before scoring, so spam is never judged.
        if self.judge.is_spam_tld(&host) {
            debug!(host, "Spam TLD filtered");
            bump(&self.counters.spam_tld_filtered);
            return Some(ProcessingOutcome::SkippedSpamTld);
        }

        // Stage 3: in-session dedup, one insert-or-found operation.
        let first_sighting = self.seen.lock().unwrap().insert(host.clone());
        if !first_sighting {
            return self
                .skip(
                    &host,
                    ProcessingOutcome::SkippedDuplicateInSession,
                    Some(&self.counters.duplicates_skipped),
                    now,
                )
                .await;
        }

        // Stage 4: blacklist check. The judge is not consulted for
        // blacklisted domains.
        match self.registry.is_blacklisted(&host).await {
            Ok(true) => {
                return self
                    .skip(
                        &host,
                        ProcessingOutcome::SkippedBlacklisted,
                        Some(&self.counters.blacklisted_skipped),
                        now,
                    )
                    .await;
            }
            Ok(false) => {}
            Err(e) => return self.transient(&host, None, e, now).await,
        }

        // Stage 5: score. Always computed once stages 1-4 pass.
        let score = self.judge.score(&item.result, &item.request);

        self.persist(item, host, score, now).await
    }

    /// Stages 6-7: registry admission, threshold, lock, insert, event.
    async fn persist(
        &self,
        item: FanoutItem,
        host: String,
        score: Confidence,
        now: DateTime<Utc>,
    ) -> Option<ProcessingOutcome> {
        // Every sighting registers: last_seen_at and discovery_count track
        // how often search keeps surfacing a domain.
        let domain = match self.registry.register_or_get(&host, self.session_id, now).await {
            Ok(domain) => domain,
            Err(e) => return self.transient(&host, None, e, now).await,
        };

        let check = match self.registry.should_process(&host, now).await {
            Ok(check) => check,
            Err(e) => return self.transient(&host, Some(&domain), e, now).await,
        };

        match check {
            CheckResult::Ok => {}
            CheckResult::SkipBlacklisted { .. } => {
                // Raced with an operator between stage 4 and here.
                bump(&self.counters.blacklisted_skipped);
                self.record(&domain, ProcessingOutcome::SkippedBlacklisted, None, None, now)
                    .await;
                return Some(ProcessingOutcome::SkippedBlacklisted);
            }
            CheckResult::SkipRecent { until } => {
                debug!(host, %until, "Domain in cool-down");
                self.record(&domain, ProcessingOutcome::SkippedRecent, None, None, now)
                    .await;
                return Some(ProcessingOutcome::SkippedRecent);
            }
            CheckResult::SkipNoFunds { revisit_after } => {
                debug!(host, %revisit_after, "Domain marked no-funds");
                self.record(&domain, ProcessingOutcome::SkippedRecent, None, None, now)
                    .await;
                return Some(ProcessingOutcome::SkippedRecent);
            }
            CheckResult::SkipProcessing { locked_by } => {
                debug!(host, locked_by, "Domain locked by another worker");
                bump(&self.counters.duplicates_skipped);
                self.record(
                    &domain,
                    ProcessingOutcome::SkippedDuplicateInSession,
                    None,
                    None,
                    now,
                )
                .await;
                return Some(ProcessingOutcome::SkippedDuplicateInSession);
            }
            CheckResult::SkipInactive => {
                debug!(host, "Domain parked as inactive");
                return None;
            }
        }

        // Stage 6: threshold.
        if score < self.config.confidence_threshold {
            bump(&self.counters.low_confidence_created);
            let candidate_id = if self.config.persist_low_confidence {
                self.insert_candidate(&item, &domain, score, CandidateStatus::SkippedLowConfidence, now)
                    .await
            } else {
                None
            };
            self.record(
                &domain,
                ProcessingOutcome::SkippedLowConfidence,
                candidate_id,
                Some(score),
                now,
            )
            .await;
            debug!(host = %domain.domain_name, %score, "Below confidence threshold");
            return Some(ProcessingOutcome::SkippedLowConfidence);
        }

        // Stage 7: lock, insert, record, publish. The lock serializes
        // concurrent workers on the same domain; losing it means someone
        // else is creating the candidate right now.
        let worker_id = format!("{}-{}", self.worker_prefix, Uuid::new_v4().simple());
        let acquired = match self
            .registry
            .acquire_processing_lock(domain.id, &worker_id, self.config.lock_ttl, now)
            .await
        {
            Ok(acquired) => acquired,
            Err(e) => return self.transient(&host, Some(&domain), e, now).await,
        };
        if !acquired {
            bump(&self.counters.duplicates_skipped);
            self.record(
                &domain,
                ProcessingOutcome::SkippedDuplicateInSession,
                None,
                None,
                now,
            )
            .await;
            return Some(ProcessingOutcome::SkippedDuplicateInSession);
        }

        let outcome = self.create_candidate(&item, &domain, score, now).await;

        if let Err(e) = self
            .registry
            .release_processing_lock(domain.id, &worker_id)
            .await
        {
            warn!(host = %domain.domain_name, error = %e, "Failed to release processing lock; lease will expire");
        }

        outcome
    }

    async fn create_candidate(
        &self,
        item: &FanoutItem,
        domain: &Domain,
        score: Confidence,
        now: DateTime<Utc>,
    ) -> Option<ProcessingOutcome> {
        let candidate_id = match self
            .insert_candidate(item, domain, score, CandidateStatus::PendingCrawl, now)
            .await
        {
            Some(id) => id,
            None => {
                bump(&self.counters.failed_transient);
                self.record(domain, ProcessingOutcome::FailedTransient, None, None, now)
                    .await;
                return Some(ProcessingOutcome::FailedTransient);
            }
        };

        bump(&self.counters.high_confidence_created);
        self.record(
            domain,
            ProcessingOutcome::CandidateCreated,
            Some(candidate_id),
            Some(score),
            now,
        )
        .await;

        // At-least-once: published after the transactional writes.
        // Consumers deduplicate on candidate_id.
        if let Err(e) = self
            .events
            .publish_candidate_created(CandidateCreated {
                candidate_id,
                domain_name: domain.domain_name.clone(),
                source_url: item.result.url.clone(),
                confidence: score,
                session_id: self.session_id,
                timestamp: now,
            })
            .await
        {
            warn!(candidate = %candidate_id, error = %e, "Failed to publish candidate-created event");
        }

        info!(
            host = %domain.domain_name,
            %score,
            candidate = %candidate_id,
            "Candidate created"
        );
        Some(ProcessingOutcome::CandidateCreated)
    }

    async fn insert_candidate(
        &self,
        item: &FanoutItem,
        domain: &Domain,
        score: Confidence,
        status: CandidateStatus,
        now: DateTime<Utc>,
    ) -> Option<Uuid> {
        let new_candidate = NewCandidate {
            domain_id: domain.id,
            discovery_session_id: self.session_id,
            source_url: item.result.url.clone(),
            organization_name: item.result.title.clone(),
            description: item.result.description.clone(),
            confidence_score: score,
            status,
            discovered_at: now,
            raw_metadata: json!({
                "title": item.result.title,
                "description": item.result.description,
                "backend": item.result.backend.label(),
                "query": item.result.query,
                "position": item.result.position,
            }),
        };

        match self.candidates.insert(new_candidate).await {
            Ok(candidate) => Some(candidate.id),
            Err(e) => {
                warn!(host = %domain.domain_name, error = %e, "Candidate insert failed");
                None
            }
        }
    }

    /// Terminal skip that needs a domain row for its log entry: register
    /// the sighting, bump the counter, append the log.
    async fn skip(
        &self,
        host: &str,
        outcome: ProcessingOutcome,
        counter: Option<&AtomicU64>,
        now: DateTime<Utc>,
    ) -> Option<ProcessingOutcome> {
        if let Some(counter) = counter {
            bump(counter);
        }
        match self.registry.register_or_get(host, self.session_id, now).await {
            Ok(domain) => self.record(&domain, outcome, None, None, now).await,
            Err(e) => {
                warn!(host, error = %e, "Could not register domain for skip record");
            }
        }
        Some(outcome)
    }

    async fn record(
        &self,
        domain: &Domain,
        outcome: ProcessingOutcome,
        candidate_id: Option<Uuid>,
        score: Option<Confidence>,
        now: DateTime<Utc>,
    ) {
        if let Err(e) = self
            .registry
            .record_processing(domain.id, self.session_id, candidate_id, outcome, score, now)
            .await
        {
            warn!(host = %domain.domain_name, %outcome, error = %e, "Failed to append processing log");
        }
    }

    /// Registry gave up after its internal retries: count the unit as a
    /// transient failure and move on. The domain's next_retry_at makes it
    /// eligible again in a later session.
    async fn transient(
        &self,
        host: &str,
        domain: Option<&Domain>,
        error: RegistryError,
        now: DateTime<Utc>,
    ) -> Option<ProcessingOutcome> {
        warn!(host, error = %error, "Transient registry failure for result");
        bump(&self.counters.failed_transient);
        if let Some(domain) = domain {
            self.record(domain, ProcessingOutcome::FailedTransient, None, None, now)
                .await;
        }
        Some(ProcessingOutcome::FailedTransient)
    }
}
