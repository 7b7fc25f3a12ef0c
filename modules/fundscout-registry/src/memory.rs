//! In-memory store doubles with the same semantics as the Postgres
//! implementations. Deterministic tests with a controlled clock: no
//! network, no database, no Docker.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use fundscout_common::{
    normalize_domain_name, Confidence, DomainStatus, ProcessingOutcome,
};
use fundscout_events::{DomainStatusChanged, EventPublisher};

use crate::error::RegistryError;
use crate::pg::{active_checks, failure_backoff};
use crate::registry::{CandidateStore, DomainRegistry, SessionStore};
use crate::types::{
    Candidate, CheckResult, DiscoverySessionRow, Domain, NewCandidate, ProcessingLogEntry,
    SessionTotals,
};

/// No-op event sink for tests that don't assert on events.
pub struct NullEventPublisher;

#[async_trait]
impl EventPublisher for NullEventPublisher {
    async fn publish_candidate_created(
        &self,
        _payload: fundscout_events::CandidateCreated,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn publish_domain_status_changed(
        &self,
        _payload: DomainStatusChanged,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct MemoryDomainRegistry {
    domains: Mutex<HashMap<String, Domain>>,
    log: Mutex<Vec<ProcessingLogEntry>>,
    events: Arc<dyn EventPublisher>,
    cooldown: Duration,
}

impl MemoryDomainRegistry {
    pub fn new(cooldown: Duration) -> Self {
        Self::with_events(cooldown, Arc::new(NullEventPublisher))
    }

    pub fn with_events(cooldown: Duration, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            domains: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
            events,
            cooldown,
        }
    }

    /// Snapshot a domain row for assertions.
    pub fn get(&self, domain_name: &str) -> Option<Domain> {
        let name = normalize_domain_name(domain_name);
        self.domains.lock().unwrap().get(&name).cloned()
    }

    /// Snapshot the processing log for assertions.
    pub fn log_entries(&self) -> Vec<ProcessingLogEntry> {
        self.log.lock().unwrap().clone()
    }

    fn new_row(domain_name: &str, now: DateTime<Utc>, discovery_count: i64) -> Domain {
        Domain {
            id: Uuid::new_v4(),
            domain_name: domain_name.to_string(),
            status: DomainStatus::Active,
            first_discovered_at: now,
            last_seen_at: now,
            discovery_count,
            last_processed_at: None,
            best_confidence_score: None,
            high_quality_candidate_count: 0,
            low_quality_candidate_count: 0,
            blacklist_reason: None,
            blacklisted_by: None,
            blacklisted_at: None,
            no_funds_reason: None,
            revisit_after: None,
            failure_count: 0,
            next_retry_at: None,
            locked_by: None,
            lock_expires_at: None,
        }
    }

    /// Apply an operator transition, creating the row if unseen. Returns
    /// the old status.
    fn transition<F>(&self, domain_name: &str, now: DateTime<Utc>, apply: F) -> DomainStatus
    where
        F: FnOnce(&mut Domain),
    {
        let name = normalize_domain_name(domain_name);
        let mut domains = self.domains.lock().unwrap();
        let entry = domains
            .entry(name.clone())
            .or_insert_with(|| Self::new_row(&name, now, 0));
        let old_status = entry.status;
        apply(entry);
        old_status
    }
}

#[async_trait]
impl DomainRegistry for MemoryDomainRegistry {
    async fn should_process(
        &self,
        domain_name: &str,
        now: DateTime<Utc>,
    ) -> Result<CheckResult, RegistryError> {
        let name = normalize_domain_name(domain_name);
        let mut domains = self.domains.lock().unwrap();

        let domain = match domains.get_mut(&name) {
            Some(d) => d,
            None => return Ok(CheckResult::Ok),
        };

        let verdict = match domain.status {
            DomainStatus::Blacklisted => CheckResult::SkipBlacklisted {
                reason: domain.blacklist_reason.clone(),
            },
            DomainStatus::Inactive => CheckResult::SkipInactive,
            DomainStatus::NoFundsCurrentYear => match domain.revisit_after {
                Some(revisit) if now < revisit => {
                    CheckResult::SkipNoFunds { revisit_after: revisit }
                }
                _ => {
                    domain.status = DomainStatus::Active;
                    domain.revisit_after = None;
                    domain.no_funds_reason = None;
                    active_checks(domain, self.cooldown, now)
                }
            },
            DomainStatus::Active => active_checks(domain, self.cooldown, now),
        };

        Ok(verdict)
    }

    async fn register_or_get(
        &self,
        domain_name: &str,
        _session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Domain, RegistryError> {
        let name = normalize_domain_name(domain_name);
        let mut domains = self.domains.lock().unwrap();

        let domain = domains
            .entry(name.clone())
            .and_modify(|d| {
                d.last_seen_at = now;
                d.discovery_count += 1;
            })
            .or_insert_with(|| Self::new_row(&name, now, 1));

        Ok(domain.clone())
    }

    async fn acquire_processing_lock(
        &self,
        domain_id: Uuid,
        worker_id: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<bool, RegistryError> {
        let mut domains = self.domains.lock().unwrap();
        let domain = domains
            .values_mut()
            .find(|d| d.id == domain_id)
            .ok_or_else(|| RegistryError::UnknownDomain(domain_id.to_string()))?;

        let lease_free = match (&domain.locked_by, domain.lock_expires_at) {
            (Some(_), Some(expires)) => expires <= now,
            _ => true,
        };
        if !lease_free {
            return Ok(false);
        }

        domain.locked_by = Some(worker_id.to_string());
        domain.lock_expires_at = Some(now + ttl);
        Ok(true)
    }

    async fn release_processing_lock(
        &self,
        domain_id: Uuid,
        worker_id: &str,
    ) -> Result<(), RegistryError> {
        let mut domains = self.domains.lock().unwrap();
        if let Some(domain) = domains.values_mut().find(|d| d.id == domain_id) {
            if domain.locked_by.as_deref() == Some(worker_id) {
                domain.locked_by = None;
                domain.lock_expires_at = None;
            }
        }
        Ok(())
    }

    async fn record_processing(
        &self,
        domain_id: Uuid,
        session_id: Uuid,
        candidate_id: Option<Uuid>,
        outcome: ProcessingOutcome,
        confidence: Option<Confidence>,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let mut domains = self.domains.lock().unwrap();
        let domain = domains
            .values_mut()
            .find(|d| d.id == domain_id)
            .ok_or_else(|| RegistryError::UnknownDomain(domain_id.to_string()))?;

        match outcome {
            ProcessingOutcome::CandidateCreated => {
                domain.last_processed_at = Some(now);
                domain.high_quality_candidate_count += 1;
                domain.best_confidence_score =
                    Some(domain.best_confidence_score.unwrap_or(Confidence::ZERO).max(
                        confidence.unwrap_or(Confidence::ZERO),
                    ));
                domain.failure_count = 0;
                domain.next_retry_at = None;
            }
            ProcessingOutcome::SkippedLowConfidence => {
                domain.last_processed_at = Some(now);
                domain.low_quality_candidate_count += 1;
                domain.best_confidence_score =
                    Some(domain.best_confidence_score.unwrap_or(Confidence::ZERO).max(
                        confidence.unwrap_or(Confidence::ZERO),
                    ));
            }
            ProcessingOutcome::FailedTransient => {
                domain.last_processed_at = Some(now);
                domain.failure_count += 1;
                domain.next_retry_at = Some(now + failure_backoff(domain.failure_count));
            }
            // Pure skips append a log row only; they never slide the
            // cool-down window.
            _ => {}
        }

        self.log.lock().unwrap().push(ProcessingLogEntry {
            domain_id,
            processed_at: now,
            discovery_session_id: session_id,
            candidate_id,
            outcome,
        });
        Ok(())
    }

    async fn blacklist(
        &self,
        domain_name: &str,
        reason: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let old_status = self.transition(domain_name, now, |d| {
            d.status = DomainStatus::Blacklisted;
            d.blacklist_reason = Some(reason.to_string());
            d.blacklisted_by = Some(actor.to_string());
            d.blacklisted_at = Some(now);
        });

        self.events
            .publish_domain_status_changed(DomainStatusChanged {
                domain_name: normalize_domain_name(domain_name),
                old_status,
                new_status: DomainStatus::Blacklisted,
                reason: Some(reason.to_string()),
                actor: actor.to_string(),
                timestamp: now,
            })
            .await
            .map_err(RegistryError::Other)?;
        Ok(())
    }

    async fn lift_blacklist(
        &self,
        domain_name: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let old_status = self.transition(domain_name, now, |d| {
            d.status = DomainStatus::Active;
            d.blacklist_reason = None;
            d.blacklisted_by = None;
            d.blacklisted_at = None;
        });

        self.events
            .publish_domain_status_changed(DomainStatusChanged {
                domain_name: normalize_domain_name(domain_name),
                old_status,
                new_status: DomainStatus::Active,
                reason: None,
                actor: actor.to_string(),
                timestamp: now,
            })
            .await
            .map_err(RegistryError::Other)?;
        Ok(())
    }

    async fn mark_no_funds(
        &self,
        domain_name: &str,
        reason: &str,
        revisit_after: DateTime<Utc>,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let old_status = self.transition(domain_name, now, |d| {
            d.status = DomainStatus::NoFundsCurrentYear;
            d.no_funds_reason = Some(reason.to_string());
            d.revisit_after = Some(revisit_after);
        });

        self.events
            .publish_domain_status_changed(DomainStatusChanged {
                domain_name: normalize_domain_name(domain_name),
                old_status,
                new_status: DomainStatus::NoFundsCurrentYear,
                reason: Some(reason.to_string()),
                actor: actor.to_string(),
                timestamp: now,
            })
            .await
            .map_err(RegistryError::Other)?;
        Ok(())
    }

    async fn is_blacklisted(&self, domain_name: &str) -> Result<bool, RegistryError> {
        let name = normalize_domain_name(domain_name);
        let domains = self.domains.lock().unwrap();
        Ok(domains
            .get(&name)
            .map(|d| d.status == DomainStatus::Blacklisted)
            .unwrap_or(false))
    }
}

// ---------------------------------------------------------------------------
// MemoryCandidateStore / MemorySessionStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryCandidateStore {
    candidates: Mutex<Vec<Candidate>>,
}

impl MemoryCandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Candidate> {
        self.candidates.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandidateStore for MemoryCandidateStore {
    async fn insert(&self, candidate: NewCandidate) -> Result<Candidate, RegistryError> {
        let row = Candidate {
            id: Uuid::new_v4(),
            domain_id: candidate.domain_id,
            discovery_session_id: candidate.discovery_session_id,
            source_url: candidate.source_url,
            organization_name: candidate.organization_name,
            description: candidate.description,
            confidence_score: candidate.confidence_score,
            status: candidate.status,
            discovered_at: candidate.discovered_at,
            discovered_by: "SYSTEM".to_string(),
            raw_metadata: candidate.raw_metadata,
        };
        self.candidates.lock().unwrap().push(row.clone());
        Ok(row)
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<Uuid, DiscoverySessionRow>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, session_id: Uuid) -> Option<DiscoverySessionRow> {
        self.sessions.lock().unwrap().get(&session_id).cloned()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: &DiscoverySessionRow) -> Result<(), RegistryError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn finalize(
        &self,
        session_id: Uuid,
        completed_at: DateTime<Utc>,
        totals: SessionTotals,
    ) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.get_mut(&session_id) {
            session.completed_at = Some(completed_at);
            session.totals = totals;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> MemoryDomainRegistry {
        MemoryDomainRegistry::new(Duration::hours(24))
    }

    #[tokio::test]
    async fn unknown_domain_is_eligible() {
        let reg = registry();
        let verdict = reg.should_process("brand-new.org", Utc::now()).await.unwrap();
        assert_eq!(verdict, CheckResult::Ok);
    }

    #[tokio::test]
    async fn registration_is_idempotent_and_counts_sightings() {
        let reg = registry();
        let session = Uuid::new_v4();
        let now = Utc::now();

        let first = reg.register_or_get("WWW.New-Foundation.ORG", session, now).await.unwrap();
        let second = reg
            .register_or_get("new-foundation.org", session, now + Duration::minutes(1))
            .await
            .unwrap();

        assert_eq!(first.id, second.id, "same domain id on re-registration");
        assert_eq!(first.discovery_count, 1);
        assert_eq!(second.discovery_count, 2);
        assert_eq!(second.domain_name, "new-foundation.org");
    }

    #[tokio::test]
    async fn blacklist_is_terminal_until_lifted() {
        let reg = registry();
        let now = Utc::now();
        reg.blacklist("scam-grants.com", "known scam", "ops@fundscout", now)
            .await
            .unwrap();

        // Stays blacklisted across arbitrary later probes.
        for hours in [1, 24, 24 * 90] {
            let verdict = reg
                .should_process("scam-grants.com", now + Duration::hours(hours))
                .await
                .unwrap();
            assert!(
                matches!(verdict, CheckResult::SkipBlacklisted { .. }),
                "expected blacklist skip after {hours}h, got {verdict:?}"
            );
        }
        assert!(reg.is_blacklisted("scam-grants.com").await.unwrap());

        reg.lift_blacklist("scam-grants.com", "ops@fundscout", now + Duration::days(1))
            .await
            .unwrap();
        let verdict = reg
            .should_process("scam-grants.com", now + Duration::days(2))
            .await
            .unwrap();
        assert_eq!(verdict, CheckResult::Ok);
    }

    #[tokio::test]
    async fn cooldown_window_boundaries() {
        let reg = registry();
        let session = Uuid::new_v4();
        let now = Utc::now();

        let domain = reg.register_or_get("us-bulgaria.org", session, now).await.unwrap();
        reg.record_processing(
            domain.id,
            session,
            None,
            ProcessingOutcome::SkippedLowConfidence,
            Some(Confidence::from_hundredths(40)),
            now,
        )
        .await
        .unwrap();

        // Inside the window: skipped.
        for minutes in [0, 60, 23 * 60 + 59] {
            let verdict = reg
                .should_process("us-bulgaria.org", now + Duration::minutes(minutes))
                .await
                .unwrap();
            assert!(
                matches!(verdict, CheckResult::SkipRecent { .. }),
                "expected cooldown skip at +{minutes}m, got {verdict:?}"
            );
        }

        // At the boundary and after: eligible again.
        let verdict = reg
            .should_process("us-bulgaria.org", now + Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(verdict, CheckResult::Ok);
    }

    #[tokio::test]
    async fn no_funds_revisit_boundary() {
        let reg = registry();
        let now = Utc::now();
        let revisit = now + Duration::days(90);

        reg.mark_no_funds("local-foundation.bg", "cycle closed", revisit, "ops", now)
            .await
            .unwrap();

        let verdict = reg
            .should_process("local-foundation.bg", revisit - Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(verdict, CheckResult::SkipNoFunds { revisit_after: revisit });

        let verdict = reg.should_process("local-foundation.bg", revisit).await.unwrap();
        assert_eq!(verdict, CheckResult::Ok);

        // The transition back to ACTIVE is sticky.
        assert_eq!(
            reg.get("local-foundation.bg").unwrap().status,
            DomainStatus::Active
        );
    }

    #[tokio::test]
    async fn lock_is_exclusive_until_lease_expiry() {
        let reg = registry();
        let session = Uuid::new_v4();
        let now = Utc::now();
        let ttl = Duration::hours(1);

        let domain = reg.register_or_get("new-foundation.org", session, now).await.unwrap();

        assert!(reg
            .acquire_processing_lock(domain.id, "worker-1", ttl, now)
            .await
            .unwrap());
        assert!(
            !reg.acquire_processing_lock(domain.id, "worker-2", ttl, now)
                .await
                .unwrap(),
            "second worker must not acquire a live lease"
        );
        assert!(
            !reg.acquire_processing_lock(domain.id, "worker-1", ttl, now)
                .await
                .unwrap(),
            "the lock is non-reentrant"
        );

        // After expiry another worker takes over.
        let later = now + ttl + Duration::seconds(1);
        assert!(reg
            .acquire_processing_lock(domain.id, "worker-2", ttl, later)
            .await
            .unwrap());

        // The original holder's release is now a no-op.
        reg.release_processing_lock(domain.id, "worker-1").await.unwrap();
        let row = reg.get("new-foundation.org").unwrap();
        assert_eq!(row.locked_by.as_deref(), Some("worker-2"));
    }

    #[tokio::test]
    async fn transient_failures_back_off_and_recover() {
        let reg = registry();
        let session = Uuid::new_v4();
        let now = Utc::now();

        let domain = reg.register_or_get("flaky.org", session, now).await.unwrap();
        reg.record_processing(domain.id, session, None, ProcessingOutcome::FailedTransient, None, now)
            .await
            .unwrap();

        let row = reg.get("flaky.org").unwrap();
        assert_eq!(row.failure_count, 1);
        assert_eq!(row.next_retry_at, Some(now + Duration::hours(6)));

        // Both the retry backoff and the cool-down gate the domain; the
        // longer of the two wins.
        let verdict = reg
            .should_process("flaky.org", now + Duration::hours(6))
            .await
            .unwrap();
        assert!(matches!(verdict, CheckResult::SkipRecent { .. }));

        let eligible_at = now + Duration::hours(24);
        let verdict = reg.should_process("flaky.org", eligible_at).await.unwrap();
        assert_eq!(verdict, CheckResult::Ok);

        // A created candidate clears the failure bookkeeping.
        reg.record_processing(
            domain.id,
            session,
            Some(Uuid::new_v4()),
            ProcessingOutcome::CandidateCreated,
            Some(Confidence::from_hundredths(82)),
            eligible_at,
        )
        .await
        .unwrap();
        let row = reg.get("flaky.org").unwrap();
        assert_eq!(row.failure_count, 0);
        assert!(row.next_retry_at.is_none());
        assert_eq!(row.best_confidence_score, Some(Confidence::from_hundredths(82)));
    }

    #[tokio::test]
    async fn counters_are_monotonic_over_mixed_outcomes() {
        let reg = registry();
        let session = Uuid::new_v4();
        let now = Utc::now();
        let domain = reg.register_or_get("steady.org", session, now).await.unwrap();

        let outcomes = [
            (ProcessingOutcome::CandidateCreated, Some(70)),
            (ProcessingOutcome::SkippedLowConfidence, Some(30)),
            (ProcessingOutcome::SkippedRecent, None),
            (ProcessingOutcome::CandidateCreated, Some(65)),
        ];
        let mut previous = (0, 0);
        for (i, (outcome, score)) in outcomes.into_iter().enumerate() {
            reg.record_processing(
                domain.id,
                session,
                None,
                outcome,
                score.map(Confidence::from_hundredths),
                now + Duration::minutes(i as i64),
            )
            .await
            .unwrap();
            let row = reg.get("steady.org").unwrap();
            let current = (
                row.high_quality_candidate_count,
                row.low_quality_candidate_count,
            );
            assert!(current.0 >= previous.0 && current.1 >= previous.1);
            previous = current;
        }

        assert_eq!(previous, (2, 1));
        assert_eq!(
            reg.get("steady.org").unwrap().best_confidence_score,
            Some(Confidence::from_hundredths(70)),
            "best score keeps the maximum, not the latest"
        );
        assert_eq!(reg.log_entries().len(), 4);
    }

    #[tokio::test]
    async fn random_operation_sequences_never_unblacklist() {
        // Pseudo-random op mix derived from a fixed seed; blacklist must
        // survive everything except an explicit lift.
        let reg = registry();
        let session = Uuid::new_v4();
        let now = Utc::now();
        reg.blacklist("locked-down.org", "fraud", "ops", now).await.unwrap();

        let mut state = 0x2545F491u64;
        for step in 0..200 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let at = now + Duration::minutes(step);
            match state % 4 {
                0 => {
                    let _ = reg.register_or_get("locked-down.org", session, at).await.unwrap();
                }
                1 => {
                    let domain = reg.get("locked-down.org").unwrap();
                    let _ = reg
                        .record_processing(
                            domain.id,
                            session,
                            None,
                            ProcessingOutcome::SkippedBlacklisted,
                            None,
                            at,
                        )
                        .await;
                }
                2 => {
                    let _ = reg
                        .mark_no_funds("other-domain.org", "n/a", at + Duration::days(30), "ops", at)
                        .await;
                }
                _ => {}
            }
            let verdict = reg.should_process("locked-down.org", at).await.unwrap();
            assert!(
                matches!(verdict, CheckResult::SkipBlacklisted { .. }),
                "step {step}: blacklist must be terminal, got {verdict:?}"
            );
        }
    }
}
