//! Contracts for the durable stores.
//!
//! The pipeline talks to these traits only. Production uses the Postgres
//! implementations in `pg`; tests use the in-memory doubles in `memory`:
//! no network, no database, no Docker.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use fundscout_common::{Confidence, ProcessingOutcome};

use crate::error::RegistryError;
use crate::types::{Candidate, CheckResult, Domain, DiscoverySessionRow, NewCandidate, SessionTotals};

/// Durable per-domain deduplication and lifecycle store.
///
/// Domain names are normalized (lowercase, leading `www.` stripped) by every
/// implementation before any lookup, so callers may pass hosts as extracted.
/// Operations on the same domain name are linearizable; multi-step mutations
/// run inside one transaction with row locking. Time-dependent operations
/// take `now` so tests run under a controlled clock.
#[async_trait]
pub trait DomainRegistry: Send + Sync {
    /// Decide whether a domain is eligible for processing right now.
    /// The cool-down, blacklist, no-funds and retry gates all live here,
    /// not in the caller.
    async fn should_process(
        &self,
        domain_name: &str,
        now: DateTime<Utc>,
    ) -> Result<CheckResult, RegistryError>;

    /// Idempotent registration: insert on first sighting, otherwise update
    /// `last_seen_at` and increment `discovery_count` by exactly one.
    async fn register_or_get(
        &self,
        domain_name: &str,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Domain, RegistryError>;

    /// Non-blocking, non-reentrant row lock with an absolute lease.
    /// Returns false when another worker holds an unexpired lease.
    async fn acquire_processing_lock(
        &self,
        domain_id: Uuid,
        worker_id: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<bool, RegistryError>;

    /// Release a held lock. Best-effort after lease expiry: if another
    /// worker took the lease over, this is a no-op.
    async fn release_processing_lock(
        &self,
        domain_id: Uuid,
        worker_id: &str,
    ) -> Result<(), RegistryError>;

    /// Append a processing-log row and update the domain's rollups:
    /// `last_processed_at` always; quality counters and best score for
    /// candidate outcomes; failure bookkeeping for transient failures.
    async fn record_processing(
        &self,
        domain_id: Uuid,
        session_id: Uuid,
        candidate_id: Option<Uuid>,
        outcome: ProcessingOutcome,
        confidence: Option<Confidence>,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError>;

    /// Operator action: terminal until lifted. Emits a status-change event.
    async fn blacklist(
        &self,
        domain_name: &str,
        reason: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError>;

    /// Operator action: return a blacklisted domain to the active pool.
    async fn lift_blacklist(
        &self,
        domain_name: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError>;

    /// Operator action: park a domain until `revisit_after`. Emits a
    /// status-change event.
    async fn mark_no_funds(
        &self,
        domain_name: &str,
        reason: &str,
        revisit_after: DateTime<Utc>,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError>;

    /// Fast read. Unknown domains are not blacklisted.
    async fn is_blacklisted(&self, domain_name: &str) -> Result<bool, RegistryError>;
}

/// Persistence for candidates that crossed (or, for audit rows, missed)
/// the confidence threshold.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn insert(&self, candidate: NewCandidate) -> Result<Candidate, RegistryError>;
}

/// Persistence for discovery sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Write the session row at session start.
    async fn create(&self, session: &DiscoverySessionRow) -> Result<(), RegistryError>;

    /// Stamp completion and denormalize the final totals. Also called on
    /// cancellation and deadline breach with partial totals.
    async fn finalize(
        &self,
        session_id: Uuid,
        completed_at: DateTime<Utc>,
        totals: SessionTotals,
    ) -> Result<(), RegistryError>;
}
