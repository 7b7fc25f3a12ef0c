//! Row types for the durable discovery schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fundscout_common::{CandidateStatus, Confidence, DomainStatus, ProcessingOutcome};

/// The durable deduplication entity, keyed by normalized host. Never
/// physically deleted; lifecycle moves through status transitions only.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    pub id: Uuid,
    pub domain_name: String,
    pub status: DomainStatus,
    pub first_discovered_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub discovery_count: i64,
    pub last_processed_at: Option<DateTime<Utc>>,
    pub best_confidence_score: Option<Confidence>,
    pub high_quality_candidate_count: i64,
    pub low_quality_candidate_count: i64,
    pub blacklist_reason: Option<String>,
    pub blacklisted_by: Option<String>,
    pub blacklisted_at: Option<DateTime<Utc>>,
    pub no_funds_reason: Option<String>,
    pub revisit_after: Option<DateTime<Utc>>,
    pub failure_count: i32,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub locked_by: Option<String>,
    pub lock_expires_at: Option<DateTime<Utc>>,
}

/// Append-only record of one processing event for a domain.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingLogEntry {
    pub domain_id: Uuid,
    pub processed_at: DateTime<Utc>,
    pub discovery_session_id: Uuid,
    pub candidate_id: Option<Uuid>,
    pub outcome: ProcessingOutcome,
}

/// A candidate to persist. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewCandidate {
    pub domain_id: Uuid,
    pub discovery_session_id: Uuid,
    pub source_url: String,
    pub organization_name: Option<String>,
    pub description: Option<String>,
    pub confidence_score: Confidence,
    pub status: CandidateStatus,
    pub discovered_at: DateTime<Utc>,
    /// Title, description and backend identifier as returned by the search.
    pub raw_metadata: serde_json::Value,
}

/// A persisted candidate row.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: Uuid,
    pub domain_id: Uuid,
    pub discovery_session_id: Uuid,
    pub source_url: String,
    pub organization_name: Option<String>,
    pub description: Option<String>,
    pub confidence_score: Confidence,
    pub status: CandidateStatus,
    pub discovered_at: DateTime<Utc>,
    pub discovered_by: String,
    pub raw_metadata: serde_json::Value,
}

/// A discovery session row, created at session start and finalized with
/// denormalized totals at completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverySessionRow {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub target_day_of_week: String,
    pub query_count: i32,
    pub totals: SessionTotals,
}

/// Denormalized per-session counters. Mirrors the pipeline's processing
/// statistics at the persistence boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTotals {
    pub total_results: i64,
    pub spam_tld_filtered: i64,
    pub blacklisted_skipped: i64,
    pub duplicates_skipped: i64,
    pub high_confidence_created: i64,
    pub low_confidence_created: i64,
    pub invalid_urls_skipped: i64,
    pub failed_transient: i64,
}

/// Answer to `should_process`: proceed, or why not.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
    /// Unknown or active domain; proceed.
    Ok,
    /// Terminal until an operator lifts it.
    SkipBlacklisted { reason: Option<String> },
    /// Marked as having no funds this cycle; eligible again at the given time.
    SkipNoFunds { revisit_after: DateTime<Utc> },
    /// Processed within the cool-down window, or backing off after
    /// transient failures.
    SkipRecent { until: DateTime<Utc> },
    /// Another worker currently holds the processing lock.
    SkipProcessing { locked_by: String },
    /// Parked by an operator; not part of the active pool.
    SkipInactive,
}

impl CheckResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, CheckResult::Ok)
    }
}
