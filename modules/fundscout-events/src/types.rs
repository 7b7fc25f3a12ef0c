//! Topic names and typed payloads for the discovery event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fundscout_common::{Confidence, DomainStatus};

/// Topic for candidates that crossed the confidence threshold.
pub const TOPIC_CANDIDATE_CREATED: &str = "candidate-created";

/// Topic for operator and pipeline domain lifecycle transitions.
pub const TOPIC_DOMAIN_STATUS_CHANGES: &str = "domain-status-changes";

/// An event as stored in Postgres. Returned by all read methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub seq: i64,
    pub ts: DateTime<Utc>,
    pub topic: String,
    pub session_id: Option<Uuid>,
    pub payload: serde_json::Value,
}

/// Payload published on `candidate-created`. Delivery is at-least-once;
/// consumers deduplicate on `candidate_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCreated {
    pub candidate_id: Uuid,
    pub domain_name: String,
    pub source_url: String,
    pub confidence: Confidence,
    pub session_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Payload published on `domain-status-changes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainStatusChanged {
    pub domain_name: String,
    pub old_status: DomainStatus,
    pub new_status: DomainStatus,
    pub reason: Option<String>,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
}
