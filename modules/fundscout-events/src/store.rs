//! EventStore — append-only topic log backed by Postgres.
//!
//! Topics are ordered by a global BIGSERIAL sequence. Gap-free reads are
//! guaranteed internally: consumers never observe BIGSERIAL gaps from
//! rolled-back or in-flight transactions.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::types::{
    CandidateCreated, DomainStatusChanged, StoredEvent, TOPIC_CANDIDATE_CREATED,
    TOPIC_DOMAIN_STATUS_CHANGES,
};

/// Publishing surface used by the pipeline and the registry. Lets tests
/// capture events without Postgres.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_candidate_created(&self, payload: CandidateCreated) -> Result<()>;
    async fn publish_domain_status_changed(&self, payload: DomainStatusChanged) -> Result<()>;
}

/// Append-only topic log. The single source of truth for downstream
/// consumers.
#[derive(Clone)]
pub struct EventStore {
    pool: PgPool,
}

impl EventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the events table and indexes. Idempotent; run at startup.
    pub async fn migrate(pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS discovery_event (
                seq        BIGSERIAL PRIMARY KEY,
                ts         TIMESTAMPTZ NOT NULL DEFAULT now(),
                topic      TEXT NOT NULL,
                session_id UUID,
                payload    JSONB NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS discovery_event_topic_seq_idx
             ON discovery_event (topic, seq)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Append an event to a topic. Returns the assigned sequence number.
    pub async fn append(
        &self,
        topic: &str,
        session_id: Option<Uuid>,
        payload: serde_json::Value,
    ) -> Result<i64> {
        let row = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO discovery_event (topic, session_id, payload)
            VALUES ($1, $2, $3)
            RETURNING seq
            "#,
        )
        .bind(topic)
        .bind(session_id)
        .bind(&payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Read events in flat sequence order starting from `seq_start`
    /// (inclusive).
    ///
    /// **Gap-free guarantee:** if concurrent transactions created a momentary
    /// gap, this returns events only up to the gap boundary. The next call
    /// picks up where it left off once the gap closes.
    pub async fn read_from(&self, seq_start: i64, limit: usize) -> Result<Vec<StoredEvent>> {
        let rows = sqlx::query_as::<_, StoredEvent>(
            r#"
            SELECT seq, ts, topic, session_id, payload
            FROM discovery_event
            WHERE seq >= $1
            ORDER BY seq ASC
            LIMIT $2
            "#,
        )
        .bind(seq_start)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        // Stop at the first gap — an in-flight transaction hasn't committed.
        let mut result = Vec::with_capacity(rows.len());
        let mut expected_seq = seq_start;
        for row in rows {
            if row.seq != expected_seq {
                break;
            }
            expected_seq = row.seq + 1;
            result.push(row);
        }

        Ok(result)
    }

    /// Read one topic in sequence order.
    pub async fn read_topic(
        &self,
        topic: &str,
        seq_start: i64,
        limit: usize,
    ) -> Result<Vec<StoredEvent>> {
        let rows = sqlx::query_as::<_, StoredEvent>(
            r#"
            SELECT seq, ts, topic, session_id, payload
            FROM discovery_event
            WHERE topic = $1 AND seq >= $2
            ORDER BY seq ASC
            LIMIT $3
            "#,
        )
        .bind(topic)
        .bind(seq_start)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// The latest committed sequence number, or 0 if the log is empty.
    pub async fn latest_seq(&self) -> Result<i64> {
        let row = sqlx::query_as::<_, (Option<i64>,)>("SELECT MAX(seq) FROM discovery_event")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0.unwrap_or(0))
    }

    /// Delete events older than `cutoff`. Retention policy is the operator's
    /// call; the pipeline requires at least 7 days.
    pub async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM discovery_event WHERE ts < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        let purged = result.rows_affected();
        if purged > 0 {
            info!(purged, %cutoff, "Purged expired events");
        }
        Ok(purged)
    }
}

#[async_trait]
impl EventPublisher for EventStore {
    async fn publish_candidate_created(&self, payload: CandidateCreated) -> Result<()> {
        let session_id = payload.session_id;
        self.append(
            TOPIC_CANDIDATE_CREATED,
            Some(session_id),
            serde_json::to_value(payload)?,
        )
        .await?;
        Ok(())
    }

    async fn publish_domain_status_changed(&self, payload: DomainStatusChanged) -> Result<()> {
        self.append(
            TOPIC_DOMAIN_STATUS_CHANGES,
            None,
            serde_json::to_value(payload)?,
        )
        .await?;
        Ok(())
    }
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredEvent {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(StoredEvent {
            seq: row.try_get("seq")?,
            ts: row.try_get("ts")?,
            topic: row.try_get("topic")?,
            session_id: row.try_get("session_id")?,
            payload: row.try_get("payload")?,
        })
    }
}
