//! Postgres implementations of the store contracts.
//!
//! All multi-step mutations run inside a single transaction with
//! `SELECT ... FOR UPDATE` row locking, so operations on the same domain
//! name serialize at the database. Transient failures are retried with
//! exponential backoff and jitter; each transaction is bounded by the
//! configured timeout.

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

use fundscout_common::{
    normalize_domain_name, Confidence, DomainStatus, ProcessingOutcome,
};
use fundscout_events::{DomainStatusChanged, EventPublisher};

use crate::error::RegistryError;
use crate::registry::{CandidateStore, DomainRegistry, SessionStore};
use crate::types::{
    Candidate, CheckResult, DiscoverySessionRow, Domain, NewCandidate, SessionTotals,
};

/// Attempts per operation before a transient error is surfaced.
const MAX_ATTEMPTS: u32 = 3;
/// Base backoff between attempts. Actual delay is base * 2^attempt + jitter.
const RETRY_BASE: StdDuration = StdDuration::from_millis(200);

/// Base interval for the per-domain failure backoff (doubles per failure,
/// capped at 96 hours).
const FAILURE_RETRY_BASE_HOURS: i64 = 6;

pub async fn with_retries<T, F, Fut>(op_name: &str, mut op: F) -> Result<T, RegistryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RegistryError>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Err(RegistryError::Transient(reason)) if attempt + 1 < MAX_ATTEMPTS => {
                let backoff = RETRY_BASE * 2u32.pow(attempt);
                let jitter = StdDuration::from_millis(rand::rng().random_range(0..100));
                warn!(
                    op = op_name,
                    attempt = attempt + 1,
                    backoff_ms = backoff.as_millis() as u64,
                    reason = %reason,
                    "Transient registry error, retrying after backoff"
                );
                tokio::time::sleep(backoff + jitter).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// Create the discovery schema. Idempotent; run at startup.
pub async fn migrate(pool: &PgPool) -> Result<(), RegistryError> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS domain (
            id                           UUID PRIMARY KEY,
            domain_name                  TEXT NOT NULL UNIQUE,
            status                       TEXT NOT NULL DEFAULT 'ACTIVE',
            first_discovered_at          TIMESTAMPTZ NOT NULL,
            last_seen_at                 TIMESTAMPTZ NOT NULL,
            discovery_count              BIGINT NOT NULL DEFAULT 1,
            last_processed_at            TIMESTAMPTZ,
            best_confidence_score        SMALLINT,
            high_quality_candidate_count BIGINT NOT NULL DEFAULT 0,
            low_quality_candidate_count  BIGINT NOT NULL DEFAULT 0,
            blacklist_reason             TEXT,
            blacklisted_by               TEXT,
            blacklisted_at               TIMESTAMPTZ,
            no_funds_reason              TEXT,
            revisit_after                TIMESTAMPTZ,
            failure_count                INTEGER NOT NULL DEFAULT 0,
            next_retry_at                TIMESTAMPTZ,
            locked_by                    TEXT,
            lock_expires_at              TIMESTAMPTZ
        )
        "#,
        "CREATE INDEX IF NOT EXISTS domain_status_idx ON domain (status)",
        r#"
        CREATE TABLE IF NOT EXISTS domain_processing_log (
            id                   BIGSERIAL PRIMARY KEY,
            domain_id            UUID NOT NULL REFERENCES domain (id),
            processed_at         TIMESTAMPTZ NOT NULL,
            discovery_session_id UUID NOT NULL,
            candidate_id         UUID,
            outcome              TEXT NOT NULL
        )
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS domain_processing_log_domain_idx
        ON domain_processing_log (domain_id, processed_at)
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS funding_source_candidate (
            id                   UUID PRIMARY KEY,
            domain_id            UUID NOT NULL REFERENCES domain (id),
            discovery_session_id UUID NOT NULL,
            source_url           TEXT NOT NULL,
            organization_name    TEXT,
            description          TEXT,
            confidence_score     SMALLINT NOT NULL,
            status               TEXT NOT NULL,
            discovered_at        TIMESTAMPTZ NOT NULL,
            discovered_by        TEXT NOT NULL DEFAULT 'SYSTEM',
            raw_metadata         JSONB NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS discovery_session (
            id                      UUID PRIMARY KEY,
            started_at              TIMESTAMPTZ NOT NULL,
            completed_at            TIMESTAMPTZ,
            target_day_of_week      TEXT NOT NULL,
            query_count             INTEGER NOT NULL,
            total_results           BIGINT NOT NULL DEFAULT 0,
            spam_tld_filtered       BIGINT NOT NULL DEFAULT 0,
            blacklisted_skipped     BIGINT NOT NULL DEFAULT 0,
            duplicates_skipped      BIGINT NOT NULL DEFAULT 0,
            high_confidence_created BIGINT NOT NULL DEFAULT 0,
            low_confidence_created  BIGINT NOT NULL DEFAULT 0,
            invalid_urls_skipped    BIGINT NOT NULL DEFAULT 0,
            failed_transient        BIGINT NOT NULL DEFAULT 0
        )
        "#,
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// PgDomainRegistry
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgDomainRegistry {
    pool: PgPool,
    events: Arc<dyn EventPublisher>,
    cooldown: Duration,
    tx_timeout: StdDuration,
}

impl PgDomainRegistry {
    pub fn new(
        pool: PgPool,
        events: Arc<dyn EventPublisher>,
        cooldown: Duration,
        tx_timeout: StdDuration,
    ) -> Self {
        Self {
            pool,
            events,
            cooldown,
            tx_timeout,
        }
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, RegistryError>>,
    ) -> Result<T, RegistryError> {
        match tokio::time::timeout(self.tx_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RegistryError::Transient(format!(
                "registry transaction exceeded {:?}",
                self.tx_timeout
            ))),
        }
    }

    async fn should_process_once(
        &self,
        domain_name: &str,
        now: DateTime<Utc>,
    ) -> Result<CheckResult, RegistryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, Domain>(
            "SELECT * FROM domain WHERE domain_name = $1 FOR UPDATE",
        )
        .bind(domain_name)
        .fetch_optional(&mut *tx)
        .await?;

        let domain = match row {
            Some(d) => d,
            None => {
                tx.commit().await?;
                return Ok(CheckResult::Ok);
            }
        };

        let verdict = match domain.status {
            DomainStatus::Blacklisted => CheckResult::SkipBlacklisted {
                reason: domain.blacklist_reason.clone(),
            },
            DomainStatus::Inactive => CheckResult::SkipInactive,
            DomainStatus::NoFundsCurrentYear => {
                match domain.revisit_after {
                    Some(revisit) if now < revisit => {
                        CheckResult::SkipNoFunds { revisit_after: revisit }
                    }
                    _ => {
                        // Revisit time reached: fold the domain back into the
                        // active pool before the normal checks.
                        sqlx::query(
                            "UPDATE domain
                             SET status = 'ACTIVE', revisit_after = NULL, no_funds_reason = NULL
                             WHERE id = $1",
                        )
                        .bind(domain.id)
                        .execute(&mut *tx)
                        .await?;
                        active_checks(&domain, self.cooldown, now)
                    }
                }
            }
            DomainStatus::Active => active_checks(&domain, self.cooldown, now),
        };

        tx.commit().await?;
        Ok(verdict)
    }

    async fn register_or_get_once(
        &self,
        domain_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Domain, RegistryError> {
        let domain = sqlx::query_as::<_, Domain>(
            r#"
            INSERT INTO domain (id, domain_name, status, first_discovered_at, last_seen_at, discovery_count)
            VALUES ($1, $2, 'ACTIVE', $3, $3, 1)
            ON CONFLICT (domain_name) DO UPDATE
                SET last_seen_at = EXCLUDED.last_seen_at,
                    discovery_count = domain.discovery_count + 1
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(domain_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(domain)
    }

    async fn acquire_lock_once(
        &self,
        domain_id: Uuid,
        worker_id: &str,
        expires: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, RegistryError> {
        let result = sqlx::query(
            r#"
            UPDATE domain
            SET locked_by = $2, lock_expires_at = $3
            WHERE id = $1
              AND (locked_by IS NULL OR lock_expires_at IS NULL OR lock_expires_at <= $4)
            "#,
        )
        .bind(domain_id)
        .bind(worker_id)
        .bind(expires)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_processing_once(
        &self,
        domain_id: Uuid,
        session_id: Uuid,
        candidate_id: Option<Uuid>,
        outcome: ProcessingOutcome,
        confidence: Option<Confidence>,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO domain_processing_log
                (domain_id, processed_at, discovery_session_id, candidate_id, outcome)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(domain_id)
        .bind(now)
        .bind(session_id)
        .bind(candidate_id)
        .bind(outcome.as_str())
        .execute(&mut *tx)
        .await?;

        let score = confidence.map(|c| i16::from(c.hundredths()));
        match outcome {
            ProcessingOutcome::CandidateCreated => {
                sqlx::query(
                    r#"
                    UPDATE domain
                    SET last_processed_at = $2,
                        high_quality_candidate_count = high_quality_candidate_count + 1,
                        best_confidence_score = GREATEST(COALESCE(best_confidence_score, 0), $3),
                        failure_count = 0,
                        next_retry_at = NULL
                    WHERE id = $1
                    "#,
                )
                .bind(domain_id)
                .bind(now)
                .bind(score.unwrap_or(0))
                .execute(&mut *tx)
                .await?;
            }
            ProcessingOutcome::SkippedLowConfidence => {
                sqlx::query(
                    r#"
                    UPDATE domain
                    SET last_processed_at = $2,
                        low_quality_candidate_count = low_quality_candidate_count + 1,
                        best_confidence_score = GREATEST(COALESCE(best_confidence_score, 0), $3)
                    WHERE id = $1
                    "#,
                )
                .bind(domain_id)
                .bind(now)
                .bind(score.unwrap_or(0))
                .execute(&mut *tx)
                .await?;
            }
            ProcessingOutcome::FailedTransient => {
                let failure_count = sqlx::query_as::<_, (i32,)>(
                    "SELECT failure_count FROM domain WHERE id = $1 FOR UPDATE",
                )
                .bind(domain_id)
                .fetch_one(&mut *tx)
                .await?
                .0 + 1;
                let next_retry = now + failure_backoff(failure_count);
                sqlx::query(
                    r#"
                    UPDATE domain
                    SET last_processed_at = $2, failure_count = $3, next_retry_at = $4
                    WHERE id = $1
                    "#,
                )
                .bind(domain_id)
                .bind(now)
                .bind(failure_count)
                .bind(next_retry)
                .execute(&mut *tx)
                .await?;
            }
            // Pure skips append a log row only. Touching last_processed_at
            // here would slide the cool-down window on every sighting.
            _ => {}
        }

        tx.commit().await?;
        Ok(())
    }

    /// Lock (or create) the domain row for an operator transition. Returns
    /// the previous status.
    async fn lock_or_create_row(
        tx: &mut Transaction<'_, Postgres>,
        domain_name: &str,
        now: DateTime<Utc>,
    ) -> Result<DomainStatus, RegistryError> {
        let existing = sqlx::query_as::<_, Domain>(
            "SELECT * FROM domain WHERE domain_name = $1 FOR UPDATE",
        )
        .bind(domain_name)
        .fetch_optional(&mut **tx)
        .await?;

        match existing {
            Some(d) => Ok(d.status),
            None => {
                // Operators may act on domains the pipeline has not sighted.
                sqlx::query(
                    r#"
                    INSERT INTO domain (id, domain_name, status, first_discovered_at, last_seen_at, discovery_count)
                    VALUES ($1, $2, 'ACTIVE', $3, $3, 0)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(domain_name)
                .bind(now)
                .execute(&mut **tx)
                .await?;
                Ok(DomainStatus::Active)
            }
        }
    }

    async fn blacklist_once(
        &self,
        domain_name: &str,
        reason: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<DomainStatus, RegistryError> {
        let mut tx = self.pool.begin().await?;
        let old_status = Self::lock_or_create_row(&mut tx, domain_name, now).await?;

        sqlx::query(
            r#"
            UPDATE domain
            SET status = 'BLACKLISTED', blacklist_reason = $2, blacklisted_by = $3, blacklisted_at = $4
            WHERE domain_name = $1
            "#,
        )
        .bind(domain_name)
        .bind(reason)
        .bind(actor)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(old_status)
    }

    async fn lift_blacklist_once(
        &self,
        domain_name: &str,
        now: DateTime<Utc>,
    ) -> Result<DomainStatus, RegistryError> {
        let mut tx = self.pool.begin().await?;
        let old_status = Self::lock_or_create_row(&mut tx, domain_name, now).await?;

        sqlx::query(
            r#"
            UPDATE domain
            SET status = 'ACTIVE', blacklist_reason = NULL, blacklisted_by = NULL, blacklisted_at = NULL
            WHERE domain_name = $1
            "#,
        )
        .bind(domain_name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(old_status)
    }

    async fn mark_no_funds_once(
        &self,
        domain_name: &str,
        reason: &str,
        revisit_after: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<DomainStatus, RegistryError> {
        let mut tx = self.pool.begin().await?;
        let old_status = Self::lock_or_create_row(&mut tx, domain_name, now).await?;

        sqlx::query(
            r#"
            UPDATE domain
            SET status = 'NO_FUNDS_CURRENT_YEAR', no_funds_reason = $2, revisit_after = $3
            WHERE domain_name = $1
            "#,
        )
        .bind(domain_name)
        .bind(reason)
        .bind(revisit_after)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(old_status)
    }
}

/// Cool-down and failure-backoff checks for a domain that is (or just
/// became) ACTIVE.
pub(crate) fn active_checks(domain: &Domain, cooldown: Duration, now: DateTime<Utc>) -> CheckResult {
    if let (Some(locked_by), Some(expires)) = (&domain.locked_by, domain.lock_expires_at) {
        if now < expires {
            return CheckResult::SkipProcessing {
                locked_by: locked_by.clone(),
            };
        }
    }
    if let Some(next_retry) = domain.next_retry_at {
        if now < next_retry {
            return CheckResult::SkipRecent { until: next_retry };
        }
    }
    if let Some(last) = domain.last_processed_at {
        let until = last + cooldown;
        if now < until {
            return CheckResult::SkipRecent { until };
        }
    }
    CheckResult::Ok
}

/// Exponential per-domain backoff: 6h, 12h, 24h, 48h, capped at 96h.
pub(crate) fn failure_backoff(failure_count: i32) -> Duration {
    let exponent = (failure_count - 1).clamp(0, 4) as u32;
    Duration::hours(FAILURE_RETRY_BASE_HOURS << exponent)
}

#[async_trait]
impl DomainRegistry for PgDomainRegistry {
    async fn should_process(
        &self,
        domain_name: &str,
        now: DateTime<Utc>,
    ) -> Result<CheckResult, RegistryError> {
        let name = normalize_domain_name(domain_name);
        with_retries("should_process", || {
            self.bounded(self.should_process_once(&name, now))
        })
        .await
    }

    async fn register_or_get(
        &self,
        domain_name: &str,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Domain, RegistryError> {
        let name = normalize_domain_name(domain_name);
        let domain = with_retries("register_or_get", || {
            self.bounded(self.register_or_get_once(&name, now))
        })
        .await?;
        debug!(domain = %domain.domain_name, %session_id, count = domain.discovery_count, "Domain registered");
        Ok(domain)
    }

    async fn acquire_processing_lock(
        &self,
        domain_id: Uuid,
        worker_id: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<bool, RegistryError> {
        let expires = now + ttl;
        with_retries("acquire_processing_lock", || {
            self.bounded(self.acquire_lock_once(domain_id, worker_id, expires, now))
        })
        .await
    }

    async fn release_processing_lock(
        &self,
        domain_id: Uuid,
        worker_id: &str,
    ) -> Result<(), RegistryError> {
        let result = sqlx::query(
            "UPDATE domain SET locked_by = NULL, lock_expires_at = NULL
             WHERE id = $1 AND locked_by = $2",
        )
        .bind(domain_id)
        .bind(worker_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(%domain_id, worker_id, "Lock already released or taken over after lease expiry");
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
        with_retries("record_processing", || {
            self.bounded(self.record_processing_once(
                domain_id,
                session_id,
                candidate_id,
                outcome,
                confidence,
                now,
            ))
        })
        .await
    }

    async fn blacklist(
        &self,
        domain_name: &str,
        reason: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let name = normalize_domain_name(domain_name);
        let old_status = with_retries("blacklist", || {
            self.bounded(self.blacklist_once(&name, reason, actor, now))
        })
        .await?;

        self.events
            .publish_domain_status_changed(DomainStatusChanged {
                domain_name: name,
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
        let name = normalize_domain_name(domain_name);
        let old_status = with_retries("lift_blacklist", || {
            self.bounded(self.lift_blacklist_once(&name, now))
        })
        .await?;

        self.events
            .publish_domain_status_changed(DomainStatusChanged {
                domain_name: name,
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
        let name = normalize_domain_name(domain_name);
        let old_status = with_retries("mark_no_funds", || {
            self.bounded(self.mark_no_funds_once(&name, reason, revisit_after, now))
        })
        .await?;

        self.events
            .publish_domain_status_changed(DomainStatusChanged {
                domain_name: name,
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
        let status = sqlx::query_as::<_, (String,)>(
            "SELECT status FROM domain WHERE domain_name = $1",
        )
        .bind(&name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(matches!(status, Some((s,)) if s == DomainStatus::Blacklisted.as_str()))
    }
}

// ---------------------------------------------------------------------------
// PgCandidateStore
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_once(&self, id: Uuid, candidate: &NewCandidate) -> Result<(), RegistryError> {
        sqlx::query(
            r#"
            INSERT INTO funding_source_candidate
                (id, domain_id, discovery_session_id, source_url, organization_name,
                 description, confidence_score, status, discovered_at, discovered_by, raw_metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'SYSTEM', $10)
            "#,
        )
        .bind(id)
        .bind(candidate.domain_id)
        .bind(candidate.discovery_session_id)
        .bind(&candidate.source_url)
        .bind(&candidate.organization_name)
        .bind(&candidate.description)
        .bind(i16::from(candidate.confidence_score.hundredths()))
        .bind(candidate.status.as_str())
        .bind(candidate.discovered_at)
        .bind(&candidate.raw_metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn insert(&self, candidate: NewCandidate) -> Result<Candidate, RegistryError> {
        let id = Uuid::new_v4();
        with_retries("insert_candidate", || self.insert_once(id, &candidate)).await?;

        Ok(Candidate {
            id,
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
        })
    }
}

// ---------------------------------------------------------------------------
// PgSessionStore
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, session: &DiscoverySessionRow) -> Result<(), RegistryError> {
        sqlx::query(
            r#"
            INSERT INTO discovery_session (id, started_at, target_day_of_week, query_count)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session.id)
        .bind(session.started_at)
        .bind(&session.target_day_of_week)
        .bind(session.query_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn finalize(
        &self,
        session_id: Uuid,
        completed_at: DateTime<Utc>,
        totals: SessionTotals,
    ) -> Result<(), RegistryError> {
        sqlx::query(
            r#"
            UPDATE discovery_session
            SET completed_at = $2,
                total_results = $3,
                spam_tld_filtered = $4,
                blacklisted_skipped = $5,
                duplicates_skipped = $6,
                high_confidence_created = $7,
                low_confidence_created = $8,
                invalid_urls_skipped = $9,
                failed_transient = $10
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .bind(completed_at)
        .bind(totals.total_results)
        .bind(totals.spam_tld_filtered)
        .bind(totals.blacklisted_skipped)
        .bind(totals.duplicates_skipped)
        .bind(totals.high_confidence_created)
        .bind(totals.low_confidence_created)
        .bind(totals.invalid_urls_skipped)
        .bind(totals.failed_transient)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

impl<'r> sqlx::FromRow<'r, PgRow> for Domain {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = DomainStatus::from_str(&status)
            .map_err(|e| sqlx::Error::Decode(e.to_string().into()))?;
        let best: Option<i16> = row.try_get("best_confidence_score")?;

        Ok(Domain {
            id: row.try_get("id")?,
            domain_name: row.try_get("domain_name")?,
            status,
            first_discovered_at: row.try_get("first_discovered_at")?,
            last_seen_at: row.try_get("last_seen_at")?,
            discovery_count: row.try_get("discovery_count")?,
            last_processed_at: row.try_get("last_processed_at")?,
            best_confidence_score: best.map(|h| Confidence::from_hundredths(h.clamp(0, 100) as u8)),
            high_quality_candidate_count: row.try_get("high_quality_candidate_count")?,
            low_quality_candidate_count: row.try_get("low_quality_candidate_count")?,
            blacklist_reason: row.try_get("blacklist_reason")?,
            blacklisted_by: row.try_get("blacklisted_by")?,
            blacklisted_at: row.try_get("blacklisted_at")?,
            no_funds_reason: row.try_get("no_funds_reason")?,
            revisit_after: row.try_get("revisit_after")?,
            failure_count: row.try_get("failure_count")?,
            next_retry_at: row.try_get("next_retry_at")?,
            locked_by: row.try_get("locked_by")?,
            lock_expires_at: row.try_get("lock_expires_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_domain(now: DateTime<Utc>) -> Domain {
        Domain {
            id: Uuid::new_v4(),
            domain_name: "example.org".to_string(),
            status: DomainStatus::Active,
            first_discovered_at: now,
            last_seen_at: now,
            discovery_count: 1,
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

    #[test]
    fn failure_backoff_doubles_and_caps() {
        assert_eq!(failure_backoff(1), Duration::hours(6));
        assert_eq!(failure_backoff(2), Duration::hours(12));
        assert_eq!(failure_backoff(3), Duration::hours(24));
        assert_eq!(failure_backoff(5), Duration::hours(96));
        assert_eq!(failure_backoff(12), Duration::hours(96), "capped");
    }

    #[test]
    fn active_checks_prefers_live_lock_over_cooldown() {
        let now = Utc::now();
        let mut domain = active_domain(now);
        domain.last_processed_at = Some(now - Duration::minutes(5));
        domain.locked_by = Some("worker-1".to_string());
        domain.lock_expires_at = Some(now + Duration::minutes(30));
        assert_eq!(
            active_checks(&domain, Duration::hours(24), now),
            CheckResult::SkipProcessing {
                locked_by: "worker-1".to_string()
            }
        );
    }

    #[test]
    fn active_checks_ignores_expired_lock() {
        let now = Utc::now();
        let mut domain = active_domain(now);
        domain.locked_by = Some("worker-1".to_string());
        domain.lock_expires_at = Some(now - Duration::seconds(1));
        assert_eq!(active_checks(&domain, Duration::hours(24), now), CheckResult::Ok);
    }

    #[test]
    fn active_checks_enforces_cooldown_boundary() {
        let now = Utc::now();
        let cooldown = Duration::hours(24);
        let mut domain = active_domain(now);

        domain.last_processed_at = Some(now - Duration::hours(23));
        assert!(matches!(
            active_checks(&domain, cooldown, now),
            CheckResult::SkipRecent { .. }
        ));

        domain.last_processed_at = Some(now - cooldown);
        assert_eq!(active_checks(&domain, cooldown, now), CheckResult::Ok);
    }

    #[test]
    fn active_checks_honors_next_retry_at() {
        let now = Utc::now();
        let mut domain = active_domain(now);
        domain.next_retry_at = Some(now + Duration::hours(2));
        assert!(matches!(
            active_checks(&domain, Duration::hours(24), now),
            CheckResult::SkipRecent { .. }
        ));
    }
}
