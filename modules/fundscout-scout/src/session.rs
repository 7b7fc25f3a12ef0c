//! Discovery session orchestration: plan → generate → fan out → pipeline,
//! bounded by a cancellation flag and a soft wall-clock deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use fundscout_common::DiscoveryConfig;
use fundscout_events::EventPublisher;
use fundscout_registry::{
    CandidateStore, DiscoverySessionRow, DomainRegistry, SessionStore, SessionTotals,
};

use crate::fanout::{QueryJob, SearchFanout};
use crate::judge::Judge;
use crate::pipeline::stats::ProcessingStatistics;
use crate::pipeline::CandidatePipeline;
use crate::planner::TaxonomyBatchPlanner;
use crate::query_gen::QueryGenerator;

/// Capacity of the fan-out → pipeline channel. Bounded so a slow registry
/// backpressures the fan-out instead of buffering unboundedly.
const RESULT_CHANNEL_CAPACITY: usize = 64;

/// Cooperative stop signal for one session. Workers finish their current
/// result and exit; partial statistics are still emitted.
#[derive(Debug, Default)]
pub struct SessionControl {
    cancelled: AtomicBool,
    deadline: Mutex<Option<DateTime<Utc>>>,
}

impl SessionControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Arm the soft wall-clock deadline. Called once at session start.
    pub fn arm_deadline(&self, deadline: DateTime<Utc>) {
        *self.deadline.lock().unwrap() = Some(deadline);
    }

    pub fn should_stop(&self, now: DateTime<Utc>) -> bool {
        if self.is_cancelled() {
            return true;
        }
        matches!(*self.deadline.lock().unwrap(), Some(deadline) if now >= deadline)
    }
}

/// The assembled discovery core. All collaborators arrive through the
/// constructor; nothing global.
pub struct Scout {
    planner: TaxonomyBatchPlanner,
    generator: QueryGenerator,
    fanout: SearchFanout,
    registry: Arc<dyn DomainRegistry>,
    candidates: Arc<dyn CandidateStore>,
    sessions: Arc<dyn SessionStore>,
    events: Arc<dyn EventPublisher>,
    judge: Arc<dyn Judge>,
    config: DiscoveryConfig,
}

impl Scout {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        planner: TaxonomyBatchPlanner,
        generator: QueryGenerator,
        fanout: SearchFanout,
        registry: Arc<dyn DomainRegistry>,
        candidates: Arc<dyn CandidateStore>,
        sessions: Arc<dyn SessionStore>,
        events: Arc<dyn EventPublisher>,
        judge: Arc<dyn Judge>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            planner,
            generator,
            fanout,
            registry,
            candidates,
            sessions,
            events,
            judge,
            config,
        }
    }

    /// Run one nightly discovery session for `date`.
    pub async fn run(
        &self,
        date: NaiveDate,
        control: Arc<SessionControl>,
    ) -> Result<ProcessingStatistics> {
        let session_id = Uuid::new_v4();
        let started_at = Utc::now();
        control.arm_deadline(started_at + self.config.session_deadline);

        let requests = self.planner.plan_daily_batch(date);
        info!(
            %session_id,
            %date,
            requests = requests.len(),
            "Discovery session starting"
        );

        self.sessions
            .create(&DiscoverySessionRow {
                id: session_id,
                started_at,
                completed_at: None,
                target_day_of_week: format!("{:?}", date.weekday()),
                query_count: requests.len() as i32,
                totals: SessionTotals::default(),
            })
            .await?;

        // Expand each request into concrete queries. The generator never
        // fails; a dead LLM degrades to templates.
        let mut jobs = Vec::new();
        for request in requests {
            if control.should_stop(Utc::now()) {
                info!("Stopping query generation early");
                break;
            }
            let request = Arc::new(request);
            for query in self.generator.generate(&request).await {
                jobs.push(QueryJob {
                    request: Arc::clone(&request),
                    query,
                });
            }
        }
        info!(queries = jobs.len(), "Query batch generated");

        let pipeline = CandidatePipeline::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.candidates),
            Arc::clone(&self.events),
            Arc::clone(&self.judge),
            self.config.clone(),
            session_id,
        );

        let (tx, rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        let (fanout_stats, stats) = tokio::join!(
            self.fanout.execute(jobs, tx, &control),
            pipeline.run(rx, &control),
        );

        let completed_at = Utc::now();
        if let Err(e) = self
            .sessions
            .finalize(session_id, completed_at, stats.to_totals())
            .await
        {
            warn!(%session_id, error = %e, "Failed to finalize session row");
        }

        if control.is_cancelled() {
            info!(%session_id, "Session cancelled; partial statistics emitted");
        }
        info!(%session_id, "{stats}");
        info!(%session_id, "Backend health:\n{fanout_stats}");

        Ok(stats)
    }
}
