use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::Claude;
use fundscout_common::{Config, DiscoveryConfig};
use fundscout_events::EventStore;
use fundscout_registry::{PgCandidateStore, PgDomainRegistry, PgSessionStore};
use fundscout_scout::{
    MetadataJudge, QueryGenerator, Scout, SearchFanout, SessionControl, TaxonomyBatchPlanner,
};
use fundscout_search::{BraveBackend, SearchBackend, SerperBackend, TavilyBackend};

/// Nightly funding-source discovery run.
#[derive(Parser)]
struct Args {
    /// Plan the batch for this date instead of today (YYYY-MM-DD).
    /// Planning is deterministic, so re-running a date reproduces its batch.
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fundscout=info".parse()?))
        .init();

    let args = Args::parse();

    info!("Fundscout discovery starting...");

    let config = Config::from_env();
    config.log_redacted();
    let discovery = DiscoveryConfig::default();
    discovery.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&config.database_url)
        .await?;

    fundscout_registry::migrate(&pool).await?;
    EventStore::migrate(&pool).await?;

    let events = Arc::new(EventStore::new(pool.clone()));
    let registry = Arc::new(PgDomainRegistry::new(
        pool.clone(),
        events.clone(),
        discovery.recent_cooldown,
        discovery.registry_tx_timeout,
    ));
    let candidates = Arc::new(PgCandidateStore::new(pool.clone()));
    let sessions = Arc::new(PgSessionStore::new(pool));

    let mut backends: Vec<Arc<dyn SearchBackend>> = Vec::new();
    if !config.serper_api_key.is_empty() {
        backends.push(Arc::new(SerperBackend::new(config.serper_api_key.clone())));
    }
    if !config.tavily_api_key.is_empty() {
        backends.push(Arc::new(TavilyBackend::new(config.tavily_api_key.clone())));
    }
    if !config.brave_api_key.is_empty() {
        backends.push(Arc::new(BraveBackend::new(config.brave_api_key.clone())));
    }
    if backends.is_empty() {
        anyhow::bail!("No search backend configured; set at least one API key");
    }

    let llm = if config.llm_disabled {
        None
    } else {
        Some(Arc::new(Claude::new(&config.anthropic_api_key)) as Arc<dyn ai_client::QueryWriter>)
    };

    let scout = Scout::new(
        TaxonomyBatchPlanner::new(discovery.queries_per_night),
        QueryGenerator::new(llm, discovery.llm_timeout),
        SearchFanout::new(backends, &discovery),
        registry,
        candidates,
        sessions,
        events,
        Arc::new(MetadataJudge::new(
            discovery.judge_weights,
            discovery.spam_tlds.clone(),
        )),
        discovery,
    );

    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let control = Arc::new(SessionControl::new());

    let stats = scout.run(date, control).await?;

    info!("Discovery run complete. {stats}");
    Ok(())
}
