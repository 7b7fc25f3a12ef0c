//! End-to-end pipeline scenarios against in-memory stores: stage ordering,
//! deduplication, blacklisting, cool-down, statistics conservation.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use fundscout_common::{
    spam_tld_set, Bloc, Confidence, Country, DiscoveryConfig, FundingCategory, GeoScope,
    JudgeWeights, ProcessingOutcome, QueryRequest, SearchBackendKind,
};
use fundscout_events::testing::MemoryEventLog;
use fundscout_registry::memory::{MemoryCandidateStore, MemoryDomainRegistry};
use fundscout_registry::DomainRegistry;
use fundscout_scout::testing::{search_result, CountingJudge, FixedJudge};
use fundscout_scout::{CandidatePipeline, FanoutItem, Judge, MetadataJudge};

struct Harness {
    pipeline: CandidatePipeline,
    registry: Arc<MemoryDomainRegistry>,
    candidates: Arc<MemoryCandidateStore>,
    events: Arc<MemoryEventLog>,
    judge: Arc<CountingJudge>,
}

fn config() -> DiscoveryConfig {
    DiscoveryConfig {
        spam_tlds: spam_tld_set(&[".xyz", ".click", ".top"]),
        ..DiscoveryConfig::default()
    }
}

fn harness_with(config: DiscoveryConfig, inner_judge: Arc<dyn Judge>) -> Harness {
    let registry = Arc::new(MemoryDomainRegistry::new(config.recent_cooldown));
    let candidates = Arc::new(MemoryCandidateStore::new());
    let events = Arc::new(MemoryEventLog::default());
    let judge = Arc::new(CountingJudge::new(inner_judge));

    let pipeline = CandidatePipeline::new(
        registry.clone(),
        candidates.clone(),
        events.clone(),
        judge.clone(),
        config,
        Uuid::new_v4(),
    );

    Harness {
        pipeline,
        registry,
        candidates,
        events,
        judge,
    }
}

fn harness() -> Harness {
    let cfg = config();
    let judge = Arc::new(MetadataJudge::new(
        JudgeWeights::default(),
        cfg.spam_tlds.clone(),
    ));
    harness_with(cfg, judge)
}

fn eu_request() -> Arc<QueryRequest> {
    Arc::new(
        QueryRequest::builder()
            .category(FundingCategory::ResearchGrants)
            .geographic_scope(GeoScope::Bloc(Bloc::EuropeanUnion))
            .backend(SearchBackendKind::Serper)
            .build(),
    )
}

fn bulgaria_request() -> Arc<QueryRequest> {
    Arc::new(
        QueryRequest::builder()
            .category(FundingCategory::Scholarships)
            .geographic_scope(GeoScope::Country(Country::Bulgaria))
            .backend(SearchBackendKind::Serper)
            .build(),
    )
}

fn item(request: &Arc<QueryRequest>, url: &str, title: &str, description: &str) -> FanoutItem {
    FanoutItem {
        result: search_result(url, title, description),
        request: Arc::clone(request),
    }
}

#[tokio::test]
async fn scenario_mixed_batch() {
    let h = harness();
    let request = eu_request();
    let now = Utc::now();

    let outcome1 = h
        .pipeline
        .process(
            item(
                &request,
                "https://ec.europa.eu/research/participants/horizon",
                "Horizon Europe funding opportunities",
                "research grants call for proposals",
            ),
            now,
        )
        .await;
    let outcome2 = h
        .pipeline
        .process(
            item(
                &request,
                "https://ec.europa.eu/programmes/horizon",
                "Horizon programmes",
                "programme overview",
            ),
            now,
        )
        .await;
    let outcome3 = h
        .pipeline
        .process(
            item(&request, "https://free-money-now.xyz/claim", "Free money grants", ""),
            now,
        )
        .await;

    assert_eq!(outcome1, Some(ProcessingOutcome::CandidateCreated));
    assert_eq!(outcome2, Some(ProcessingOutcome::SkippedDuplicateInSession));
    assert_eq!(outcome3, Some(ProcessingOutcome::SkippedSpamTld));

    let created = h.candidates.all();
    assert_eq!(created.len(), 1);
    assert!(created[0].confidence_score >= Confidence::from_hundredths(60));
    assert_eq!(created[0].source_url, "https://ec.europa.eu/research/participants/horizon");

    // Spam was gated before scoring: only the two europa results were judged.
    assert_eq!(h.judge.score_calls(), 1, "only the first sighting is scored");

    let stats = h.pipeline.counters.snapshot();
    assert_eq!(stats.total_results, 3);
    assert_eq!(stats.high_confidence_created, 1);
    assert_eq!(stats.duplicates_skipped, 1);
    assert_eq!(stats.spam_tld_filtered, 1);

    // The candidate-created event went out with the right payload.
    let events = h.events.candidate_created.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].domain_name, "ec.europa.eu");
    assert_eq!(events[0].candidate_id, created[0].id);
}

#[tokio::test]
async fn scenario_blacklisted_domain_is_never_judged() {
    let h = harness();
    let now = Utc::now();
    h.registry
        .blacklist("scam-grants.com", "known scam network", "ops@fundscout", now)
        .await
        .unwrap();

    let outcome = h
        .pipeline
        .process(
            item(
                &eu_request(),
                "https://scam-grants.com/apply",
                "Apply for research grants today",
                "grants funding call for proposals",
            ),
            now,
        )
        .await;

    assert_eq!(outcome, Some(ProcessingOutcome::SkippedBlacklisted));
    assert_eq!(h.judge.score_calls(), 0, "blacklist check precedes scoring");
    assert!(h.candidates.all().is_empty());

    let stats = h.pipeline.counters.snapshot();
    assert_eq!(stats.blacklisted_skipped, 1);
}

#[tokio::test]
async fn scenario_cooldown_skips_without_touching_scores() {
    let h = harness();
    let now = Utc::now();
    let session = Uuid::new_v4();

    // Processed an hour ago with a recorded best score.
    let domain = h
        .registry
        .register_or_get("us-bulgaria.org", session, now - Duration::hours(1))
        .await
        .unwrap();
    h.registry
        .record_processing(
            domain.id,
            session,
            Some(Uuid::new_v4()),
            ProcessingOutcome::CandidateCreated,
            Some(Confidence::from_hundredths(80)),
            now - Duration::hours(1),
        )
        .await
        .unwrap();

    let outcome = h
        .pipeline
        .process(
            item(
                &bulgaria_request(),
                "https://us-bulgaria.org/grants",
                "Education grants Bulgaria",
                "foundation call for proposals scholarships",
            ),
            now,
        )
        .await;

    assert_eq!(outcome, Some(ProcessingOutcome::SkippedRecent));
    assert!(h.candidates.all().is_empty(), "no candidate inside the cool-down");

    let row = h.registry.get("us-bulgaria.org").unwrap();
    assert_eq!(row.best_confidence_score, Some(Confidence::from_hundredths(80)));
    assert_eq!(row.high_quality_candidate_count, 1, "counters unchanged by the skip");
}

#[tokio::test]
async fn scenario_no_funds_domain_revisited_after_deadline() {
    let h = harness();
    let now = Utc::now();
    h.registry
        .mark_no_funds(
            "local-foundation.bg",
            "no open calls this cycle",
            now - Duration::seconds(1),
            "ops@fundscout",
            now - Duration::days(30),
        )
        .await
        .unwrap();

    let outcome = h
        .pipeline
        .process(
            item(
                &bulgaria_request(),
                "https://local-foundation.bg/grants",
                "Education grants Bulgaria",
                "foundation call for proposals scholarships for students",
            ),
            now,
        )
        .await;

    assert_eq!(outcome, Some(ProcessingOutcome::CandidateCreated));
    assert_eq!(h.candidates.all().len(), 1);
}

#[tokio::test]
async fn scenario_concurrent_sighting_creates_exactly_one_candidate() {
    let h = harness();
    let request = bulgaria_request();
    let now = Utc::now();

    let worker = |path: &str| {
        h.pipeline.process(
            item(
                &request,
                &format!("https://new-foundation.org/{path}"),
                "New foundation grants Bulgaria",
                "scholarship funding call for proposals",
            ),
            now,
        )
    };

    let (a, b) = tokio::join!(worker("open-call"), worker("programs"));

    let outcomes = [a.unwrap(), b.unwrap()];
    assert!(outcomes.contains(&ProcessingOutcome::CandidateCreated));
    assert!(outcomes.contains(&ProcessingOutcome::SkippedDuplicateInSession));

    assert_eq!(h.candidates.all().len(), 1, "exactly one creation attempt wins");
    let row = h.registry.get("new-foundation.org").unwrap();
    assert_eq!(row.discovery_count, 2, "both sightings registered");
}

#[tokio::test]
async fn spam_gate_runs_before_session_dedup() {
    let h = harness();
    let request = eu_request();
    let now = Utc::now();

    // The same spam host twice: if the gate ran after the dedup insert, the
    // second sighting would surface as a duplicate.
    for _ in 0..2 {
        let outcome = h
            .pipeline
            .process(item(&request, "https://free-money-now.xyz/claim", "Free money", ""), now)
            .await;
        assert_eq!(outcome, Some(ProcessingOutcome::SkippedSpamTld));
    }

    let stats = h.pipeline.counters.snapshot();
    assert_eq!(stats.spam_tld_filtered, 2);
    assert_eq!(stats.duplicates_skipped, 0);
    assert!(h.registry.get("free-money-now.xyz").is_none(), "spam never registers");
}

#[tokio::test]
async fn session_dedup_runs_before_blacklist_check() {
    let h = harness();
    let now = Utc::now();
    h.registry
        .blacklist("scam-grants.com", "fraud", "ops", now)
        .await
        .unwrap();

    let first = h
        .pipeline
        .process(item(&eu_request(), "https://scam-grants.com/a", "Grants", ""), now)
        .await;
    let second = h
        .pipeline
        .process(item(&eu_request(), "https://scam-grants.com/b", "Grants", ""), now)
        .await;

    assert_eq!(first, Some(ProcessingOutcome::SkippedBlacklisted));
    assert_eq!(
        second,
        Some(ProcessingOutcome::SkippedDuplicateInSession),
        "the second sighting dedups before the blacklist read"
    );
}

#[tokio::test]
async fn invalid_urls_are_counted_and_skipped() {
    let h = harness();
    let outcome = h
        .pipeline
        .process(item(&eu_request(), "not a url at all", "Grants", ""), Utc::now())
        .await;

    assert_eq!(outcome, Some(ProcessingOutcome::SkippedInvalidUrl));
    let stats = h.pipeline.counters.snapshot();
    assert_eq!(stats.invalid_urls_skipped, 1);
    assert_eq!(stats.total_results, 1);
}

#[tokio::test]
async fn low_confidence_counter_increments_exactly_once_per_result() {
    // Regression guard: the low-confidence counter used to stay at zero.
    let cfg = config();
    let h = harness_with(cfg, Arc::new(FixedJudge::new(Confidence::from_hundredths(30))));
    let request = eu_request();
    let now = Utc::now();

    for host in ["a-foundation.org", "b-foundation.org", "c-foundation.org"] {
        let outcome = h
            .pipeline
            .process(item(&request, &format!("https://{host}/x"), "Thin page", ""), now)
            .await;
        assert_eq!(outcome, Some(ProcessingOutcome::SkippedLowConfidence));
    }

    let stats = h.pipeline.counters.snapshot();
    assert_eq!(stats.low_confidence_created, 3);
    assert_eq!(stats.high_confidence_created, 0);
    assert!(h.candidates.all().is_empty(), "audit rows are off by default");
}

#[tokio::test]
async fn low_confidence_audit_rows_when_configured() {
    let cfg = DiscoveryConfig {
        persist_low_confidence: true,
        ..config()
    };
    let h = harness_with(cfg, Arc::new(FixedJudge::new(Confidence::from_hundredths(42))));

    let outcome = h
        .pipeline
        .process(
            item(&eu_request(), "https://thin-page.org/x", "Thin page", ""),
            Utc::now(),
        )
        .await;
    assert_eq!(outcome, Some(ProcessingOutcome::SkippedLowConfidence));

    let rows = h.candidates.all();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].status,
        fundscout_common::CandidateStatus::SkippedLowConfidence
    );
    assert_eq!(rows[0].confidence_score, Confidence::from_hundredths(42));
}

#[tokio::test]
async fn each_domain_gets_one_creation_attempt_per_session() {
    let h = harness();
    let request = bulgaria_request();
    let now = Utc::now();

    let mut created = 0;
    let mut duplicates = 0;
    for i in 0..5 {
        let outcome = h
            .pipeline
            .process(
                item(
                    &request,
                    &format!("https://busy-foundation.org/page-{i}"),
                    "Foundation grants Bulgaria",
                    "scholarships call for proposals",
                ),
                now,
            )
            .await;
        match outcome {
            Some(ProcessingOutcome::CandidateCreated) => created += 1,
            Some(ProcessingOutcome::SkippedDuplicateInSession) => duplicates += 1,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(duplicates, 4);
    assert_eq!(h.candidates.all().len(), 1);
}

#[tokio::test]
async fn statistics_are_conserved_across_a_mixed_run() {
    let h = harness();
    let eu = eu_request();
    let bg = bulgaria_request();
    let now = Utc::now();

    let inputs = vec![
        item(&eu, "https://ec.europa.eu/research/horizon", "Horizon Europe funding opportunities", "research grants call for proposals"),
        item(&eu, "https://ec.europa.eu/other", "Duplicate host", ""),
        item(&eu, "https://free-money-now.xyz/claim", "Free money grants", ""),
        item(&eu, "::::", "Broken", ""),
        item(&bg, "https://quiet-news-site.com/story", "Local news roundup", "weather and traffic"),
        item(&bg, "https://local-foundation.bg/grants", "Education grants Bulgaria", "foundation scholarships call for proposals"),
    ];

    for input in inputs {
        h.pipeline.process(input, now).await;
    }

    let stats = h.pipeline.counters.snapshot();
    assert_eq!(stats.total_results, 6);
    assert_eq!(
        stats.total_processed(),
        stats.total_results,
        "every result reached exactly one terminal outcome"
    );
    assert_eq!(
        stats.total_candidates_created()
            + stats.spam_tld_filtered
            + stats.blacklisted_skipped
            + stats.duplicates_skipped
            + stats.invalid_urls_skipped,
        stats.total_results,
        "outcome counters partition the batch"
    );
}
