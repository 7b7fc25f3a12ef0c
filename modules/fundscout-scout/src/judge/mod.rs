//! MetadataJudge — confidence scoring from search metadata alone.
//!
//! Four sub-judges (funding vocabulary, domain credibility, geographic
//! relevance, organization type) each produce 0.0..=1.0; the composite is
//! their weighted mean, rounded half-up to scale 2. No network I/O; all
//! judge tables are compile-time data, so the same input always yields the
//! same score.

pub mod credibility;
pub mod funding;
pub mod geo;
pub mod org_type;

use std::collections::BTreeSet;

use regex::Regex;

use fundscout_common::{normalize_host, Confidence, JudgeWeights, QueryRequest, SearchResult};

/// The scoring surface the pipeline depends on. A trait seam so tests can
/// verify the spam gate short-circuits scoring.
pub trait Judge: Send + Sync {
    /// Hard gate: true if the host's TLD is on the spam denylist.
    fn is_spam_tld(&self, host: &str) -> bool;

    /// Composite confidence for a result, judged against its originating
    /// request.
    fn score(&self, result: &SearchResult, request: &QueryRequest) -> Confidence;
}

/// Whole-word match for a term that may contain spaces. Both sides are
/// expected lowercase.
pub(crate) fn term_match(text: &str, term: &str) -> bool {
    let pattern = format!(r"\b{}\b", regex::escape(term));
    Regex::new(&pattern).unwrap().is_match(text)
}

pub struct MetadataJudge {
    weights: JudgeWeights,
    spam_tlds: BTreeSet<String>,
}

impl MetadataJudge {
    pub fn new(weights: JudgeWeights, spam_tlds: BTreeSet<String>) -> Self {
        Self { weights, spam_tlds }
    }
}

impl Judge for MetadataJudge {
    fn is_spam_tld(&self, host: &str) -> bool {
        credibility::is_spam_tld(host, &self.spam_tlds)
    }

    fn score(&self, result: &SearchResult, request: &QueryRequest) -> Confidence {
        let host = normalize_host(&result.url).unwrap_or_default();
        let text = result.metadata_text().to_lowercase();

        let funding = funding::score(&text);
        let credibility = credibility::score(&host, &self.spam_tlds);
        let geography = geo::score(&text, &host, request.geographic_scope);
        let organization = org_type::score(&text, request.funder_type);

        let weighted = funding * self.weights.funding
            + credibility * self.weights.credibility
            + geography * self.weights.geography
            + organization * self.weights.org_type;

        Confidence::from_f64(weighted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundscout_common::{
        spam_tld_set, Bloc, Country, FunderType, FundingCategory, GeoScope, SearchBackendKind,
    };

    fn judge() -> MetadataJudge {
        MetadataJudge::new(JudgeWeights::default(), spam_tld_set(&[".xyz", ".click", ".top"]))
    }

    fn result(url: &str, title: &str, description: &str) -> SearchResult {
        SearchResult {
            url: url.to_string(),
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            backend: SearchBackendKind::Serper,
            query: "test".to_string(),
            position: 1,
        }
    }

    fn eu_request() -> QueryRequest {
        QueryRequest::builder()
            .category(FundingCategory::ResearchGrants)
            .geographic_scope(GeoScope::Bloc(Bloc::EuropeanUnion))
            .backend(SearchBackendKind::Serper)
            .build()
    }

    #[test]
    fn institutional_funding_page_crosses_the_threshold() {
        let score = judge().score(
            &result(
                "https://ec.europa.eu/research/participants/horizon",
                "Horizon Europe funding opportunities",
                "research grants call for proposals",
            ),
            &eu_request(),
        );
        assert!(
            score >= Confidence::from_hundredths(60),
            "expected >= 0.60, got {score}"
        );
    }

    #[test]
    fn irrelevant_page_scores_below_threshold() {
        let score = judge().score(
            &result(
                "https://some-news-site.com/article",
                "Local sports roundup",
                "the weekend's matches reviewed",
            ),
            &eu_request(),
        );
        assert!(score < Confidence::from_hundredths(60), "got {score}");
    }

    #[test]
    fn scoring_is_deterministic() {
        let request = eu_request();
        let input = result(
            "https://americaforbulgaria.org/grants",
            "Education grants in Bulgaria",
            "foundation funding for schools, apply by the deadline",
        );
        let first = judge().score(&input, &request);
        for _ in 0..50 {
            assert_eq!(judge().score(&input, &request), first);
        }
    }

    #[test]
    fn scores_stay_in_unit_range_with_scale_two() {
        // A grid of pathological inputs; every score must be a valid
        // scale-2 confidence.
        let inputs = [
            result("https://a.xyz/x", "", ""),
            result("not a url at all", "grants", "grants"),
            result("https://mon.gov.bg/grants", "ГРАНТОВЕ", "стипендии и награди"),
            result(
                "https://x.org/y",
                &"grant ".repeat(200),
                &"scholarship funding award ".repeat(100),
            ),
            result("https://ec.europa.eu/", "Horizon", ""),
        ];
        let requests = [
            eu_request(),
            QueryRequest::builder()
                .category(FundingCategory::Scholarships)
                .geographic_scope(GeoScope::Country(Country::Bulgaria))
                .backend(SearchBackendKind::Tavily)
                .funder_type(FunderType::Government)
                .build(),
        ];
        for input in &inputs {
            for request in &requests {
                let score = judge().score(input, request);
                assert!(score >= Confidence::ZERO && score <= Confidence::MAX);
                // Scale 2 by construction: hundredths round-trip exactly.
                assert_eq!(
                    Confidence::from_hundredths(score.hundredths()),
                    score
                );
            }
        }
    }

    #[test]
    fn spam_gate_matches_credibility_tier() {
        let judge = judge();
        assert!(judge.is_spam_tld("free-money-now.xyz"));
        assert!(!judge.is_spam_tld("ec.europa.eu"));
    }

    #[test]
    fn custom_weights_shift_the_composite() {
        let spam = spam_tld_set(&[".xyz"]);
        let credibility_heavy = MetadataJudge::new(
            JudgeWeights {
                funding: 0.1,
                credibility: 0.7,
                geography: 0.1,
                org_type: 0.1,
            },
            spam.clone(),
        );
        let equal = MetadataJudge::new(JudgeWeights::default(), spam);

        let input = result("https://ec.europa.eu/x", "page with no funding words", "");
        let request = eu_request();
        assert!(
            credibility_heavy.score(&input, &request) > equal.score(&input, &request),
            "weighting credibility up must lift an institutional host with bare text"
        );
    }
}
