//! Shared value types for the discovery pipeline.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::taxonomy::{
    Beneficiary, FunderType, FundingCategory, FundingMechanism, GeoScope, ProjectScale,
    RecipientType, SearchBackendKind, SearchLanguage,
};

// ============================================================================
// Confidence
// ============================================================================

/// A fixed-precision confidence score in 0.00..=1.00, scale 2.
///
/// Stored as hundredths so equality and ordering are exact. Constructed from
/// `f64` by rounding half away from zero (half-up for this non-negative
/// range); values outside the unit interval are clamped.
///
/// ```
/// use fundscout_common::Confidence;
/// assert_eq!(Confidence::from_f64(0.125).to_string(), "0.13");
/// assert_eq!(Confidence::from_f64(1.7), Confidence::MAX);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Confidence(u8);

impl Confidence {
    pub const ZERO: Confidence = Confidence(0);
    pub const MAX: Confidence = Confidence(100);

    /// Round half-up to scale 2, clamping into 0.00..=1.00.
    pub fn from_f64(value: f64) -> Self {
        let clamped = value.clamp(0.0, 1.0);
        Self((clamped * 100.0).round() as u8)
    }

    /// Exact construction from hundredths. Saturates at 1.00.
    pub fn from_hundredths(hundredths: u8) -> Self {
        Self(hundredths.min(100))
    }

    pub fn hundredths(&self) -> u8 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// QueryRequest
// ============================================================================

/// A fully-specified discovery intent, produced by the planner and immutable
/// afterwards. Category and geographic scope are always present; the optional
/// dimensions add keywords but never contradict the required ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct QueryRequest {
    pub category: FundingCategory,
    pub geographic_scope: GeoScope,
    pub backend: SearchBackendKind,
    #[builder(default = 3)]
    pub number_of_queries: usize,
    #[builder(default, setter(strip_option))]
    pub funder_type: Option<FunderType>,
    #[builder(default, setter(strip_option))]
    pub mechanism: Option<FundingMechanism>,
    #[builder(default, setter(strip_option))]
    pub project_scale: Option<ProjectScale>,
    #[builder(default)]
    pub beneficiaries: BTreeSet<Beneficiary>,
    #[builder(default, setter(strip_option))]
    pub recipient_type: Option<RecipientType>,
    #[builder(default, setter(strip_option))]
    pub user_language: Option<SearchLanguage>,
    #[builder(default)]
    pub search_languages: BTreeSet<SearchLanguage>,
}

// ============================================================================
// SearchResult
// ============================================================================

/// Normalized output of one search backend hit. Transient: lives only for
/// the duration of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub backend: SearchBackendKind,
    /// The query text that produced this result.
    pub query: String,
    /// 1-based position within the backend's result list.
    pub position: usize,
}

impl SearchResult {
    /// Title and description joined for keyword scanning.
    pub fn metadata_text(&self) -> String {
        let mut text = String::new();
        if let Some(title) = &self.title {
            text.push_str(title);
        }
        if let Some(description) = &self.description {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(description);
        }
        text
    }
}

// ============================================================================
// Lifecycle enums
// ============================================================================

/// Lifecycle status of a domain in the registry. Stored as text; the string
/// forms are part of the schema.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainStatus {
    Active,
    Blacklisted,
    NoFundsCurrentYear,
    Inactive,
}

impl DomainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Blacklisted => "BLACKLISTED",
            Self::NoFundsCurrentYear => "NO_FUNDS_CURRENT_YEAR",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl std::str::FromStr for DomainStatus {
    type Err = crate::FundscoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "BLACKLISTED" => Ok(Self::Blacklisted),
            "NO_FUNDS_CURRENT_YEAR" => Ok(Self::NoFundsCurrentYear),
            "INACTIVE" => Ok(Self::Inactive),
            other => Err(crate::FundscoutError::Validation(format!(
                "unknown domain status: {other}"
            ))),
        }
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of processing one search result, appended to the
/// per-domain processing log.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingOutcome {
    CandidateCreated,
    SkippedBlacklisted,
    SkippedRecent,
    SkippedDuplicateInSession,
    SkippedSpamTld,
    SkippedLowConfidence,
    SkippedInvalidUrl,
    FailedTransient,
}

impl ProcessingOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CandidateCreated => "CANDIDATE_CREATED",
            Self::SkippedBlacklisted => "SKIPPED_BLACKLISTED",
            Self::SkippedRecent => "SKIPPED_RECENT",
            Self::SkippedDuplicateInSession => "SKIPPED_DUPLICATE_IN_SESSION",
            Self::SkippedSpamTld => "SKIPPED_SPAM_TLD",
            Self::SkippedLowConfidence => "SKIPPED_LOW_CONFIDENCE",
            Self::SkippedInvalidUrl => "SKIPPED_INVALID_URL",
            Self::FailedTransient => "FAILED_TRANSIENT",
        }
    }
}

impl std::str::FromStr for ProcessingOutcome {
    type Err = crate::FundscoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CANDIDATE_CREATED" => Ok(Self::CandidateCreated),
            "SKIPPED_BLACKLISTED" => Ok(Self::SkippedBlacklisted),
            "SKIPPED_RECENT" => Ok(Self::SkippedRecent),
            "SKIPPED_DUPLICATE_IN_SESSION" => Ok(Self::SkippedDuplicateInSession),
            "SKIPPED_SPAM_TLD" => Ok(Self::SkippedSpamTld),
            "SKIPPED_LOW_CONFIDENCE" => Ok(Self::SkippedLowConfidence),
            "SKIPPED_INVALID_URL" => Ok(Self::SkippedInvalidUrl),
            "FAILED_TRANSIENT" => Ok(Self::FailedTransient),
            other => Err(crate::FundscoutError::Validation(format!(
                "unknown processing outcome: {other}"
            ))),
        }
    }
}

impl fmt::Display for ProcessingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate lifecycle status. The pipeline only ever writes the first two;
/// downstream stages own the rest of the lifecycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStatus {
    PendingCrawl,
    SkippedLowConfidence,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingCrawl => "PENDING_CRAWL",
            Self::SkippedLowConfidence => "SKIPPED_LOW_CONFIDENCE",
        }
    }
}

impl std::str::FromStr for CandidateStatus {
    type Err = crate::FundscoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_CRAWL" => Ok(Self::PendingCrawl),
            "SKIPPED_LOW_CONFIDENCE" => Ok(Self::SkippedLowConfidence),
            other => Err(crate::FundscoutError::Validation(format!(
                "unknown candidate status: {other}"
            ))),
        }
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Country;

    #[test]
    fn confidence_rounds_half_up() {
        assert_eq!(Confidence::from_f64(0.0), Confidence::ZERO);
        // 0.375 and 0.625 are exactly representable, so the half is exact.
        assert_eq!(Confidence::from_f64(0.375).hundredths(), 38);
        assert_eq!(Confidence::from_f64(0.625).hundredths(), 63);
        assert_eq!(Confidence::from_f64(0.601).hundredths(), 60);
        assert_eq!(Confidence::from_f64(1.0), Confidence::MAX);
    }

    #[test]
    fn confidence_clamps_out_of_range() {
        assert_eq!(Confidence::from_f64(-3.0), Confidence::ZERO);
        assert_eq!(Confidence::from_f64(17.0), Confidence::MAX);
    }

    #[test]
    fn confidence_display_has_scale_two() {
        assert_eq!(Confidence::from_hundredths(5).to_string(), "0.05");
        assert_eq!(Confidence::from_hundredths(60).to_string(), "0.60");
        assert_eq!(Confidence::MAX.to_string(), "1.00");
    }

    #[test]
    fn confidence_ordering_matches_value() {
        assert!(Confidence::from_f64(0.59) < Confidence::from_f64(0.60));
        assert!(Confidence::from_f64(0.60) >= Confidence::from_f64(0.60));
    }

    #[test]
    fn query_request_builder_defaults() {
        let request = QueryRequest::builder()
            .category(FundingCategory::StemEducation)
            .geographic_scope(GeoScope::Country(Country::Bulgaria))
            .backend(SearchBackendKind::Serper)
            .build();
        assert_eq!(request.number_of_queries, 3);
        assert!(request.funder_type.is_none());
        assert!(request.beneficiaries.is_empty());
    }

    #[test]
    fn metadata_text_joins_title_and_description() {
        let result = SearchResult {
            url: "https://example.org".to_string(),
            title: Some("Grants".to_string()),
            description: Some("open call".to_string()),
            backend: SearchBackendKind::Serper,
            query: "q".to_string(),
            position: 1,
        };
        assert_eq!(result.metadata_text(), "Grants open call");
    }
}
