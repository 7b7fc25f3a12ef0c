//! Funding-keyword sub-judge: does the metadata talk about money moving?

use std::sync::LazyLock;

use regex::Regex;

/// Vocabulary that names a funding instrument outright.
const STRONG_TERMS: &[&str] = &[
    "grant",
    "grants",
    "scholarship",
    "scholarships",
    "fellowship",
    "fellowships",
    "bursary",
    "bursaries",
    "call for proposals",
    "funding opportunity",
    "funding opportunities",
    "request for applications",
    "rfa",
    "tender",
    "tenders",
    "award",
    "awards",
];

/// Vocabulary that co-occurs with funding pages but is weaker on its own.
const SUPPORT_TERMS: &[&str] = &[
    "funding",
    "financial support",
    "financial aid",
    "stipend",
    "deadline",
    "eligibility",
    "apply",
    "applications open",
    "donor",
    "co-financing",
];

static STRONG_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    STRONG_TERMS
        .iter()
        .map(|t| Regex::new(&format!(r"\b{}\b", regex::escape(t))).unwrap())
        .collect()
});

static SUPPORT_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    SUPPORT_TERMS
        .iter()
        .map(|t| Regex::new(&format!(r"\b{}\b", regex::escape(t))).unwrap())
        .collect()
});

/// Weighted distinct-term matches, saturating at 1.0. `text` must already
/// be lowercased.
pub(crate) fn score(text: &str) -> f64 {
    let strong = STRONG_RES.iter().filter(|re| re.is_match(text)).count();
    let support = SUPPORT_RES.iter().filter(|re| re.is_match(text)).count();
    (strong as f64 * 0.35 + support as f64 * 0.15).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_funding_vocabulary_saturates() {
        let text = "research grants call for proposals funding opportunities";
        assert_eq!(score(text), 1.0);
    }

    #[test]
    fn single_weak_term_scores_low() {
        assert_eq!(score("application deadline for enrollment"), 0.15);
    }

    #[test]
    fn no_vocabulary_scores_zero() {
        assert_eq!(score("latest education news from the region"), 0.0);
    }

    #[test]
    fn word_boundaries_prevent_substring_hits() {
        // "migrant" must not count as "grant".
        assert_eq!(score("migrant workers in the region"), 0.0);
    }
}
