//! Organization-type sub-judge: detect funder-type indicators and align
//! them with the request's optional funder type.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use fundscout_common::FunderType;

const INDICATORS: &[(&str, FunderType)] = &[
    ("foundation", FunderType::PrivateFoundation),
    ("charitable trust", FunderType::PrivateFoundation),
    ("philanthropy", FunderType::PrivateFoundation),
    ("community foundation", FunderType::CommunityFoundation),
    ("community fund", FunderType::CommunityFoundation),
    ("ministry", FunderType::Government),
    ("government", FunderType::Government),
    ("national agency", FunderType::Government),
    ("municipality", FunderType::Government),
    ("european commission", FunderType::Multilateral),
    ("commission", FunderType::Multilateral),
    ("european union", FunderType::Multilateral),
    ("united nations", FunderType::Multilateral),
    ("unesco", FunderType::Multilateral),
    ("unicef", FunderType::Multilateral),
    ("world bank", FunderType::DevelopmentBank),
    ("development bank", FunderType::DevelopmentBank),
    ("investment bank", FunderType::DevelopmentBank),
    ("embassy", FunderType::BilateralDonor),
    ("usaid", FunderType::BilateralDonor),
    ("development cooperation", FunderType::BilateralDonor),
    ("corporate social responsibility", FunderType::CorporateCsr),
    ("csr", FunderType::CorporateCsr),
    ("ngo", FunderType::Ngo),
    ("nonprofit", FunderType::Ngo),
    ("non-profit", FunderType::Ngo),
    ("civil society", FunderType::Ngo),
];

static INDICATOR_RES: LazyLock<Vec<(Regex, FunderType)>> = LazyLock::new(|| {
    INDICATORS
        .iter()
        .map(|(term, funder)| {
            (
                Regex::new(&format!(r"\b{}\b", regex::escape(term))).unwrap(),
                *funder,
            )
        })
        .collect()
});

const NO_INDICATOR: f64 = 0.3;
const DETECTED: f64 = 0.7;
const ALIGNED: f64 = 1.0;
const MISALIGNED: f64 = 0.5;

/// `text` must already be lowercased.
pub(crate) fn score(text: &str, requested: Option<FunderType>) -> f64 {
    let detected: BTreeSet<FunderType> = INDICATOR_RES
        .iter()
        .filter(|(re, _)| re.is_match(text))
        .map(|(_, funder)| *funder)
        .collect();

    match (detected.is_empty(), requested) {
        (true, _) => NO_INDICATOR,
        (false, None) => DETECTED,
        (false, Some(funder)) if detected.contains(&funder) => ALIGNED,
        (false, Some(_)) => MISALIGNED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_indicator_scores_full() {
        assert_eq!(
            score("the america for bulgaria foundation", Some(FunderType::PrivateFoundation)),
            ALIGNED
        );
    }

    #[test]
    fn misaligned_indicator_scores_half() {
        assert_eq!(
            score("ministry of education announces program", Some(FunderType::PrivateFoundation)),
            MISALIGNED
        );
    }

    #[test]
    fn indicator_without_request_is_positive() {
        assert_eq!(score("grants by the open society foundation", None), DETECTED);
    }

    #[test]
    fn no_indicator_is_neutral_low() {
        assert_eq!(score("free money for everyone", None), NO_INDICATOR);
        assert_eq!(score("free money", Some(FunderType::Government)), NO_INDICATOR);
    }
}
