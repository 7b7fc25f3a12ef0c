//! Geographic-relevance sub-judge: does the metadata point at the request's
//! scope? Direct mentions beat membership mentions (a country inside the
//! requested region or bloc, or the parents of a requested country).

use fundscout_common::{host_tld, Country, GeoScope};

use crate::judge::term_match;

const DIRECT: f64 = 1.0;
const MEMBERSHIP: f64 = 0.6;
const UNRELATED: f64 = 0.15;

/// ccTLD that counts as a direct signal for a country scope.
fn country_tld(country: Country) -> Option<&'static str> {
    match country {
        Country::Bulgaria => Some("bg"),
        Country::Romania => Some("ro"),
        Country::Greece => Some("gr"),
        Country::Serbia => Some("rs"),
        Country::NorthMacedonia => Some("mk"),
        Country::Croatia => Some("hr"),
        Country::Germany => Some("de"),
        Country::France => Some("fr"),
        Country::Netherlands => Some("nl"),
        Country::Poland => Some("pl"),
        Country::UnitedKingdom => Some("uk"),
        Country::UnitedStates => None,
    }
}

/// `text` and `host` must already be lowercased; host normalized.
pub(crate) fn score(text: &str, host: &str, scope: GeoScope) -> f64 {
    let direct_by_text = scope.mention_terms().iter().any(|t| term_match(text, t));
    let direct_by_host = match scope {
        GeoScope::Country(country) => country_tld(country)
            .map(|tld| host_tld(host) == Some(tld))
            .unwrap_or(false),
        _ => false,
    };
    if direct_by_text || direct_by_host {
        return DIRECT;
    }

    if scope.membership_terms().iter().any(|t| term_match(text, t)) {
        return MEMBERSHIP;
    }

    UNRELATED
}
