//! Domain-credibility sub-judge: tiered trust by TLD and host.

use std::collections::BTreeSet;

use fundscout_common::host_tld;

/// Established funders whose hosts outrank their generic TLD tier.
const TRUSTED_HOSTS: &[&str] = &[
    "americaforbulgaria.org",
    "opensocietyfoundations.org",
    "fordfoundation.org",
    "gatesfoundation.org",
    "tulipfoundation.net",
    "erstestiftung.org",
    "fulbright.bg",
    "daad.de",
];

/// Score assigned below every other tier when the TLD is on the spam list.
pub(crate) const SPAM_SCORE: f64 = 0.05;

/// Hard spam gate, exposed separately so the pipeline can short-circuit
/// before any scoring happens.
pub fn is_spam_tld(host: &str, spam_tlds: &BTreeSet<String>) -> bool {
    host_tld(host).map(|tld| spam_tlds.contains(tld)).unwrap_or(false)
}

/// `host` must already be normalized (lowercase, no `www.`).
pub(crate) fn score(host: &str, spam_tlds: &BTreeSet<String>) -> f64 {
    if host.is_empty() {
        return 0.0;
    }
    if is_spam_tld(host, spam_tlds) {
        return SPAM_SCORE;
    }

    // Institutional tier: government, education, treaty organizations.
    if host.ends_with(".gov")
        || host.ends_with(".edu")
        || host.ends_with(".int")
        || host.ends_with(".mil")
        || host.contains(".gov.")
        || host.contains(".edu.")
        || host.ends_with(".ac.uk")
        || host == "europa.eu"
        || host.ends_with(".europa.eu")
    {
        return 0.95;
    }

    if TRUSTED_HOSTS
        .iter()
        .any(|trusted| host == *trusted || host.ends_with(&format!(".{trusted}")))
    {
        return 0.75;
    }

    match host_tld(host) {
        Some("org") => 0.6,
        Some("eu") => 0.55,
        Some("com") | Some("net") | Some("info") => 0.5,
        _ => 0.4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundscout_common::spam_tld_set;

    fn spam() -> BTreeSet<String> {
        spam_tld_set(&[".xyz", ".click", ".top"])
    }

    #[test]
    fn spam_tld_gate_and_floor() {
        assert!(is_spam_tld("free-money-now.xyz", &spam()));
        assert!(!is_spam_tld("ec.europa.eu", &spam()));
        assert_eq!(score("free-money-now.xyz", &spam()), SPAM_SCORE);
    }

    #[test]
    fn institutional_hosts_rank_highest() {
        assert_eq!(score("ec.europa.eu", &spam()), 0.95);
        assert_eq!(score("grants.gov", &spam()), 0.95);
        assert_eq!(score("mon.gov.bg", &spam()), 0.95);
        assert_eq!(score("sofia.edu", &spam()), 0.95);
    }

    #[test]
    fn known_foundations_rank_above_generic_org() {
        assert_eq!(score("americaforbulgaria.org", &spam()), 0.75);
        assert!(score("americaforbulgaria.org", &spam()) > score("random-site.org", &spam()));
    }

    #[test]
    fn generic_tlds_are_neutral() {
        assert_eq!(score("random-site.org", &spam()), 0.6);
        assert_eq!(score("some-company.com", &spam()), 0.5);
        assert_eq!(score("odd-host.biz", &spam()), 0.4);
    }
}
