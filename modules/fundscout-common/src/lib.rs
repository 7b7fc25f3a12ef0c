pub mod config;
pub mod error;
pub mod taxonomy;
pub mod types;

pub use config::{spam_tld_set, Config, DiscoveryConfig, JudgeWeights};
pub use error::FundscoutError;
pub use taxonomy::*;
pub use types::*;

/// Extract and normalize the host of a URL: lowercase, one leading `www.`
/// stripped. Returns `None` when the URL does not parse to an absolute form
/// with a host. Subdomains are preserved — `erasmus-plus.ec.europa.eu` and
/// `ec.europa.eu` are distinct domains.
///
/// ```
/// assert_eq!(
///     fundscout_common::normalize_host("https://WWW.Example.ORG/grants"),
///     Some("example.org".to_string())
/// );
/// assert_eq!(fundscout_common::normalize_host("not a url"), None);
/// ```
pub fn normalize_host(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    if host.is_empty() {
        return None;
    }
    Some(host)
}

/// Normalize a bare domain name the same way [`normalize_host`] normalizes
/// a URL host: lowercase, one leading `www.` stripped.
pub fn normalize_domain_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    lower.strip_prefix("www.").unwrap_or(&lower).to_string()
}

/// The top-level domain of a normalized host, without the dot.
/// `example.org` → `org`; single-label hosts return `None`.
pub fn host_tld(host: &str) -> Option<&str> {
    let (_, tld) = host.rsplit_once('.')?;
    if tld.is_empty() {
        None
    } else {
        Some(tld)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_host_keeps_subdomains() {
        assert_eq!(
            normalize_host("https://erasmus-plus.ec.europa.eu/calls"),
            Some("erasmus-plus.ec.europa.eu".to_string())
        );
    }

    #[test]
    fn normalize_host_strips_single_www() {
        assert_eq!(
            normalize_host("http://www.www-archive.example.com"),
            Some("www-archive.example.com".to_string())
        );
    }

    #[test]
    fn normalize_host_rejects_hostless_urls() {
        assert_eq!(normalize_host("mailto:grants@example.org"), None);
        assert_eq!(normalize_host("/relative/path"), None);
    }

    #[test]
    fn host_tld_extraction() {
        assert_eq!(host_tld("free-money-now.xyz"), Some("xyz"));
        assert_eq!(host_tld("ec.europa.eu"), Some("eu"));
        assert_eq!(host_tld("localhost"), None);
    }
}
