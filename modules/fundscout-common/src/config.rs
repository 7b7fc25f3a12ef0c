use std::collections::{BTreeSet, HashMap};
use std::env;
use std::time::Duration;

use crate::taxonomy::SearchBackendKind;
use crate::types::Confidence;
use crate::FundscoutError;

/// Process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres (domains, candidates, sessions, events)
    pub database_url: String,

    // AI provider
    pub anthropic_api_key: String,

    // Search backends
    pub serper_api_key: String,
    pub tavily_api_key: String,
    pub brave_api_key: String,

    /// Skip the LLM entirely and generate queries from templates.
    pub llm_disabled: bool,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        let llm_disabled = env::var("FUNDSCOUT_LLM_DISABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            database_url: required_env("DATABASE_URL"),
            anthropic_api_key: if llm_disabled {
                env::var("ANTHROPIC_API_KEY").unwrap_or_default()
            } else {
                required_env("ANTHROPIC_API_KEY")
            },
            serper_api_key: env::var("SERPER_API_KEY").unwrap_or_default(),
            tavily_api_key: env::var("TAVILY_API_KEY").unwrap_or_default(),
            brave_api_key: env::var("BRAVE_API_KEY").unwrap_or_default(),
            llm_disabled,
        }
    }

    /// Log the presence of each sensitive env var without leaking values.
    pub fn log_redacted(&self) {
        let vars = [
            ("DATABASE_URL", &self.database_url),
            ("ANTHROPIC_API_KEY", &self.anthropic_api_key),
            ("SERPER_API_KEY", &self.serper_api_key),
            ("TAVILY_API_KEY", &self.tavily_api_key),
            ("BRAVE_API_KEY", &self.brave_api_key),
        ];
        for (name, value) in vars {
            if value.is_empty() {
                tracing::info!("{name} = (empty)");
            } else {
                tracing::info!("{name} = ({} chars)", value.len());
            }
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

// ============================================================================
// Discovery tunables
// ============================================================================

/// Relative weight of each metadata sub-judge. Must sum to 1.00.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgeWeights {
    pub funding: f64,
    pub credibility: f64,
    pub geography: f64,
    pub org_type: f64,
}

impl Default for JudgeWeights {
    fn default() -> Self {
        Self {
            funding: 0.25,
            credibility: 0.25,
            geography: 0.25,
            org_type: 0.25,
        }
    }
}

impl JudgeWeights {
    pub fn sum(&self) -> f64 {
        self.funding + self.credibility + self.geography + self.org_type
    }
}

/// Tunables for one discovery session. Defaults match the nightly production
/// profile; tests override individual fields.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Batch size cap for the planner.
    pub queries_per_night: usize,
    /// Inclusive candidate-creation threshold.
    pub confidence_threshold: Confidence,
    /// A domain processed more recently than this is skipped.
    pub recent_cooldown: chrono::Duration,
    /// Absolute lease duration for processing locks.
    pub lock_ttl: chrono::Duration,
    /// TLDs (without the leading dot) that short-circuit to a spam skip.
    pub spam_tlds: BTreeSet<String>,
    /// Concurrent in-flight searches allowed per backend.
    pub per_backend_concurrency: HashMap<SearchBackendKind, usize>,
    /// Concurrent in-flight searches across all backends.
    pub fanout_concurrency: usize,
    /// Pipeline worker pool size.
    pub worker_count: usize,
    /// Results requested per search query.
    pub results_per_query: usize,
    pub per_query_timeout: Duration,
    pub llm_timeout: Duration,
    pub registry_tx_timeout: Duration,
    pub judge_weights: JudgeWeights,
    /// Persist below-threshold results as audit candidates instead of
    /// only counting them.
    pub persist_low_confidence: bool,
    /// Soft wall-clock deadline for a session.
    pub session_deadline: chrono::Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            queries_per_night: 20,
            confidence_threshold: Confidence::from_hundredths(60),
            recent_cooldown: chrono::Duration::hours(24),
            lock_ttl: chrono::Duration::hours(1),
            spam_tlds: spam_tld_set(&[".xyz", ".click", ".top", ".loan", ".win", ".bid"]),
            per_backend_concurrency: HashMap::from([
                (SearchBackendKind::Serper, 4),
                (SearchBackendKind::Tavily, 2),
                (SearchBackendKind::Brave, 4),
            ]),
            fanout_concurrency: 8,
            worker_count: 4,
            results_per_query: 10,
            per_query_timeout: Duration::from_secs(30),
            llm_timeout: Duration::from_secs(20),
            registry_tx_timeout: Duration::from_secs(10),
            judge_weights: JudgeWeights::default(),
            persist_low_confidence: false,
            session_deadline: chrono::Duration::hours(4),
        }
    }
}

impl DiscoveryConfig {
    pub fn validate(&self) -> Result<(), FundscoutError> {
        if self.queries_per_night == 0 {
            return Err(FundscoutError::Config(
                "queries_per_night must be positive".to_string(),
            ));
        }
        if self.worker_count == 0 || self.fanout_concurrency == 0 {
            return Err(FundscoutError::Config(
                "worker_count and fanout_concurrency must be positive".to_string(),
            ));
        }
        let sum = self.judge_weights.sum();
        if (sum - 1.0).abs() > 0.005 {
            return Err(FundscoutError::Config(format!(
                "judge weights must sum to 1.00, got {sum:.2}"
            )));
        }
        Ok(())
    }

    /// Concurrency cap for one backend, defaulting conservatively.
    pub fn backend_concurrency(&self, backend: SearchBackendKind) -> usize {
        self.per_backend_concurrency
            .get(&backend)
            .copied()
            .unwrap_or(2)
    }
}

/// Normalize a spam-TLD policy list: lowercase, leading dot stripped.
pub fn spam_tld_set(tlds: &[&str]) -> BTreeSet<String> {
    tlds.iter()
        .map(|t| t.trim_start_matches('.').to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        DiscoveryConfig::default().validate().expect("valid defaults");
    }

    #[test]
    fn unbalanced_judge_weights_rejected() {
        let mut config = DiscoveryConfig::default();
        config.judge_weights.funding = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn spam_tld_set_strips_dots_and_case() {
        let set = spam_tld_set(&[".XYZ", "click"]);
        assert!(set.contains("xyz"));
        assert!(set.contains("click"));
    }
}
