use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

/// Bounded text generation: one prompt in, at most `max_results` trimmed,
/// non-empty lines out. Implementations must respect the timeout; callers
/// are expected to have a deterministic fallback for failures.
#[async_trait]
pub trait QueryWriter: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        max_results: usize,
        timeout: Duration,
    ) -> Result<Vec<String>>;
}
