pub mod brave;
pub mod error;
pub mod serper;
pub mod tavily;
pub mod types;

pub use brave::BraveBackend;
pub use error::{Result, SearchError};
pub use serper::SerperBackend;
pub use tavily::TavilyBackend;

use async_trait::async_trait;

use fundscout_common::{SearchBackendKind, SearchResult};

/// A search backend behind one uniform capability: execute a query, return
/// normalized results. Errors surface through [`SearchError`]; the fan-out
/// decides what is transient.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn kind(&self) -> SearchBackendKind;

    /// Run one query. Results carry a non-empty URL, the originating query
    /// text and the backend identifier.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;
}
