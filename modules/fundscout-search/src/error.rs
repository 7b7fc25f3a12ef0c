use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("search timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl SearchError {
    /// Transient errors are retried by the fan-out; the rest indicate a
    /// misconfigured backend (bad key, bad request) and are only logged.
    pub fn is_transient(&self) -> bool {
        match self {
            SearchError::Http(_) | SearchError::Timeout(_) => true,
            SearchError::Api { status, .. } => *status == 429 || *status >= 500,
        }
    }
}
