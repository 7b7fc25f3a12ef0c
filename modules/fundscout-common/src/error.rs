use thiserror::Error;

#[derive(Error, Debug)]
pub enum FundscoutError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Search backend error: {0}")]
    Search(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Discovery session cancelled")]
    SessionCancelled,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
