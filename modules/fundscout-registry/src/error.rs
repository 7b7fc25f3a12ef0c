use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    /// Retryable store failure: connection loss, pool exhaustion, timeout.
    #[error("transient store error: {0}")]
    Transient(String),

    /// Schema or uniqueness violation. A programmer error, never retried.
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("unknown domain: {0}")]
    UnknownDomain(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for RegistryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.constraint().is_some() => {
                RegistryError::Constraint(db.to_string())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => RegistryError::Transient(err.to_string()),
            _ => RegistryError::Other(err.into()),
        }
    }
}
