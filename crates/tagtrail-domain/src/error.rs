use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid ingest payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid tag ID: {0}")]
    InvalidTagId(String),

    #[error("Store error: {0}")]
    StoreError(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
