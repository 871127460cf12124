pub mod enrichment;
pub mod identity;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Email is already registered")]
    EmailTaken,
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Credential hashing failed: {0}")]
    CredentialError(String),
    #[error("Store error: {0}")]
    StoreError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
