use thiserror::Error;

/// Failures reported by the persistence layer. Callers match on the kind;
/// only `Storage`, `Pool` and `PasswordHash` are unexpected.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no matching record found")]
    NoRecord,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("duplicate email")]
    DuplicateEmail,

    #[error("expiry of {0} days is out of range")]
    ExpiryOutOfRange(i64),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(String),
}
