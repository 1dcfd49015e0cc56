//! Error types for session and token operations

/// Errors from session storage and token endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token refresh failed: {0}")]
    Refresh(String),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("session storage error: {0}")]
    Storage(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
