//! Error types for request building and transport failures

/// Errors building a request before it reaches the wire.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// Result alias for request building.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to obtain any response from the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP transport error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Http(err.to_string())
        }
    }
}
