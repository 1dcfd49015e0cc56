//! Error types surfaced to callers of the authenticated client

/// Terminal outcome of one client call.
///
/// `SessionExpired` is the only variant that reflects global session state;
/// every other variant is local to the request that produced it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("access forbidden")]
    Forbidden,

    #[error("resource not found")]
    NotFound,

    #[error("server error (HTTP {status})")]
    Server { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("session expired")]
    SessionExpired,

    /// 401 on a request that never carried session credentials (bad login).
    #[error("unauthorized")]
    Unauthorized,

    #[error("request failed (HTTP {status}): {message}")]
    Unexpected {
        status: u16,
        message: String,
        payload: serde_json::Value,
    },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error(transparent)]
    Transport(#[from] transport::Error),

    #[error(transparent)]
    Storage(#[from] mail_auth::Error),
}

impl Error {
    /// Build `Unexpected` from a status and its decoded error body.
    ///
    /// Uses the body's `message` field when present.
    pub fn unexpected(status: u16, payload: serde_json::Value) -> Self {
        let message = payload
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .unwrap_or("request failed")
            .to_string();
        Error::Unexpected {
            status,
            message,
            payload,
        }
    }

    /// The single notification a user should see for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Error::Forbidden => "You do not have permission to access this resource".into(),
            Error::NotFound => "The requested resource does not exist".into(),
            Error::Server { .. } => "Server error".into(),
            Error::Network(_) => "Network connection failed".into(),
            Error::SessionExpired => "Login expired, please log in again".into(),
            Error::Unauthorized => "Invalid username or password".into(),
            Error::Unexpected { message, .. } => message.clone(),
            Error::Decode(_) => "Unexpected response from server".into(),
            Error::Transport(_) => "Request could not be sent".into(),
            Error::Storage(_) => "Session could not be saved".into(),
        }
    }

    /// Metric label for this failure kind.
    pub fn label(&self) -> &'static str {
        match self {
            Error::Forbidden => "forbidden",
            Error::NotFound => "not_found",
            Error::Server { .. } => "server_error",
            Error::Network(_) => "network_error",
            Error::SessionExpired => "session_expired",
            Error::Unauthorized => "unauthorized",
            Error::Unexpected { .. } => "other",
            Error::Decode(_) => "decode_error",
            Error::Transport(_) => "invalid_request",
            Error::Storage(_) => "storage_error",
        }
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
