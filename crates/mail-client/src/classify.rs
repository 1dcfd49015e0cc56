//! Response classification
//!
//! Maps a transport result to one `Outcome`. Rules apply in order:
//!
//! 1. binary request with a 2xx response: `BinaryPassthrough`, body untouched
//! 2. no response at all: `NetworkError`
//! 3. 401: `AuthExpired`
//! 4. 403: `Forbidden`
//! 5. 404: `NotFound`
//! 6. 5xx: `ServerError`
//! 7. 2xx: `Success` with the decoded body
//! 8. anything else: `Other` with the decoded body
//!
//! A binary request that fails is classified by rules 2-8 like any other, so
//! an expired token on a download still goes through refresh.

use serde_json::Value;
use transport::{RawResponse, ResponseKind, TransportError};

/// Classification of a single attempt.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success(Value),
    BinaryPassthrough(RawResponse),
    AuthExpired,
    Forbidden,
    NotFound,
    ServerError(u16),
    NetworkError(String),
    Other { status: u16, payload: Value },
}

impl Outcome {
    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::BinaryPassthrough(_) => "binary",
            Outcome::AuthExpired => "auth_expired",
            Outcome::Forbidden => "forbidden",
            Outcome::NotFound => "not_found",
            Outcome::ServerError(_) => "server_error",
            Outcome::NetworkError(_) => "network_error",
            Outcome::Other { .. } => "other",
        }
    }
}

/// Classify one transport result. Pure and deterministic.
pub fn classify(kind: ResponseKind, result: Result<RawResponse, TransportError>) -> Outcome {
    let response = match result {
        Ok(response) => response,
        Err(e) => return Outcome::NetworkError(e.to_string()),
    };

    if kind == ResponseKind::Binary && response.is_success() {
        return Outcome::BinaryPassthrough(response);
    }

    match response.status {
        401 => Outcome::AuthExpired,
        403 => Outcome::Forbidden,
        404 => Outcome::NotFound,
        500..=599 => Outcome::ServerError(response.status),
        200..=299 => Outcome::Success(decode_payload(&response.body)),
        status => Outcome::Other {
            status,
            payload: decode_payload(&response.body),
        },
    }
}

/// Decode a body as JSON; empty is `null`, non-JSON text becomes a string.
fn decode_payload(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}
