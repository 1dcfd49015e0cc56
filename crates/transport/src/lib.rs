//! Transport seam for the webmail client
//!
//! Defines the request descriptor that endpoint builders produce, the
//! prepared request the pipeline hands to the wire, the raw response the
//! classifier consumes, and the `Transport` trait that decouples the client
//! from reqwest. `HttpTransport` is the production implementation; tests can
//! substitute any other `Transport`.

pub mod error;
pub mod http;
pub mod request;

pub use error::{Error, Result, TransportError};
pub use http::HttpTransport;
pub use request::{AuthMode, PreparedRequest, RawResponse, RequestDescriptor, ResponseKind};

pub use reqwest::Method;

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by `Transport::send`.
pub type SendFuture<'a> =
    Pin<Box<dyn Future<Output = std::result::Result<RawResponse, TransportError>> + Send + 'a>>;

/// Executes prepared requests against the backend.
///
/// A transport never interprets status codes: any HTTP response, including
/// 4xx/5xx, is `Ok(RawResponse)`. `Err(TransportError)` means no response was
/// received at all (DNS, connect, timeout, body read).
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    /// Identifier for logging (e.g. "http")
    fn id(&self) -> &str;

    fn send(&self, request: PreparedRequest) -> SendFuture<'_>;
}
