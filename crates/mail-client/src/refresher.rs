//! Token refresh seam
//!
//! The coordinator only needs "exchange this refresh token for a new pair".
//! `RefreshClient` provides it against the real backend; tests can plug in a
//! scripted implementation.

use std::future::Future;
use std::pin::Pin;

use mail_auth::{RefreshClient, TokenResponse};

/// Boxed future returned by `Refresher::refresh`.
pub type RefreshFuture<'a> =
    Pin<Box<dyn Future<Output = mail_auth::Result<TokenResponse>> + Send + 'a>>;

/// Exchanges a refresh token for new credentials.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn Refresher>`).
pub trait Refresher: Send + Sync {
    fn refresh<'a>(&'a self, refresh_token: &'a str) -> RefreshFuture<'a>;
}

impl Refresher for RefreshClient {
    fn refresh<'a>(&'a self, refresh_token: &'a str) -> RefreshFuture<'a> {
        Box::pin(RefreshClient::refresh(self, refresh_token))
    }
}
