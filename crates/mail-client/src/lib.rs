//! Authenticated client for the webmail backend
//!
//! Every backend call flows through the same typed stages:
//!
//! 1. `pipeline::prepare` attaches `Authorization: Bearer <access>` from a
//!    session snapshot
//! 2. a `Transport` sends it and returns the raw response
//! 3. `classify::classify` labels the outcome
//! 4. on `AuthExpired`, the `RefreshCoordinator` decides whether this request
//!    leads a refresh, queues behind one already in flight, replays against
//!    credentials that rotated while it was on the wire, or fails
//!
//! Only one refresh call is ever in flight. When it succeeds every queued
//! request is replayed in arrival order with the new token; when it fails the
//! session is cleared, every queued request resolves `SessionExpired`, and the
//! `SessionInvalidationHook` fires exactly once.

pub mod account;
pub mod classify;
pub mod client;
pub mod coordinator;
pub mod endpoints;
pub mod error;
pub mod hook;
pub mod metrics;
pub mod pipeline;
pub mod refresher;

pub use classify::{Outcome, classify};
pub use client::{AuthenticatedClient, ClientBuilder, Reply};
pub use coordinator::{Admission, Phase, RefreshCoordinator};
pub use error::{Error, Result};
pub use hook::{FnHook, NoopHook, SessionInvalidationHook};
pub use pipeline::prepare;
pub use refresher::Refresher;
