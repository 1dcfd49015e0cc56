//! Session credentials for the webmail backend
//!
//! Owns the access/refresh token pair and everything that touches it without
//! going through the request pipeline: the write-through session store, the
//! persisted storage contract, and the token refresh endpoint call. No request
//! replay or concurrency policy lives here; that belongs to the client's
//! refresh coordinator.
//!
//! Session lifecycle:
//! 1. Startup: `SessionStore::restore()` loads tokens from `TokenStorage`
//! 2. Login: caller stores the issued pair via `SessionStore::set_tokens()`
//! 3. Expired access token: coordinator calls `RefreshClient::refresh()`
//! 4. Refresh success: new pair written via `set_tokens()` (persisted first)
//! 5. Logout or irrecoverable refresh failure: `SessionStore::clear()`

pub mod constants;
pub mod error;
pub mod session;
pub mod storage;
pub mod token;
pub mod types;

pub use constants::*;
pub use error::{Error, Result};
pub use session::{SessionSnapshot, SessionStore};
pub use storage::{FileStorage, MemoryStorage, PersistedTokens, TokenStorage};
pub use token::{RefreshClient, TokenResponse};
pub use types::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};
