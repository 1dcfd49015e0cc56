//! Write-through session store
//!
//! Holds the current access/refresh pair for the single signed-in user.
//! Readers take a cloned `SessionSnapshot`; they never see a half-applied
//! update because the whole session is swapped under one `RwLock`. Writers
//! are serialized by an async mutex so that "persist, then swap" pairs from a
//! login and a refresh can never interleave.

use std::sync::RwLock;

use common::Secret;
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::storage::{MemoryStorage, PersistedTokens, TokenStorage};

/// Point-in-time copy of the session.
///
/// `generation` increases on every mutation. The refresh coordinator compares
/// the generation a request was sent with against the current one to tell a
/// stale 401 (credentials already rotated) from a fresh expiry.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    access: Option<Secret<String>>,
    refresh: Option<Secret<String>>,
    generation: u64,
}

impl SessionSnapshot {
    /// Authenticated if and only if an access token is present.
    pub fn is_authenticated(&self) -> bool {
        self.access.is_some()
    }

    pub fn access_token(&self) -> Option<&Secret<String>> {
        self.access.as_ref()
    }

    pub fn refresh_token(&self) -> Option<&Secret<String>> {
        self.refresh.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn empty(generation: u64) -> Self {
        Self {
            access: None,
            refresh: None,
            generation,
        }
    }
}

/// Owner of the session credentials.
pub struct SessionStore {
    state: RwLock<SessionSnapshot>,
    writer: tokio::sync::Mutex<()>,
    storage: Box<dyn TokenStorage>,
}

impl SessionStore {
    /// Build a store, restoring any pair persisted by a previous process.
    pub async fn restore(storage: impl TokenStorage + 'static) -> Result<Self> {
        let restored = storage.load().await?;
        let snapshot = match restored {
            Some(tokens) => {
                info!(
                    has_refresh = !tokens.refresh.is_empty(),
                    "session restored from storage"
                );
                SessionSnapshot {
                    access: Secret::non_empty(tokens.access.clone()),
                    refresh: Secret::non_empty(tokens.refresh.clone()),
                    generation: 0,
                }
            }
            None => SessionSnapshot::default(),
        };
        Ok(Self {
            state: RwLock::new(snapshot),
            writer: tokio::sync::Mutex::new(()),
            storage: Box::new(storage),
        })
    }

    /// Empty store backed by in-process storage.
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(SessionSnapshot::default()),
            writer: tokio::sync::Mutex::new(()),
            storage: Box::new(MemoryStorage::new()),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn access_token(&self) -> Option<Secret<String>> {
        self.snapshot().access
    }

    pub fn refresh_token(&self) -> Option<Secret<String>> {
        self.snapshot().refresh
    }

    pub fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_authenticated()
    }

    pub fn generation(&self) -> u64 {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .generation
    }

    /// Store a new token pair.
    ///
    /// A `None` (or empty) refresh token keeps the current one. The pair is
    /// persisted before the in-memory swap; if persisting fails the previous
    /// session stays in place and the error is returned.
    #[instrument(skip_all)]
    pub async fn set_tokens(&self, access: String, refresh: Option<String>) -> Result<()> {
        let _guard = self.writer.lock().await;
        let current = self.snapshot();

        let refresh = refresh
            .and_then(Secret::non_empty)
            .or_else(|| current.refresh.clone());
        let access = Secret::non_empty(access);

        let persisted = PersistedTokens {
            access: access.as_ref().map(|t| t.expose().clone()).unwrap_or_default(),
            refresh: refresh
                .as_ref()
                .map(|t| t.expose().clone())
                .unwrap_or_default(),
        };
        self.storage.save(&persisted).await?;

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        // `invalidate` does not take the writer lock, so it may have run while
        // we were persisting. The new pair is already on disk and wins; the
        // generation is re-read so it still moves past the invalidation.
        let generation = state.generation + 1;
        *state = SessionSnapshot {
            access,
            refresh,
            generation,
        };
        debug!(generation, "session tokens updated");
        Ok(())
    }

    /// Drop the in-memory session immediately, without touching storage.
    ///
    /// A `set_tokens` already persisting when this runs still installs its
    /// pair afterwards.
    ///
    /// Always advances the generation, so concurrent requests that were sent
    /// before the call observe that the session changed underneath them.
    /// Returns whether the session was authenticated before the call.
    pub fn invalidate(&self) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let was_authenticated = state.is_authenticated();
        let generation = state.generation + 1;
        *state = SessionSnapshot::empty(generation);
        was_authenticated
    }

    /// Clear the session in memory and in storage. Idempotent.
    #[instrument(skip_all)]
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.writer.lock().await;
        let was_authenticated = self.invalidate();
        self.storage.remove().await?;
        info!(was_authenticated, "session cleared");
        Ok(())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("SessionStore")
            .field("authenticated", &snapshot.is_authenticated())
            .field("generation", &snapshot.generation)
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}
