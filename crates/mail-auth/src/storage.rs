//! Persisted token storage
//!
//! The session survives restarts through a tiny key/value contract: the
//! access token under `token` and the refresh token under `refreshToken`.
//! `FileStorage` keeps them in a JSON file written with temp-file + rename so
//! a crash mid-write never leaves a half-written pair behind.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Boxed future returned by `TokenStorage` operations.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// The persisted access/refresh pair.
///
/// Empty strings mean "absent"; field names match the keys the browser
/// frontend keeps in local storage.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedTokens {
    #[serde(rename = "token", default)]
    pub access: String,
    #[serde(rename = "refreshToken", default)]
    pub refresh: String,
}

impl fmt::Debug for PersistedTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedTokens")
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .finish()
    }
}

/// Durable key/value storage for the session token pair.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Box<dyn TokenStorage>`).
pub trait TokenStorage: Send + Sync {
    /// Load the stored pair, `None` when nothing (or only an empty access token) is stored.
    fn load(&self) -> StorageFuture<'_, Option<PersistedTokens>>;

    /// Replace the stored pair.
    fn save<'a>(&'a self, tokens: &'a PersistedTokens) -> StorageFuture<'a, ()>;

    /// Remove both keys. Removing an absent pair is not an error.
    fn remove(&self) -> StorageFuture<'_, ()>;
}

/// JSON file storage with atomic writes and 0600 permissions.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_inner(&self) -> Result<Option<PersistedTokens>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "session file not found, starting signed out");
                return Ok(None);
            }
            Err(e) => return Err(Error::Storage(format!("reading session file: {e}"))),
        };
        let tokens: PersistedTokens = serde_json::from_str(&contents)
            .map_err(|e| Error::Parse(format!("parsing session file: {e}")))?;
        if tokens.access.is_empty() {
            return Ok(None);
        }
        info!(path = %self.path.display(), "restored persisted session");
        Ok(Some(tokens))
    }

    async fn remove_inner(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed session file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("removing session file: {e}"))),
        }
    }
}

impl TokenStorage for FileStorage {
    fn load(&self) -> StorageFuture<'_, Option<PersistedTokens>> {
        Box::pin(self.load_inner())
    }

    fn save<'a>(&'a self, tokens: &'a PersistedTokens) -> StorageFuture<'a, ()> {
        Box::pin(write_atomic(&self.path, tokens))
    }

    fn remove(&self) -> StorageFuture<'_, ()> {
        Box::pin(self.remove_inner())
    }
}

/// In-process storage for tests and sessions that must not touch disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tokens: std::sync::Mutex<Option<PersistedTokens>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a stored pair, as if a previous process had saved it.
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        Self {
            tokens: std::sync::Mutex::new(Some(PersistedTokens {
                access: access.to_string(),
                refresh: refresh.to_string(),
            })),
        }
    }

    /// Current stored pair (for assertions).
    pub fn stored(&self) -> Option<PersistedTokens> {
        self.tokens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl TokenStorage for MemoryStorage {
    fn load(&self) -> StorageFuture<'_, Option<PersistedTokens>> {
        let tokens = self.stored().filter(|t| !t.access.is_empty());
        Box::pin(async move { Ok(tokens) })
    }

    fn save<'a>(&'a self, tokens: &'a PersistedTokens) -> StorageFuture<'a, ()> {
        *self.tokens.lock().unwrap_or_else(|e| e.into_inner()) = Some(tokens.clone());
        Box::pin(async { Ok(()) })
    }

    fn remove(&self) -> StorageFuture<'_, ()> {
        *self.tokens.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Box::pin(async { Ok(()) })
    }
}

/// Write the token pair to a file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. Sets file permissions to 0600 (owner read/write only) since the
/// file contains bearer tokens.
async fn write_atomic(path: &Path, tokens: &PersistedTokens) -> Result<()> {
    let json = serde_json::to_string_pretty(tokens)
        .map_err(|e| Error::Parse(format!("serializing session: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Storage("session path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".session.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Storage(format!("writing temp session file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Storage(format!("setting session file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Storage(format!("renaming temp session file: {e}")))?;

    debug!(path = %path.display(), "persisted session");
    Ok(())
}
