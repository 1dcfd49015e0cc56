//! Session-invalidation hook

use std::fmt;

/// Notified when the session can no longer be recovered.
///
/// Called at most once per failed refresh episode, after the session store
/// has been cleared, so implementations always observe a signed-out session.
/// Navigation and user notification belong here, not in the client.
pub trait SessionInvalidationHook: Send + Sync {
    fn on_session_expired(&self);
}

/// Hook that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl SessionInvalidationHook for NoopHook {
    fn on_session_expired(&self) {}
}

/// Adapts a closure into a hook.
pub struct FnHook<F>(F);

impl<F> FnHook<F>
where
    F: Fn() + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> SessionInvalidationHook for FnHook<F>
where
    F: Fn() + Send + Sync,
{
    fn on_session_expired(&self) {
        (self.0)()
    }
}

impl<F> fmt::Debug for FnHook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnHook")
    }
}
