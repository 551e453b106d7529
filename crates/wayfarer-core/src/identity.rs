//! Process-wide identity holder with an explicit login/logout lifecycle.
//!
//! Every component that needs the current user goes through
//! [`IdentityContext`] rather than an ambient global, so tests can
//! substitute fixtures. The context is versioned: each `set` or `clear`
//! bumps a monotonic counter that consumers use to detect identity changes
//! (e.g. to reset view state).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::types::Identity;

/// Shared holder for the current [`Identity`].
///
/// Cloning is cheap and all clones observe the same identity.
#[derive(Clone, Debug, Default)]
pub struct IdentityContext {
    inner: Arc<Mutex<Option<Identity>>>,
    version: Arc<AtomicU64>,
}

impl IdentityContext {
    /// Create an empty context (no identity live).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current identity. Idempotent: setting the same identity
    /// again still bumps the version, which is what consumers key off.
    pub fn set(&self, identity: Identity) {
        let mut guard = self.inner.lock().expect("identity mutex poisoned");
        tracing::info!(guest = identity.guest, "Identity set");
        *guard = Some(identity);
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    /// Clear the current identity (logout).
    pub fn clear(&self) {
        let mut guard = self.inner.lock().expect("identity mutex poisoned");
        if guard.is_some() {
            tracing::info!("Identity cleared");
        }
        *guard = None;
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    /// Returns a clone of the current identity, or `None` if logged out.
    pub fn current(&self) -> Option<Identity> {
        self.inner.lock().expect("identity mutex poisoned").clone()
    }

    /// Returns the auth token of the current identity, if any.
    ///
    /// Absence is a precondition failure for protected operations, not a
    /// recoverable error: callers must not attempt a network call without
    /// one.
    pub fn token(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("identity mutex poisoned")
            .as_ref()
            .and_then(|i| i.token.clone())
    }

    /// Monotonic change counter, bumped on every `set` and `clear`.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_identity(guest: bool) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            token: Some("token-abc".to_string()),
            first_name: "Sana".to_string(),
            last_name: "Khan".to_string(),
            email: "sana@example.com".to_string(),
            guest,
        }
    }

    #[test]
    fn test_new_context_is_empty() {
        let ctx = IdentityContext::new();
        assert!(ctx.current().is_none());
        assert!(ctx.token().is_none());
        assert_eq!(ctx.version(), 0);
    }

    #[test]
    fn test_set_and_current() {
        let ctx = IdentityContext::new();
        let identity = make_identity(false);
        ctx.set(identity.clone());
        assert_eq!(ctx.current(), Some(identity));
        assert_eq!(ctx.version(), 1);
    }

    #[test]
    fn test_set_replaces_previous() {
        let ctx = IdentityContext::new();
        ctx.set(make_identity(false));
        let second = make_identity(true);
        ctx.set(second.clone());
        assert_eq!(ctx.current(), Some(second));
        assert_eq!(ctx.version(), 2);
    }

    #[test]
    fn test_clear() {
        let ctx = IdentityContext::new();
        ctx.set(make_identity(false));
        ctx.clear();
        assert!(ctx.current().is_none());
        assert!(ctx.token().is_none());
        assert_eq!(ctx.version(), 2);
    }

    #[test]
    fn test_clear_when_empty_still_bumps_version() {
        let ctx = IdentityContext::new();
        ctx.clear();
        assert_eq!(ctx.version(), 1);
    }

    #[test]
    fn test_token_accessor() {
        let ctx = IdentityContext::new();
        ctx.set(make_identity(false));
        assert_eq!(ctx.token(), Some("token-abc".to_string()));
    }

    #[test]
    fn test_token_none_when_identity_has_no_token() {
        let ctx = IdentityContext::new();
        let mut identity = make_identity(false);
        identity.token = None;
        ctx.set(identity);
        assert!(ctx.current().is_some());
        assert!(ctx.token().is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let ctx = IdentityContext::new();
        let other = ctx.clone();
        ctx.set(make_identity(true));
        assert!(other.current().is_some());
        assert_eq!(other.version(), 1);
    }
}
