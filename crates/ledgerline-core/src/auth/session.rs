use std::sync::Arc;

use tracing::{info, warn};

use super::TokenStore;

/// Callback fired when the session can no longer be recovered.
///
/// The surrounding application decides what "go re-authenticate" means
/// (a CLI prints a hint, a UI routes to its login screen); the core only
/// emits the signal.
pub type UnauthenticatedHook = Arc<dyn Fn() + Send + Sync>;

/// Tears down a dead session: clears stored credentials and signals the
/// application to re-authenticate.
#[derive(Clone)]
pub struct SessionTerminator {
    store: Arc<TokenStore>,
    on_unauthenticated: UnauthenticatedHook,
}

impl SessionTerminator {
    pub fn new(store: Arc<TokenStore>, on_unauthenticated: UnauthenticatedHook) -> Self {
        Self {
            store,
            on_unauthenticated,
        }
    }

    /// Clear all session data and fire the re-authentication signal.
    ///
    /// Idempotent: terminating an already-empty session just re-fires the
    /// signal. A failed store write is logged, not propagated - the
    /// in-memory state is gone either way.
    pub fn terminate(&self) {
        info!("Terminating session");
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "Failed to clear session store during termination");
        }
        (self.on_unauthenticated)();
    }
}
