//! Single-fire readiness signal.

use std::sync::Arc;
use tokio::sync::watch;

/// State of a startup attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Nothing has decided the outcome yet.
    Pending,
    /// The server is accepting connections.
    Ready,
    /// The server will not become ready; carries the cause.
    Failed(String),
}

impl Readiness {
    pub fn is_pending(&self) -> bool {
        matches!(self, Readiness::Pending)
    }
}

/// Completion value shared by every detection task of one startup attempt.
///
/// The first call that moves the signal out of `Pending` wins. Later calls
/// return `false` and leave the stored value untouched.
#[derive(Debug, Clone)]
pub struct ReadinessSignal {
    tx: Arc<watch::Sender<Readiness>>,
}

impl Default for ReadinessSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Readiness::Pending);
        Self { tx: Arc::new(tx) }
    }

    /// Commit `value` if nothing has been committed yet.
    ///
    /// Returns true if this call set the value. Committing `Pending` is a no-op.
    pub fn complete(&self, value: Readiness) -> bool {
        if value.is_pending() {
            return false;
        }
        // The check and the write happen under the channel's lock.
        self.tx.send_if_modified(|current| {
            if current.is_pending() {
                *current = value;
                true
            } else {
                false
            }
        })
    }

    pub fn mark_ready(&self) -> bool {
        self.complete(Readiness::Ready)
    }

    pub fn mark_failed(&self, cause: impl Into<String>) -> bool {
        self.complete(Readiness::Failed(cause.into()))
    }

    /// Current value.
    pub fn state(&self) -> Readiness {
        self.tx.borrow().clone()
    }

    pub fn is_completed(&self) -> bool {
        !self.tx.borrow().is_pending()
    }

    /// Wait until the signal leaves `Pending` and return the committed value.
    pub async fn wait(&self) -> Readiness {
        let mut rx = self.tx.subscribe();
        let state = match rx.wait_for(|state| !state.is_pending()).await {
            Ok(state) => state.clone(),
            // Unreachable while `self` holds the sender.
            Err(_) => Readiness::Pending,
        };
        state
    }
}
