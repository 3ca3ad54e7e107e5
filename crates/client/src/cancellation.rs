//! Cooperative cancellation for in-flight API calls.
//!
//! Responsibilities:
//! - Provide a cloneable token that callers pass through [`crate::RequestOptions`].
//! - Let the client race the token exchange and the API call against it.
//!
//! Does NOT handle:
//! - Installing signal handlers (the CLI wires Ctrl+C to [`CancellationToken::cancel`]).
//!
//! Invariants:
//! - Once cancelled, a token remains cancelled forever.
//! - A cancelled call resolves to a `TransportError` with message `"request cancelled"`.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::Notify;

/// Cancellation token usable across async tasks.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel token (idempotent).
    pub fn cancel(&self) {
        let was_cancelled = self.cancelled.swap(true, Ordering::SeqCst);
        if !was_cancelled {
            self.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Await cancellation.
    ///
    /// The `notified()` future is created before the flag is checked so a
    /// concurrent `cancel` cannot be missed.
    pub async fn cancelled(&self) {
        let notified = self.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}
