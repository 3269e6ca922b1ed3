//! Call cancellation: a shared abort token and the error it surfaces.
//!
//! A caller hands an `AbortToken` to a cancellable retry run. Aborting the
//! token interrupts the in-flight call and any backoff sleep; the run then
//! fails with `Cancelled` (converted into the operation's own error type).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Notify;

/// Error returned when a call is stopped through its abort token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("call aborted by caller")]
pub struct Cancelled;

#[derive(Debug, Default)]
struct Inner {
    aborted: AtomicBool,
    notify: Notify,
}

/// Cloneable abort flag. All clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    inner: Arc<Inner>,
}

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abort. Idempotent; wakes every task waiting in `aborted()`.
    pub fn abort(&self) {
        self.inner.aborted.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.load(Ordering::SeqCst)
    }

    /// Resolves once `abort()` has been called (immediately if it already was).
    pub async fn aborted(&self) {
        loop {
            // Register before checking the flag so an abort in between is not lost.
            let notified = self.inner.notify.notified();
            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn clones_share_state() {
        let token = AbortToken::new();
        let other = token.clone();
        assert!(!other.is_aborted());
        token.abort();
        assert!(other.is_aborted());
    }

    #[tokio::test]
    async fn aborted_resolves_after_abort() {
        let token = AbortToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.aborted().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.abort();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn aborted_is_immediate_when_already_set() {
        let token = AbortToken::new();
        token.abort();
        tokio::time::timeout(Duration::from_millis(100), token.aborted())
            .await
            .expect("already aborted");
    }
}
