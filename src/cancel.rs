//! Cooperative cancellation for connect and read loops.
//!
//! All polling in this crate suspends only at backoff sleeps; cancellation
//! is observed between loop iterations and while sleeping, never by
//! pre-empting an in-progress socket call. The signal is a
//! `tokio::sync::watch` channel: the [`CancelSource`] flips it once, every
//! [`CancelToken`] clone sees it.
//!
//! # Example
//!
//! ```
//! use aiswire::CancelSource;
//!
//! let (source, token) = CancelSource::new();
//! assert!(!token.is_canceled());
//! source.cancel();
//! assert!(token.is_canceled());
//! ```

use std::time::Duration;

use tokio::sync::watch;

/// Owning side of a cancellation signal.
///
/// Dropping the source without calling [`cancel`](Self::cancel) leaves the
/// tokens un-canceled forever.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

/// Observer side handed to `connect`/`read_line` operations.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelSource {
    /// Create a source/token pair.
    pub fn new() -> (CancelSource, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (CancelSource { tx }, CancelToken { rx })
    }

    /// Signal cancellation to every token cloned from this source.
    ///
    /// Idempotent; later calls have no further effect.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl CancelToken {
    /// A token that is never canceled.
    pub fn never() -> CancelToken {
        let (_tx, rx) = watch::channel(false);
        CancelToken { rx }
    }

    /// Whether cancellation has been signaled.
    #[inline]
    pub fn is_canceled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is signaled; pends forever otherwise.
    pub async fn canceled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Source dropped without canceling: stay pending.
                std::future::pending::<()>().await;
            }
        }
    }

    /// Sleep for `delay`, waking early on cancellation.
    ///
    /// Returns `true` if the sleep was cut short by cancellation.
    pub(crate) async fn sleep(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            _ = self.canceled() => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_starts_uncanceled() {
        let (_source, token) = CancelSource::new();
        assert!(!token.is_canceled());
    }

    #[test]
    fn test_cancel_is_visible_to_clones() {
        let (source, token) = CancelSource::new();
        let clone = token.clone();
        source.cancel();
        assert!(token.is_canceled());
        assert!(clone.is_canceled());
    }

    #[test]
    fn test_never_token_survives_forever() {
        let token = CancelToken::never();
        assert!(!token.is_canceled());
    }

    #[tokio::test]
    async fn test_canceled_resolves_after_signal() {
        let (source, token) = CancelSource::new();
        source.cancel();
        // Must not hang.
        token.canceled().await;
    }

    #[tokio::test]
    async fn test_sleep_cut_short_by_cancellation() {
        let (source, token) = CancelSource::new();
        source.cancel();
        let canceled = token.sleep(Duration::from_secs(60)).await;
        assert!(canceled);
    }

    #[tokio::test]
    async fn test_sleep_runs_to_completion_without_signal() {
        let (_source, token) = CancelSource::new();
        let canceled = token.sleep(Duration::from_millis(1)).await;
        assert!(!canceled);
    }
}
