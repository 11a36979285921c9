//! Request lifetime capability.
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering::SeqCst},
};
use tokio::sync::Notify;

/// Cooperative cancellation signal.
///
/// Clones share one state. Triggering is safe from any thread, concurrently
/// with normal use; observers poll [`is_cancelled`][CancelSignal::is_cancelled]
/// or await [`cancelled`][CancelSignal::cancelled].
#[derive(Clone, Debug, Default)]
pub struct CancelSignal {
    shared: Arc<Shared>,
}

#[derive(Debug, Default)]
struct Shared {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    /// Create a signal that is not triggered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once the signal has been triggered.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(SeqCst)
    }

    /// Trigger the signal, waking every waiter.
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, SeqCst);
        self.shared.notify.notify_waiters();
    }

    /// Wait until the signal is triggered.
    pub async fn cancelled(&self) {
        let notified = self.shared.notify.notified();
        tokio::pin!(notified);
        loop {
            // register before the flag check, so a concurrent trigger
            // between check and await is not missed
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.as_mut().await;
            notified.set(self.shared.notify.notified());
        }
    }
}

/// Request lifetime capability: exposes the per-request cancellation signal
/// and the abort trigger.
#[derive(Clone, Debug, Default)]
pub struct Lifetime {
    signal: CancelSignal,
}

impl Lifetime {
    /// Create [`Lifetime`] with an untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cancellation signal observed by request processing.
    #[inline]
    pub fn aborted(&self) -> CancelSignal {
        self.signal.clone()
    }

    /// Replace the cancellation signal.
    pub fn set_aborted(&mut self, signal: CancelSignal) {
        self.signal = signal;
    }

    /// Trigger the signal: the request should stop processing.
    pub fn abort(&self) {
        self.signal.cancel();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cancel_is_sticky() {
        let signal = CancelSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_cancelled());

        signal.cancel();
        assert!(observer.is_cancelled());

        // late clone still observes
        assert!(signal.clone().is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_wakes() {
        let signal = CancelSignal::new();
        let observer = signal.clone();

        let wait = tokio::spawn(async move { observer.cancelled().await });
        tokio::task::yield_now().await;

        signal.cancel();
        wait.await.unwrap();
    }
}
