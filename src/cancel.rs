use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};

/// Creates a cancellation pair for one pipeline stage. The handle signals,
/// the token is checked at every blocking boundary. Dropping the last handle
/// counts as cancellation, so a stage can never outlive its controller.
pub fn channel() -> (CancelHandle, CancelToken) {
    let (tx, rx) = bounded(1);
    (CancelHandle { tx }, CancelToken { rx })
}

#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Sender<()>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.try_send(());
    }
}

#[derive(Debug)]
pub struct CancelToken {
    rx: Receiver<()>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        !matches!(self.rx.try_recv(), Err(TryRecvError::Empty))
    }

    /// Sleeps for `duration` unless cancelled first. Returns whether the
    /// wait was interrupted by cancellation.
    pub fn sleep(&self, duration: Duration) -> bool {
        !matches!(self.rx.recv_timeout(duration), Err(RecvTimeoutError::Timeout))
    }

    /// The underlying receiver, for `select!`ing alongside other channels.
    pub fn signal(&self) -> &Receiver<()> {
        &self.rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn not_cancelled_until_signalled() {
        let (handle, token) = channel();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_interrupts_sleep() {
        let (handle, token) = channel();
        handle.cancel();
        let start = Instant::now();
        assert!(token.sleep(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn sleep_runs_to_completion_without_signal() {
        let (_handle, token) = channel();
        assert!(!token.sleep(Duration::from_millis(10)));
    }

    #[test]
    fn dropped_handle_counts_as_cancelled() {
        let (handle, token) = channel();
        drop(handle);
        assert!(token.is_cancelled());
        assert!(token.sleep(Duration::from_secs(10)));
    }
}
