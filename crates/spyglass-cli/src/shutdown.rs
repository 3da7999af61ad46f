//! Cancellation for poll loops.
//!
//! Poll loops sleep between cycles; a plain `thread::sleep` would hold
//! shutdown hostage for a full interval. [`CancelToken`] offers an
//! interruptible wait instead: cancellation aborts the current sleep
//! immediately, and only the sleep — an in-flight read is never
//! interrupted, loops check the token between operations.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

pub struct CancelToken {
    cancelled: Mutex<bool>,
    signal: Condvar,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            cancelled: Mutex::new(false),
            signal: Condvar::new(),
        }
    }

    /// Request cancellation, waking every waiting thread.
    pub fn cancel(&self) {
        match self.cancelled.lock() {
            Ok(mut flag) => *flag = true,
            Err(poisoned) => *poisoned.into_inner() = true,
        }
        self.signal.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        match self.cancelled.lock() {
            Ok(flag) => *flag,
            Err(_) => true,
        }
    }

    /// Sleep for `duration` unless cancelled first.
    ///
    /// Returns `true` if cancellation cut the wait short (or had already
    /// been requested), `false` on a normal timeout.
    pub fn wait(&self, duration: Duration) -> bool {
        let guard = match self.cancelled.lock() {
            Ok(guard) => guard,
            Err(_) => return true,
        };
        match self
            .signal
            .wait_timeout_while(guard, duration, |cancelled| !*cancelled)
        {
            Ok((guard, _)) => *guard,
            Err(_) => true,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_starts_uncancelled() {
        assert!(!CancelToken::new().is_cancelled());
    }

    #[test]
    fn test_wait_runs_to_timeout() {
        let token = CancelToken::new();
        let start = Instant::now();
        assert!(!token.wait(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_cancel_interrupts_wait() {
        let token = Arc::new(CancelToken::new());
        let waiter = Arc::clone(&token);

        let handle = thread::spawn(move || {
            let start = Instant::now();
            (waiter.wait(Duration::from_secs(30)), start.elapsed())
        });

        thread::sleep(Duration::from_millis(30));
        token.cancel();

        let (interrupted, elapsed) = handle.join().unwrap();
        assert!(interrupted);
        assert!(elapsed < Duration::from_secs(5));
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_wait_after_cancel_returns_immediately() {
        let token = CancelToken::new();
        token.cancel();
        let start = Instant::now();
        assert!(token.wait(Duration::from_secs(30)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
