//! Rate-limited call gate.
//!
//! Every remote call (API page or file download) goes through
//! [`CallGate::invoke`], which waits a fixed interval after the call whether
//! it succeeded or not. This full blocking wait is the only rate-limit
//! mechanism: there is no token bucket and no adaptive backoff.

use std::future::Future;
use std::time::Duration;

use crate::domain::Result;

/// Runs remote calls followed by a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct CallGate {
    delay: Duration,
}

impl CallGate {
    /// Create a gate waiting `delay` after each call.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Delay applied after each call.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Awaits `call`, logs a failure, then waits the configured delay.
    ///
    /// The failure is returned to the caller rather than handled here; the
    /// caller decides whether to stop the enclosing loop.
    ///
    /// # Errors
    /// Returns the error produced by `call`.
    pub async fn invoke<T, F>(&self, label: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let result = call.await;

        if let Err(ref e) = result {
            tracing::error!(call = label, error = %e, "Remote call failed");
        }

        tokio::time::sleep(self.delay).await;

        result
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::domain::AppError;

    #[tokio::test(start_paused = true)]
    async fn test_waits_after_success() {
        let gate = CallGate::new(Duration::from_millis(1200));
        let start = Instant::now();

        let value = gate.invoke("users.list", async { Ok(7) }).await.unwrap();

        assert_eq!(value, 7);
        assert!(start.elapsed() >= Duration::from_millis(1200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_after_failure_and_returns_error() {
        let gate = CallGate::new(Duration::from_secs(2));
        let start = Instant::now();

        let result: Result<()> = gate
            .invoke("conversations.history", async {
                Err(AppError::api("conversations.history", "ratelimited"))
            })
            .await;

        assert!(result.unwrap_err().is_rate_limited());
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_calls_accumulate_delay() {
        let gate = CallGate::new(Duration::from_millis(500));
        let start = Instant::now();

        for _ in 0..3 {
            gate.invoke("users.list", async { Ok(()) }).await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(1500));
    }
}
