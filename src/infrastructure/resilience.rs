use std::{fmt::Display, future::Future, time::Duration};

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Denylist writes: 3 attempts, 100ms then 200ms.
    pub const DENYLIST: RetryPolicy = RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_millis(500),
    };

    /// Idempotent database reads: 3 attempts, 1s then 2s.
    pub const DATABASE: RetryPolicy = RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(10),
    };

    /// Start-up connection to the database.
    pub const STARTUP: RetryPolicy = RetryPolicy {
        max_attempts: 6,
        initial_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(32),
    };

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Runs `operation` until it succeeds, `should_retry` rejects the error,
    /// or the attempts are used up. The last error is returned.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        name: &str,
        should_retry: P,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && should_retry(&e) => {
                    let wait = self.delay_for(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        name, attempt, self.max_attempts, e, wait
                    );

                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    if attempt > 1 {
                        tracing::error!("{} failed after {} attempts: {}", name, attempt, e);
                    }
                    return Err(e);
                }
            }
        }
    }
}
