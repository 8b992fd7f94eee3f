//! Bounded exponential-backoff retry.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Delay before the first retry. Doubles on each further attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt numbered `attempt` (starting at 0).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2_u32.saturating_pow(attempt))
    }
}

/// Run `operation`, retrying every error with exponential backoff.
///
/// The operation is invoked at most `max_retries + 1` times. Errors are not
/// distinguished: anything the operation should not retry has to be turned
/// into a success value by the operation itself.
pub async fn with_retry<T, E, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_retries => {
                let delay = policy.delay(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "Remote call failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::Instant;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }

    #[test]
    fn test_delay_doubles() {
        let policy = policy();
        assert_eq!(policy.delay(0), Duration::from_millis(1000));
        assert_eq!(policy.delay(1), Duration::from_millis(2000));
        assert_eq!(policy.delay(2), Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_failures() {
        let calls = Cell::new(0);

        let result: Result<&str, String> = with_retry(policy(), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n <= 2 {
                    Err(format!("failure {n}"))
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_returns_last_error() {
        let calls = Cell::new(0);
        let start = Instant::now();

        let result: Result<(), String> = with_retry(policy(), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { Err(format!("failure {n}")) }
        })
        .await;

        assert_eq!(result, Err("failure 4".to_owned()));
        assert_eq!(calls.get(), 4);
        // 1s + 2s + 4s of backoff
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(7));
        assert!(elapsed < Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_runs_once() {
        let calls = Cell::new(0);
        let policy = RetryPolicy {
            max_retries: 0,
            base_delay: Duration::from_millis(10),
        };

        let result: Result<(), &str> = with_retry(policy, || {
            calls.set(calls.get() + 1);
            async { Err("nope") }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
