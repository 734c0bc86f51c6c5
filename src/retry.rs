use crate::error::AppError;
use std::future::Future;
use std::time::Duration;

/// Bounded exponential backoff around a single fallible async operation
///
/// The wait after the n-th failed attempt is
/// `multiplier * 2^(n-1)`, clamped to `[initial_delay, max_delay]`.
/// With the defaults (3 attempts, 0.3s, 0.3s, 3.0s) that is 0.3s then 0.6s.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Lower bound for any wait
    pub initial_delay: Duration,
    /// Base unit that doubles after each failed attempt
    pub multiplier: Duration,
    /// Upper bound for any wait
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(300),
            multiplier: Duration::from_millis(300),
            max_delay: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// Policy that never waits between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            multiplier: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Wait before the attempt following failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let raw = self.multiplier.saturating_mul(1u32 << exponent);
        let max = self.max_delay.max(self.initial_delay);
        raw.clamp(self.initial_delay, max)
    }

    /// Run `operation` until it succeeds or `max_attempts` is reached
    ///
    /// The closure receives the 1-based attempt number. The last error is
    /// returned unchanged when every attempt fails.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, AppError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts => {
                    tracing::warn!(
                        attempt = attempt,
                        error = %e,
                        "Giving up after final attempt"
                    );
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn upstream_error() -> AppError {
        AppError::UpstreamError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "overloaded".to_string(),
        }
    }

    #[test]
    fn test_default_delay_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(300));
        assert_eq!(policy.delay_after(2), Duration::from_millis(600));
        assert_eq!(policy.delay_after(3), Duration::from_millis(1200));
        assert_eq!(policy.delay_after(4), Duration::from_millis(2400));
        assert_eq!(policy.delay_after(5), Duration::from_secs(3));
        assert_eq!(policy.delay_after(40), Duration::from_secs(3));
    }

    #[test]
    fn test_delay_respects_lower_bound() {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        };
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(3);

        let result = policy
            .execute(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(upstream_error())
                    } else {
                        Ok("answer")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "answer");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(3);

        let result: Result<(), AppError> = policy
            .execute(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(upstream_error()) }
            })
            .await;

        assert!(matches!(result, Err(AppError::UpstreamError { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_first_success_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::immediate(3)
            .execute(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, AppError>(7) }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_follow_the_schedule() {
        let start = tokio::time::Instant::now();
        let result: Result<(), AppError> = RetryPolicy::default()
            .execute(|_| async { Err(upstream_error()) })
            .await;

        assert!(result.is_err());
        // 0.3s + 0.6s between three attempts
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(900));
        assert!(elapsed < Duration::from_secs(1));
    }
}
