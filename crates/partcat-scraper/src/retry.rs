//! Bounded retry with exponential backoff.
//!
//! [`retry_with_backoff`] wraps any fallible async operation. Every failure
//! is treated as transient; the caller decides what the operation covers.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::sink::LogSink;

/// Exponent cap so `base * 2^attempt` cannot overflow.
const MAX_BACKOFF_SHIFT: u32 = 20;

/// How many times to try and how long to wait in between.
///
/// The wait after failed attempt `n` (0-based) is `base_delay * 2^n` plus a
/// random jitter in `[0, max_jitter)`. As long as `max_jitter <= base_delay`
/// the waits are strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_jitter: Duration,
}

impl RetryPolicy {
    /// `max_attempts` counts the first try; values below 1 are raised to 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_jitter: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait before the attempt following failed attempt `attempt` (0-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(1u32 << attempt.min(MAX_BACKOFF_SHIFT));
        exponential.saturating_add(self.jitter())
    }

    /// Every wait a fully failing run would go through, in order.
    #[must_use]
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_attempts.saturating_sub(1))
            .map(|attempt| self.backoff(attempt))
            .collect()
    }

    fn jitter(&self) -> Duration {
        let max_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Runs `operation` until it succeeds or `policy.max_attempts()` is reached.
///
/// `operation` receives the 0-based attempt number. Each failure is
/// reported to `sink`; no wait follows the final attempt. The last error is
/// returned when every attempt fails.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    sink: &dyn LogSink,
    label: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 0u32;

    loop {
        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let attempt_number = attempt + 1;
        sink.warn(&format!(
            "attempt {attempt_number}/{max_attempts} failed for {label}: {err}"
        ));
        if attempt_number >= max_attempts {
            return Err(err);
        }

        let delay = policy.backoff(attempt);
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        tracing::warn!(
            attempt = attempt_number,
            max_attempts,
            delay_ms,
            error = %err,
            target = label,
            "request failed, retrying after backoff"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    use super::*;
    use crate::sink::{LogLevel, RecordingSink};

    fn no_wait(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let sink = RecordingSink::new();
        let result = retry_with_backoff(&no_wait(3), &sink, "test", |_| {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, String>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let sink = RecordingSink::new();
        let result = retry_with_backoff(&no_wait(3), &sink, "test", |_| {
            let cc = Arc::clone(&cc);
            async move {
                let n = cc.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err("connection reset".to_owned())
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert_eq!(sink.messages(LogLevel::Warn).len(), 2);
    }

    #[tokio::test]
    async fn returns_last_error_after_exhausting_attempts() {
        let sink = RecordingSink::new();
        let result = retry_with_backoff(&no_wait(3), &sink, "http://x/", |attempt| async move {
            Err::<(), String>(format!("failure #{attempt}"))
        })
        .await;
        assert_eq!(result.unwrap_err(), "failure #2");

        let warnings = sink.messages(LogLevel::Warn);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].starts_with("attempt 1/3 failed for http://x/"));
        assert!(warnings[2].starts_with("attempt 3/3 failed"));
    }

    #[tokio::test]
    async fn single_attempt_policy_never_retries() {
        let call_count = AtomicU32::new(0);
        let sink = RecordingSink::new();
        let result = retry_with_backoff(&no_wait(0), &sink, "test", |_| {
            call_count.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), &str>("boom") }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn schedule_doubles_without_jitter() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100));
        assert_eq!(
            policy.schedule(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
            ]
        );
    }

    #[test]
    fn schedule_is_strictly_increasing_with_bounded_jitter() {
        let policy = RetryPolicy::new(6, Duration::from_millis(50))
            .with_jitter(Duration::from_millis(49));
        for _ in 0..200 {
            let schedule = policy.schedule();
            assert_eq!(schedule.len(), 5);
            assert!(
                schedule.windows(2).all(|w| w[0] < w[1]),
                "not strictly increasing: {schedule:?}"
            );
            assert!(schedule[0] >= Duration::from_millis(50));
            assert!(schedule[0] < Duration::from_millis(100));
        }
    }

    #[tokio::test]
    async fn waits_grow_between_real_attempts() {
        let stamps = Mutex::new(Vec::new());
        let sink = RecordingSink::new();
        let policy = RetryPolicy::new(3, Duration::from_millis(40));
        let _ = retry_with_backoff(&policy, &sink, "test", |_| {
            stamps.lock().unwrap().push(Instant::now());
            async { Err::<(), &str>("timeout") }
        })
        .await;

        let stamps = stamps.into_inner().unwrap();
        assert_eq!(stamps.len(), 3);
        let first_gap = stamps[1] - stamps[0];
        let second_gap = stamps[2] - stamps[1];
        assert!(first_gap >= Duration::from_millis(40), "{first_gap:?}");
        assert!(second_gap >= Duration::from_millis(80), "{second_gap:?}");
        assert!(second_gap > first_gap);
    }
}
