//! Retry policy for throttled SPARQL requests.
//!
//! Only [`WikigraphError::Throttled`] is retried. Every other error is
//! returned to the caller on first sight.

use std::future::Future;
use std::time::Duration;

use crate::error::{Result, WikigraphError};

/// Upper bound for a single exponential delay.
const MAX_DELAY: Duration = Duration::from_secs(60);

/// Delay schedule between throttled attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry
    Fixed(Duration),
    /// Doubles after each retry, capped at one minute
    Exponential { initial: Duration },
}

/// How long and how often to retry a throttled request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    backoff: Backoff,
    max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// `max_attempts` of `None` retries forever.
    pub fn new(backoff: Backoff, max_attempts: Option<u32>) -> Self {
        Self {
            backoff,
            max_attempts,
        }
    }

    /// Fixed delay, no attempt ceiling.
    pub fn unlimited(delay: Duration) -> Self {
        Self::new(Backoff::Fixed(delay), None)
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial } => {
                let factor = 2u32.saturating_pow(retry);
                initial.saturating_mul(factor).min(MAX_DELAY)
            }
        }
    }

    /// Run `op` until it returns something other than a throttling error.
    ///
    /// Each call of `op` counts as one attempt. With a bounded policy the
    /// last throttled attempt yields [`WikigraphError::RetriesExhausted`].
    pub async fn run<F, Fut, T>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts: u32 = 0;

        loop {
            match op().await {
                Err(e) if e.is_throttled() => {
                    attempts = attempts.saturating_add(1);
                    if let Some(max) = self.max_attempts {
                        if attempts >= max {
                            return Err(WikigraphError::RetriesExhausted { attempts });
                        }
                    }
                    let delay = self.delay_for(attempts - 1);
                    log::warn!("429: too many requests, retrying in {:?} (attempt {})", delay, attempts + 1);
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unlimited(Duration::from_millis(100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_fixed_delay_is_constant() {
        let policy = RetryPolicy::unlimited(Duration::from_millis(300));
        assert_eq!(policy.delay_for(0), Duration::from_millis(300));
        assert_eq!(policy.delay_for(10), Duration::from_millis(300));
    }

    #[test]
    fn test_exponential_delay_doubles_and_caps() {
        let policy = RetryPolicy::new(
            Backoff::Exponential { initial: Duration::from_secs(1) },
            None,
        );
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for(40), MAX_DELAY);
    }

    #[tokio::test]
    async fn test_retries_throttled_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::unlimited(Duration::ZERO);

        let result = policy
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 5 {
                        Err(WikigraphError::Throttled)
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::unlimited(Duration::ZERO);

        let result: Result<()> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(WikigraphError::Service { status: 500, body: "boom".to_string() }) }
            })
            .await;

        assert!(matches!(result, Err(WikigraphError::Service { status: 500, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bounded_policy_gives_up() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(Backoff::Fixed(Duration::ZERO), Some(3));

        let result: Result<()> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(WikigraphError::Throttled) }
            })
            .await;

        assert!(matches!(result, Err(WikigraphError::RetriesExhausted { attempts: 3 })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
