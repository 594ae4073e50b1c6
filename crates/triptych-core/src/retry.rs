//! Retryable Remote Operations
//!
//! Bounded exponential backoff for the remote calls at the pipeline's edges
//! (vector fetches, searches, batch commits). Retry policy is pluggable at
//! the client boundary; the aggregator itself never retries.

use std::future::Future;
use std::time::Duration;

use crate::error::{CoreError, CoreResult};

/// Retry policy for a remote call boundary
///
/// The default policy performs no retries, matching the store contracts:
/// a backend surfaces the first failure unless its caller opts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

impl RetryPolicy {
    /// Policy with `max_retries` attempts and the given base delay
    pub fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
        }
    }

    /// Policy that surfaces the first failure immediately
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 500,
        }
    }

    /// Backoff delay before retry number `attempt` (zero-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms * 2_u64.pow(attempt))
    }
}

/// Run `operation` with bounded retries and exponential backoff
///
/// Only errors whose [`CoreError::is_retryable`] returns true are retried;
/// data-gap errors (missing vectors, empty searches) come back unchanged on
/// the first attempt since the store would answer them identically.
///
/// `op_name` labels the warn-level log line emitted per retry.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    op_name: &str,
    mut operation: F,
) -> CoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    let mut last_error = None;

    for attempt in 0..=policy.max_retries {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() || attempt >= policy.max_retries {
                    return Err(err);
                }

                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}), retrying in {}ms: {}",
                    op_name,
                    attempt + 1,
                    policy.max_retries + 1,
                    delay.as_millis(),
                    err
                );

                tokio::time::sleep(delay).await;
                last_error = Some(err);
            }
        }
    }

    // The loop returns on every path; this covers the max_retries == u32::MAX edge
    Err(last_error
        .unwrap_or_else(|| CoreError::transport(format!("{op_name}: retry attempts exhausted"))))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::types::RepTag;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, 1)
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_op = calls.clone();

        let result = with_retry(&fast_policy(3), "fetch", move || {
            let calls = calls_in_op.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(CoreError::transport("connection reset"))
                } else {
                    Ok(7_usize)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_errors_surface_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_op = calls.clone();

        let result: CoreResult<usize> = with_retry(&fast_policy(5), "fetch", move || {
            let calls = calls_in_op.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(CoreError::missing_representation("P1", RepTag::Name))
            }
        })
        .await;

        assert!(matches!(
            result,
            Err(CoreError::MissingRepresentation { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_policy_attempts_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_op = calls.clone();

        let result: CoreResult<usize> =
            with_retry(&RetryPolicy::disabled(), "search", move || {
                let calls = calls_in_op.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(CoreError::transport("unreachable"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_return_last_error() {
        let result: CoreResult<usize> = with_retry(&fast_policy(2), "commit", || async {
            Err(CoreError::storage("locked"))
        })
        .await;

        assert_eq!(result, Err(CoreError::storage("locked")));
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::new(3, 100);
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    }
}
