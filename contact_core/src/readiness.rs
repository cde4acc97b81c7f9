//! Scoped acquisition of resources that become ready asynchronously.
//!
//! [`acquire`] polls a probe with bounded exponential backoff and hands back a
//! [`Scoped`] guard whose teardown runs exactly once, on drop or on [`Scoped::release`].

use std::fmt;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
}

impl RetryPolicy {
    /// Delay slept after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1).saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            multiplier: 2,
        }
    }
}

#[derive(Error, Debug)]
#[error("Resource not ready after {attempts} attempts: {last_error}")]
pub struct AcquireError {
    pub attempts: u32,
    pub last_error: String,
}

type Teardown<T> = Box<dyn FnOnce(&mut T) + Send>;

pub struct Scoped<T> {
    resource: Option<T>,
    teardown: Option<Teardown<T>>,
}

impl<T> Scoped<T> {
    pub fn new(resource: T) -> Self {
        Self {
            resource: Some(resource),
            teardown: None,
        }
    }

    pub fn with_teardown(mut self, teardown: impl FnOnce(&mut T) + Send + 'static) -> Self {
        self.teardown = Some(Box::new(teardown));
        self
    }

    /// Runs the teardown now and gives back the resource.
    pub fn release(mut self) -> Option<T> {
        self.run_teardown();
        self.resource.take()
    }

    fn run_teardown(&mut self) {
        if let (Some(teardown), Some(resource)) = (self.teardown.take(), self.resource.as_mut()) {
            teardown(resource);
        }
    }
}

impl<T> Deref for Scoped<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.resource.as_ref() {
            Some(resource) => resource,
            None => unreachable!("scoped resource accessed after release"),
        }
    }
}

impl<T> DerefMut for Scoped<T> {
    fn deref_mut(&mut self) -> &mut T {
        match self.resource.as_mut() {
            Some(resource) => resource,
            None => unreachable!("scoped resource accessed after release"),
        }
    }
}

impl<T> Drop for Scoped<T> {
    fn drop(&mut self) {
        self.run_teardown();
    }
}

impl<T: fmt::Debug> fmt::Debug for Scoped<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scoped")
            .field("resource", &self.resource)
            .field("has_teardown", &self.teardown.is_some())
            .finish()
    }
}

/// Calls `probe` until it yields the resource or `policy.max_attempts` is spent.
pub async fn acquire<T, E, F, Fut>(name: &str, policy: RetryPolicy, mut probe: F) -> Result<Scoped<T>, AcquireError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match probe().await {
            Ok(resource) => {
                debug!(resource = name, attempt, "Resource ready");
                return Ok(Scoped::new(resource));
            }
            Err(e) => {
                last_error = e.to_string();
                if attempt < max_attempts {
                    let delay = policy.delay_after(attempt);
                    warn!(
                        resource = name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %last_error,
                        "Resource not ready, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(AcquireError {
        attempts: max_attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            multiplier: 2,
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            multiplier: 2,
        };

        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
        assert_eq!(policy.delay_after(4), Duration::from_millis(500));
        assert_eq!(policy.delay_after(40), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_acquire_after_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let scoped = acquire("widget", fast_policy(5), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(format!("not yet ({})", n))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(*scoped, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_acquire_gives_up() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = acquire("widget", fast_policy(2), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("offline") }
        })
        .await
        .unwrap_err();

        assert_eq!(err.attempts, 2);
        assert_eq!(err.last_error, "offline");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_teardown_runs_once_on_drop() {
        let detached = Arc::new(AtomicU32::new(0));
        let counter = detached.clone();

        {
            let _scoped = Scoped::new(7).with_teardown(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(detached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_runs_teardown_and_returns_resource() {
        let detached = Arc::new(AtomicU32::new(0));
        let counter = detached.clone();

        let scoped = Scoped::new(String::from("handle")).with_teardown(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(scoped.release().as_deref(), Some("handle"));
        assert_eq!(detached.load(Ordering::SeqCst), 1);
    }
}
