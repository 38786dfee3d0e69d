//! Bounded wait for a collaborator that may not be initialised yet.
//!
//! Best effort only: when the probe never succeeds the wait gives up quietly
//! (a debug log line) and the caller skips whatever it wanted to do.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            max_attempts: 10,
        }
    }
}

/// Polls `probe` every `policy.interval` until it yields a value, at most
/// `policy.max_attempts` times.
pub async fn wait_for<T, F>(what: &str, policy: RetryPolicy, mut probe: F) -> Option<T>
where
    F: FnMut() -> Option<T>,
{
    for attempt in 1..=policy.max_attempts {
        if let Some(ready) = probe() {
            if attempt > 1 {
                tracing::debug!("{what} ready after {attempt} attempts");
            }
            return Some(ready);
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    tracing::debug!(
        "{what} not ready after {} attempts, giving up",
        policy.max_attempts
    );
    None
}
