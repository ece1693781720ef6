//! Built-in attempt observer emitting `tracing` events.

use async_trait::async_trait;

use crate::attempt::{Attempt, OnAttempt};

/// Observer logging every attempt: failures at `warn`, successes at `debug`,
/// both carrying the retry count and the upcoming wait.
///
/// Register it like any other observer:
///
/// ```
/// use reattempt::{LogAttempts, Runner};
///
/// let runner: Runner<u32> = Runner::builder().on_attempt(LogAttempts).build();
/// # let _ = runner;
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAttempts;

#[async_trait]
impl<V: Send + 'static> OnAttempt<V> for LogAttempts {
    async fn on_attempt(&self, attempt: Attempt<'_, V>) {
        match attempt.error {
            Some(error) => tracing::warn!(
                retries = attempt.retries,
                next = ?attempt.next,
                done = attempt.done(),
                %error,
                "attempt failed",
            ),
            None => tracing::debug!(
                retries = attempt.retries,
                done = attempt.done(),
                "attempt succeeded",
            ),
        }
    }
}
