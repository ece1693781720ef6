//! # Per-attempt observation.
//!
//! After every task invocation — including the final, successful one — the
//! runner hands each registered [`OnAttempt`] observer an [`Attempt`] view of
//! what happened. Observers run one at a time, in registration order, on the
//! runner's own task; a slow observer delays the next retry.

use std::error::Error;
use std::time::Duration;

use async_trait::async_trait;

use crate::scope::Scope;

/// Snapshot of one task attempt, passed to observers.
///
/// The result is exposed mutably: the HTTP layer's cleanup observer uses
/// this to drain response bodies of non-final attempts.
pub struct Attempt<'a, V> {
    /// The policy scope spanning this run's attempts.
    pub scope: &'a Scope,

    /// The value produced by this attempt, when it succeeded.
    pub result: Option<&'a mut V>,

    /// The error produced by this attempt, when it failed.
    pub error: Option<&'a (dyn Error + Send + Sync + 'static)>,

    /// Number of retries so far; zero on the initial attempt.
    pub retries: u32,

    /// How long the runner will wait before the next retry. Zero means no
    /// further attempt will be made; prefer [`done`](Attempt::done) over
    /// checking this directly.
    pub next: Duration,
}

impl<V> Attempt<'_, V> {
    /// True if this is the last attempt of the run, whether because it
    /// succeeded, because retries stopped, or because the scope ended.
    #[must_use]
    pub fn done(&self) -> bool {
        self.next.is_zero() || self.scope.is_cancelled()
    }
}

/// Observer invoked after each attempt.
///
/// Implementations must return promptly and must not panic; the runner does
/// not proceed past an observer that has not returned. Plain closures
/// `Fn(Attempt<'_, V>)` implement this trait.
#[async_trait]
pub trait OnAttempt<V>: Send + Sync {
    /// Called once per task invocation, after the retry decision and the
    /// next interval are known.
    async fn on_attempt(&self, attempt: Attempt<'_, V>);
}

#[async_trait]
impl<V, F> OnAttempt<V> for F
where
    V: Send + 'static,
    F: for<'a> Fn(Attempt<'a, V>) + Send + Sync,
{
    async fn on_attempt(&self, attempt: Attempt<'_, V>) {
        (self)(attempt);
    }
}
