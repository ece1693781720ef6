//! # The retryability decision.
//!
//! [`check_retry`] decides whether a task outcome warrants another attempt.
//! Errors can opt in (or out) of retries by carrying a [`Retryable`] marker,
//! created with [`set_retryable`]; callers can override everything with a
//! predicate over the whole outcome.

use std::error::Error;
use std::fmt;

use crate::error::BoxError;

/// Predicate deciding whether a task outcome warrants a retry.
///
/// The predicate sees every outcome, including successes, so adapters can
/// retry on the content of a value (the HTTP layer retries on status codes
/// this way).
pub type ShouldRetry<V> = dyn Fn(&Result<V, BoxError>) -> bool + Send + Sync;

/// Wrapper error that associates an explicit retryability with its cause.
///
/// The wrapped error stays visible through [`Error::source`], so chain
/// inspection and downcasting keep working.
#[derive(Debug)]
pub struct Retryable {
    retryable: bool,
    source: BoxError,
}

impl Retryable {
    /// The retryability carried by this wrapper.
    #[must_use]
    pub fn should_retry(&self) -> bool {
        self.retryable
    }
}

impl fmt::Display for Retryable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

impl Error for Retryable {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}

/// Associates retryability with `err`, preserving it in the error chain.
pub fn set_retryable(err: impl Into<BoxError>, retryable: bool) -> BoxError {
    Box::new(Retryable {
        retryable,
        source: err.into(),
    })
}

/// Returns the retryability carried by the error chain, if any link carries
/// one.
#[must_use]
pub fn retryable_hint(err: &(dyn Error + 'static)) -> Option<bool> {
    let mut current = Some(err);
    while let Some(link) = current {
        if let Some(marker) = link.downcast_ref::<Retryable>() {
            return Some(marker.should_retry());
        }
        current = link.source();
    }

    None
}

/// Default error classification, combining both in-error signals.
///
/// An error is retryable if its chain carries a [`Retryable`] signal (which
/// wins), else if it classifies as temporary (see
/// [`temporary_hint`](crate::temporary_hint)), else yes: an error that says
/// nothing about itself is assumed transient.
#[must_use]
pub fn default_retryability(err: &(dyn Error + 'static)) -> bool {
    retryable_hint(err)
        .or_else(|| crate::error::temporary_hint(err))
        .unwrap_or(true)
}

/// Decides whether a task outcome warrants a retry.
///
/// - Without a predicate, a success never retries; an error retries
///   according to the [`Retryable`] signal in its chain, defaulting to yes
///   (an unclassified failure is assumed transient).
/// - With a predicate, the predicate decides for every outcome — it wins
///   over the in-error signal so callers can override it.
pub fn check_retry<V>(outcome: &Result<V, BoxError>, predicate: Option<&ShouldRetry<V>>) -> bool {
    match (outcome, predicate) {
        (Ok(_), None) => false,
        (_, Some(p)) => p(outcome),
        (Err(err), None) => retryable_hint(err.as_ref()).unwrap_or(true),
    }
}
