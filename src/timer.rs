//! # Injectable wait primitive.
//!
//! The runner never sleeps directly; it asks a [`Timer`] for a wake-up
//! future and races it against cancellation. Dropping the future before it
//! completes is the (idempotent) way to stop the timer, which is exactly
//! what losing a `select!` does.

use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};

/// Strategy for starting a wake-up timer.
///
/// The default implementation uses real time; tests typically inject
/// [`ImmediateTimer`].
pub trait Timer: Send + Sync {
    /// Returns a future that completes approximately `interval` from now.
    fn sleep(&self, interval: Duration) -> BoxFuture<'static, ()>;
}

/// The real-time [`Timer`], backed by [`tokio::time::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    fn sleep(&self, interval: Duration) -> BoxFuture<'static, ()> {
        tokio::time::sleep(interval).boxed()
    }
}

/// A [`Timer`] whose futures complete immediately, regardless of interval.
///
/// Lets tests drive a retry loop through all its waits without consuming
/// wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateTimer;

impl Timer for ImmediateTimer {
    fn sleep(&self, _interval: Duration) -> BoxFuture<'static, ()> {
        future::ready(()).boxed()
    }
}
