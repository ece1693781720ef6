use std::time::Duration;

use crate::policy::{CorePolicy, Policy};
use crate::scope::Scope;

/// Policy yielding the same interval for every retry.
///
/// Slightly cheaper than [`Exponential`](super::Exponential) with a
/// multiplier of 1.0; [`Config`](crate::Config) picks it automatically when
/// neither jitter nor growth is requested.
#[derive(Debug)]
pub struct Constant {
    core: CorePolicy,
    interval: Duration,
}

impl Constant {
    /// Creates a constant policy. `max_retries == 0` means unbounded.
    #[must_use]
    pub fn new(scope: Scope, interval: Duration, max_retries: u32) -> Self {
        Self {
            core: CorePolicy::new(scope, max_retries),
            interval,
        }
    }
}

impl Policy for Constant {
    fn scope(&self) -> &Scope {
        &self.core.scope
    }

    fn cancel(&mut self) {
        self.core.cancel();
    }

    fn next(&mut self) -> Option<Duration> {
        if !self.core.within_limits() {
            return None;
        }

        self.core.retry_count += 1;
        Some(self.interval)
    }
}
