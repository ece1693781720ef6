use std::time::Duration;

use rand::Rng;

use crate::policy::{CorePolicy, Policy};
use crate::scope::Scope;

/// Source of jitter randomness: draws a value in `[0, n)`.
///
/// The default draws from [`rand::rng`]; tests inject a deterministic one.
type RandFn = Box<dyn FnMut(u64) -> u64 + Send>;

/// Policy yielding exponentially growing, optionally jittered intervals.
///
/// Each call grows the previous interval by `multiplier` (when `> 1.0`),
/// clamps it to `max_interval` (when nonzero), then perturbs it uniformly
/// within `± interval * jitter` (when `jitter > 0`). The jittered result is
/// clamped to `max_interval` as well, so no returned interval ever exceeds
/// the ceiling.
pub struct Exponential {
    core: CorePolicy,
    rand: RandFn,
    initial: Duration,
    previous: Option<Duration>,
    jitter: f64,
    multiplier: f64,
    max_interval: Duration,
}

impl Exponential {
    /// Creates an exponential policy starting at `initial`, with no growth,
    /// no jitter, and no per-interval ceiling. `max_retries == 0` means
    /// unbounded.
    #[must_use]
    pub fn new(scope: Scope, initial: Duration, max_retries: u32) -> Self {
        Self {
            core: CorePolicy::new(scope, max_retries),
            rand: Box::new(|n| rand::rng().random_range(0..n)),
            initial,
            previous: None,
            jitter: 0.0,
            multiplier: 0.0,
            max_interval: Duration::ZERO,
        }
    }

    /// Sets the growth factor. Values `<= 1.0` disable growth.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the jitter fraction. Nonpositive values disable jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Sets the per-interval ceiling. Zero means unbounded.
    #[must_use]
    pub fn with_max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }

    /// Replaces the jitter randomness source. `rand(n)` must return a value
    /// in `[0, n)`.
    #[must_use]
    pub fn with_rand(mut self, rand: impl FnMut(u64) -> u64 + Send + 'static) -> Self {
        self.rand = Box::new(rand);
        self
    }

    /// Computes the next un-jittered interval and records it for the
    /// following call. The first call returns `initial` as is.
    fn next_base(&mut self) -> Duration {
        let base = match self.previous {
            None => self.initial,
            Some(prev) => {
                let mut base = prev;
                if self.multiplier > 1.0 {
                    let grown = prev.as_secs_f64() * self.multiplier;
                    base = if grown.is_finite() {
                        Duration::try_from_secs_f64(grown).unwrap_or(Duration::MAX)
                    } else {
                        Duration::MAX
                    };
                }
                if !self.max_interval.is_zero() && base > self.max_interval {
                    base = self.max_interval;
                }
                base
            }
        };

        self.previous = Some(base);
        base
    }

    /// Perturbs `base` uniformly within `base ± base * jitter`, then applies
    /// the per-interval ceiling.
    fn jitterize(&mut self, base: Duration) -> Duration {
        let mut next = base;
        if self.jitter > 0.0 {
            let base_ns = u64::try_from(base.as_nanos()).unwrap_or(u64::MAX);
            let delta = (base_ns as f64 * self.jitter) as u64;
            let draw = (self.rand)(delta.saturating_mul(2).saturating_add(1));
            next = Duration::from_nanos(base_ns.saturating_sub(delta).saturating_add(draw));
        }

        if !self.max_interval.is_zero() && next > self.max_interval {
            next = self.max_interval;
        }

        next
    }
}

impl Policy for Exponential {
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
        let base = self.next_base();
        Some(self.jitterize(base))
    }
}
