//! # Policy configuration.
//!
//! [`Config`] is the canonical [`PolicyFactory`]: a plain value type friendly
//! to being deserialized from external sources, selecting among the three
//! policy kinds from its field values.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use reattempt::{Config, PolicyFactory, Scope};
//!
//! let cfg = Config {
//!     interval: Duration::from_millis(100),
//!     multiplier: 2.0,
//!     max_retries: 5,
//!     ..Config::default()
//! };
//!
//! let mut policy = cfg.new_policy(&Scope::new());
//! assert_eq!(policy.next(), Some(Duration::from_millis(100)));
//! assert_eq!(policy.next(), Some(Duration::from_millis(200)));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::policies::{Constant, Exponential, Never};
use crate::policy::{Policy, PolicyFactory};
use crate::scope::Scope;

/// The possible options when creating a policy.
///
/// Three kinds of policies come out of this type:
/// - `interval` unset: the policy never retries;
/// - `interval` set, `jitter` and `multiplier` unset: a constant backoff;
/// - otherwise: an exponential backoff.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Retry interval for a constant backoff; the starting interval for an
    /// exponential backoff. Unset disables retries entirely.
    pub interval: Duration,

    /// Random jitter fraction for an exponential backoff. Nonpositive
    /// values are ignored.
    pub jitter: f64,

    /// Interval multiplier for an exponential backoff. Values `<= 1.0` are
    /// ignored; if `jitter` is also unset the policy is a constant backoff.
    pub multiplier: f64,

    /// Absolute maximum number of retries, regardless of other fields.
    /// Zero retries until success.
    pub max_retries: u32,

    /// Absolute wall-clock budget for an operation and all its retries.
    /// Zero enforces no budget.
    pub max_elapsed_time: Duration,

    /// Upper limit for each interval of an exponential backoff. Zero means
    /// unbounded; constant backoffs ignore this field.
    pub max_interval: Duration,
}

impl Config {
    /// Derives the scope the policy will span: deadline-bounded when
    /// `max_elapsed_time` is set, plain cancellable otherwise.
    fn new_policy_scope(&self, parent: &Scope) -> Scope {
        if self.max_elapsed_time > Duration::ZERO {
            parent.child_with_timeout(self.max_elapsed_time)
        } else {
            parent.child()
        }
    }
}

impl PolicyFactory for Config {
    fn new_policy(&self, parent: &Scope) -> Box<dyn Policy> {
        let scope = self.new_policy_scope(parent);
        if self.interval.is_zero() {
            return Box::new(Never::new(scope));
        }

        if self.jitter <= 0.0 && self.multiplier <= 1.0 {
            return Box::new(Constant::new(scope, self.interval, self.max_retries));
        }

        Box::new(
            Exponential::new(scope, self.interval, self.max_retries)
                .with_jitter(self.jitter)
                .with_multiplier(self.multiplier)
                .with_max_interval(self.max_interval),
        )
    }
}
