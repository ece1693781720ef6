//! # reattempt
//!
//! **Reattempt** is a task retry engine: policies that pace retries,
//! a runner that executes cancellable tasks, observers that watch every
//! attempt, and an HTTP client adapter built on top of all three.
//!
//! ## Features
//!
//! | Area            | Description                                                        | Key types / traits                        |
//! |-----------------|--------------------------------------------------------------------|-------------------------------------------|
//! | **Policies**    | Pace retries: never, constant, exponential with jitter and caps.   | [`Config`], [`Policy`], [`PolicyFactory`] |
//! | **Runner**      | Execute a task, classify failures, wait, retry, report one outcome.| [`Runner`], [`Task`]                      |
//! | **Scopes**      | Cancellation and deadlines spanning a whole series of attempts.    | [`Scope`], [`ScopeError`]                 |
//! | **Observers**   | Hook into every attempt (logging, metrics, cleanup).               | [`OnAttempt`], [`Attempt`], [`LogAttempts`] |
//! | **Retryability**| Decide which outcomes warrant another attempt.                     | [`set_retryable`], [`check_retry`]        |
//! | **HTTP**        | Retry HTTP transactions with body replay and response hygiene.     | [`http::Client`], [`http::retry_status`]  |
//!
//! ```no_run
//! use std::time::Duration;
//! use reattempt::{BoxError, Config, Runner, Scope};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), BoxError> {
//!     let runner: Runner<u32> = Runner::builder()
//!         .policy_factory(Config {
//!             interval: Duration::from_millis(100),
//!             multiplier: 2.0,
//!             jitter: 0.2,
//!             max_retries: 5,
//!             ..Config::default()
//!         })
//!         .build();
//!
//!     // The task receives the policy's scope and is retried on failure.
//!     let value = runner
//!         .run(&Scope::new(), &|_scope: Scope| async move {
//!             Ok::<_, BoxError>(123u32)
//!         })
//!         .await?;
//!
//!     println!("answer: {value}");
//!     Ok(())
//! }
//! ```
//!
//! ---

mod attempt;
mod config;
mod error;
mod observe;
mod policies;
mod policy;
mod runner;
mod scope;
mod should_retry;
mod task;
mod timer;

pub mod http;

// ---- Public re-exports ----

pub use attempt::{Attempt, OnAttempt};
pub use config::Config;
pub use error::{set_temporary, temporary_hint, BoxError, Temporary};
pub use observe::LogAttempts;
pub use policies::{Constant, Exponential, Never};
pub use policy::{Policy, PolicyFactory};
pub use runner::{Runner, RunnerBuilder};
pub use scope::{Scope, ScopeError};
pub use should_retry::{
    check_retry, default_retryability, retryable_hint, set_retryable, Retryable, ShouldRetry,
};
pub use task::{with_value, Task, TaskFn};
pub use timer::{ImmediateTimer, Timer, TokioTimer};
