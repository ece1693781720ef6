//! # Example: backoff
//!
//! Demonstrates how a [`Runner`] retries a flaky task according to an
//! exponential [`Config`] and what its observer sees along the way.
//!
//! The task fails twice before succeeding, showing how the interval grows
//! and how the final attempt reports a zero `next`.
//!
//! ## Run
//! ```bash
//! cargo run --example backoff
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reattempt::{Attempt, BoxError, Config, Runner, Scope};

static ATTEMPTS: AtomicU64 = AtomicU64::new(0);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BoxError> {
    // 1. Exponential policy: 100ms, 200ms, 400ms... capped at 2s, 5 retries max.
    let policy = Config {
        interval: Duration::from_millis(100),
        multiplier: 2.0,
        jitter: 0.2,
        max_interval: Duration::from_secs(2),
        max_retries: 5,
        ..Config::default()
    };

    // 2. Observe every attempt.
    let runner: Runner<u64> = Runner::builder()
        .policy_factory(policy)
        .on_attempt(|a: Attempt<'_, u64>| match a.error {
            Some(err) => println!("[observer] retries={} next={:?} err={err}", a.retries, a.next),
            None => println!("[observer] retries={} done={}", a.retries, a.done()),
        })
        .build();

    // 3. A task that fails twice before succeeding.
    let flaky = |_scope: Scope| async move {
        let attempt = ATTEMPTS.fetch_add(1, Ordering::Relaxed) + 1;
        if attempt <= 2 {
            println!("[flaky] simulated failure #{attempt}");
            Err(BoxError::from(format!("boom #{attempt}")))
        } else {
            println!("[flaky] success on attempt {attempt}");
            Ok(attempt)
        }
    };

    // 4. Run it.
    let value = runner.run(&Scope::new(), &flaky).await?;
    println!("[main] succeeded with value {value}");
    Ok(())
}
