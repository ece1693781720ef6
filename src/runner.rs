//! # The retry orchestration loop.
//!
//! A [`Runner`] executes a task at least once, retrying failures according
//! to its policy factory:
//!
//! ```text
//!   run(parent, task)
//!        │ fresh policy (factory) ── scope spans all attempts
//!        ▼
//!   ┌─► task(scope) ──► check_retry ──► policy.next()
//!   │        └─────── observers (in order, next included) ──────┐
//!   │                                                           ▼
//!   └── timer(interval) ◄─ select ─► scope.cancelled() ──► scope error
//! ```
//!
//! Exactly one outcome comes back: the value of the final successful
//! attempt, the task error that stopped retries, or the scope error when the
//! run was cancelled (which supersedes any task error seen before the wait).

use std::sync::Arc;
use std::time::Duration;

use crate::attempt::{Attempt, OnAttempt};
use crate::error::BoxError;
use crate::policies::Never;
use crate::policy::{Policy, PolicyFactory};
use crate::scope::{Scope, ScopeError};
use crate::should_retry::{check_retry, ShouldRetry};
use crate::task::Task;
use crate::timer::{ImmediateTimer, Timer, TokioTimer};

/// Builder for [`Runner`], accepting any subset of its options.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use reattempt::{Config, Runner};
///
/// let runner: Runner<u32> = Runner::builder()
///     .policy_factory(Config {
///         interval: Duration::from_millis(100),
///         max_retries: 3,
///         ..Config::default()
///     })
///     .build();
/// ```
pub struct RunnerBuilder<V> {
    factory: Option<Arc<dyn PolicyFactory>>,
    should_retry: Option<Box<ShouldRetry<V>>>,
    on_attempts: Vec<Box<dyn OnAttempt<V>>>,
    timer: Box<dyn Timer>,
}

impl<V: Send + 'static> Default for RunnerBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Send + 'static> RunnerBuilder<V> {
    /// Creates a builder with no policy (no retries), no predicate, no
    /// observers, and the real-time timer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factory: None,
            should_retry: None,
            on_attempts: Vec::new(),
            timer: Box::new(TokioTimer),
        }
    }

    /// Sets the factory producing a fresh policy per run. Without one, the
    /// runner never retries.
    #[must_use]
    pub fn policy_factory(mut self, factory: impl PolicyFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Sets the predicate deciding which outcomes warrant a retry. It is
    /// consulted for every outcome and wins over any in-error signal.
    #[must_use]
    pub fn should_retry(
        mut self,
        predicate: impl Fn(&Result<V, BoxError>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_retry = Some(Box::new(predicate));
        self
    }

    /// Appends an observer. Observers accumulate and run in insertion order
    /// after every attempt.
    #[must_use]
    pub fn on_attempt(mut self, observer: impl OnAttempt<V> + 'static) -> Self {
        self.on_attempts.push(Box::new(observer));
        self
    }

    /// Replaces the wait timer. Mainly useful in tests.
    #[must_use]
    pub fn timer(mut self, timer: impl Timer + 'static) -> Self {
        self.timer = Box::new(timer);
        self
    }

    /// Shorthand for [`timer`](Self::timer)`(`[`ImmediateTimer`]`)`.
    #[must_use]
    pub fn immediate_timer(self) -> Self {
        self.timer(ImmediateTimer)
    }

    /// Builds the runner.
    #[must_use]
    pub fn build(self) -> Runner<V> {
        Runner {
            factory: self.factory,
            should_retry: self.should_retry,
            on_attempts: self.on_attempts,
            timer: self.timer,
        }
    }
}

/// Task executor honouring retry semantics.
///
/// A runner composes a [`PolicyFactory`], an optional retry predicate, an
/// ordered list of [`OnAttempt`] observers, and a [`Timer`]. It holds no
/// per-run state, so one runner can serve many sequential runs.
pub struct Runner<V> {
    factory: Option<Arc<dyn PolicyFactory>>,
    should_retry: Option<Box<ShouldRetry<V>>>,
    on_attempts: Vec<Box<dyn OnAttempt<V>>>,
    timer: Box<dyn Timer>,
}

impl<V: Send + 'static> Runner<V> {
    /// Starts building a runner.
    #[must_use]
    pub fn builder() -> RunnerBuilder<V> {
        RunnerBuilder::new()
    }

    /// Executes `task` at least once, retrying failures according to the
    /// configured policy.
    ///
    /// The policy factory may impose a wall-clock budget (for example
    /// [`Config::max_elapsed_time`](crate::Config::max_elapsed_time)); once
    /// it is reached, attempts halt regardless of the state of `parent`.
    pub async fn run<T>(&self, parent: &Scope, task: &T) -> Result<V, BoxError>
    where
        T: Task<V> + ?Sized,
    {
        let mut policy = self.new_policy(parent);
        let outcome = self.attempt_loop(policy.as_mut(), task).await;
        policy.cancel();
        outcome
    }

    /// Creates the policy for one series of attempts.
    fn new_policy(&self, parent: &Scope) -> Box<dyn Policy> {
        match &self.factory {
            Some(factory) => factory.new_policy(parent),
            None => Box::new(Never::new(parent.child())),
        }
    }

    async fn attempt_loop<T>(&self, policy: &mut dyn Policy, task: &T) -> Result<V, BoxError>
    where
        T: Task<V> + ?Sized,
    {
        let scope = policy.scope().clone();
        let mut retries: u32 = 0;

        while !scope.is_cancelled() {
            let outcome = task.run(scope.clone()).await;
            let (outcome, next) = self.handle_attempt(policy, &scope, retries, outcome).await;

            let Some(interval) = next else {
                return outcome;
            };

            // Losing the select drops the sleep, which stops the timer.
            tokio::select! {
                _ = scope.cancelled() => {
                    return Err(Box::new(scope.error().unwrap_or(ScopeError::Canceled)));
                }
                _ = self.timer.sleep(interval) => {}
            }

            retries += 1;
        }

        Err(Box::new(scope.error().unwrap_or(ScopeError::Canceled)))
    }

    /// Deals with the aftermath of one attempt: decides whether to keep
    /// trying, advances the policy, and dispatches the observers, which see
    /// the interval the runner is about to wait (zero on the final attempt).
    async fn handle_attempt(
        &self,
        policy: &mut dyn Policy,
        scope: &Scope,
        retries: u32,
        mut outcome: Result<V, BoxError>,
    ) -> (Result<V, BoxError>, Option<Duration>) {
        let keep_trying = check_retry(&outcome, self.should_retry.as_deref());

        // If the outcome already ruled retries out, the policy is not
        // consulted and keeps its remaining budget.
        let next = if keep_trying { policy.next() } else { None };

        for observer in &self.on_attempts {
            let (result, error) = match &mut outcome {
                Ok(value) => (Some(value), None),
                Err(err) => (None, Some(&**err)),
            };
            observer
                .on_attempt(Attempt {
                    scope,
                    result,
                    error,
                    retries,
                    next: next.unwrap_or_default(),
                })
                .await;
        }

        (outcome, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::should_retry::set_retryable;
    use crate::task::TaskFn;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex;

    /// What an observer saw for one attempt.
    #[derive(Debug, Clone, PartialEq)]
    struct Seen {
        retries: u32,
        next: Duration,
        result: Option<u32>,
        error: Option<String>,
    }

    #[derive(Default)]
    struct Recorder {
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    impl Recorder {
        fn observer(&self) -> impl for<'a> Fn(Attempt<'a, u32>) + Send + Sync {
            let seen = Arc::clone(&self.seen);
            move |attempt: Attempt<'_, u32>| {
                seen.lock().unwrap().push(Seen {
                    retries: attempt.retries,
                    next: attempt.next,
                    result: attempt.result.map(|v| *v),
                    error: attempt.error.map(|e| e.to_string()),
                });
            }
        }

        fn take(&self) -> Vec<Seen> {
            self.seen.lock().unwrap().clone()
        }
    }

    fn constant_policy(interval: Duration) -> Config {
        Config {
            interval,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn first_attempt_success_with_no_policy() {
        let recorder = Recorder::default();
        let runner = Runner::builder().on_attempt(recorder.observer()).build();

        let value = runner
            .run(&Scope::new(), &|_scope: Scope| async move {
                Ok::<_, BoxError>(123u32)
            })
            .await
            .unwrap();

        assert_eq!(value, 123);
        assert_eq!(
            recorder.take(),
            vec![Seen {
                retries: 0,
                next: Duration::ZERO,
                result: Some(123),
                error: None,
            }]
        );
    }

    #[tokio::test]
    async fn succeeds_after_retries() {
        let recorder = Recorder::default();
        let runner = Runner::builder()
            .policy_factory(constant_policy(Duration::from_secs(5)))
            .immediate_timer()
            .on_attempt(recorder.observer())
            .build();

        let mut failures_left = 2u32;
        let task = TaskFn::new(move |_scope: Scope| {
            let fail = failures_left > 0;
            failures_left = failures_left.saturating_sub(1);
            async move {
                if fail {
                    Err(BoxError::from("still warming up"))
                } else {
                    Ok(123u32)
                }
            }
        });

        let value = runner.run(&Scope::new(), &task).await.unwrap();
        assert_eq!(value, 123);

        let seen = recorder.take();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].retries, 0);
        assert_eq!(seen[0].next, Duration::from_secs(5));
        assert_eq!(seen[1].retries, 1);
        assert_eq!(seen[1].next, Duration::from_secs(5));
        assert_eq!(seen[2].retries, 2);
        assert_eq!(seen[2].next, Duration::ZERO);
        assert_eq!(seen[2].result, Some(123));
    }

    /// Timer firing immediately for the first `fire_first` sleeps, then
    /// hanging forever; records whether a hanging sleep was dropped (i.e.
    /// the timer was stopped) before completing.
    struct HangingTimer {
        fire_first: u32,
        started: Arc<AtomicU32>,
        stopped: Arc<AtomicBool>,
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    impl Timer for HangingTimer {
        fn sleep(&self, _interval: Duration) -> BoxFuture<'static, ()> {
            let nth = self.started.fetch_add(1, Ordering::SeqCst) + 1;
            if nth <= self.fire_first {
                return futures::future::ready(()).boxed();
            }

            let flag = DropFlag(Arc::clone(&self.stopped));
            async move {
                let _flag = flag;
                futures::future::pending::<()>().await
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn cancel_during_wait_surfaces_the_scope_error() {
        let started = Arc::new(AtomicU32::new(0));
        let stopped = Arc::new(AtomicBool::new(false));
        let attempts = Arc::new(AtomicU32::new(0));
        let recorder = Recorder::default();

        let runner = Runner::builder()
            .policy_factory(constant_policy(Duration::from_secs(5)))
            .timer(HangingTimer {
                fire_first: 2,
                started: Arc::clone(&started),
                stopped: Arc::clone(&stopped),
            })
            .on_attempt(recorder.observer())
            .build();

        let parent = Scope::new();
        let run = tokio::spawn({
            let parent = parent.clone();
            let attempts = Arc::clone(&attempts);
            async move {
                runner
                    .run(&parent, &move |_scope: Scope| {
                        let attempts = Arc::clone(&attempts);
                        async move {
                            attempts.fetch_add(1, Ordering::SeqCst);
                            Err::<u32, _>(BoxError::from("flaky"))
                        }
                    })
                    .await
            }
        });

        // The first two waits fire immediately; the third hangs and pins the
        // run inside the select until the parent is cancelled.
        while started.load(Ordering::SeqCst) < 3 {
            tokio::task::yield_now().await;
        }
        parent.cancel();

        let err = run.await.unwrap().unwrap_err();
        let scope_err = err.downcast_ref::<ScopeError>().expect("scope error");
        assert_eq!(*scope_err, ScopeError::Canceled);

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(stopped.load(Ordering::SeqCst), "timer was not stopped");
        assert_eq!(recorder.take().len(), 3);
    }

    #[tokio::test]
    async fn carried_retryability_halts_after_one_attempt() {
        let recorder = Recorder::default();
        let runner = Runner::builder()
            .policy_factory(constant_policy(Duration::from_secs(5)))
            .immediate_timer()
            .on_attempt(recorder.observer())
            .build();

        let attempts = Arc::new(AtomicU32::new(0));
        let task = {
            let attempts = Arc::clone(&attempts);
            move |_scope: Scope| {
                let attempts = Arc::clone(&attempts);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<u32, _>(set_retryable("bad request", false))
                }
            }
        };

        let err = runner.run(&Scope::new(), &task).await.unwrap_err();
        assert_eq!(err.to_string(), "bad request");
        assert_eq!(attempts.load(Ordering::SeqCst), 1);

        let seen = recorder.take();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].next, Duration::ZERO);
    }

    #[tokio::test]
    async fn predicate_overrides_the_default_decision() {
        let runner = Runner::builder()
            .policy_factory(constant_policy(Duration::from_millis(1)))
            .immediate_timer()
            .should_retry(|outcome: &Result<u32, BoxError>| {
                matches!(outcome, Err(e) if e.to_string() == "transient")
            })
            .build();

        let mut first = true;
        let task = TaskFn::new(move |_scope: Scope| {
            let transient = first;
            first = false;
            async move {
                Err::<u32, _>(BoxError::from(if transient { "transient" } else { "fatal" }))
            }
        });

        let err = runner.run(&Scope::new(), &task).await.unwrap_err();
        assert_eq!(err.to_string(), "fatal");
    }

    #[tokio::test]
    async fn already_cancelled_parent_runs_zero_attempts() {
        let attempts = Arc::new(AtomicU32::new(0));
        let runner: Runner<u32> = Runner::builder().build();

        let parent = Scope::new();
        parent.cancel();

        let err = {
            let attempts = Arc::clone(&attempts);
            runner
                .run(&parent, &move |_scope: Scope| {
                    let attempts = Arc::clone(&attempts);
                    async move {
                        attempts.fetch_add(1, Ordering::SeqCst);
                        Ok(1u32)
                    }
                })
                .await
                .unwrap_err()
        };

        assert!(err.downcast_ref::<ScopeError>().is_some());
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn observers_run_in_insertion_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let tag = |name: &'static str| {
            let order = Arc::clone(&order);
            move |_attempt: Attempt<'_, u32>| order.lock().unwrap().push(name)
        };

        let runner = Runner::builder()
            .on_attempt(tag("first"))
            .on_attempt(tag("second"))
            .build();

        runner
            .run(&Scope::new(), &|_scope: Scope| async move {
                Ok::<_, BoxError>(1u32)
            })
            .await
            .unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_time_budget_ends_the_run_mid_wait() {
        let attempts = Arc::new(AtomicU32::new(0));
        let runner = Runner::builder()
            .policy_factory(Config {
                interval: Duration::from_secs(5),
                max_elapsed_time: Duration::from_secs(12),
                ..Config::default()
            })
            .build();

        let err = {
            let attempts = Arc::clone(&attempts);
            runner
                .run(&Scope::new(), &move |_scope: Scope| {
                    let attempts = Arc::clone(&attempts);
                    async move {
                        attempts.fetch_add(1, Ordering::SeqCst);
                        Err::<u32, _>(BoxError::from("flaky"))
                    }
                })
                .await
                .unwrap_err()
        };

        let scope_err = err.downcast_ref::<ScopeError>().expect("scope error");
        assert_eq!(*scope_err, ScopeError::DeadlineExceeded);
        // Attempts start at t = 0s, 5s, 10s; the budget ends the third wait.
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
