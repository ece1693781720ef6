//! # Task abstraction and function-backed task implementations.
//!
//! A [`Task`] is the unit of work a [`Runner`](crate::Runner) retries. It
//! receives a [`Scope`] and should honour it during long I/O; that is the
//! task's contract, not the runner's.
//!
//! Plain `Fn` closures returning futures already implement [`Task`].
//! [`TaskFn`] wraps `FnMut` closures that carry mutable state between
//! attempts.

use std::future::Future;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::scope::Scope;

/// An asynchronous, cancelable unit of work producing a `V`.
#[async_trait]
pub trait Task<V>: Send + Sync {
    /// Executes one attempt. Implementations should check
    /// [`Scope::is_cancelled`] (or select on [`Scope::cancelled`]) and exit
    /// promptly when the scope ends.
    async fn run(&self, scope: Scope) -> Result<V, BoxError>;
}

#[async_trait]
impl<V, F, Fut> Task<V> for F
where
    V: Send + 'static,
    F: Fn(Scope) -> Fut + Send + Sync,
    Fut: Future<Output = Result<V, BoxError>> + Send,
{
    async fn run(&self, scope: Scope) -> Result<V, BoxError> {
        (self)(scope).await
    }
}

/// Function-backed task for `FnMut` closures.
///
/// The closure is guarded by a [`Mutex`] so `run(&self, ..)` can call it
/// repeatedly. The mutex is held only while the closure creates its future,
/// not while the future executes.
///
/// # Example
/// ```
/// use reattempt::{BoxError, Scope, TaskFn};
///
/// let mut left = 3;
/// let countdown = TaskFn::new(move |_scope: Scope| {
///     left -= 1;
///     let left = left;
///     async move {
///         if left > 0 {
///             return Err(BoxError::from(format!("{left} to go")));
///         }
///         Ok(0u32)
///     }
/// });
/// # let _ = countdown;
/// ```
pub struct TaskFn<F> {
    func: Mutex<F>,
}

impl<F> TaskFn<F> {
    /// Wraps a closure as a task.
    pub fn new(func: F) -> Self {
        Self {
            func: Mutex::new(func),
        }
    }
}

#[async_trait]
impl<V, F, Fut> Task<V> for TaskFn<F>
where
    V: Send + 'static,
    F: FnMut(Scope) -> Fut + Send,
    Fut: Future<Output = Result<V, BoxError>> + Send,
{
    async fn run(&self, scope: Scope) -> Result<V, BoxError> {
        let fut = {
            let mut func = self
                .func
                .lock()
                .map_err(|_| BoxError::from("task closure poisoned"))?;
            (func)(scope)
        };

        fut.await
    }
}

/// Lifts a valueless task into one that always yields `value`, whatever the
/// error.
pub fn with_value<V, F, Fut>(value: V, task: F) -> impl Task<V>
where
    V: Clone + Send + Sync + 'static,
    F: Fn(Scope) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send,
{
    move |scope: Scope| {
        let value = value.clone();
        let fut = task(scope);
        async move {
            fut.await?;
            Ok(value)
        }
    }
}
