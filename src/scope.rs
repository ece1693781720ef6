//! # Cancellation scope shared by a series of attempts.
//!
//! A [`Scope`] is a clonable handle over a [`CancellationToken`] plus an
//! optional deadline. It spans one entire run of a task: the policy owns it,
//! the runner waits on it, and the task receives a clone so in-flight I/O can
//! stop cooperatively.
//!
//! Scopes form a tree. Cancelling a parent cancels every child; a child's
//! deadline never extends past its parent's.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use thiserror::Error;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

/// Why a [`Scope`] ended.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeError {
    /// The scope (or one of its ancestors) was cancelled explicitly.
    #[error("scope canceled")]
    Canceled,

    /// The scope's deadline passed before the work completed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// A cancellable, possibly deadline-bounded scope.
///
/// Cloning a `Scope` yields another handle to the same scope; cancelling
/// through any handle cancels them all.
///
/// # Example
/// ```
/// use reattempt::Scope;
///
/// let root = Scope::new();
/// let child = root.child();
/// root.cancel();
/// assert!(child.is_cancelled());
/// ```
#[derive(Clone, Debug)]
pub struct Scope {
    token: CancellationToken,
    deadline: Option<Instant>,
    cause: Arc<OnceLock<ScopeError>>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    /// Creates a root scope with no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
            cause: Arc::new(OnceLock::new()),
        }
    }

    /// Derives a child scope.
    ///
    /// The child is cancelled when this scope is cancelled and inherits this
    /// scope's deadline, but cancelling the child leaves this scope intact.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
            cause: Arc::new(OnceLock::new()),
        }
    }

    /// Derives a child scope that additionally expires after `timeout`.
    ///
    /// The effective deadline is the earlier of `now + timeout` and this
    /// scope's own deadline.
    #[must_use]
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let own = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) => parent.min(own),
            None => own,
        };

        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
            cause: Arc::new(OnceLock::new()),
        }
    }

    /// Cancels this scope and all scopes derived from it. Idempotent.
    pub fn cancel(&self) {
        let cause = if self.deadline_passed() {
            ScopeError::DeadlineExceeded
        } else {
            ScopeError::Canceled
        };
        let _ = self.cause.set(cause);
        self.token.cancel();
    }

    /// True once this scope has been cancelled or its deadline has passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.error().is_some()
    }

    /// Returns the reason this scope ended, or `None` while it is live.
    ///
    /// The first observed cause is latched: a scope that hit its deadline
    /// keeps reporting [`ScopeError::DeadlineExceeded`] even if `cancel` is
    /// called afterwards.
    #[must_use]
    pub fn error(&self) -> Option<ScopeError> {
        if let Some(cause) = self.cause.get() {
            return Some(*cause);
        }

        if self.deadline_passed() {
            let _ = self.cause.set(ScopeError::DeadlineExceeded);
            return self.cause.get().copied();
        }

        // Parent-driven cancellation arrives through the token without
        // passing through our `cancel`.
        if self.token.is_cancelled() {
            let _ = self.cause.set(ScopeError::Canceled);
            return self.cause.get().copied();
        }

        None
    }

    /// Completes when the scope is cancelled or its deadline passes.
    ///
    /// Completes immediately if that already happened.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = time::sleep_until(deadline) => {
                        let _ = self.cause.set(ScopeError::DeadlineExceeded);
                    }
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// The instant at which this scope expires, if it carries a deadline.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_scope_is_live() {
        let scope = Scope::new();
        assert!(!scope.is_cancelled());
        assert_eq!(scope.error(), None);
    }

    #[test]
    fn cancel_is_idempotent() {
        let scope = Scope::new();
        scope.cancel();
        scope.cancel();
        assert_eq!(scope.error(), Some(ScopeError::Canceled));
    }

    #[test]
    fn parent_cancel_reaches_child() {
        let parent = Scope::new();
        let child = parent.child();

        parent.cancel();
        assert!(child.is_cancelled());
        assert_eq!(child.error(), Some(ScopeError::Canceled));
    }

    #[test]
    fn child_cancel_leaves_parent_live() {
        let parent = Scope::new();
        let child = parent.child();

        child.cancel();
        assert!(!parent.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_reports_deadline_exceeded() {
        let scope = Scope::new().child_with_timeout(Duration::from_secs(10));
        assert!(!scope.is_cancelled());

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(scope.is_cancelled());
        assert_eq!(scope.error(), Some(ScopeError::DeadlineExceeded));

        // The first cause wins even if cancel comes in later.
        scope.cancel();
        assert_eq!(scope.error(), Some(ScopeError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_completes_at_deadline() {
        let scope = Scope::new().child_with_timeout(Duration::from_secs(5));

        let waiter = tokio::spawn({
            let scope = scope.clone();
            async move { scope.cancelled().await }
        });

        tokio::time::advance(Duration::from_secs(6)).await;
        waiter.await.unwrap();
        assert_eq!(scope.error(), Some(ScopeError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn child_deadline_never_extends_parent() {
        let parent = Scope::new().child_with_timeout(Duration::from_secs(5));
        let child = parent.child_with_timeout(Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(child.error(), Some(ScopeError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn cancelled_completes_immediately_when_already_cancelled() {
        let scope = Scope::new();
        scope.cancel();
        scope.cancelled().await;
    }
}
