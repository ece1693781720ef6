use std::time::Duration;

use crate::policy::Policy;
use crate::scope::Scope;

/// The policy that never retries.
///
/// It still owns a scope so callers get a uniform handle for cancelling the
/// single attempt.
#[derive(Debug)]
pub struct Never {
    scope: Scope,
}

impl Never {
    /// Creates a never-retry policy over the given scope.
    #[must_use]
    pub fn new(scope: Scope) -> Self {
        Self { scope }
    }
}

impl Policy for Never {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn cancel(&mut self) {
        self.scope.cancel();
    }

    fn next(&mut self) -> Option<Duration> {
        None
    }
}

impl Drop for Never {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
