//! Response-body hygiene between attempts.

use async_trait::async_trait;
use reqwest::Response;

use crate::attempt::{Attempt, OnAttempt};

/// Observer that drains the response body of every non-final attempt.
///
/// Reading a body to its end is what lets the underlying connection return
/// to the pool instead of being torn down. The final attempt's response —
/// success or not — is left untouched for the caller.
///
/// [`ClientBuilder`](super::ClientBuilder) appends this observer after any
/// user-supplied ones, so those still see a live body.
#[derive(Debug, Default, Clone, Copy)]
pub struct CleanupResponse;

#[async_trait]
impl OnAttempt<Response> for CleanupResponse {
    async fn on_attempt(&self, attempt: Attempt<'_, Response>) {
        if attempt.done() {
            return;
        }

        if let Some(response) = attempt.result {
            while let Ok(Some(_)) = response.chunk().await {}
        }
    }
}
