//! Status-class retry predicate for HTTP transactions.

use std::collections::HashSet;

use reqwest::{Response, StatusCode};

use crate::error::{temporary_hint, BoxError};

/// Builds a retry predicate from a set of retryable status codes.
///
/// The returned predicate retries:
/// - responses whose status is in `codes`;
/// - transport errors classified as temporary (an explicit
///   [`Temporary`](crate::Temporary) marker in the chain, a reqwest timeout
///   or connection failure, or a transient I/O error kind).
///
/// Every other error is considered fatal and halts retries.
///
/// # Example
/// ```
/// use reqwest::StatusCode;
/// use reattempt::http::retry_status;
/// use reattempt::Runner;
///
/// let runner = Runner::builder()
///     .should_retry(retry_status([
///         StatusCode::TOO_MANY_REQUESTS,
///         StatusCode::SERVICE_UNAVAILABLE,
///     ]))
///     .build();
/// # let _ = runner;
/// ```
pub fn retry_status<I>(codes: I) -> impl Fn(&Result<Response, BoxError>) -> bool + Send + Sync
where
    I: IntoIterator<Item = StatusCode>,
{
    let codes: HashSet<StatusCode> = codes.into_iter().collect();

    move |outcome| match outcome {
        Ok(response) => codes.contains(&response.status()),
        Err(err) => temporary_hint(err.as_ref()).unwrap_or(false),
    }
}
