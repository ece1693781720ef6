//! # Retrying HTTP client.
//!
//! [`Client`] executes HTTP transactions through a
//! [`Runner`](crate::Runner)`<Response>`: the request is treated as a
//! prototype and re-created for every attempt, [`Requester`] mutators adjust
//! each attempt's request, and [`CleanupResponse`] keeps intermediate
//! response bodies from leaking connections.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Request, Response};

use crate::error::BoxError;
use crate::http::cleanup::CleanupResponse;
use crate::http::factory::{Prototype, RequestFactory};
use crate::runner::{Runner, RunnerBuilder};
use crate::scope::{Scope, ScopeError};

/// The required behaviour of the client side of an HTTP transaction:
/// execute one request, return one response.
///
/// Implemented for [`reqwest::Client`], which is also the default.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Executes a single HTTP transaction.
    async fn execute(&self, request: Request) -> Result<Response, BoxError>;
}

#[async_trait]
impl HttpClient for reqwest::Client {
    async fn execute(&self, request: Request) -> Result<Response, BoxError> {
        Ok(reqwest::Client::execute(self, request).await?)
    }
}

/// Strategy mutating an HTTP request before an attempt executes: add
/// headers, rewrite the URL, stamp attempt metadata.
///
/// Requesters run in registration order against every attempt's request,
/// after the request factory produced it.
pub type Requester = Box<dyn Fn(&mut Request) + Send + Sync>;

/// Builder for [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    http: Option<Arc<dyn HttpClient>>,
    requesters: Vec<Requester>,
    runner: Option<RunnerBuilder<Response>>,
}

impl ClientBuilder {
    /// Creates a builder with the default transport and a never-retry
    /// runner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transport executing HTTP transactions.
    #[must_use]
    pub fn http_client(mut self, client: impl HttpClient + 'static) -> Self {
        self.http = Some(Arc::new(client));
        self
    }

    /// Appends a request mutator. Requesters accumulate and run in the
    /// order they were added.
    #[must_use]
    pub fn requester(mut self, requester: impl Fn(&mut Request) + Send + Sync + 'static) -> Self {
        self.requesters.push(Box::new(requester));
        self
    }

    /// Sets the retry wiring for the client.
    ///
    /// [`CleanupResponse`] is appended to the builder's observers, so any
    /// observers already registered still see a live response body for
    /// intermediate attempts.
    #[must_use]
    pub fn runner(mut self, runner: RunnerBuilder<Response>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Builds the client. Without [`http_client`](Self::http_client) a
    /// default [`reqwest::Client`] is used; without
    /// [`runner`](Self::runner) transactions are never retried.
    #[must_use]
    pub fn build(self) -> Client {
        Client {
            http: self
                .http
                .unwrap_or_else(|| Arc::new(reqwest::Client::new())),
            requesters: self.requesters,
            runner: self
                .runner
                .unwrap_or_default()
                .on_attempt(CleanupResponse)
                .build(),
        }
    }
}

/// HTTP client that retries transactions according to a policy.
pub struct Client {
    http: Arc<dyn HttpClient>,
    requesters: Vec<Requester>,
    runner: Runner<Response>,
}

impl Client {
    /// Starts building a client.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Executes `request`, retrying according to the configured policy.
    ///
    /// The request is a prototype: it is cloned for every attempt, so its
    /// body must be absent or an in-memory buffer. Use
    /// [`execute_with`](Self::execute_with) and a
    /// [`Prototype`] body strategy for bodies that need explicit replay.
    pub async fn execute(&self, request: Request) -> Result<Response, BoxError> {
        self.execute_in(&Scope::new(), request).await
    }

    /// Like [`execute`](Self::execute), with the run bound to `parent`:
    /// cancelling it interrupts the in-flight attempt and any wait.
    pub async fn execute_in(&self, parent: &Scope, request: Request) -> Result<Response, BoxError> {
        self.execute_with(parent, &Prototype::new(request)).await
    }

    /// Executes the transaction described by `factory`, retrying according
    /// to the configured policy.
    ///
    /// Per attempt: the factory mints a fresh request, each requester
    /// mutates it in order, and the transport executes it racing the scope.
    /// Response bodies of non-final attempts are drained; the final response
    /// is returned untouched.
    pub async fn execute_with(
        &self,
        parent: &Scope,
        factory: &dyn RequestFactory,
    ) -> Result<Response, BoxError> {
        let task = |scope: Scope| async move {
            let mut request = factory.request().await?;
            for requester in &self.requesters {
                requester(&mut request);
            }

            tokio::select! {
                outcome = self.http.execute(request) => outcome,
                _ = scope.cancelled() => {
                    Err(Box::new(scope.error().unwrap_or(ScopeError::Canceled)) as BoxError)
                }
            }
        };

        self.runner.run(parent, &task).await
    }
}
