//! # HTTP transactions as retryable tasks.
//!
//! [`HttpTask`] packages a request factory, a transport, and a converter
//! into a [`Task`] that can be handed to any runner over the converted value
//! type. It is the lower-level sibling of [`Client`](super::Client) for
//! callers who want a typed result rather than a raw response.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Response;

use crate::error::BoxError;
use crate::http::client::HttpClient;
use crate::http::convert::Converter;
use crate::http::factory::RequestFactory;
use crate::scope::{Scope, ScopeError};
use crate::task::Task;

/// An HTTP client task producing a `V` per attempt.
///
/// The workflow of one attempt: the factory mints the request, the client
/// executes it racing the scope, and the converter turns the response into
/// the task value. Without a converter, the response is drained and the
/// zero value of `V` is returned.
///
/// # Panics
///
/// Running the task panics if [`factory`](Self::factory) is unset. That is a
/// programmer error, detected at first use.
pub struct HttpTask<V> {
    /// Creates the request for each attempt. Required.
    pub factory: Option<Arc<dyn RequestFactory>>,

    /// Executes HTTP transactions. Defaults to a [`reqwest::Client`].
    pub client: Option<Arc<dyn HttpClient>>,

    /// Turns responses into values. Optional; see the type docs.
    pub converter: Option<Arc<dyn Converter<V>>>,
}

impl<V> Default for HttpTask<V> {
    fn default() -> Self {
        Self {
            factory: None,
            client: None,
            converter: None,
        }
    }
}

impl<V> HttpTask<V> {
    async fn transact(&self, scope: &Scope) -> Result<Response, BoxError> {
        let factory = self
            .factory
            .as_ref()
            .expect("HttpTask requires a request factory");
        let request = factory.request().await?;

        let default_client;
        let client: &dyn HttpClient = match &self.client {
            Some(client) => client.as_ref(),
            None => {
                default_client = reqwest::Client::new();
                &default_client
            }
        };

        tokio::select! {
            outcome = client.execute(request) => outcome,
            _ = scope.cancelled() => {
                Err(Box::new(scope.error().unwrap_or(ScopeError::Canceled)) as BoxError)
            }
        }
    }
}

#[async_trait]
impl<V> Task<V> for HttpTask<V>
where
    V: Default + Send + Sync + 'static,
{
    async fn run(&self, scope: Scope) -> Result<V, BoxError> {
        let mut response = self.transact(&scope).await?;

        match &self.converter {
            Some(converter) => converter.convert(response).await,
            None => {
                // Nobody will read this body; drain it so the connection
                // can be reused.
                while let Ok(Some(_)) = response.chunk().await {}
                Ok(V::default())
            }
        }
    }
}
