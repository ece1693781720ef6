//! # Response converters.
//!
//! A [`Converter`] turns the final [`Response`] of a run into a typed value.
//! Converters see every response, including non-success ones, so they may
//! turn those into errors. Plain `async fn(Response) -> Result<V, BoxError>`
//! functions and closures implement the trait; the ones here cover the
//! common cases.

use std::future::Future;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::BoxError;

/// Converts a response into an arbitrary value.
#[async_trait]
pub trait Converter<V>: Send + Sync {
    /// Consumes the response and produces the task value.
    async fn convert(&self, response: Response) -> Result<V, BoxError>;
}

#[async_trait]
impl<V, F, Fut> Converter<V> for F
where
    V: Send + 'static,
    F: Fn(Response) -> Fut + Send + Sync,
    Fut: Future<Output = Result<V, BoxError>> + Send,
{
    async fn convert(&self, response: Response) -> Result<V, BoxError> {
        (self)(response).await
    }
}

/// `Converter<bool>`: true for a 2xx status, false otherwise.
///
/// For most callers a non-2xx response should become an error with retry
/// semantics attached; this is for the simplest fire-and-check cases.
pub async fn success(response: Response) -> Result<bool, BoxError> {
    Ok(response.status().is_success())
}

/// `Converter<Bytes>`: the raw response body.
pub async fn body_bytes(response: Response) -> Result<Bytes, BoxError> {
    Ok(response.bytes().await?)
}

/// `Converter<String>`: the response body as text.
pub async fn text(response: Response) -> Result<String, BoxError> {
    Ok(response.text().await?)
}

/// `Converter<V>`: the response body deserialized as JSON.
///
/// Only the body is consulted; status and headers are ignored.
pub async fn json<V: DeserializeOwned>(response: Response) -> Result<V, BoxError> {
    let data = response.bytes().await?;
    Ok(serde_json::from_slice(&data)?)
}
