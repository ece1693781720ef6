//! # Per-attempt request creation.
//!
//! A retried request cannot be executed twice; something must mint a fresh
//! [`reqwest::Request`] for every attempt. [`RequestFactory`] is that
//! strategy, and [`Prototype`] is the standard implementation: clone a
//! prototype request and, when a body strategy is attached, give the clone a
//! fresh body.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_LENGTH;
use reqwest::Request;
use tokio::io::{AsyncRead, AsyncSeek};

use crate::error::BoxError;
use crate::http::body::{BytesBody, GetBody, ReaderBody};
use crate::should_retry::set_retryable;

/// Strategy creating the request for each task attempt.
#[async_trait]
pub trait RequestFactory: Send + Sync {
    /// Produces a fresh request for the next attempt.
    async fn request(&self) -> Result<Request, BoxError>;
}

/// [`RequestFactory`] cloning a prototype request per attempt.
///
/// Without a body strategy this is only appropriate for requests whose body
/// is absent or an in-memory buffer (streamed bodies are not cloneable).
/// With one, the prototype's own body slot is ignored and every attempt gets
/// a fresh body from the strategy.
pub struct Prototype {
    prototype: Request,
    get_body: Option<Arc<dyn GetBody>>,
}

impl Prototype {
    /// Clones `prototype` as is for each attempt.
    #[must_use]
    pub fn new(prototype: Request) -> Self {
        Self {
            prototype,
            get_body: None,
        }
    }

    /// Clones `prototype` and gives each attempt a fresh body over `data`.
    #[must_use]
    pub fn bytes(prototype: Request, data: impl Into<Bytes>) -> Self {
        Self::with_body(prototype, BytesBody::new(data))
    }

    /// Clones `prototype` and rewinds the shared `reader` for each attempt.
    #[must_use]
    pub fn reader<R>(prototype: Request, reader: R) -> Self
    where
        R: AsyncRead + AsyncSeek + Unpin + Send + 'static,
    {
        Self::with_body(prototype, ReaderBody::new(reader))
    }

    /// Clones `prototype` and sources each attempt's body from `get_body`.
    #[must_use]
    pub fn with_body(prototype: Request, get_body: impl GetBody + 'static) -> Self {
        Self {
            prototype,
            get_body: Some(Arc::new(get_body)),
        }
    }
}

#[async_trait]
impl RequestFactory for Prototype {
    async fn request(&self) -> Result<Request, BoxError> {
        let mut request = match self.prototype.try_clone() {
            Some(request) => request,
            // A streaming body defeats cloning; retrying it would replay
            // nothing, so fail the run instead.
            None => {
                return Err(set_retryable(
                    "request body is streamed and cannot be replayed across attempts",
                    false,
                ))
            }
        };

        if let Some(get_body) = &self.get_body {
            *request.body_mut() = Some(get_body.body().await?);
            if let Some(len) = get_body.content_length() {
                request.headers_mut().insert(CONTENT_LENGTH, len.into());
            }
        }

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::{Method, Url};

    fn put(url: &str) -> Request {
        Request::new(Method::PUT, Url::parse(url).expect("valid url"))
    }

    #[tokio::test]
    async fn clones_are_independent() {
        let factory = Prototype::new(put("http://origin.test/items"));

        let mut first = factory.request().await.unwrap();
        first
            .headers_mut()
            .insert("x-attempt", reqwest::header::HeaderValue::from_static("1"));

        let second = factory.request().await.unwrap();
        assert!(second.headers().get("x-attempt").is_none());
        assert_eq!(second.method(), &Method::PUT);
    }

    #[tokio::test]
    async fn body_strategy_feeds_every_attempt() {
        let factory = Prototype::bytes(put("http://origin.test/items"), "hello");

        for _ in 0..3 {
            let request = factory.request().await.unwrap();
            let body = request.body().and_then(|b| b.as_bytes()).expect("body");
            assert_eq!(body, b"hello");
            assert_eq!(
                request.headers().get(CONTENT_LENGTH).and_then(|v| v.to_str().ok()),
                Some("5"),
            );
        }
    }

    #[tokio::test]
    async fn reader_strategy_is_rewound_per_attempt() {
        let factory = Prototype::reader(
            put("http://origin.test/items"),
            std::io::Cursor::new(b"hello".to_vec()),
        );

        for _ in 0..3 {
            let request = factory.request().await.unwrap();
            let body = request.body().and_then(|b| b.as_bytes()).expect("body");
            assert_eq!(body, b"hello");
        }
    }

    #[tokio::test]
    async fn strategy_overrides_the_prototype_body() {
        let mut prototype = put("http://origin.test/items");
        *prototype.body_mut() = Some("stale".into());

        let factory = Prototype::bytes(prototype, "fresh");
        let request = factory.request().await.unwrap();
        let body = request.body().and_then(|b| b.as_bytes()).expect("body");
        assert_eq!(body, b"fresh");
    }
}
