//! # Request body strategies.
//!
//! An HTTP request that is retried needs a fresh body for every attempt.
//! A [`GetBody`] produces one on demand; [`Prototype`](super::Prototype)
//! invokes it during per-attempt request assembly.

use std::io::SeekFrom;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Body;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};
use tokio::sync::Mutex;

use crate::error::BoxError;

/// Strategy producing a request body for each attempt.
///
/// Implementations must be idempotent: every call yields the same bytes.
#[async_trait]
pub trait GetBody: Send + Sync {
    /// Produces the body for the next attempt.
    async fn body(&self) -> Result<Body, BoxError>;

    /// The body length, when known up front.
    fn content_length(&self) -> Option<u64> {
        None
    }
}

/// [`GetBody`] over a shared byte buffer: each attempt gets a fresh body
/// over the same bytes. Cloning [`Bytes`] is cheap, so this is the strategy
/// of choice for in-memory payloads.
#[derive(Debug, Clone)]
pub struct BytesBody {
    data: Bytes,
}

impl BytesBody {
    /// Wraps a byte buffer as a replayable body.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

#[async_trait]
impl GetBody for BytesBody {
    async fn body(&self) -> Result<Body, BoxError> {
        Ok(Body::from(self.data.clone()))
    }

    fn content_length(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

/// [`GetBody`] over a single seekable reader, rewound to the start before
/// each attempt.
///
/// The reader is shared across attempts and never closed by the transport;
/// callers must not mutate the underlying data while a run is in flight.
#[derive(Debug)]
pub struct ReaderBody<R> {
    reader: Mutex<R>,
}

impl<R> ReaderBody<R>
where
    R: AsyncRead + AsyncSeek + Unpin + Send + 'static,
{
    /// Wraps a seekable reader as a replayable body.
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(reader),
        }
    }
}

#[async_trait]
impl<R> GetBody for ReaderBody<R>
where
    R: AsyncRead + AsyncSeek + Unpin + Send + 'static,
{
    async fn body(&self) -> Result<Body, BoxError> {
        let mut reader = self.reader.lock().await;
        reader.seek(SeekFrom::Start(0)).await?;

        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(Body::from(buf))
    }
}
