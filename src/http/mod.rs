//! # HTTP adaptation layer.
//!
//! Wraps a [`Runner`](crate::Runner)`<`[`reqwest::Response`]`>` into an HTTP
//! client that retries transactions according to a policy:
//!
//! - [`Client`] clones the request for each attempt, lets [`Requester`]
//!   mutators adjust it, and executes it through an injected [`HttpClient`]
//!   capability (the default is a [`reqwest::Client`]).
//! - [`Prototype`] request factories pair a request with a [`GetBody`]
//!   strategy so bodies can be replayed across attempts.
//! - [`CleanupResponse`] drains the response bodies of non-final attempts so
//!   connections return to the pool; the final response is left for the
//!   caller.
//! - [`retry_status`] builds the usual "retry these status codes, plus
//!   temporary transport errors" predicate.
//! - [`convert`] turns final responses into typed values for
//!   [`HttpTask`]-based callers.

mod body;
mod cleanup;
mod client;
pub mod convert;
mod factory;
mod should_retry;
mod task;

pub use body::{BytesBody, GetBody, ReaderBody};
pub use cleanup::CleanupResponse;
pub use client::{Client, ClientBuilder, HttpClient, Requester};
pub use convert::Converter;
pub use factory::{Prototype, RequestFactory};
pub use should_retry::retry_status;
pub use task::HttpTask;
