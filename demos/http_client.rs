//! # Example: http_client
//!
//! Builds a retrying HTTP [`Client`]: 429/503 responses and temporary
//! transport errors are retried with exponential backoff, intermediate
//! response bodies are drained automatically, and a requester stamps every
//! attempt with a header.
//!
//! ## Run
//! ```bash
//! cargo run --example http_client -- https://httpbin.org/status/503,200
//! ```

use std::time::Duration;

use reqwest::header::HeaderValue;
use reqwest::StatusCode;

use reattempt::http::{retry_status, Client};
use reattempt::{BoxError, Config, LogAttempts, Runner};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BoxError> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://httpbin.org/status/503,200".to_owned());

    let client = Client::builder()
        .requester(|request| {
            request
                .headers_mut()
                .insert("x-retried-by", HeaderValue::from_static("reattempt"));
        })
        .runner(
            Runner::builder()
                .policy_factory(Config {
                    interval: Duration::from_millis(250),
                    multiplier: 2.0,
                    jitter: 0.2,
                    max_retries: 4,
                    max_elapsed_time: Duration::from_secs(30),
                    ..Config::default()
                })
                .should_retry(retry_status([
                    StatusCode::TOO_MANY_REQUESTS,
                    StatusCode::SERVICE_UNAVAILABLE,
                ]))
                .on_attempt(LogAttempts),
        )
        .build();

    let request = reqwest::Client::new().get(&url).build()?;
    let response = client.execute(request).await?;

    println!("final status: {}", response.status());
    println!("body: {}", response.text().await?);
    Ok(())
}
