//! HTTP retrieval with bounded retry on connection-level failures.

mod retry;

pub use retry::{Attempt, RetryPolicy};

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-request timeout covering connect, headers and body.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 5;
const MAX_RESPONSE_BYTES: usize = 10_000_000;

pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
}

/// Why a retrieval produced no usable body.
///
/// Holds descriptions rather than source errors so that degraded results can
/// be cloned into run summaries and asserted on in tests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URL '{0}': must be HTTP(S)")]
    InvalidUrl(String),

    #[error("gave up after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("status {status} ({reason}) for {url}")]
    Status {
        status: u16,
        reason: String,
        url: String,
    },

    #[error("response too large (>{} bytes)", MAX_RESPONSE_BYTES)]
    TooLarge,

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Request(e.to_string())
    }
}

/// A `reqwest::Client` paired with the retry policy every request goes through.
#[derive(Clone)]
pub struct RetryingTransport {
    http: Client,
    policy: RetryPolicy,
}

impl RetryingTransport {
    pub fn new(http: Client, policy: RetryPolicy) -> Self {
        Self { http, policy }
    }

    /// GETs `url` and returns the body decoded as UTF-8.
    ///
    /// Non-2xx statuses are reported as [`FetchError::Status`]; the body is not read.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        validate_url(url)?;

        let http = &self.http;
        let attempt = self
            .policy
            .execute(
                |target: String| async move {
                    http.get(&target)
                        .header("User-Agent", crate::USER_AGENT)
                        .send()
                        .await
                },
                url.to_string(),
            )
            .await?;
        debug!(url = %url, success = attempt.success(), "request finished");

        let response = match attempt {
            Attempt::Success(response) => response,
            Attempt::Exhausted {
                attempts,
                last_error,
            } => {
                return Err(FetchError::Exhausted {
                    attempts,
                    last_error,
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                url: response.url().to_string(),
            });
        }

        read_capped(response).await
    }
}

async fn read_capped(response: reqwest::Response) -> Result<String, FetchError> {
    if let Some(len) = response.content_length()
        && len as usize > MAX_RESPONSE_BYTES
    {
        return Err(FetchError::TooLarge);
    }

    let final_url = response.url().to_string();
    let mut body = Vec::new();
    let mut stream = response;
    while let Some(chunk) = stream.chunk().await? {
        body.extend_from_slice(&chunk);
        if body.len() > MAX_RESPONSE_BYTES {
            return Err(FetchError::TooLarge);
        }
    }
    debug!(url = %final_url, bytes = body.len(), "response read");
    Ok(String::from_utf8_lossy(&body).into_owned())
}

fn validate_url(raw: &str) -> Result<(), FetchError> {
    let parsed = url::Url::parse(raw).map_err(|_| FetchError::InvalidUrl(raw.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(FetchError::InvalidUrl(raw.to_string())),
    }
}
