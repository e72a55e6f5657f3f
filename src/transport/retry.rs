use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::debug;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 12;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Errors that may be retried by [`RetryPolicy::execute`].
///
/// Only failures to establish the connection (TCP connect, TLS handshake)
/// count as transient. Everything else is surfaced on the first occurrence.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for reqwest::Error {
    fn is_transient(&self) -> bool {
        self.is_connect()
    }
}

/// Result of a retried operation once it stops being retried.
#[derive(Debug)]
pub enum Attempt<T> {
    Success(T),
    Exhausted { attempts: u32, last_error: String },
}

impl<T> Attempt<T> {
    pub fn success(&self) -> bool {
        matches!(self, Attempt::Success(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Runs `op(input)` until it succeeds, fails with a non-transient error,
    /// or `max_attempts` transient failures have been seen.
    ///
    /// The delay between attempts is fixed. No sleep follows the last attempt.
    pub async fn execute<I, T, E, F, Fut>(&self, op: F, input: I) -> Result<Attempt<T>, E>
    where
        I: Clone,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        let mut last_error = None;
        for attempt in 0..self.max_attempts {
            match op(input.clone()).await {
                Ok(value) => return Ok(Attempt::Success(value)),
                Err(e) if e.is_transient() => {
                    debug!(attempt = attempt + 1, error = %e, "transient failure");
                    last_error = Some(e.to_string());
                    if attempt + 1 < self.max_attempts {
                        tokio::time::sleep(self.delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Attempt::Exhausted {
            attempts: self.max_attempts,
            last_error: last_error.unwrap_or_else(|| "no attempts were made".to_string()),
        })
    }
}
