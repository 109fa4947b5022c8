//! Bounded exponential backoff for transient provider failures

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// Retry policy for embedding and vector-index calls.
///
/// Generation calls deliberately bypass this: see `GenerationProvider`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl RetryPolicy {
    /// Create a policy allowing up to `max_retries` retries after the first
    /// attempt
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Run an operation, retrying transient failures with exponential
    /// backoff (1s, 2s, 4s, ...). Non-transient errors are returned
    /// immediately.
    pub async fn run<F, Fut, T>(&self, what: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {}",
                        what,
                        attempt + 1,
                        self.max_retries + 1,
                        delay,
                        e
                    );
                    last_error = Some(e);
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::internal(format!("{} failed", what))))
    }
}
