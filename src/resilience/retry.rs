use std::fmt::Display;
use std::future::Future;

use tokio::time::{sleep, Duration};
use tracing::{error, warn};

use crate::cell::authorizer::{Authorization, Authorizer};
use crate::config::settings::RetryConfig;

#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { attempts: 3, base_delay_ms: 200, max_delay_ms: 1000 }
    }
}

impl From<&Option<RetryConfig>> for RetrySettings {
    fn from(retry: &Option<RetryConfig>) -> Self {
        let defaults = RetrySettings::default();
        Self {
            attempts: retry.as_ref().and_then(|r| r.attempts).unwrap_or(defaults.attempts),
            base_delay_ms: retry.as_ref().and_then(|r| r.base_delay_ms).unwrap_or(defaults.base_delay_ms),
            max_delay_ms: retry.as_ref().and_then(|r| r.max_delay_ms).unwrap_or(defaults.max_delay_ms),
        }
    }
}

impl RetrySettings {
    pub async fn run_with_retry<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut delay = self.base_delay_ms;
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.attempts => {
                    warn!("Attempt {attempt}/{} failed: {e}", self.attempts);
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(self.max_delay_ms);
                    attempt += 1;
                }
                Err(e) => {
                    error!("all {attempt} attempts failed: {e}");
                    return Err(e);
                }
            }
        }
    }
}

/// Authorizer decorator retrying failed calls with exponential backoff
/// before the failure reaches the cell.
#[derive(Debug, Clone)]
pub struct RetryingAuthorizer<A> {
    inner: A,
    retry: RetrySettings,
}

impl<A: Authorizer> RetryingAuthorizer<A> {
    pub fn new(inner: A, retry: RetrySettings) -> Self {
        Self { inner, retry }
    }
}

impl<A: Authorizer> Authorizer for RetryingAuthorizer<A> {
    fn authorize(&self) -> impl Future<Output = Authorization> + Send {
        self.retry.run_with_retry(|| self.inner.authorize())
    }
}
