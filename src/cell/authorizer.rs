use std::fmt;
use std::future::Future;

use tokio::time::Duration;

/// Credential issued by an authorizer together with its validity period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub credential: String,
    pub valid_for: Duration,
}

impl Grant {
    pub fn new(credential: impl Into<String>, valid_for: Duration) -> Self {
        Self { credential: credential.into(), valid_for }
    }
}

/// Failed authorization. `retry_after` is used by the cell as the minimum
/// interval before the next attempt.
#[derive(Debug)]
pub struct Denial {
    pub error: anyhow::Error,
    pub retry_after: Duration,
}

impl Denial {
    pub fn new(error: impl Into<anyhow::Error>, retry_after: Duration) -> Self {
        Self { error: error.into(), retry_after }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#} (retry after {:?})", self.error, self.retry_after)
    }
}

pub type Authorization = Result<Grant, Denial>;

/// Produces fresh credentials. Called by the refresh loop only, one call at a time.
///
/// Implementations must tolerate being called repeatedly for the whole lifetime
/// of the cell; they may be slow and may fail.
pub trait Authorizer: Send + Sync + 'static {
    fn authorize(&self) -> impl Future<Output = Authorization> + Send;
}

impl<F, Fut> Authorizer for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Authorization> + Send,
{
    fn authorize(&self) -> impl Future<Output = Authorization> + Send {
        (self)()
    }
}
