use std::sync::Arc;

use tokio::time::{Duration, Instant};

use crate::cell::authorizer::{Denial, Grant};
use crate::cell::error::CellError;
use crate::cell::schedule::RefreshSchedule;

/// Stand-in for "never" when `now + delay` does not fit in an `Instant`.
pub const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Outcome of the last authorizer call. A failure clears the credential:
/// readers see the error, never the previous value.
#[derive(Debug, Clone)]
pub struct Slot {
    pub outcome: Result<String, Arc<anyhow::Error>>,
    /// Next authorizer call; a credential is not handed out after this point.
    pub refresh_at: Instant,
    /// Hard expiry of the credential (`None` for failures).
    pub expires_at: Option<Instant>,
}

impl Slot {
    pub fn granted(grant: Grant, schedule: &RefreshSchedule, now: Instant) -> Self {
        Self {
            refresh_at: after(now, schedule.refresh_delay(grant.valid_for)),
            expires_at: Some(after(now, grant.valid_for)),
            outcome: Ok(grant.credential),
        }
    }

    pub fn denied(denial: Denial, schedule: &RefreshSchedule, now: Instant) -> Self {
        Self {
            outcome: Err(Arc::new(denial.error)),
            refresh_at: after(now, schedule.retry_delay(denial.retry_after)),
            expires_at: None,
        }
    }

    /// A credential is servable up to its refresh point and strictly before its
    /// hard expiry; a failure stays visible until the next outcome replaces it.
    pub fn is_servable(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires_at) => now <= self.refresh_at && now < expires_at,
            None => true,
        }
    }

    pub fn reply(&self) -> Result<String, CellError> {
        self.outcome.clone().map_err(CellError::Fetch)
    }
}

fn after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
