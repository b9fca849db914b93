use std::sync::Arc;

use thiserror::Error;

/// Errors returned by `RefreshingCell::get`.
#[derive(Debug, Clone, Error)]
pub enum CellError {
    /// The last authorizer call failed; shared by every reader served
    /// while the failure is the current slot content.
    #[error("authorizer failed: {0:#}")]
    Fetch(Arc<anyhow::Error>),
    /// The cell was cancelled (or its loop is gone); no value will ever be served again.
    #[error("refreshing cell is stopped")]
    Stopped,
}

impl CellError {
    pub fn is_stopped(&self) -> bool {
        matches!(self, CellError::Stopped)
    }
}
