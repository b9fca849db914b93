use tokio::time::Duration;

use crate::config::types::CellConfig;

pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_millis(10);
/// Lower bound between two authorizer calls. Keeps a credential with
/// `valid_for <= safety margin` (or a zero `retry_after`) from spinning the loop.
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(10);

/// When to call the authorizer again, relative to the completion of the last call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    /// Fixed margin subtracted from the credential validity.
    pub safety_margin: Duration,
    /// Optional margin relative to the validity; the larger of both wins.
    pub safety_margin_percent: Option<u32>,
    pub min_refresh_interval: Duration,
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self {
            safety_margin: DEFAULT_SAFETY_MARGIN,
            safety_margin_percent: None,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
        }
    }
}

impl RefreshSchedule {
    pub fn new(safety_margin: Duration) -> Self {
        Self { safety_margin, ..Self::default() }
    }

    pub fn with_min_refresh_interval(mut self, min_refresh_interval: Duration) -> Self {
        self.min_refresh_interval = min_refresh_interval;
        self
    }

    pub fn with_safety_margin_percent(mut self, percent: u32) -> Self {
        self.safety_margin_percent = Some(percent);
        self
    }

    pub fn safety_margin_for(&self, valid_for: Duration) -> Duration {
        let relative = self
            .safety_margin_percent
            .map(|percent| valid_for / 100 * percent.min(100))
            .unwrap_or(Duration::ZERO);
        self.safety_margin.max(relative)
    }

    /// Delay before refreshing a credential valid for `valid_for`.
    pub fn refresh_delay(&self, valid_for: Duration) -> Duration {
        valid_for
            .saturating_sub(self.safety_margin_for(valid_for))
            .max(self.min_refresh_interval)
    }

    /// Delay before retrying after a failed call.
    pub fn retry_delay(&self, retry_after: Duration) -> Duration {
        retry_after.max(self.min_refresh_interval)
    }
}

impl From<&CellConfig> for RefreshSchedule {
    fn from(cfg: &CellConfig) -> Self {
        Self {
            safety_margin: Duration::from_millis(cfg.safety_margin_ms),
            safety_margin_percent: cfg.safety_margin_percent,
            min_refresh_interval: Duration::from_millis(cfg.min_refresh_interval_ms),
        }
    }
}
