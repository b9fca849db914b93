use serde::Deserialize;

use crate::config::settings::SettingsConfig;

pub const DEFAULT_CELL_NAME: &str = "default";
pub const DEFAULT_SAFETY_MARGIN_MS: u64 = 10;
pub const DEFAULT_MIN_REFRESH_INTERVAL_MS: u64 = 10;

pub const DEFAULT_LIFE_SPAN_MS: u64 = 100;
pub const DEFAULT_FAILURE_RATE: f64 = 0.2;
pub const DEFAULT_OUTAGE_MS: u64 = 2 * DEFAULT_LIFE_SPAN_MS;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub cell: CellConfig,
    #[serde(default)]
    pub authorizer: AuthorizerConfig,
}

/// ================================
/// Refreshing cell
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct CellConfig {
    #[serde(default = "default_cell_name")]
    pub name: String,
    /// subtracted from the credential validity to compute the refresh point
    #[serde(default = "default_safety_margin_ms")]
    pub safety_margin_ms: u64,
    /// optional margin relative to the validity; the larger margin wins
    /// invariant: <= 100
    pub safety_margin_percent: Option<u32>,
    /// floor between two authorizer calls
    /// invariant: > 0
    #[serde(default = "default_min_refresh_interval_ms")]
    pub min_refresh_interval_ms: u64,
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            name: default_cell_name(),
            safety_margin_ms: DEFAULT_SAFETY_MARGIN_MS,
            safety_margin_percent: None,
            min_refresh_interval_ms: DEFAULT_MIN_REFRESH_INTERVAL_MS,
        }
    }
}

/// ================================
/// Simulated authorizer
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct AuthorizerConfig {
    #[serde(default = "default_life_span_ms")]
    pub life_span_ms: u64,
    /// probability of an outage starting on a call, invariant: [0, 1]
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,
    #[serde(default = "default_outage_ms")]
    pub outage_ms: u64,
    #[serde(default)]
    pub latency_ms: u64,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            life_span_ms: DEFAULT_LIFE_SPAN_MS,
            failure_rate: DEFAULT_FAILURE_RATE,
            outage_ms: DEFAULT_OUTAGE_MS,
            latency_ms: 0,
        }
    }
}

fn default_cell_name() -> String {
    DEFAULT_CELL_NAME.to_string()
}

fn default_safety_margin_ms() -> u64 {
    DEFAULT_SAFETY_MARGIN_MS
}

fn default_min_refresh_interval_ms() -> u64 {
    DEFAULT_MIN_REFRESH_INTERVAL_MS
}

fn default_life_span_ms() -> u64 {
    DEFAULT_LIFE_SPAN_MS
}

fn default_failure_rate() -> f64 {
    DEFAULT_FAILURE_RATE
}

fn default_outage_ms() -> u64 {
    DEFAULT_OUTAGE_MS
}
