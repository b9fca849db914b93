//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates settings (retry, server, metrics, logging), cell schedule
//!   and simulated authorizer invariants

use tracing::{error, info};

use crate::config::settings::{RetryConfig, SettingsConfig};
use crate::config::types::{AuthorizerConfig, CellConfig, ServiceConfig};
use crate::observability::metrics::get_metrics;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_cell(&cfg.cell, &mut errors);
    validate_authorizer(&cfg.authorizer, &mut errors);

    if errors.is_empty() {
        info!("config is valid");
        return Ok(());
    }

    let metrics = get_metrics().await;
    for e in &errors {
        error!("config validation: {}", e);
        metrics.config_validation_errors.inc();
    }
    Err(errors)
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    // retry invariants
    if let Some(retry) = &settings.retry {
        validate_retry("settings.retry", retry, errors);
    }

    if settings.server.host.is_empty() {
        errors.push(format!(
            "settings.server.host '{}' must be valid",
            settings.server.host
        ));
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be valid",
            settings.server.port
        ));
    }

    // metrics endpoint start with '/'
    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }

    if let Some(logging) = &settings.logging {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' must be one of {:?}",
                logging.level, LOG_LEVELS
            ));
        }
    }
}

fn validate_retry(ctx: &str, retry: &RetryConfig, errors: &mut Vec<String>) {
    if let Some(attempts) = retry.attempts {
        if attempts == 0 {
            errors.push(format!("{}.attempts must be >= 1", ctx));
        }
    }
    if let (Some(base), Some(max)) = (retry.base_delay_ms, retry.max_delay_ms) {
        if max < base {
            errors.push(format!(
                "{}.max_delay_ms ({}) must be >= base_delay_ms ({})",
                ctx, max, base
            ));
        }
    }
}

fn validate_cell(cell: &CellConfig, errors: &mut Vec<String>) {
    if cell.name.trim().is_empty() {
        errors.push("cell.name must not be empty".to_string());
    }
    if cell.min_refresh_interval_ms == 0 {
        errors.push("cell.min_refresh_interval_ms must be > 0".to_string());
    }
    if let Some(percent) = cell.safety_margin_percent {
        if percent > 100 {
            errors.push(format!(
                "cell.safety_margin_percent ({}) must be <= 100",
                percent
            ));
        }
    }
}

fn validate_authorizer(authorizer: &AuthorizerConfig, errors: &mut Vec<String>) {
    if !(0.0..=1.0).contains(&authorizer.failure_rate) {
        errors.push(format!(
            "authorizer.failure_rate ({}) must be within [0, 1]",
            authorizer.failure_rate
        ));
    }
    if authorizer.life_span_ms == 0 {
        errors.push("authorizer.life_span_ms must be > 0".to_string());
    }
}
