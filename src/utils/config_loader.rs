use std::path::Path;
use anyhow::{anyhow, Result};
use tracing::warn;

use crate::config::types::ServiceConfig;
use crate::config::proc_loader::file_to_config;

/// Load the service config, falling back to defaults when the file does not exist.
pub async fn run(config_path: &str) -> Result<ServiceConfig> {
    let path = Path::new(config_path);
    if !path.exists() {
        warn!("config file '{}' not found, using defaults", config_path);
        return Ok(ServiceConfig::default());
    }
    file_to_config(path).await.map_err(|e| anyhow!(format!("Invalid config format: {}", e)))
}
