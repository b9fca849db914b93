use anyhow::Result;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tracing::info;
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
}

impl AppState {
    pub fn new(metrics: &Metrics) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
        }
    }
}

pub fn router(settings_config: &SettingsConfig, state: AppState) -> Router {
    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .with_state(state)
}

/// Serve the metrics endpoint until `shutdown` fires. Returns immediately when metrics are disabled.
pub async fn start(settings_config: &SettingsConfig, shutdown: CancellationToken) -> Result<()> {
    let metrics = get_metrics().await;
    let app = router(settings_config, AppState::new(metrics));

    if !app.has_routes() {
        info!("metrics endpoint disabled");
        return Ok(());
    }

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("metrics endpoint listening on {}{}", bind_addr, settings_config.metrics.path);
    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    metrics.up.set(0);
    Ok(())
}
