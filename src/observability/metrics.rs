use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;


// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async { 
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Authorizer metrics
    pub authorize_requests: IntCounterVec,
    pub authorize_failures: IntCounterVec,
    pub authorize_duration: HistogramVec,

    // Read path metrics
    pub reads_served: IntCounterVec,
    pub reads_parked: IntCounterVec,

    // Cell state
    pub credential_expiry_unix: IntGaugeVec,
    pub cell_up: IntGaugeVec,

    // Config/runtime
    pub parse_failures: IntCounter,
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("tokenrefresh".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Authorizer
            authorize_requests: IntCounterVec::new(Opts::new("authorize_requests_total", "Total authorizer calls by cell"),&["cell"],).unwrap(),
            authorize_failures: IntCounterVec::new(Opts::new("authorize_failures_total", "Authorizer failures by reason"),&["cell", "reason"],).unwrap(),
            authorize_duration: HistogramVec::new(HistogramOpts::new("authorize_duration_seconds", "Authorizer call duration seconds").buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),&["cell"],).unwrap(),

            // Reads
            reads_served: IntCounterVec::new(Opts::new("reads_served_total", "Reads answered by outcome"),&["cell", "outcome"],).unwrap(),
            reads_parked: IntCounterVec::new(Opts::new("reads_parked_total", "Reads that waited for a servable credential"),&["cell"],).unwrap(),

            // Cell
            credential_expiry_unix: IntGaugeVec::new(Opts::new("credential_expiry_unix_seconds", "Current credential expiry timestamp"),&["cell"],).unwrap(),
            cell_up: IntGaugeVec::new(Opts::new("cell_up", "1 while the refresh loop is running"),&["cell"],).unwrap(),

            // Config/runtime
            parse_failures: IntCounter::new("config_parse_failures_total","Config parse failures",).unwrap(),
            config_validation_errors: IntCounter::new("config_validation_errors_total","Validation errors during startup",).unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.authorize_requests.clone())).unwrap();
        reg.register(Box::new(metrics.authorize_failures.clone())).unwrap();
        reg.register(Box::new(metrics.authorize_duration.clone())).unwrap();
        reg.register(Box::new(metrics.reads_served.clone())).unwrap();
        reg.register(Box::new(metrics.reads_parked.clone())).unwrap();
        reg.register(Box::new(metrics.credential_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.cell_up.clone())).unwrap();
        reg.register(Box::new(metrics.parse_failures.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
