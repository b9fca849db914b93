use std::future::Future;
use std::sync::Mutex;

use anyhow::anyhow;
use tokio::time::{sleep, Duration, Instant};
use tracing::{info, warn};

use crate::cell::authorizer::{Authorization, Authorizer, Denial, Grant};
use crate::config::types::AuthorizerConfig;

/// Stand-in for a remote authorization endpoint.
///
/// Issues random 8-byte hex tokens valid for `life_span`. On every call an
/// outage starts with probability `failure_rate`; while it lasts every call
/// is rejected with `retry_after = life_span`.
#[derive(Debug)]
pub struct SimulatedAuthorizer {
    life_span: Duration,
    failure_rate: f64,
    outage: Duration,
    latency: Duration,
    outage_until: Mutex<Option<Instant>>,
}

impl SimulatedAuthorizer {
    pub fn new(life_span: Duration) -> Self {
        Self {
            life_span,
            failure_rate: 0.0,
            outage: life_span * 2,
            latency: Duration::ZERO,
            outage_until: Mutex::new(None),
        }
    }

    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = failure_rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_outage(mut self, outage: Duration) -> Self {
        self.outage = outage;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn issue(&self, now: Instant) -> Authorization {
        let mut outage_until = self
            .outage_until
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if outage_until.is_some_and(|until| now >= until) {
            info!("API error resolved");
            *outage_until = None;
        }
        if outage_until.is_none() && rand::random::<f64>() < self.failure_rate {
            warn!("API error");
            *outage_until = Some(now + self.outage);
        }
        if outage_until.is_some() {
            return Err(Denial::new(anyhow!("temporary API error"), self.life_span));
        }

        Ok(Grant::new(format!("{:016x}", rand::random::<u64>()), self.life_span))
    }
}

impl From<&AuthorizerConfig> for SimulatedAuthorizer {
    fn from(cfg: &AuthorizerConfig) -> Self {
        SimulatedAuthorizer::new(Duration::from_millis(cfg.life_span_ms))
            .with_failure_rate(cfg.failure_rate)
            .with_outage(Duration::from_millis(cfg.outage_ms))
            .with_latency(Duration::from_millis(cfg.latency_ms))
    }
}

impl Authorizer for SimulatedAuthorizer {
    fn authorize(&self) -> impl Future<Output = Authorization> + Send {
        async move {
            if !self.latency.is_zero() {
                sleep(self.latency).await;
            }
            self.issue(Instant::now())
        }
    }
}
