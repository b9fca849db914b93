// tests/common/mod.rs
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use tokio::time::{sleep, Duration, Instant};

use crate::cell::authorizer::{Authorization, Authorizer, Denial, Grant};

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// One scripted authorizer response.
#[derive(Debug, Clone)]
pub enum Step {
    Grant(String, Duration),
    Deny(String, Duration),
}

pub fn grant(credential: &str, valid_for_ms: u64) -> Step {
    Step::Grant(credential.to_owned(), ms(valid_for_ms))
}

pub fn deny(message: &str, retry_after_ms: u64) -> Step {
    Step::Deny(message.to_owned(), ms(retry_after_ms))
}

/// What the authorizer observed; shared with the test.
#[derive(Debug, Default)]
pub struct CallLog {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    issued: Mutex<Vec<(String, Instant)>>,
}

impl CallLog {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Instant the credential was handed to the cell.
    pub fn issued_at(&self, credential: &str) -> Option<Instant> {
        self.issued
            .lock()
            .unwrap()
            .iter()
            .find(|(issued, _)| issued == credential)
            .map(|(_, at)| *at)
    }
}

/// Replays `steps` in order. Once the script is exhausted the last step repeats,
/// with granted credentials suffixed by the call number so each one is unique.
pub struct ScriptedAuthorizer {
    steps: Vec<Step>,
    latency: Duration,
    calls_log: Arc<CallLog>,
}

impl ScriptedAuthorizer {
    pub fn new(steps: Vec<Step>) -> (Self, Arc<CallLog>) {
        assert!(!steps.is_empty(), "script needs at least one step");
        let calls_log = Arc::new(CallLog::default());
        (Self { steps, latency: Duration::ZERO, calls_log: calls_log.clone() }, calls_log)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn step(&self, call: usize) -> Authorization {
        let (step, suffix) = match self.steps.get(call) {
            Some(step) => (step.clone(), None),
            None => (self.steps[self.steps.len() - 1].clone(), Some(call)),
        };
        match step {
            Step::Grant(credential, valid_for) => {
                let credential = match suffix {
                    Some(call) => format!("{credential}#{call}"),
                    None => credential,
                };
                self.calls_log.issued.lock().unwrap().push((credential.clone(), Instant::now()));
                Ok(Grant::new(credential, valid_for))
            }
            Step::Deny(message, retry_after) => Err(Denial::new(anyhow!(message), retry_after)),
        }
    }
}

impl Authorizer for ScriptedAuthorizer {
    fn authorize(&self) -> impl Future<Output = Authorization> + Send {
        async move {
            let call = self.calls_log.calls.fetch_add(1, Ordering::SeqCst);
            let in_flight = self.calls_log.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.calls_log.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

            if !self.latency.is_zero() {
                sleep(self.latency).await;
            }
            let outcome = self.step(call);

            self.calls_log.in_flight.fetch_sub(1, Ordering::SeqCst);
            outcome
        }
    }
}
