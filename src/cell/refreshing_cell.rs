use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{sleep_until, Duration, Instant, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cell::authorizer::{Authorization, Authorizer, Denial};
use crate::cell::error::CellError;
use crate::cell::schedule::RefreshSchedule;
use crate::cell::slot::Slot;
use crate::observability::metrics::{get_metrics, Metrics};

const REQUEST_BUFFER_SIZE: usize = 64;

static CREDENTIAL_MSG: &'static str = "credential";
static ERROR_MSG: &'static str = "error";
static DENIED_MSG: &'static str = "denied";
static PANICKED_MSG: &'static str = "panicked";

type Reply = oneshot::Sender<Result<String, CellError>>;

/// Handle to a self-refreshing credential.
///
/// `spawn` starts one background loop which owns the slot. Readers send a
/// request to the loop and wait for the handoff, so a read never races with a
/// refresh. The loop runs until the cancellation token fires or every handle
/// is dropped; the creator is responsible for cancelling it.
///
/// After cancellation `get` fails fast with `CellError::Stopped`.
#[derive(Debug, Clone)]
pub struct RefreshingCell {
    requests: mpsc::Sender<Reply>,
    shutdown: CancellationToken,
}

impl RefreshingCell {
    /// Start the refresh loop. Returns without waiting for the first fetch.
    /// Must be called from within a tokio runtime.
    pub fn spawn<A: Authorizer>(
        name: impl Into<String>,
        authorizer: A,
        schedule: RefreshSchedule,
        shutdown: CancellationToken,
    ) -> Self {
        let (requests, receiver) = mpsc::channel(REQUEST_BUFFER_SIZE);
        let refresher = Refresher {
            name: name.into(),
            authorizer: Arc::new(authorizer),
            schedule,
            shutdown: shutdown.clone(),
            requests: receiver,
            slot: None,
            parked: VecDeque::new(),
            in_flight: None,
        };
        tokio::spawn(refresher.run());
        Self { requests, shutdown }
    }

    /// Current credential, or the error of the last failed refresh.
    ///
    /// Never calls the authorizer. Returns at once while the cell is serving;
    /// waits for the first fetch, and for the refresh outcome when the current
    /// credential is past its refresh point.
    pub async fn get(&self) -> Result<String, CellError> {
        if self.shutdown.is_cancelled() {
            return Err(CellError::Stopped);
        }
        let (reply, response) = oneshot::channel();
        self.requests
            .send(reply)
            .await
            .map_err(|_| CellError::Stopped)?;
        response.await.map_err(|_| CellError::Stopped)?
    }
}

struct InFlight {
    handle: JoinHandle<Authorization>,
    started_at: Instant,
}

/// Background owner of the slot.
struct Refresher<A> {
    name: String,
    authorizer: Arc<A>,
    schedule: RefreshSchedule,
    shutdown: CancellationToken,
    requests: mpsc::Receiver<Reply>,
    slot: Option<Slot>,
    /// Readers waiting for a servable slot.
    parked: VecDeque<Reply>,
    in_flight: Option<InFlight>,
}

impl<A: Authorizer> Refresher<A> {
    async fn run(mut self) {
        let metrics = get_metrics().await;
        metrics.cell_up.with_label_values(&[self.name.as_str()]).set(1);
        info!(cell = %self.name, "refresh loop started");

        // initial state: FETCHING
        self.start_fetch(metrics);
        let timer = sleep_until(Instant::now());
        tokio::pin!(timer);

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            // cancellation first; the timer is disabled while a fetch is in flight,
            // so it cannot starve readers
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                Some(joined) = join_in_flight(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.complete_fetch(joined, timer.as_mut(), metrics);
                }
                _ = &mut timer, if self.in_flight.is_none() => {
                    debug!(cell = %self.name, "refresh timer fired");
                    self.start_fetch(metrics);
                }
                request = self.requests.recv() => match request {
                    Some(reply) => self.serve(reply, metrics),
                    None => {
                        debug!(cell = %self.name, "all handles dropped");
                        break;
                    }
                },
            }
        }

        self.stop(metrics);
    }

    fn start_fetch(&mut self, metrics: &Metrics) {
        if self.shutdown.is_cancelled() {
            return;
        }
        metrics.authorize_requests.with_label_values(&[self.name.as_str()]).inc();
        let authorizer = Arc::clone(&self.authorizer);
        self.in_flight = Some(InFlight {
            handle: tokio::spawn(async move { authorizer.authorize().await }),
            started_at: Instant::now(),
        });
    }

    fn complete_fetch(
        &mut self,
        joined: (Result<Authorization, JoinError>, Instant),
        timer: Pin<&mut Sleep>,
        metrics: &Metrics,
    ) {
        self.in_flight = None;
        let (joined, started_at) = joined;
        let now = Instant::now();
        metrics
            .authorize_duration
            .with_label_values(&[self.name.as_str()])
            .observe(now.duration_since(started_at).as_secs_f64());

        let slot = match joined {
            Ok(Ok(grant)) => {
                info!(cell = %self.name, valid_for = ?grant.valid_for, "credential refreshed");
                metrics
                    .credential_expiry_unix
                    .with_label_values(&[self.name.as_str()])
                    .set(expiry_unix(grant.valid_for));
                Slot::granted(grant, &self.schedule, now)
            }
            Ok(Err(denial)) => {
                warn!(cell = %self.name, "authorizer failed: {}", denial);
                metrics.authorize_failures.with_label_values(&[self.name.as_str(), DENIED_MSG]).inc();
                Slot::denied(denial, &self.schedule, now)
            }
            Err(err) => {
                warn!(cell = %self.name, "authorizer task failed: {}", err);
                metrics.authorize_failures.with_label_values(&[self.name.as_str(), PANICKED_MSG]).inc();
                let denial = Denial::new(anyhow!("authorizer task failed: {err}"), Duration::ZERO);
                Slot::denied(denial, &self.schedule, now)
            }
        };

        debug!(
            cell = %self.name,
            next_refresh_in = ?slot.refresh_at.duration_since(now),
            "refresh scheduled"
        );
        timer.reset(slot.refresh_at);
        self.slot = Some(slot);
        self.release_parked(now, metrics);
    }

    fn serve(&mut self, reply: Reply, metrics: &Metrics) {
        match &self.slot {
            Some(slot) if slot.is_servable(Instant::now()) => {
                let response = slot.reply();
                self.record_read(&response, metrics);
                let _ = reply.send(response);
            }
            _ => {
                metrics.reads_parked.with_label_values(&[self.name.as_str()]).inc();
                self.parked.push_back(reply);
            }
        }
    }

    fn release_parked(&mut self, now: Instant, metrics: &Metrics) {
        let Some(slot) = &self.slot else {
            return;
        };
        if !slot.is_servable(now) || self.parked.is_empty() {
            return;
        }
        let response = slot.reply();
        debug!(cell = %self.name, readers = self.parked.len(), "releasing parked readers");
        while let Some(reply) = self.parked.pop_front() {
            self.record_read(&response, metrics);
            let _ = reply.send(response.clone());
        }
    }

    fn record_read(&self, response: &Result<String, CellError>, metrics: &Metrics) {
        let outcome = if response.is_ok() { CREDENTIAL_MSG } else { ERROR_MSG };
        metrics.reads_served.with_label_values(&[self.name.as_str(), outcome]).inc();
    }

    fn stop(mut self, metrics: &Metrics) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
        }
        // dropping the repliers and the receiver wakes every waiting reader with `Stopped`
        self.parked.clear();
        self.requests.close();
        metrics.cell_up.with_label_values(&[self.name.as_str()]).set(0);
        info!(cell = %self.name, "refresh loop stopped");
    }
}

async fn join_in_flight(
    in_flight: &mut Option<InFlight>,
) -> Option<(Result<Authorization, JoinError>, Instant)> {
    match in_flight {
        Some(in_flight) => Some(((&mut in_flight.handle).await, in_flight.started_at)),
        None => None,
    }
}

fn expiry_unix(valid_for: Duration) -> i64 {
    chrono::Duration::from_std(valid_for)
        .ok()
        .and_then(|valid_for| Utc::now().checked_add_signed(valid_for))
        .map(|expires_at: DateTime<Utc>| expires_at.timestamp())
        .unwrap_or(i64::MAX)
}
