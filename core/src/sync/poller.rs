use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Notify, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use super::store::ViewStateStore;
use crate::error::FetchResult;

/// How often a poller repeats its fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cadence {
    /// Fetch immediately, then once per period.
    Every(Duration),
    /// Fetch immediately and never again on a timer. Forced refreshes
    /// still work.
    Once,
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Every(period) => write!(f, "every {period:?}"),
            Cadence::Once => f.write_str("once"),
        }
    }
}

/// Rejected poller configuration.
#[derive(Debug, Error)]
pub enum PollError {
    /// `Cadence::Every` needs a positive period.
    #[error("poll period must be greater than zero")]
    ZeroPeriod,
}

/// Start a repeating fetch-and-apply loop feeding `store`.
///
/// The first fetch runs immediately, later ones per `cadence`. A tick
/// that lands while a fetch is still in flight is skipped, never queued.
/// Results carry the generation handed out by [`ViewStateStore::rearm`];
/// the store drops any result whose tag no longer matches, so stopping
/// the returned handle is a logical cancellation and never aborts an
/// in-flight request.
pub fn start<T, F, Fut>(
    target: impl Into<String>,
    cadence: Cadence,
    store: Arc<ViewStateStore<T>>,
    fetch: F,
) -> Result<PollHandle, PollError>
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FetchResult<T>> + Send + 'static,
{
    let target = target.into();
    let period = match cadence {
        Cadence::Every(period) => {
            if period.is_zero() {
                return Err(PollError::ZeroPeriod);
            }
            Some(period)
        }
        Cadence::Once => None,
    };

    let generation = store.rearm();
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let refresh = Arc::new(Notify::new());
    let gate = Arc::new(Semaphore::new(1));
    let fetch = Arc::new(fetch);

    let loop_target = target.clone();
    let loop_refresh = refresh.clone();
    let retire: Arc<dyn Retire> = store.clone();

    let task = tokio::spawn(async move {
        // First cycle runs by hand; the timer takes over a full period
        // later.
        let mut tick = period.map(|p| {
            let mut iv = interval_at(Instant::now() + p, p);
            iv.set_missed_tick_behavior(MissedTickBehavior::Skip);
            iv
        });
        spawn_cycle(&loop_target, generation, &gate, &store, &fetch);
        // A refresh that finds a fetch in flight is deferred, not dropped:
        // the acquire branch below runs it once the gate frees.
        let mut deferred = false;
        loop {
            tokio::select! {
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
                _ = loop_refresh.notified() => {
                    match gate.clone().try_acquire_owned() {
                        Ok(permit) => {
                            debug!("forced refresh target={}", loop_target);
                            run_cycle(&loop_target, generation, permit, &store, &fetch);
                        }
                        Err(_) => {
                            debug!("refresh deferred target={} fetch in flight", loop_target);
                            deferred = true;
                        }
                    }
                }
                permit = gate.clone().acquire_owned(), if deferred => {
                    deferred = false;
                    if let Ok(permit) = permit {
                        debug!("deferred refresh target={}", loop_target);
                        run_cycle(&loop_target, generation, permit, &store, &fetch);
                    }
                }
                _ = next_tick(&mut tick) => {
                    spawn_cycle(&loop_target, generation, &gate, &store, &fetch);
                }
            }
        }
        debug!("poll loop exit target={} generation={}", loop_target, generation);
    });

    Ok(PollHandle {
        target,
        stop_tx,
        refresh,
        retire,
        task: Some(task),
        stopped: false,
    })
}

/// Pending timer tick, or forever for `Cadence::Once`.
async fn next_tick(tick: &mut Option<Interval>) {
    match tick {
        Some(iv) => {
            iv.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn spawn_cycle<T, F, Fut>(
    target: &str,
    generation: u64,
    gate: &Arc<Semaphore>,
    store: &Arc<ViewStateStore<T>>,
    fetch: &Arc<F>,
) where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FetchResult<T>> + Send + 'static,
{
    // In-flight gate
    match gate.clone().try_acquire_owned() {
        Ok(permit) => run_cycle(target, generation, permit, store, fetch),
        Err(_) => debug!("cycle skipped target={} fetch in flight", target),
    }
}

/// One fetch-and-apply task. The permit is released when the cycle ends,
/// whatever the outcome.
fn run_cycle<T, F, Fut>(
    target: &str,
    generation: u64,
    permit: OwnedSemaphorePermit,
    store: &Arc<ViewStateStore<T>>,
    fetch: &Arc<F>,
) where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FetchResult<T>> + Send + 'static,
{
    let target = target.to_string();
    let store = store.clone();
    let fetch = fetch.clone();

    tokio::spawn(async move {
        match fetch().await {
            Ok(payload) => {
                if store.apply_ok(generation, payload) {
                    debug!("fetch ok target={} generation={}", target, generation);
                } else {
                    debug!("late result dropped target={} generation={}", target, generation);
                }
            }
            Err(e) => match store.apply_err(generation, e.to_string()) {
                Some(failures) => {
                    warn!("fetch err target={} failures={} err={}", target, failures, e);
                }
                None => {
                    debug!("late failure dropped target={} generation={}", target, generation);
                }
            },
        }
        drop(permit);
    });
}

/// Hands out forced-refresh requests for one running poller.
///
/// A request runs one extra cycle as soon as the gate allows: immediately
/// when the poller is idle, or right after the current fetch completes
/// when one is in flight. The regular timer is neither reset nor doubled,
/// and requests made while one is already waiting collapse into a single
/// extra cycle.
#[derive(Clone)]
pub struct Refresher {
    inner: Arc<Notify>,
}

impl Refresher {
    /// Ask for one out-of-band cycle.
    pub fn request(&self) {
        self.inner.notify_one();
    }
}

/// Object-safe view of a store used to bump its generation at stop time.
trait Retire: Send + Sync {
    fn retire(&self) -> u64;
}

impl<T: Send + Sync> Retire for ViewStateStore<T> {
    fn retire(&self) -> u64 {
        ViewStateStore::retire(self)
    }
}

/// Running poller. Stopping (or dropping) it cancels the timer and
/// bumps the store generation so late results are dropped.
pub struct PollHandle {
    target: String,
    stop_tx: watch::Sender<bool>,
    refresh: Arc<Notify>,
    retire: Arc<dyn Retire>,
    task: Option<JoinHandle<()>>,
    stopped: bool,
}

impl PollHandle {
    /// Label this poller logs under.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Clonable forced-refresh handle.
    pub fn refresher(&self) -> Refresher {
        Refresher {
            inner: self.refresh.clone(),
        }
    }

    /// Stop polling. Idempotent. The loop winds down on its own; any
    /// fetch still in flight resolves into a generation mismatch.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        let _ = self.stop_tx.send(true);
        let generation = self.retire.retire();
        self.task.take();
        debug!("poller stopped target={} generation now={}", self.target, generation);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
