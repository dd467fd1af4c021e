use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;

/// Consecutive failures tolerated before a screen is flagged `Error`.
pub const DEFAULT_FAIL_THRESHOLD: u32 = 3;

/// How much the current snapshot can be trusted, independent of whether
/// a payload is present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// No payload yet; the first fetch is pending or still failing.
    Loading,
    /// Latest fetch succeeded.
    Fresh,
    /// A recent fetch failed but an earlier payload is still shown.
    Stale,
    /// Consecutive failures passed the threshold.
    Error,
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Freshness::Loading => "loading",
            Freshness::Fresh => "fresh",
            Freshness::Stale => "stale",
            Freshness::Error => "error",
        };
        f.write_str(s)
    }
}

/// Latest presentable state for one screen.
///
/// The payload is only ever replaced whole. A snapshot with failures on
/// record keeps the last good payload; one that never had a payload
/// never invents one.
#[derive(Debug)]
pub struct Snapshot<T> {
    /// Last successfully fetched payload, shared with readers.
    pub payload: Option<Arc<T>>,
    /// Trust level for `payload`.
    pub freshness: Freshness,
    /// Generation the store currently accepts results for.
    pub generation: u64,
    /// Consecutive failures since the last success.
    pub failures: u32,
    /// When the payload last landed.
    pub fetched_at: Option<Instant>,
    /// Text of the most recent failure, cleared on success.
    pub last_error: Option<String>,
}

impl<T> Snapshot<T> {
    fn initial(generation: u64) -> Self {
        Self {
            payload: None,
            freshness: Freshness::Loading,
            generation,
            failures: 0,
            fetched_at: None,
            last_error: None,
        }
    }
}

// Derived Clone would demand T: Clone; the payload is behind an Arc.
impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            payload: self.payload.clone(),
            freshness: self.freshness,
            generation: self.generation,
            failures: self.failures,
            fetched_at: self.fetched_at,
            last_error: self.last_error.clone(),
        }
    }
}

/// Holds the latest-known-good snapshot for one screen and reconciles
/// poll results into it.
///
/// Publication goes through a `watch` channel, so readers always see a
/// whole snapshot and never a torn mix of fields. Results are tagged
/// with a generation; a result from before the owning screen was torn
/// down no longer matches and is dropped.
pub struct ViewStateStore<T> {
    tx: watch::Sender<Snapshot<T>>,
    threshold: u32,
}

impl<T> ViewStateStore<T> {
    /// Store with the default failure threshold.
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_FAIL_THRESHOLD)
    }

    /// Store flagging `Error` once consecutive failures exceed `threshold`.
    pub fn with_threshold(threshold: u32) -> Self {
        let (tx, _) = watch::channel(Snapshot::initial(1));
        Self { tx, threshold }
    }

    /// Watch handle for readers; fires on every published change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.tx.subscribe()
    }

    /// Owned copy of the current snapshot.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.tx.borrow().clone()
    }

    /// Generation results must carry to be accepted.
    pub fn generation(&self) -> u64 {
        self.tx.borrow().generation
    }

    /// Reset to `Loading` for a (re)activated screen and return the
    /// generation new results must be tagged with. The generation itself
    /// is not changed here; [`ViewStateStore::retire`] already bumped it
    /// when the previous run stopped.
    pub fn rearm(&self) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|s| {
            *s = Snapshot::initial(s.generation);
            generation = s.generation;
        });
        generation
    }

    /// Bump the generation so in-flight results of the finished run are
    /// recognized as stale and dropped. Returns the new generation.
    pub fn retire(&self) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|s| {
            s.generation += 1;
            generation = s.generation;
        });
        generation
    }

    /// Apply a successful fetch tagged with `generation`. Returns false
    /// if the tag no longer matches and the result was dropped.
    pub fn apply_ok(&self, generation: u64, payload: T) -> bool {
        let mut applied = false;
        self.tx.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            s.payload = Some(Arc::new(payload));
            s.freshness = Freshness::Fresh;
            s.failures = 0;
            s.fetched_at = Some(Instant::now());
            s.last_error = None;
            applied = true;
            true
        });
        applied
    }

    /// Record a failed fetch tagged with `generation`. The prior payload
    /// is left untouched. Returns the new consecutive-failure count, or
    /// `None` if the tag no longer matches.
    pub fn apply_err(&self, generation: u64, error: String) -> Option<u32> {
        let mut failures = None;
        self.tx.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            s.failures = s.failures.saturating_add(1);
            s.freshness = if s.payload.is_some() {
                if s.failures > self.threshold {
                    Freshness::Error
                } else {
                    Freshness::Stale
                }
            } else if s.failures > self.threshold {
                Freshness::Error
            } else {
                Freshness::Loading
            };
            s.last_error = Some(error);
            failures = Some(s.failures);
            true
        });
        failures
    }
}

impl<T> Default for ViewStateStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
