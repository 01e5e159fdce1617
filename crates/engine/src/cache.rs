//! LRU result cache with single-flight computation.
//!
//! At most one computation runs per [`CacheKey`]. Concurrent requests for a
//! key that is being computed wait for that computation instead of starting
//! their own. Only successes are cached; a failure is handed to the callers
//! waiting at the time and the key is free to be computed again.
//!
//! Lock order: `in_flight` before `entries`. Hits take only `entries`.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use mangrove_core::{CancelToken, DataVersion, Error};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::request::CacheKey;
use crate::result::AnalysisResult;

/// How often a waiting caller re-checks its own cancellation token
const WAIT_POLL: Duration = Duration::from_millis(20);

/// Counters describing cache behaviour since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Requests answered from a cached entry
    pub hits: u64,
    /// Requests that found neither an entry nor a computation in progress
    pub misses: u64,
    /// Requests that waited on another caller's computation
    pub coalesced: u64,
    /// Computations started
    pub computations: u64,
    /// Computations that failed (cancellations excluded)
    pub failures: u64,
    /// Entries dropped to make room for newer ones
    pub evictions: u64,
    /// Entries currently cached
    pub entries: usize,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    computations: AtomicU64,
    failures: AtomicU64,
    evictions: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

struct Entries {
    lru: LruCache<CacheKey, Arc<AnalysisResult>>,
    /// Results for versions below this are never inserted
    floor: DataVersion,
    /// Bumped by every invalidation
    generation: u64,
}

#[derive(Clone)]
enum FlightOutcome {
    Done(Arc<AnalysisResult>),
    Failed(EngineError),
    /// The leader was cancelled or panicked; waiters should try again
    Abandoned,
}

/// A computation in progress that other callers can wait on.
struct Flight {
    outcome: Mutex<Option<FlightOutcome>>,
    ready: Condvar,
}

impl Flight {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    fn complete(&self, outcome: FlightOutcome) {
        let mut slot = self.outcome.lock();
        if slot.is_none() {
            *slot = Some(outcome);
        }
        self.ready.notify_all();
    }

    /// Block until the flight completes or `cancel` fires.
    fn wait(&self, cancel: &CancelToken) -> std::result::Result<FlightOutcome, Error> {
        let mut slot = self.outcome.lock();
        loop {
            if let Some(outcome) = slot.as_ref() {
                return Ok(outcome.clone());
            }
            cancel.check()?;
            self.ready.wait_for(&mut slot, WAIT_POLL);
        }
    }
}

/// Marks the flight abandoned if the leader unwinds before completing it.
struct LeaderGuard<'a> {
    cache: &'a ResultCache,
    key: &'a CacheKey,
    flight: &'a Flight,
    armed: bool,
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.cache.in_flight.lock().remove(self.key);
            self.flight.complete(FlightOutcome::Abandoned);
        }
    }
}

enum Role {
    Leader(Arc<Flight>, u64),
    Waiter(Arc<Flight>),
}

/// Bounded cache of analysis results keyed by data version and parameters.
pub struct ResultCache {
    entries: Mutex<Entries>,
    in_flight: Mutex<HashMap<CacheKey, Arc<Flight>>>,
    counters: Counters,
}

impl ResultCache {
    /// Create a cache holding at most `capacity` results (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(Entries {
                lru: LruCache::new(cap),
                floor: DataVersion::INITIAL,
                generation: 0,
            }),
            in_flight: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// Cached result for `key`, if present. Marks it most recently used.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<AnalysisResult>> {
        self.entries.lock().lru.get(key).cloned()
    }

    /// Return the cached result for `key`, or compute it exactly once.
    ///
    /// If another caller is already computing `key`, wait for its outcome.
    /// When that caller is cancelled, one of the waiters takes over. A
    /// waiter whose own `cancel` fires stops waiting with
    /// [`Error::Cancelled`] without affecting the computation.
    pub fn get_or_compute<F>(&self, key: &CacheKey, cancel: &CancelToken, compute: F) -> Result<Arc<AnalysisResult>>
    where
        F: Fn() -> Result<AnalysisResult>,
    {
        loop {
            if let Some(hit) = self.hit(key) {
                return Ok(hit);
            }
            let role = {
                let mut in_flight = self.in_flight.lock();
                // A leader may have finished since the lookup above
                if let Some(hit) = self.hit(key) {
                    return Ok(hit);
                }
                match in_flight.get(key) {
                    Some(flight) => Role::Waiter(Arc::clone(flight)),
                    None => {
                        let flight = Arc::new(Flight::new());
                        in_flight.insert(key.clone(), Arc::clone(&flight));
                        Role::Leader(flight, self.entries.lock().generation)
                    }
                }
            };

            match role {
                Role::Waiter(flight) => {
                    Counters::bump(&self.counters.coalesced);
                    debug!(version = %key.version, "waiting on in-flight computation");
                    match flight.wait(cancel)? {
                        FlightOutcome::Done(result) => return Ok(result),
                        FlightOutcome::Failed(e) => return Err(e),
                        FlightOutcome::Abandoned => continue,
                    }
                }
                Role::Leader(flight, generation) => {
                    return self.lead(key, &flight, generation, &compute);
                }
            }
        }
    }

    fn hit(&self, key: &CacheKey) -> Option<Arc<AnalysisResult>> {
        let hit = self.get(key)?;
        Counters::bump(&self.counters.hits);
        debug!(version = %key.version, "cache hit");
        Some(hit)
    }

    fn lead<F>(&self, key: &CacheKey, flight: &Flight, generation: u64, compute: &F) -> Result<Arc<AnalysisResult>>
    where
        F: Fn() -> Result<AnalysisResult>,
    {
        Counters::bump(&self.counters.misses);
        Counters::bump(&self.counters.computations);
        debug!(version = %key.version, "cache miss, computing");

        let mut guard = LeaderGuard {
            cache: self,
            key,
            flight,
            armed: true,
        };
        let outcome = compute();
        guard.armed = false;

        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                {
                    let mut in_flight = self.in_flight.lock();
                    self.insert(key, Arc::clone(&result), generation);
                    in_flight.remove(key);
                }
                flight.complete(FlightOutcome::Done(Arc::clone(&result)));
                Ok(result)
            }
            Err(e) if e.is_cancelled() => {
                warn!(version = %key.version, "computation cancelled");
                self.in_flight.lock().remove(key);
                flight.complete(FlightOutcome::Abandoned);
                Err(e)
            }
            Err(e) => {
                Counters::bump(&self.counters.failures);
                warn!(version = %key.version, error = %e, "computation failed");
                self.in_flight.lock().remove(key);
                flight.complete(FlightOutcome::Failed(e.clone()));
                Err(e)
            }
        }
    }

    fn insert(&self, key: &CacheKey, result: Arc<AnalysisResult>, generation: u64) {
        let mut entries = self.entries.lock();
        if key.version < entries.floor || entries.generation != generation {
            debug!(version = %key.version, "result superseded, not caching");
            return;
        }
        if let Some((evicted, _)) = entries.lru.push(key.clone(), result) {
            if evicted != *key {
                Counters::bump(&self.counters.evictions);
            }
        }
    }

    /// Data moved on to `version`: drop older entries and refuse late
    /// results for them. Returns the number of entries dropped.
    pub fn supersede(&self, version: DataVersion) -> usize {
        let mut entries = self.entries.lock();
        entries.floor = entries.floor.max(version);
        entries.generation += 1;
        Self::remove_where(&mut entries.lru, |k| k.version < version)
    }

    /// Drop every entry computed at or before `version`. Computations that
    /// are running now deliver their results but do not cache them.
    pub fn invalidate(&self, version: DataVersion) -> usize {
        let mut entries = self.entries.lock();
        entries.generation += 1;
        Self::remove_where(&mut entries.lru, |k| k.version <= version)
    }

    fn remove_where(lru: &mut LruCache<CacheKey, Arc<AnalysisResult>>, pred: impl Fn(&CacheKey) -> bool) -> usize {
        let stale: Vec<CacheKey> = lru.iter().map(|(k, _)| k).filter(|k| pred(*k)).cloned().collect();
        for k in &stale {
            lru.pop(k);
        }
        stale.len()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.generation += 1;
        entries.lru.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of computations currently running
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    pub fn stats(&self) -> CacheStats {
        let c = &self.counters;
        CacheStats {
            hits: c.hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            coalesced: c.coalesced.load(Ordering::Relaxed),
            computations: c.computations.load(Ordering::Relaxed),
            failures: c.failures.load(Ordering::Relaxed),
            evictions: c.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
