//! The analysis engine: point store, result cache and worker pool behind
//! three operations.
//!
//! - [`AnalysisEngine::submit_observation`] writes a point and returns the
//!   new data version; results cached for older versions are dropped.
//! - [`AnalysisEngine::request_analysis`] answers from the cache or computes
//!   once per distinct request and version.
//! - [`AnalysisEngine::invalidate`] drops cached results explicitly.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use crossbeam_channel::{Receiver, TryRecvError};
use mangrove_algorithms::interpolation::{empirical_variogram, project_samples, EmpiricalVariogram};
use mangrove_core::{
    BoundingBox, CancelToken, DataVersion, Error, LocalProjection, MonitoringPoint, PointId, PointStore,
    StoreSnapshot,
};
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, ResultCache};
use crate::compute;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::pool::WorkerPool;
use crate::request::{AnalysisRequest, CacheKey};
use crate::result::AnalysisResult;

/// Spatial analysis engine over an in-memory point store.
///
/// Safe to share between threads; wrap it in an `Arc` to use
/// [`spawn_analysis`](Self::spawn_analysis).
pub struct AnalysisEngine {
    store: PointStore,
    cache: ResultCache,
    pool: WorkerPool,
    config: EngineConfig,
}

impl AnalysisEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.worker_threads)?;
        debug!(
            threads = pool.threads(),
            cache_capacity = config.cache_capacity,
            "analysis engine started"
        );
        Ok(Self {
            store: PointStore::new(),
            cache: ResultCache::new(config.cache_capacity),
            pool,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &PointStore {
        &self.store
    }

    pub fn version(&self) -> DataVersion {
        self.store.version()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// Insert or update a monitoring point.
    ///
    /// Returns the data version created by the write. Cached results for
    /// earlier versions are dropped.
    pub fn submit_observation(&self, point: MonitoringPoint) -> Result<DataVersion> {
        let id = point.id.clone();
        let version = self.store.upsert(point)?;
        let dropped = self.cache.supersede(version);
        debug!(point = %id, %version, dropped, "observation submitted");
        Ok(version)
    }

    /// Retire a monitoring point. Bumps the data version like any write.
    pub fn remove_point(&self, id: &PointId) -> Result<DataVersion> {
        let version = self.store.remove(id)?;
        let dropped = self.cache.supersede(version);
        debug!(point = %id, %version, dropped, "point removed");
        Ok(version)
    }

    /// Drop every cached result computed at or before `version`.
    ///
    /// Returns the number of results dropped.
    pub fn invalidate(&self, version: DataVersion) -> usize {
        let dropped = self.cache.invalidate(version);
        info!(%version, dropped, "cache invalidated");
        dropped
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Analyses being computed right now
    pub fn analyses_in_flight(&self) -> usize {
        self.cache.in_flight()
    }

    /// Run an analysis to completion.
    pub fn request_analysis(&self, request: AnalysisRequest) -> Result<Arc<AnalysisResult>> {
        self.request_analysis_with(request, &CancelToken::new())
    }

    /// Run an analysis, giving up with [`Error::Cancelled`] if `cancel`
    /// fires first.
    ///
    /// Requests for the current version (or no version) go through the
    /// cache. Requests pinned to an older version are computed against a
    /// historical snapshot and not cached. Failures carry the request.
    pub fn request_analysis_with(&self, request: AnalysisRequest, cancel: &CancelToken) -> Result<Arc<AnalysisResult>> {
        let request = request.resolved(&self.config);
        let (snapshot, cacheable) = self
            .snapshot_for(&request)
            .map_err(|e| EngineError::analysis(&request, e))?;
        let version = snapshot.version();
        let pinned = request.clone().at_version(version);

        let compute = || self.compute(&pinned, &snapshot, cancel);

        let outcome = if cacheable {
            let key = CacheKey::new(version, &pinned.kind).map_err(|e| EngineError::analysis(&pinned, e))?;
            self.cache.get_or_compute(&key, cancel, compute)
        } else {
            debug!(%version, "historical request, bypassing cache");
            compute().map(Arc::new)
        };

        outcome.map_err(|e| match e {
            EngineError::Core(source) => EngineError::analysis(&pinned, source),
            other => other,
        })
    }

    fn snapshot_for(&self, request: &AnalysisRequest) -> std::result::Result<(StoreSnapshot, bool), Error> {
        let current = self.store.snapshot();
        match request.data_version {
            None => Ok((current, true)),
            Some(v) if v == current.version() => Ok((current, true)),
            Some(v) => self.store.snapshot_at(v).map(|s| (s, false)),
        }
    }

    fn compute(
        &self,
        request: &AnalysisRequest,
        snapshot: &StoreSnapshot,
        cancel: &CancelToken,
    ) -> Result<AnalysisResult> {
        let start = Instant::now();
        let output = self
            .pool
            .install(|| compute::run(&request.kind, snapshot, &self.config, cancel));

        match output {
            Ok(output) => {
                info!(
                    analysis = request.method_name(),
                    version = %snapshot.version(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "analysis complete"
                );
                Ok(AnalysisResult {
                    request: request.clone(),
                    data_version: snapshot.version(),
                    computed_at: Utc::now(),
                    output,
                })
            }
            Err(Error::Cancelled) => {
                warn!(analysis = request.method_name(), "analysis cancelled");
                Err(EngineError::analysis(request, Error::Cancelled))
            }
            Err(e) => {
                warn!(analysis = request.method_name(), error = %e, "analysis failed");
                Err(EngineError::analysis(request, e))
            }
        }
    }

    /// Empirical variogram of `field` at the current version, for choosing
    /// kriging parameters. Lags are in metres.
    pub fn variogram(&self, field: &str, n_lags: usize, max_lag: Option<f64>) -> Result<EmpiricalVariogram> {
        let samples = self.store.snapshot().field_samples(field);
        let bbox = BoundingBox::enclosing(samples.iter().map(|(p, _)| p))
            .ok_or_else(|| Error::validation("field", format!("no points carry '{field}'")))?;
        let points = project_samples(&samples, &LocalProjection::new(bbox.center()));
        Ok(empirical_variogram(&points, n_lags, max_lag)?)
    }

    /// Run `request` on a background thread.
    ///
    /// The returned handle can cancel the analysis or wait for its result.
    pub fn spawn_analysis(self: &Arc<Self>, request: AnalysisRequest) -> Result<AnalysisHandle> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let cancel = CancelToken::new();
        let engine = Arc::clone(self);
        let token = cancel.clone();

        std::thread::Builder::new()
            .name("mangrove-analysis".into())
            .spawn(move || {
                let result = engine.request_analysis_with(request, &token);
                let _ = tx.send(result);
            })
            .map_err(|e| EngineError::Pool(format!("cannot spawn analysis thread: {e}")))?;

        Ok(AnalysisHandle { cancel, receiver: rx })
    }
}

impl std::fmt::Debug for AnalysisEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisEngine")
            .field("version", &self.store.version())
            .field("cached", &self.cache.len())
            .field("pool", &self.pool)
            .finish()
    }
}

/// A background analysis started with [`AnalysisEngine::spawn_analysis`].
pub struct AnalysisHandle {
    cancel: CancelToken,
    receiver: Receiver<Result<Arc<AnalysisResult>>>,
}

impl AnalysisHandle {
    /// Ask the analysis to stop. It finishes with a cancellation error
    /// unless it has already completed.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the analysis finishes.
    pub fn wait(self) -> Result<Arc<AnalysisResult>> {
        self.receiver
            .recv()
            .map_err(|_| EngineError::Pool("analysis thread exited without a result".into()))?
    }

    /// The result if the analysis has finished, without blocking.
    pub fn try_result(&self) -> Option<Result<Arc<AnalysisResult>>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(EngineError::Pool(
                "analysis thread exited without a result".into(),
            ))),
        }
    }
}
