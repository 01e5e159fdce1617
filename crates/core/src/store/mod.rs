//! Point Store: versioned monitoring-point records
//!
//! Writes are serialized behind a single write lock and each one bumps the
//! store's [`DataVersion`] inside that lock, so a version always identifies
//! exactly one state. Readers take [`StoreSnapshot`]s, which share the
//! current point map copy-on-write and stay valid after later writes.

mod filter;
mod history;
mod snapshot;
mod summary;

pub use filter::PointFilter;
pub use snapshot::{PointQuery, StoreSnapshot};
pub use summary::{field_summary, health_distribution, FieldSummary};

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::point::{MonitoringPoint, ObservationSnapshot, PointId};
use crate::version::DataVersion;
use history::PointHistory;

#[derive(Debug, Default)]
struct StoreState {
    version: DataVersion,
    histories: BTreeMap<PointId, PointHistory>,
    current: Arc<BTreeMap<PointId, MonitoringPoint>>,
}

/// In-memory store of monitoring points and their observation history.
#[derive(Debug, Default)]
pub struct PointStore {
    state: RwLock<StoreState>,
}

impl PointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current data version.
    pub fn version(&self) -> DataVersion {
        self.state.read().version
    }

    /// Insert a point or record a new observation for an existing one.
    ///
    /// Returns the data version created by this write. Invalid input leaves
    /// the store and its version untouched.
    pub fn upsert(&self, point: MonitoringPoint) -> Result<DataVersion> {
        point.validate()?;

        let mut guard = self.state.write();
        let state = &mut *guard;
        let next = state.version.next();

        state
            .histories
            .entry(point.id.clone())
            .or_insert_with(|| PointHistory::new(point.id.clone()))
            .observe(&point, next)?;

        debug!(point = %point.id, version = %next, "recorded observation");
        Arc::make_mut(&mut state.current).insert(point.id.clone(), point);
        state.version = next;
        Ok(next)
    }

    /// Retire a point. Its history stays readable through older snapshots.
    pub fn remove(&self, id: &PointId) -> Result<DataVersion> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let history = state
            .histories
            .get_mut(id)
            .filter(|h| h.is_live())
            .ok_or_else(|| Error::NotFound(format!("point {id}")))?;

        let next = state.version.next();
        history.remove(next);
        Arc::make_mut(&mut state.current).remove(id);
        state.version = next;

        debug!(point = %id, version = %next, "removed point");
        Ok(next)
    }

    pub fn get(&self, id: &PointId) -> Result<MonitoringPoint> {
        self.state
            .read()
            .current
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("point {id}")))
    }

    /// Lazy, restartable listing of points matching `filter` at the current
    /// version.
    pub fn list(&self, filter: PointFilter) -> PointQuery {
        self.snapshot().query(filter)
    }

    /// Consistent view of the current state.
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read();
        StoreSnapshot::new(state.version, Arc::clone(&state.current))
    }

    /// Reconstruct the store as it was at `version`.
    pub fn snapshot_at(&self, version: DataVersion) -> Result<StoreSnapshot> {
        let state = self.state.read();
        if version > state.version {
            return Err(Error::validation(
                "data_version",
                format!("{version} is newer than the current {}", state.version),
            ));
        }
        if version == state.version {
            return Ok(StoreSnapshot::new(state.version, Arc::clone(&state.current)));
        }

        let points: BTreeMap<PointId, MonitoringPoint> = state
            .histories
            .iter()
            .filter_map(|(id, h)| h.at(version).map(|p| (id.clone(), p)))
            .collect();
        Ok(StoreSnapshot::new(version, Arc::new(points)))
    }

    /// Every observation ever recorded for `id`, oldest first.
    pub fn history(&self, id: &PointId) -> Result<Vec<ObservationSnapshot>> {
        self.state
            .read()
            .histories
            .get(id)
            .map(|h| h.snapshots())
            .ok_or_else(|| Error::NotFound(format!("point {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::GeoPosition;
    use crate::point::HealthStatus;
    use chrono::{Duration, TimeZone, Utc};

    fn point(id: &str, coverage: f64, health: HealthStatus, day: i64) -> MonitoringPoint {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        MonitoringPoint::new(
            id,
            GeoPosition::new(1.3531, 103.8188),
            health,
            base + Duration::days(day),
        )
        .with_observation("coverage", coverage)
    }

    #[test]
    fn test_upsert_bumps_version() {
        let store = PointStore::new();
        assert_eq!(store.version(), DataVersion(0));
        let v1 = store.upsert(point("1", 85.0, HealthStatus::Good, 0)).unwrap();
        let v2 = store.upsert(point("2", 72.0, HealthStatus::Fair, 0)).unwrap();
        assert!(v2 > v1);
        assert_eq!(store.version(), v2);
    }

    #[test]
    fn test_invalid_upsert_keeps_version() {
        let store = PointStore::new();
        store.upsert(point("1", 85.0, HealthStatus::Good, 0)).unwrap();
        let before = store.version();

        let mut bad = point("2", 1.0, HealthStatus::Good, 0);
        bad.position.lng = 181.0;
        assert!(matches!(store.upsert(bad), Err(Error::Validation { .. })));

        let nan = point("3", f64::NAN, HealthStatus::Good, 0);
        assert!(matches!(store.upsert(nan), Err(Error::Validation { .. })));

        assert_eq!(store.version(), before);
    }

    #[test]
    fn test_get_missing() {
        let store = PointStore::new();
        assert!(matches!(store.get(&PointId::from("x")), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_updates_append_history() {
        let store = PointStore::new();
        store.upsert(point("1", 80.0, HealthStatus::Fair, 0)).unwrap();
        store.upsert(point("1", 85.0, HealthStatus::Good, 30)).unwrap();

        let current = store.get(&PointId::from("1")).unwrap();
        assert_eq!(current.field_value("coverage"), Some(85.0));

        let history = store.history(&PointId::from("1")).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].observations["coverage"], 80.0);
        assert!(history[0].version < history[1].version);
    }

    #[test]
    fn test_out_of_order_survey_rejected() {
        let store = PointStore::new();
        store.upsert(point("1", 80.0, HealthStatus::Fair, 10)).unwrap();
        let result = store.upsert(point("1", 85.0, HealthStatus::Good, 5));
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert_eq!(store.history(&PointId::from("1")).unwrap().len(), 1);
    }

    #[test]
    fn test_list_is_restartable() {
        let store = PointStore::new();
        store.upsert(point("1", 85.0, HealthStatus::Good, 0)).unwrap();
        store.upsert(point("2", 72.0, HealthStatus::Fair, 0)).unwrap();
        store.upsert(point("3", 93.0, HealthStatus::Excellent, 0)).unwrap();

        let query = store.list(PointFilter::all().with_min_health(HealthStatus::Good));
        let first: Vec<_> = query.iter().map(|p| p.id.as_str().to_string()).collect();
        let second: Vec<_> = (&query).into_iter().map(|p| p.id.as_str().to_string()).collect();
        assert_eq!(first, vec!["1", "3"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_snapshot_isolated_from_writes() {
        let store = PointStore::new();
        store.upsert(point("1", 85.0, HealthStatus::Good, 0)).unwrap();
        let snap = store.snapshot();

        store.upsert(point("2", 72.0, HealthStatus::Fair, 0)).unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn test_remove_and_historical_snapshot() {
        let store = PointStore::new();
        let v1 = store.upsert(point("1", 80.0, HealthStatus::Good, 0)).unwrap();
        let v2 = store.upsert(point("1", 90.0, HealthStatus::Good, 1)).unwrap();
        let v3 = store.remove(&PointId::from("1")).unwrap();
        assert!(v3 > v2);
        assert!(store.get(&PointId::from("1")).is_err());
        assert!(matches!(store.remove(&PointId::from("1")), Err(Error::NotFound(_))));

        let at_v1 = store.snapshot_at(v1).unwrap();
        assert_eq!(at_v1.get(&PointId::from("1")).unwrap().field_value("coverage"), Some(80.0));
        let at_v2 = store.snapshot_at(v2).unwrap();
        assert_eq!(at_v2.get(&PointId::from("1")).unwrap().field_value("coverage"), Some(90.0));
        assert!(store.snapshot_at(v3).unwrap().is_empty());
        assert!(store.snapshot_at(DataVersion(0)).unwrap().is_empty());
        assert!(store.snapshot_at(DataVersion(99)).is_err());
    }

    #[test]
    fn test_concurrent_writers_serialized() {
        let store = Arc::new(PointStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let id = format!("{t}-{i}");
                        store.upsert(point(&id, i as f64, HealthStatus::Good, 0)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.version(), DataVersion(200));
        assert_eq!(store.snapshot().len(), 200);
    }

    #[test]
    fn test_summaries() {
        let store = PointStore::new();
        store.upsert(point("1", 85.0, HealthStatus::Good, 0)).unwrap();
        store.upsert(point("2", 72.0, HealthStatus::Fair, 0)).unwrap();
        store.upsert(point("3", 93.0, HealthStatus::Excellent, 0)).unwrap();
        let snap = store.snapshot();

        let s = field_summary(&snap, "coverage").unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.min, 72.0);
        assert_eq!(s.max, 93.0);
        assert!((s.mean - 250.0 / 3.0).abs() < 1e-12);
        assert!(field_summary(&snap, "height").is_none());

        let dist = health_distribution(&snap);
        assert_eq!(dist[&HealthStatus::Poor], 0);
        assert_eq!(dist[&HealthStatus::Good], 1);
        assert_eq!(dist.values().sum::<usize>(), 3);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_every_write_increases_version(values in proptest::collection::vec(0.0f64..100.0, 1..20)) {
                let store = PointStore::new();
                let mut last = store.version();
                for (i, v) in values.iter().enumerate() {
                    let next = store.upsert(point("p", *v, HealthStatus::Good, i as i64)).unwrap();
                    prop_assert!(next > last);
                    last = next;
                }
                prop_assert_eq!(store.history(&PointId::from("p")).unwrap().len(), values.len());
            }
        }
    }
}
