//! Read-only, versioned views of the Point Store

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::geodesy::GeoPosition;
use crate::point::{MonitoringPoint, PointId};
use crate::store::PointFilter;
use crate::version::DataVersion;

/// Consistent view of every live point at one data version.
///
/// Cheap to clone; later writes to the store never alter an existing snapshot.
/// Points iterate in identifier order.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    version: DataVersion,
    points: Arc<BTreeMap<PointId, MonitoringPoint>>,
}

impl StoreSnapshot {
    pub(crate) fn new(version: DataVersion, points: Arc<BTreeMap<PointId, MonitoringPoint>>) -> Self {
        Self { version, points }
    }

    pub fn version(&self) -> DataVersion {
        self.version
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, id: &PointId) -> Result<&MonitoringPoint> {
        self.points
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("point {id} at {}", self.version)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonitoringPoint> {
        self.points.values()
    }

    /// Lazy listing of the points matching `filter`.
    pub fn query(&self, filter: PointFilter) -> PointQuery {
        PointQuery {
            snapshot: self.clone(),
            filter,
        }
    }

    /// `(position, value)` for every point carrying `field`, in id order.
    pub fn field_samples(&self, field: &str) -> Vec<(GeoPosition, f64)> {
        self.points
            .values()
            .filter_map(|p| p.field_value(field).map(|v| (p.position, v)))
            .collect()
    }
}

/// Restartable, lazily evaluated listing over a snapshot.
///
/// Each call to [`iter`](Self::iter) starts a fresh pass; the filter runs as
/// items are pulled.
#[derive(Debug, Clone)]
pub struct PointQuery {
    snapshot: StoreSnapshot,
    filter: PointFilter,
}

impl PointQuery {
    pub fn version(&self) -> DataVersion {
        self.snapshot.version
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonitoringPoint> {
        self.snapshot.points.values().filter(|p| self.filter.matches(p))
    }
}

impl<'a> IntoIterator for &'a PointQuery {
    type Item = &'a MonitoringPoint;
    type IntoIter = Box<dyn Iterator<Item = &'a MonitoringPoint> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
