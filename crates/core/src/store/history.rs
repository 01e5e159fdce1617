//! Append-only per-point revision log

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::point::{MonitoringPoint, ObservationSnapshot, PointId};
use crate::version::DataVersion;

/// A single entry in a point's log.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Revision {
    Observed(ObservationSnapshot),
    Removed(DataVersion),
}

impl Revision {
    fn version(&self) -> DataVersion {
        match self {
            Revision::Observed(s) => s.version,
            Revision::Removed(v) => *v,
        }
    }
}

/// Every revision ever recorded for one point, in version order.
#[derive(Debug, Clone)]
pub(crate) struct PointHistory {
    id: PointId,
    revisions: Vec<Revision>,
}

impl PointHistory {
    pub(crate) fn new(id: PointId) -> Self {
        Self {
            id,
            revisions: Vec::new(),
        }
    }

    fn last_survey(&self) -> Option<DateTime<Utc>> {
        self.revisions.iter().rev().find_map(|r| match r {
            Revision::Observed(s) => Some(s.surveyed_at),
            Revision::Removed(_) => None,
        })
    }

    pub(crate) fn is_live(&self) -> bool {
        matches!(self.revisions.last(), Some(Revision::Observed(_)))
    }

    /// Append a new observation. Survey timestamps may not move backwards.
    pub(crate) fn observe(&mut self, point: &MonitoringPoint, version: DataVersion) -> Result<()> {
        if let Some(last) = self.last_survey() {
            if point.surveyed_at < last {
                return Err(Error::validation(
                    "surveyed_at",
                    format!(
                        "{} precedes the latest survey {} of point {}",
                        point.surveyed_at, last, self.id
                    ),
                ));
            }
        }
        self.revisions
            .push(Revision::Observed(ObservationSnapshot::record(point, version)));
        Ok(())
    }

    pub(crate) fn remove(&mut self, version: DataVersion) {
        self.revisions.push(Revision::Removed(version));
    }

    /// State of the point as of `version`, if it existed then.
    pub(crate) fn at(&self, version: DataVersion) -> Option<MonitoringPoint> {
        let idx = self.revisions.partition_point(|r| r.version() <= version);
        match idx.checked_sub(1).map(|i| &self.revisions[i]) {
            Some(Revision::Observed(s)) => Some(s.to_point(&self.id)),
            _ => None,
        }
    }

    pub(crate) fn snapshots(&self) -> Vec<ObservationSnapshot> {
        self.revisions
            .iter()
            .filter_map(|r| match r {
                Revision::Observed(s) => Some(s.clone()),
                Revision::Removed(_) => None,
            })
            .collect()
    }
}
