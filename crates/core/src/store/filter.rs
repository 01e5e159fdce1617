//! Predicates for point listing

use crate::geodesy::BoundingBox;
use crate::point::{HealthStatus, MonitoringPoint, PointId};

/// Conjunctive filter over monitoring points. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointFilter {
    /// Exact health class
    pub health: Option<HealthStatus>,
    /// Health at or above this class
    pub min_health: Option<HealthStatus>,
    /// Only points that carry a value for this field
    pub has_field: Option<String>,
    /// Only points inside this extent
    pub within: Option<BoundingBox>,
    /// Only these identifiers
    pub ids: Option<Vec<PointId>>,
}

impl PointFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_health(mut self, health: HealthStatus) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_min_health(mut self, health: HealthStatus) -> Self {
        self.min_health = Some(health);
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.has_field = Some(field.into());
        self
    }

    pub fn within(mut self, bbox: BoundingBox) -> Self {
        self.within = Some(bbox);
        self
    }

    pub fn with_ids(mut self, ids: Vec<PointId>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn matches(&self, point: &MonitoringPoint) -> bool {
        if self.health.is_some_and(|h| point.health != h) {
            return false;
        }
        if self.min_health.is_some_and(|h| point.health < h) {
            return false;
        }
        if let Some(field) = &self.has_field {
            if point.field_value(field).is_none() {
                return false;
            }
        }
        if let Some(bbox) = &self.within {
            if !bbox.contains(&point.position) {
                return false;
            }
        }
        if let Some(ids) = &self.ids {
            if !ids.contains(&point.id) {
                return false;
            }
        }
        true
    }
}
