//! Vector features supplied to buffer analysis
//!
//! Polygon coordinates use `x = longitude`, `y = latitude`.

use geo_types::Polygon;
use serde::{Deserialize, Serialize};

use crate::geodesy::GeoPosition;
use crate::point::MonitoringPoint;

/// Geometry of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates", rename_all = "lowercase")]
pub enum FeatureGeometry {
    Point(GeoPosition),
    Polygon(Polygon<f64>),
}

/// A geographic feature with an optional identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: Option<String>,
    pub geometry: FeatureGeometry,
}

impl Feature {
    pub fn point(id: impl Into<String>, position: GeoPosition) -> Self {
        Self {
            id: Some(id.into()),
            geometry: FeatureGeometry::Point(position),
        }
    }

    pub fn polygon(id: impl Into<String>, polygon: Polygon<f64>) -> Self {
        Self {
            id: Some(id.into()),
            geometry: FeatureGeometry::Polygon(polygon),
        }
    }

    /// Label used in reports: the id, or `#index` when there is none.
    pub fn label(&self, index: usize) -> String {
        self.id.clone().unwrap_or_else(|| format!("#{index}"))
    }
}

impl From<&MonitoringPoint> for Feature {
    fn from(p: &MonitoringPoint) -> Self {
        Feature::point(p.id.as_str(), p.position)
    }
}
