//! Monitoring-point data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::geodesy::GeoPosition;
use crate::version::DataVersion;

/// Pseudo-field resolving to the ordinal health score when a point has no
/// explicit observation of that name.
pub const HEALTH_FIELD: &str = "health";

/// Unique, immutable identifier of a monitoring point.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(String);

impl PointId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PointId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Health classification of a mangrove stand, ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl HealthStatus {
    pub const ALL: [HealthStatus; 4] = [
        HealthStatus::Poor,
        HealthStatus::Fair,
        HealthStatus::Good,
        HealthStatus::Excellent,
    ];

    /// Ordinal score: Poor = 0 … Excellent = 3
    pub fn score(self) -> f64 {
        match self {
            HealthStatus::Poor => 0.0,
            HealthStatus::Fair => 1.0,
            HealthStatus::Good => 2.0,
            HealthStatus::Excellent => 3.0,
        }
    }

    pub fn risk(self) -> RiskLevel {
        match self {
            HealthStatus::Excellent => RiskLevel::Low,
            HealthStatus::Good => RiskLevel::Medium,
            HealthStatus::Fair | HealthStatus::Poor => RiskLevel::High,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Poor => "Poor",
            HealthStatus::Fair => "Fair",
            HealthStatus::Good => "Good",
            HealthStatus::Excellent => "Excellent",
        };
        f.write_str(s)
    }
}

impl FromStr for HealthStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poor" => Ok(HealthStatus::Poor),
            "fair" => Ok(HealthStatus::Fair),
            "good" => Ok(HealthStatus::Good),
            "excellent" => Ok(HealthStatus::Excellent),
            other => Err(Error::validation(
                "health",
                format!("unknown health status '{other}'"),
            )),
        }
    }
}

/// Pest/degradation risk derived from health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Current state of a monitoring point, as submitted and as read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringPoint {
    pub id: PointId,
    #[serde(default)]
    pub name: String,
    pub position: GeoPosition,
    /// Named scalar observations (coverage, height, pest, ...)
    #[serde(default)]
    pub observations: BTreeMap<String, f64>,
    pub health: HealthStatus,
    pub surveyed_at: DateTime<Utc>,
}

impl MonitoringPoint {
    pub fn new(
        id: impl Into<PointId>,
        position: GeoPosition,
        health: HealthStatus,
        surveyed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            position,
            observations: BTreeMap::new(),
            health,
            surveyed_at,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_observation(mut self, field: impl Into<String>, value: f64) -> Self {
        self.observations.insert(field.into(), value);
        self
    }

    /// Value of a named field. `health` falls back to the ordinal score.
    pub fn field_value(&self, field: &str) -> Option<f64> {
        match self.observations.get(field) {
            Some(v) => Some(*v),
            None if field == HEALTH_FIELD => Some(self.health.score()),
            None => None,
        }
    }

    /// Reject out-of-range positions, blank ids and non-finite observations.
    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(Error::validation("id", "must not be empty"));
        }
        self.position.validate()?;
        for (field, value) in &self.observations {
            if field.trim().is_empty() {
                return Err(Error::validation("observations", "field name must not be empty"));
            }
            if !value.is_finite() {
                return Err(Error::validation(
                    format!("observations.{field}"),
                    format!("{value} is not finite"),
                ));
            }
        }
        Ok(())
    }
}

impl From<String> for PointId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One immutable entry in a point's observation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSnapshot {
    /// Store version created by the write that recorded this snapshot
    pub version: DataVersion,
    pub name: String,
    pub position: GeoPosition,
    pub observations: BTreeMap<String, f64>,
    pub health: HealthStatus,
    pub surveyed_at: DateTime<Utc>,
}

impl ObservationSnapshot {
    pub fn record(point: &MonitoringPoint, version: DataVersion) -> Self {
        Self {
            version,
            name: point.name.clone(),
            position: point.position,
            observations: point.observations.clone(),
            health: point.health,
            surveyed_at: point.surveyed_at,
        }
    }

    pub fn to_point(&self, id: &PointId) -> MonitoringPoint {
        MonitoringPoint {
            id: id.clone(),
            name: self.name.clone(),
            position: self.position,
            observations: self.observations.clone(),
            health: self.health,
            surveyed_at: self.surveyed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point() -> MonitoringPoint {
        MonitoringPoint::new(
            "1",
            GeoPosition::new(1.3531, 103.8188),
            HealthStatus::Good,
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        )
        .with_name("Monitoring Point 1")
        .with_observation("coverage", 85.0)
    }

    #[test]
    fn test_health_ordering() {
        assert!(HealthStatus::Poor < HealthStatus::Fair);
        assert!(HealthStatus::Fair < HealthStatus::Good);
        assert!(HealthStatus::Good < HealthStatus::Excellent);
    }

    #[test]
    fn test_health_parse() {
        assert_eq!("Excellent".parse::<HealthStatus>().unwrap(), HealthStatus::Excellent);
        assert_eq!(" fair ".parse::<HealthStatus>().unwrap(), HealthStatus::Fair);
        assert!("bad".parse::<HealthStatus>().is_err());
    }

    #[test]
    fn test_risk_levels() {
        assert_eq!(HealthStatus::Excellent.risk(), RiskLevel::Low);
        assert_eq!(HealthStatus::Good.risk(), RiskLevel::Medium);
        assert_eq!(HealthStatus::Fair.risk(), RiskLevel::High);
        assert_eq!(HealthStatus::Poor.risk(), RiskLevel::High);
    }

    #[test]
    fn test_field_value_health_fallback() {
        let p = point();
        assert_eq!(p.field_value("coverage"), Some(85.0));
        assert_eq!(p.field_value("health"), Some(2.0));
        assert_eq!(p.field_value("height"), None);

        let explicit = point().with_observation("health", 7.0);
        assert_eq!(explicit.field_value("health"), Some(7.0));
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let p = point().with_observation("height", f64::INFINITY);
        let err = p.validate().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_position() {
        let mut p = point();
        p.position.lat = 91.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(point()).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["health"], "good");
        assert_eq!(json["observations"]["coverage"], 85.0);
    }
}
