//! # Mangrove Core
//!
//! Core types for mangrove monitoring analysis.
//!
//! This crate provides:
//! - `PointStore`: versioned monitoring-point records with snapshots
//! - `Raster` / `GridSpec`: dense lng/lat grids for interpolated surfaces
//! - `geodesy`: positions, extents and a local equal-area projection
//! - `Feature`: point and polygon inputs for buffer analysis
//! - `CancelToken`: cooperative cancellation of long computations

pub mod cancel;
pub mod error;
pub mod geodesy;
pub mod point;
pub mod raster;
pub mod store;
pub mod vector;
pub mod version;

pub use cancel::CancelToken;
pub use error::{Error, Result};
pub use geodesy::{BoundingBox, GeoPosition, LocalProjection};
pub use point::{HealthStatus, MonitoringPoint, ObservationSnapshot, PointId, RiskLevel};
pub use raster::{GeoTransform, GridSpec, Raster};
pub use store::{PointFilter, PointQuery, PointStore, StoreSnapshot};
pub use vector::{Feature, FeatureGeometry};
pub use version::DataVersion;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cancel::CancelToken;
    pub use crate::error::{Error, Result};
    pub use crate::geodesy::{BoundingBox, GeoPosition};
    pub use crate::point::{HealthStatus, MonitoringPoint, PointId};
    pub use crate::raster::{GridSpec, Raster};
    pub use crate::store::{PointFilter, PointStore, StoreSnapshot};
    pub use crate::version::DataVersion;
}
