//! Analysis results
//!
//! Results are immutable once computed. The cache owns them and callers get
//! shared `Arc` handles.

use chrono::{DateTime, Utc};
use geo_types::MultiPolygon;
use mangrove_core::{DataVersion, Raster};
use serde::{Deserialize, Serialize};

use crate::request::{AnalysisRequest, MethodKind};

/// Minimum and maximum of a surface, for legend rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// An interpolated scalar field on a regular grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub field: String,
    pub method: MethodKind,
    /// Number of samples the surface was fitted to
    pub sample_count: usize,
    pub values: Raster,
    /// Kriging variance, when requested
    pub variance: Option<Raster>,
    /// `None` when no cell has a value
    pub range: Option<ValueRange>,
}

/// Buffer zone around one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferZone {
    /// Feature id, or `#index` for anonymous features
    pub label: String,
    pub geometry: MultiPolygon<f64>,
    pub area_m2: f64,
    pub perimeter_m: f64,
}

/// Buffer zones, plus their overlay when one was requested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferSet {
    pub radius_m: f64,
    pub zones: Vec<BufferZone>,
    pub merged: Option<MultiPolygon<f64>>,
    pub merged_area_m2: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnalysisOutput {
    Surface(Surface),
    Buffers(BufferSet),
}

/// A completed analysis with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The request as computed, pinned to `data_version`
    pub request: AnalysisRequest,
    pub data_version: DataVersion,
    pub computed_at: DateTime<Utc>,
    pub output: AnalysisOutput,
}

impl AnalysisResult {
    pub fn surface(&self) -> Option<&Surface> {
        match &self.output {
            AnalysisOutput::Surface(s) => Some(s),
            AnalysisOutput::Buffers(_) => None,
        }
    }

    pub fn buffers(&self) -> Option<&BufferSet> {
        match &self.output {
            AnalysisOutput::Buffers(b) => Some(b),
            AnalysisOutput::Surface(_) => None,
        }
    }
}
