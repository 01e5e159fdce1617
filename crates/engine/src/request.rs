//! Analysis requests: what to compute, over which data version.
//!
//! Methods are a closed set of variants, each carrying its own parameter
//! struct. Requests serialize canonically, which is what the result cache
//! keys on.

use std::fmt;
use std::str::FromStr;

use mangrove_algorithms::interpolation::{IdwParams, KrigingParams, SplineParams};
use mangrove_algorithms::vector::Overlay;
use mangrove_core::{DataVersion, Error, Feature, GridSpec, PointId};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Interpolation method family, without parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Idw,
    Kriging,
    Spline,
}

impl MethodKind {
    pub const ALL: [MethodKind; 3] = [MethodKind::Idw, MethodKind::Kriging, MethodKind::Spline];

    pub fn name(self) -> &'static str {
        match self {
            MethodKind::Idw => "idw",
            MethodKind::Kriging => "kriging",
            MethodKind::Spline => "spline",
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MethodKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "idw" => Ok(MethodKind::Idw),
            "kriging" => Ok(MethodKind::Kriging),
            "spline" | "tps" => Ok(MethodKind::Spline),
            other => Err(Error::validation(
                "method",
                format!("unknown interpolation method '{other}' (expected idw, kriging or spline)"),
            )),
        }
    }
}

/// Interpolation method with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "lowercase")]
pub enum InterpolationMethod {
    Idw(IdwParams),
    Kriging(KrigingParams),
    Spline(SplineParams),
}

impl InterpolationMethod {
    /// `kind` with default parameters
    pub fn with_defaults(kind: MethodKind) -> Self {
        match kind {
            MethodKind::Idw => InterpolationMethod::Idw(IdwParams::default()),
            MethodKind::Kriging => InterpolationMethod::Kriging(KrigingParams::default()),
            MethodKind::Spline => InterpolationMethod::Spline(SplineParams::default()),
        }
    }

    pub fn kind(&self) -> MethodKind {
        match self {
            InterpolationMethod::Idw(_) => MethodKind::Idw,
            InterpolationMethod::Kriging(_) => MethodKind::Kriging,
            InterpolationMethod::Spline(_) => MethodKind::Spline,
        }
    }
}

/// Interpolate one field onto a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolationRequest {
    /// Observation field, e.g. `coverage`, or the `health` pseudo-field
    pub field: String,
    pub method: InterpolationMethod,
    pub grid: GridSpec,
}

/// Which features a buffer analysis covers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferTarget {
    /// Every live monitoring point
    AllPoints,
    /// The named monitoring points, in the given order
    Points(Vec<PointId>),
    /// Caller-supplied point or polygon features
    Features(Vec<Feature>),
}

/// Buffer features by a radius and optionally overlay the zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferRequest {
    pub target: BufferTarget,
    pub radius_m: f64,
    /// Vertices per circle. `None` takes the engine's configured default.
    #[serde(default)]
    pub vertices: Option<usize>,
    #[serde(default)]
    pub overlay: Overlay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnalysisKind {
    Interpolation(InterpolationRequest),
    Buffer(BufferRequest),
}

/// A request for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub kind: AnalysisKind,
    /// Data version to analyse. `None` means the latest.
    #[serde(default)]
    pub data_version: Option<DataVersion>,
}

impl AnalysisRequest {
    pub fn interpolation(field: impl Into<String>, method: InterpolationMethod, grid: GridSpec) -> Self {
        Self {
            kind: AnalysisKind::Interpolation(InterpolationRequest {
                field: field.into(),
                method,
                grid,
            }),
            data_version: None,
        }
    }

    pub fn buffer(target: BufferTarget, radius_m: f64) -> Self {
        Self {
            kind: AnalysisKind::Buffer(BufferRequest {
                target,
                radius_m,
                vertices: None,
                overlay: Overlay::None,
            }),
            data_version: None,
        }
    }

    /// Overlay the buffer zones. No effect on interpolation requests.
    pub fn with_overlay(mut self, overlay: Overlay) -> Self {
        if let AnalysisKind::Buffer(b) = &mut self.kind {
            b.overlay = overlay;
        }
        self
    }

    /// Pin the request to a data version.
    pub fn at_version(mut self, version: DataVersion) -> Self {
        self.data_version = Some(version);
        self
    }

    /// Fill unset parameters from `config`.
    pub fn resolved(mut self, config: &EngineConfig) -> Self {
        if let AnalysisKind::Buffer(b) = &mut self.kind {
            b.vertices.get_or_insert(config.buffer_vertices);
        }
        self
    }

    /// Short name of the analysis, e.g. `kriging` or `buffer`
    pub fn method_name(&self) -> &'static str {
        match &self.kind {
            AnalysisKind::Interpolation(i) => i.method.kind().name(),
            AnalysisKind::Buffer(_) => "buffer",
        }
    }
}

impl fmt::Display for AnalysisRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AnalysisKind::Interpolation(i) => write!(
                f,
                "{} interpolation of '{}' on a {}x{} grid",
                i.method.kind(),
                i.field,
                i.grid.rows(),
                i.grid.cols()
            )?,
            AnalysisKind::Buffer(b) => {
                let target = match &b.target {
                    BufferTarget::AllPoints => "all points".to_string(),
                    BufferTarget::Points(ids) => format!("{} points", ids.len()),
                    BufferTarget::Features(fs) => format!("{} features", fs.len()),
                };
                write!(f, "{} m buffer of {target}", b.radius_m)?
            }
        }
        match self.data_version {
            Some(v) => write!(f, " at {v}"),
            None => Ok(()),
        }
    }
}

/// Cache identity of a computation: the data version it ran against plus
/// the canonical JSON encoding of the analysis parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub version: DataVersion,
    pub fingerprint: String,
}

impl CacheKey {
    pub fn new(version: DataVersion, kind: &AnalysisKind) -> Result<Self, Error> {
        let fingerprint = serde_json::to_string(kind)
            .map_err(|e| Error::Other(format!("cannot encode analysis request: {e}")))?;
        Ok(Self { version, fingerprint })
    }
}
