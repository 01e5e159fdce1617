//! Runs one analysis against a store snapshot.
//!
//! Everything here is a pure function of the snapshot and the request, which
//! is what makes caching by `(data version, request)` sound.

use mangrove_algorithms::interpolation::{idw, ordinary_kriging, project_samples, tps_interpolation};
use mangrove_algorithms::vector::{area_m2, buffer_features, perimeter_m, BufferParams};
use mangrove_core::{CancelToken, Error, Feature, Result, StoreSnapshot};

use crate::config::EngineConfig;
use crate::request::{AnalysisKind, BufferRequest, BufferTarget, InterpolationMethod, InterpolationRequest};
use crate::result::{AnalysisOutput, BufferSet, BufferZone, Surface, ValueRange};

/// Compute the output of `kind` over `snapshot`.
pub fn run(
    kind: &AnalysisKind,
    snapshot: &StoreSnapshot,
    config: &EngineConfig,
    cancel: &CancelToken,
) -> Result<AnalysisOutput> {
    cancel.check()?;
    match kind {
        AnalysisKind::Interpolation(req) => interpolate(req, snapshot, config, cancel).map(AnalysisOutput::Surface),
        AnalysisKind::Buffer(req) => buffer(req, snapshot, config, cancel).map(AnalysisOutput::Buffers),
    }
}

fn interpolate(
    req: &InterpolationRequest,
    snapshot: &StoreSnapshot,
    config: &EngineConfig,
    cancel: &CancelToken,
) -> Result<Surface> {
    if req.field.trim().is_empty() {
        return Err(Error::validation("field", "must not be empty"));
    }
    req.grid.validate(config.max_grid_cells)?;

    let samples = snapshot.field_samples(&req.field);
    if samples.is_empty() {
        return Err(Error::validation(
            "field",
            format!("no points carry '{}' at {}", req.field, snapshot.version()),
        ));
    }
    let points = project_samples(&samples, &req.grid.projection());

    let (values, variance) = match &req.method {
        InterpolationMethod::Idw(params) => (idw(&points, &req.grid, params, cancel)?, None),
        InterpolationMethod::Kriging(params) => {
            let out = ordinary_kriging(&points, &req.grid, params, cancel)?;
            (out.estimate, out.variance)
        }
        InterpolationMethod::Spline(params) => (tps_interpolation(&points, &req.grid, params, cancel)?, None),
    };

    let range = values.value_range().map(|(min, max)| ValueRange { min, max });
    Ok(Surface {
        field: req.field.clone(),
        method: req.method.kind(),
        sample_count: points.len(),
        values,
        variance,
        range,
    })
}

/// Features selected by `target`, in a stable order.
fn resolve_target(target: &BufferTarget, snapshot: &StoreSnapshot) -> Result<Vec<Feature>> {
    match target {
        BufferTarget::AllPoints => Ok(snapshot.iter().map(Feature::from).collect()),
        BufferTarget::Points(ids) => ids
            .iter()
            .map(|id| snapshot.get(id).map(Feature::from))
            .collect(),
        BufferTarget::Features(features) => Ok(features.clone()),
    }
}

fn buffer(
    req: &BufferRequest,
    snapshot: &StoreSnapshot,
    config: &EngineConfig,
    cancel: &CancelToken,
) -> Result<BufferSet> {
    let params = BufferParams {
        radius_m: req.radius_m,
        vertices: req.vertices.unwrap_or(config.buffer_vertices),
    };
    params.validate()?;

    let features = resolve_target(&req.target, snapshot)?;
    if features.is_empty() {
        return Err(Error::InvalidGeometry("no features to buffer".into()));
    }

    let geometries = buffer_features(&features, &params, cancel)?;
    let merged = req.overlay.apply(&geometries);
    cancel.check()?;

    let zones = features
        .iter()
        .enumerate()
        .zip(geometries)
        .map(|((i, feature), geometry)| BufferZone {
            label: feature.label(i),
            area_m2: area_m2(&geometry),
            perimeter_m: perimeter_m(&geometry),
            geometry,
        })
        .collect();

    Ok(BufferSet {
        radius_m: req.radius_m,
        zones,
        merged_area_m2: merged.as_ref().map(area_m2),
        merged,
    })
}
