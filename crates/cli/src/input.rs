//! Reading points files and parsing argument values

use anyhow::{bail, Context, Result};
use mangrove_core::{BoundingBox, MonitoringPoint, PointId};
use std::path::Path;

/// Read a JSON array of monitoring points.
pub fn read_points(path: &Path) -> Result<Vec<MonitoringPoint>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read points file {}", path.display()))?;
    parse_points(&content).with_context(|| format!("Failed to parse points file {}", path.display()))
}

pub fn parse_points(json: &str) -> Result<Vec<MonitoringPoint>> {
    let points: Vec<MonitoringPoint> = serde_json::from_str(json)?;
    if points.is_empty() {
        bail!("no points in input");
    }
    Ok(points)
}

/// Parse `min_lng,min_lat,max_lng,max_lat`.
pub fn parse_bbox(s: &str) -> Result<BoundingBox> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().with_context(|| format!("Invalid coordinate '{}'", p.trim())))
        .collect::<Result<_>>()?;
    match parts.as_slice() {
        &[min_lng, min_lat, max_lng, max_lat] => Ok(BoundingBox::new(min_lng, min_lat, max_lng, max_lat)),
        _ => bail!("Bounding box must be 'min_lng,min_lat,max_lng,max_lat', got: {s}"),
    }
}

/// Parse a comma-separated list of point ids.
pub fn parse_ids(s: &str) -> Result<Vec<PointId>> {
    let ids: Vec<PointId> = s
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(PointId::from)
        .collect();
    if ids.is_empty() {
        bail!("No point ids in '{s}'");
    }
    Ok(ids)
}
