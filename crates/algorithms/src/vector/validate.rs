//! Geometry validation for buffer inputs

use geo::{Coord, Intersects, Line, LineString, Polygon};
use mangrove_core::{Error, Feature, FeatureGeometry, GeoPosition, Result};

/// Check a point position: finite and within ±90 / ±180.
pub fn validate_position(p: &GeoPosition) -> Result<()> {
    p.validate()
        .map_err(|e| Error::InvalidGeometry(format!("point ({}, {}): {e}", p.lat, p.lng)))
}

/// Check a polygon: every ring has at least 3 distinct vertices, finite
/// in-range coordinates, non-zero area, and no self-intersections.
pub fn validate_polygon(polygon: &Polygon<f64>) -> Result<()> {
    validate_ring(polygon.exterior(), "exterior ring")?;
    for (i, ring) in polygon.interiors().iter().enumerate() {
        validate_ring(ring, &format!("interior ring {i}"))?;
    }
    Ok(())
}

/// Validate a feature, naming it by `label` in the error.
pub fn validate_feature(feature: &Feature, label: &str) -> Result<()> {
    let result = match &feature.geometry {
        FeatureGeometry::Point(p) => validate_position(p),
        FeatureGeometry::Polygon(poly) => validate_polygon(poly),
    };
    result.map_err(|e| match e {
        Error::InvalidGeometry(msg) => Error::InvalidGeometry(format!("{label}: {msg}")),
        other => other,
    })
}

fn validate_ring(ring: &LineString<f64>, what: &str) -> Result<()> {
    let invalid = |reason: String| Error::InvalidGeometry(format!("{what} {reason}"));

    if let Some(c) = ring.0.iter().find(|c| !in_range(c)) {
        return Err(invalid(format!("has invalid coordinate ({}, {})", c.x, c.y)));
    }

    let vertices = open_ring(ring);
    if vertices.len() < 3 {
        return Err(invalid(format!("has {} distinct vertices, need at least 3", vertices.len())));
    }

    // Shoelace about the first vertex; zero means every vertex lies on one line
    let origin = vertices[0];
    let rel: Vec<Coord<f64>> = vertices.iter().map(|&c| c - origin).collect();
    let twice_area: f64 = (0..rel.len())
        .map(|i| {
            let a = rel[i];
            let b = rel[(i + 1) % rel.len()];
            a.x * b.y - b.x * a.y
        })
        .sum();
    let extent = rel.iter().map(|c| c.x.abs().max(c.y.abs())).fold(0.0_f64, f64::max);
    if twice_area.abs() <= 1e-12 * extent * extent {
        return Err(invalid("is degenerate (zero area)".into()));
    }

    if let Some((i, j)) = self_intersection(&vertices) {
        return Err(invalid(format!("self-intersects between edges {i} and {j}")));
    }
    Ok(())
}

fn in_range(c: &Coord<f64>) -> bool {
    c.x.is_finite() && c.y.is_finite() && c.x.abs() <= 180.0 && c.y.abs() <= 90.0
}

/// Ring vertices without the closing coordinate and without consecutive
/// duplicates.
fn open_ring(ring: &LineString<f64>) -> Vec<Coord<f64>> {
    let mut out: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    for &c in &ring.0 {
        if out.last() != Some(&c) {
            out.push(c);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

/// First pair of non-adjacent edges that touch or cross, if any.
fn self_intersection(vertices: &[Coord<f64>]) -> Option<(usize, usize)> {
    let n = vertices.len();
    let edges: Vec<Line<f64>> = (0..n)
        .map(|i| Line::new(vertices[i], vertices[(i + 1) % n]))
        .collect();

    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                // Adjacent edges share a vertex; they are only invalid if they
                // fold back over each other
                if n > 3 && overlaps_back(&edges[i], &edges[j]) {
                    return Some((i, j));
                }
                continue;
            }
            if edges[i].intersects(&edges[j]) {
                return Some((i, j));
            }
        }
    }
    None
}

/// Adjacent edges that are collinear and point back along each other.
fn overlaps_back(a: &Line<f64>, b: &Line<f64>) -> bool {
    let (da, db) = (a.delta(), b.delta());
    let cross = da.x * db.y - da.y * db.x;
    let dot = da.x * db.x + da.y * db.y;
    let scale = (da.x.hypot(da.y) * db.x.hypot(db.y)).max(f64::MIN_POSITIVE);
    cross.abs() / scale < 1e-12 && dot < 0.0
}
