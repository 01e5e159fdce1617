//! Buffer operations
//!
//! Create buffer zones of a given radius in metres around features. Points
//! become geodesic circles approximated as polygons. Polygons are projected
//! into a local equal-area plane and expanded by the Minkowski sum of the
//! polygon with a disc: the polygon itself, a rectangle along every edge and
//! a disc at every vertex, unioned together.

use std::f64::consts::PI;

use geo::{BooleanOps, Coord, Destination, LineString, MapCoords, MultiPolygon, Point, Polygon};
use mangrove_core::{CancelToken, Error, Feature, FeatureGeometry, GeoPosition, LocalProjection, Result};
use serde::{Deserialize, Serialize};

use super::measurements::{geometry_center, unwrap_lng, SPHERE};
use super::validate::validate_feature;
use crate::maybe_rayon::*;

/// Parameters for buffer operations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferParams {
    /// Buffer radius in metres
    pub radius_m: f64,
    /// Number of vertices used to approximate each circle (default: 64)
    pub vertices: usize,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            radius_m: 200.0,
            vertices: 64,
        }
    }
}

impl BufferParams {
    pub fn new(radius_m: f64) -> Self {
        Self {
            radius_m,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.radius_m.is_finite() || self.radius_m <= 0.0 {
            return Err(Error::validation(
                "radius_m",
                format!("{} must be positive and finite", self.radius_m),
            ));
        }
        if self.vertices < 4 {
            return Err(Error::validation(
                "vertices",
                format!("{} is too few to approximate a circle (minimum 4)", self.vertices),
            ));
        }
        Ok(())
    }
}

/// Unit-circle directions, counter-clockwise from east
fn circle_directions(n: usize) -> impl Iterator<Item = (f64, f64)> {
    (0..n).map(move |i| {
        let angle = 2.0 * PI * i as f64 / n as f64;
        (angle.cos(), angle.sin())
    })
}

/// Create a geodesic circle of `params.radius_m` around `center`.
///
/// Vertices are placed at equal bearings along great circles, so the shape
/// stays circular on the ground at any latitude. Vertex longitudes stay
/// within 180° of the centre, so near the antimeridian the ring may extend
/// past ±180 instead of wrapping.
pub fn buffer_point(center: &GeoPosition, params: &BufferParams) -> Polygon<f64> {
    let n = params.vertices.max(4);
    let origin = Point::new(center.lng, center.lat);
    let mut coords = Vec::with_capacity(n + 1);
    for i in 0..n {
        // Counter-clockwise from east, expressed as a bearing from north
        let bearing = 90.0 - 360.0 * i as f64 / n as f64;
        let p = SPHERE.destination(origin, bearing, params.radius_m);
        coords.push((unwrap_lng(p.x(), center.lng), p.y()));
    }
    // Close the ring
    coords.push(coords[0]);

    Polygon::new(LineString::from(coords), vec![])
}

/// Expand a polygon outwards by `params.radius_m`.
///
/// The input must already be valid (see [`validate_polygon`](super::validate_polygon)).
pub fn buffer_polygon(polygon: &Polygon<f64>, params: &BufferParams) -> Result<MultiPolygon<f64>> {
    let center =
        geometry_center(polygon).ok_or_else(|| Error::InvalidGeometry("polygon has no coordinates".into()))?;
    let proj = LocalProjection::new(center);

    let planar = polygon.map_coords(|c| {
        let (x, y) = proj.forward(c.x, c.y);
        Coord { x, y }
    });

    let r = params.radius_m;
    let disc: Vec<(f64, f64)> = circle_directions(params.vertices.max(4)).map(|(dx, dy)| (dx * r, dy * r)).collect();

    let mut acc = MultiPolygon::new(vec![planar.clone()]);
    let rings = std::iter::once(planar.exterior()).chain(planar.interiors());
    for ring in rings {
        for line in ring.lines() {
            let d = line.delta();
            let len = d.x.hypot(d.y);
            if len == 0.0 {
                continue;
            }
            let (nx, ny) = (-d.y / len * r, d.x / len * r);
            let (a, b) = (line.start, line.end);
            let strip = Polygon::new(
                LineString::from(vec![
                    (a.x + nx, a.y + ny),
                    (a.x - nx, a.y - ny),
                    (b.x - nx, b.y - ny),
                    (b.x + nx, b.y + ny),
                    (a.x + nx, a.y + ny),
                ]),
                vec![],
            );
            acc = acc.union(&strip);

            let mut around: Vec<(f64, f64)> = disc.iter().map(|&(dx, dy)| (a.x + dx, a.y + dy)).collect();
            around.push(around[0]);
            acc = acc.union(&Polygon::new(LineString::from(around), vec![]));
        }
    }

    Ok(acc.map_coords(|c| {
        let (lng, lat) = proj.inverse(c.x, c.y);
        Coord { x: lng, y: lat }
    }))
}

/// Validate `feature` and buffer it.
///
/// `label` names the feature in error messages.
pub fn buffer_feature(feature: &Feature, label: &str, params: &BufferParams) -> Result<MultiPolygon<f64>> {
    validate_feature(feature, label)?;
    match &feature.geometry {
        FeatureGeometry::Point(p) => Ok(MultiPolygon::new(vec![buffer_point(p, params)])),
        FeatureGeometry::Polygon(poly) => buffer_polygon(poly, params),
    }
}

/// Buffer every feature, one result per feature in input order.
///
/// Features are processed in parallel. The first invalid feature (by index)
/// fails the whole call.
pub fn buffer_features(
    features: &[Feature],
    params: &BufferParams,
    cancel: &CancelToken,
) -> Result<Vec<MultiPolygon<f64>>> {
    params.validate()?;
    let zones = (0..features.len())
        .into_par_iter()
        .map(|i| {
            cancel.check()?;
            let feature = &features[i];
            buffer_feature(feature, &feature.label(i), params)
        })
        .collect::<Result<Vec<_>>>()?;
    cancel.check()?;
    Ok(zones)
}
