//! Geometric measurements in metric units: area, perimeter
//!
//! Inputs are lng/lat degrees. Areas are taken in a Lambert azimuthal
//! equal-area projection centred on the geometry, so they are in square
//! metres rather than square degrees. Perimeters follow great circles.

use geo::{
    Area as GeoArea, Coord, CoordsIter, HaversineMeasure, Length, MapCoords, MultiPolygon, Polygon,
};
use mangrove_core::{GeoPosition, LocalProjection};

/// Great-circle sphere, the same authalic sphere [`LocalProjection`] uses
pub(crate) const SPHERE: HaversineMeasure = HaversineMeasure::GRS80_EQUAL_AREA;

/// `lng` shifted by whole turns to lie within 180° of `reference`
pub(crate) fn unwrap_lng(lng: f64, reference: f64) -> f64 {
    lng + 360.0 * ((reference - lng) / 360.0).round()
}

/// Centre of the geometry's extent.
///
/// Longitudes are unwrapped around the first vertex, so a geometry straddling
/// the antimeridian is centred on itself rather than on the far side of the
/// globe.
pub(crate) fn geometry_center<G>(geom: &G) -> Option<GeoPosition>
where
    G: CoordsIter<Scalar = f64>,
{
    let mut coords = geom.coords_iter();
    let first = coords.next()?;
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
    for c in coords {
        let x = unwrap_lng(c.x, first.x);
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(c.y);
        max_y = max_y.max(c.y);
    }
    Some(GeoPosition::new((min_y + max_y) / 2.0, (min_x + max_x) / 2.0))
}

/// Area in square metres.
pub fn area_m2(geom: &MultiPolygon<f64>) -> f64 {
    let Some(center) = geometry_center(geom) else {
        return 0.0;
    };
    let proj = LocalProjection::new(center);
    geom.map_coords(|c| {
        let (x, y) = proj.forward(c.x, c.y);
        Coord { x, y }
    })
    .unsigned_area()
}

/// Area of a single polygon in square metres.
pub fn polygon_area_m2(polygon: &Polygon<f64>) -> f64 {
    area_m2(&MultiPolygon::new(vec![polygon.clone()]))
}

/// Great-circle length of every ring, exterior and interior, in metres.
pub fn perimeter_m(geom: &MultiPolygon<f64>) -> f64 {
    geom.0
        .iter()
        .map(|p| {
            SPHERE.length(p.exterior()) + p.interiors().iter().map(|r| SPHERE.length(r)).sum::<f64>()
        })
        .sum()
}
