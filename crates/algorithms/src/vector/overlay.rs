//! Overlay of buffer zones: union and intersection
//!
//! Zones are folded in input order, so the same zones always produce the
//! same merged geometry.

use geo::{BooleanOps, Coord, CoordsIter, MapCoords, MultiPolygon};
use serde::{Deserialize, Serialize};

use super::measurements::unwrap_lng;

/// How buffer zones are combined into a single geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overlay {
    /// Zones are reported individually only
    #[default]
    None,
    /// Region covered by at least one zone
    Union,
    /// Region covered by every zone
    Intersection,
}

impl Overlay {
    /// Combine `zones`. `None` for [`Overlay::None`].
    pub fn apply(self, zones: &[MultiPolygon<f64>]) -> Option<MultiPolygon<f64>> {
        match self {
            Overlay::None => None,
            Overlay::Union => Some(union_all(zones)),
            Overlay::Intersection => Some(intersection_all(zones)),
        }
    }
}

/// Shift each zone by whole turns of longitude so its first vertex lies
/// within 180° of the first zone's. Zones either side of the antimeridian
/// then overlap in degree space where they overlap on the ground.
fn aligned(zones: &[MultiPolygon<f64>]) -> Vec<MultiPolygon<f64>> {
    let Some(reference) = zones.iter().find_map(|z| z.coords_iter().next()) else {
        return zones.to_vec();
    };
    zones
        .iter()
        .map(|z| match z.coords_iter().next() {
            Some(anchor) if unwrap_lng(anchor.x, reference.x) != anchor.x => {
                let shift = unwrap_lng(anchor.x, reference.x) - anchor.x;
                z.map_coords(|c| Coord { x: c.x + shift, y: c.y })
            }
            _ => z.clone(),
        })
        .collect()
}

/// Union of all zones. Overlapping zones merge into one polygon.
pub fn union_all(zones: &[MultiPolygon<f64>]) -> MultiPolygon<f64> {
    let zones = aligned(zones);
    let mut iter = zones.iter();
    let Some(first) = iter.next() else {
        return MultiPolygon::new(vec![]);
    };
    iter.fold(first.clone(), |acc, z| acc.union(z))
}

/// Region common to all zones. Empty if any two are disjoint, or if there
/// are no zones.
pub fn intersection_all(zones: &[MultiPolygon<f64>]) -> MultiPolygon<f64> {
    let zones = aligned(zones);
    let mut iter = zones.iter();
    let Some(first) = iter.next() else {
        return MultiPolygon::new(vec![]);
    };
    let mut acc = first.clone();
    for z in iter {
        if acc.0.is_empty() {
            break;
        }
        acc = acc.intersection(z);
    }
    acc
}
