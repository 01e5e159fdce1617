//! Geographic positions, extents and local projections

mod position;
mod projection;

pub use position::{BoundingBox, GeoPosition};
pub use projection::{LocalProjection, AUTHALIC_RADIUS};
