//! Vector analysis algorithms
//!
//! Buffer zones around monitoring points and polygon features:
//! - Buffer: geodesic circles around points, outward expansion of polygons
//! - Overlay: union and intersection of buffer zones
//! - Measurements: equal-area area and great-circle perimeter
//! - Validation: empty, degenerate and self-intersecting geometries

mod buffer;
mod measurements;
mod overlay;
mod validate;

pub use buffer::{buffer_feature, buffer_features, buffer_point, buffer_polygon, BufferParams};
pub use measurements::{area_m2, perimeter_m, polygon_area_m2};
pub use overlay::{intersection_all, union_all, Overlay};
pub use validate::{validate_feature, validate_polygon, validate_position};
