//! Raster grids and their georeferencing

mod geotransform;
mod grid;
mod spec;

pub use geotransform::GeoTransform;
pub use grid::Raster;
pub use spec::GridSpec;
