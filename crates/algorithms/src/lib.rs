//! # Mangrove Algorithms
//!
//! Spatial analysis algorithms for mangrove monitoring data.
//!
//! ## Available Algorithm Categories
//!
//! - **interpolation**: IDW, ordinary kriging, thin plate spline, variograms
//! - **vector**: Buffer, overlay (union / intersection), equal-area measurement

pub mod interpolation;
pub(crate) mod maybe_rayon;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::interpolation::{
        empirical_variogram, idw, ordinary_kriging, project_samples, tps_interpolation,
        IdwParams, KrigingOutput, KrigingParams, SamplePoint, SplineParams, Variogram,
        VariogramModel,
    };
    pub use crate::vector::{
        area_m2, buffer_feature, buffer_features, buffer_point, intersection_all, union_all,
        BufferParams, Overlay,
    };
    pub use mangrove_core::prelude::*;
}
