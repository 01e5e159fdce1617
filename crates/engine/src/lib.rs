//! # Mangrove Engine
//!
//! Cached, versioned spatial analysis over monitoring points.
//!
//! [`AnalysisEngine`] owns the point store, a bounded result cache and a
//! worker pool. Every result is tied to the data version it was computed
//! from; writes to the store bump the version and retire older results.
//!
//! ```no_run
//! use mangrove_engine::{AnalysisEngine, AnalysisRequest, BufferTarget, EngineConfig};
//!
//! let engine = AnalysisEngine::new(EngineConfig::default())?;
//! let result = engine.request_analysis(AnalysisRequest::buffer(BufferTarget::AllPoints, 200.0))?;
//! println!("{} zones at {}", result.buffers().map_or(0, |b| b.zones.len()), result.data_version);
//! # Ok::<(), mangrove_engine::EngineError>(())
//! ```

pub mod cache;
mod compute;
pub mod config;
mod engine;
pub mod error;
pub mod pool;
pub mod request;
pub mod result;

pub use cache::{CacheStats, ResultCache};
pub use config::{AnalysisDefaults, EngineConfig};
pub use engine::{AnalysisEngine, AnalysisHandle};
pub use error::{EngineError, Result};
pub use request::{
    AnalysisKind, AnalysisRequest, BufferRequest, BufferTarget, CacheKey, InterpolationMethod,
    InterpolationRequest, MethodKind,
};
pub use result::{AnalysisOutput, AnalysisResult, BufferSet, BufferZone, Surface, ValueRange};

pub use mangrove_algorithms::interpolation::{IdwParams, KrigingParams, SplineParams, Variogram, VariogramModel};
pub use mangrove_algorithms::vector::Overlay;
