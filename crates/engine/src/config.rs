//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::request::MethodKind;

/// Accepted range for the default buffer radius, in metres
pub const BUFFER_RADIUS_RANGE: (f64, f64) = (50.0, 1000.0);

/// Maximum number of decimal places used when reporting values
pub const MAX_PRECISION: u32 = 10;

/// Analysis engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Completed results kept in the LRU cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Worker threads for analyses. 0 uses every available core.
    #[serde(default)]
    pub worker_threads: usize,

    /// Vertices per buffer circle when a request does not say
    #[serde(default = "default_buffer_vertices")]
    pub buffer_vertices: usize,

    /// Largest interpolation grid accepted, in cells
    #[serde(default = "default_max_grid_cells")]
    pub max_grid_cells: usize,

    /// Defaults offered to callers that build requests
    #[serde(default)]
    pub defaults: AnalysisDefaults,
}

/// Default analysis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDefaults {
    #[serde(default = "default_interpolation_method")]
    pub interpolation_method: MethodKind,

    /// Buffer radius in metres, within [`BUFFER_RADIUS_RANGE`]
    #[serde(default = "default_buffer_radius")]
    pub buffer_radius_m: f64,

    /// Decimal places for reported values
    #[serde(default = "default_precision")]
    pub precision: u32,
}

// Default value functions
fn default_cache_capacity() -> usize {
    64
}

fn default_buffer_vertices() -> usize {
    64
}

fn default_max_grid_cells() -> usize {
    1_000_000
}

fn default_interpolation_method() -> MethodKind {
    MethodKind::Kriging
}

fn default_buffer_radius() -> f64 {
    200.0
}

fn default_precision() -> u32 {
    2
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            worker_threads: 0,
            buffer_vertices: default_buffer_vertices(),
            max_grid_cells: default_max_grid_cells(),
            defaults: AnalysisDefaults::default(),
        }
    }
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            interpolation_method: default_interpolation_method(),
            buffer_radius_m: default_buffer_radius(),
            precision: default_precision(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(EngineError::Config("cache_capacity must be at least 1".into()));
        }
        if self.buffer_vertices < 4 {
            return Err(EngineError::Config(format!(
                "buffer_vertices {} is below the minimum of 4",
                self.buffer_vertices
            )));
        }
        if self.max_grid_cells == 0 {
            return Err(EngineError::Config("max_grid_cells must be at least 1".into()));
        }
        self.defaults.validate()
    }
}

impl AnalysisDefaults {
    pub fn validate(&self) -> Result<()> {
        let (lo, hi) = BUFFER_RADIUS_RANGE;
        if !(lo..=hi).contains(&self.buffer_radius_m) {
            return Err(EngineError::Config(format!(
                "defaults.buffer_radius_m {} is outside [{lo}, {hi}]",
                self.buffer_radius_m
            )));
        }
        if self.precision > MAX_PRECISION {
            return Err(EngineError::Config(format!(
                "defaults.precision {} exceeds {MAX_PRECISION}",
                self.precision
            )));
        }
        Ok(())
    }

    /// Format `value` with the configured number of decimals.
    pub fn format_value(&self, value: f64) -> String {
        format!("{:.*}", self.precision as usize, value)
    }
}
