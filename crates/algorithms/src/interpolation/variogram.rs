//! Variogram models and empirical variogram diagnostics
//!
//! The semivariance γ(h) measures spatial dissimilarity as a function of
//! separation distance h:
//! ```text
//! γ(h) = (1/2N(h)) Σ [z(xᵢ) - z(xⱼ)]²   for all pairs with |xᵢ-xⱼ| ∈ h±Δh/2
//! ```
//!
//! Model parameters are always supplied by the caller. The empirical
//! variogram is offered as a diagnostic for choosing them, never to fit them
//! automatically.
//!
//! Reference:
//! Matheron, G. (1963). Principles of geostatistics. Economic Geology.
//! Cressie, N. (1993). Statistics for Spatial Data. Wiley.

use mangrove_core::{Error, Result};
use serde::{Deserialize, Serialize};

use super::SamplePoint;

/// Theoretical variogram model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariogramModel {
    /// γ(h) = c₀ + c·[1.5(h/a) - 0.5(h/a)³] for h ≤ a; c₀+c for h > a
    Spherical,
    /// γ(h) = c₀ + c·[1 - exp(-3h/a)]
    Exponential,
    /// γ(h) = c₀ + c·[1 - exp(-3h²/a²)]
    Gaussian,
}

/// Variogram model with explicit nugget, sill and range (metres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Variogram {
    pub model: VariogramModel,
    /// Semivariance as h → 0⁺ (measurement error + micro-scale variation)
    pub nugget: f64,
    /// Semivariance at which the model levels off (c₀ + c)
    pub sill: f64,
    /// Distance at which semivariance reaches ~95% of the sill
    pub range: f64,
}

impl Default for Variogram {
    /// Spherical model, no nugget, unit sill, 500 m range
    fn default() -> Self {
        Self::new(VariogramModel::Spherical, 0.0, 1.0, 500.0)
    }
}

impl Variogram {
    pub fn new(model: VariogramModel, nugget: f64, sill: f64, range: f64) -> Self {
        Self {
            model,
            nugget,
            sill,
            range,
        }
    }

    /// Partial sill c = sill - nugget
    pub fn partial_sill(&self) -> f64 {
        self.sill - self.nugget
    }

    pub fn validate(&self) -> Result<()> {
        if !self.nugget.is_finite() || self.nugget < 0.0 {
            return Err(Error::validation("nugget", format!("{} must be finite and >= 0", self.nugget)));
        }
        if !self.sill.is_finite() || self.sill <= 0.0 || self.sill < self.nugget {
            return Err(Error::validation(
                "sill",
                format!("{} must be positive and >= nugget {}", self.sill, self.nugget),
            ));
        }
        if !self.range.is_finite() || self.range <= 0.0 {
            return Err(Error::validation("range", format!("{} must be positive", self.range)));
        }
        Ok(())
    }

    /// Semivariance at separation `h`. γ(0) = 0 by convention.
    pub fn evaluate(&self, h: f64) -> f64 {
        if h < 1e-15 {
            return 0.0;
        }

        let c0 = self.nugget;
        let c = self.partial_sill();
        let a = self.range;

        match self.model {
            VariogramModel::Spherical => {
                if h >= a {
                    c0 + c
                } else {
                    let hr = h / a;
                    c0 + c * (1.5 * hr - 0.5 * hr * hr * hr)
                }
            }
            VariogramModel::Exponential => c0 + c * (1.0 - (-3.0 * h / a).exp()),
            VariogramModel::Gaussian => c0 + c * (1.0 - (-3.0 * h * h / (a * a)).exp()),
        }
    }
}

/// Empirical variogram: semivariance at discrete lag distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmpiricalVariogram {
    /// Lag bin centres
    pub lags: Vec<f64>,
    /// γ(h) per bin, NaN for bins without pairs
    pub semivariance: Vec<f64>,
    /// Point pairs contributing to each bin
    pub pair_counts: Vec<usize>,
}

/// Bin half the pairwise squared differences by separation distance.
///
/// `max_lag` defaults to half the largest pairwise distance.
pub fn empirical_variogram(
    points: &[SamplePoint],
    n_lags: usize,
    max_lag: Option<f64>,
) -> Result<EmpiricalVariogram> {
    let n = points.len();
    if n < 2 {
        return Err(Error::validation("samples", "need at least 2 points for a variogram"));
    }
    if n_lags == 0 {
        return Err(Error::validation("n_lags", "must be at least 1"));
    }

    let max_lag = match max_lag {
        Some(m) => m,
        None => {
            let mut max_dist = 0.0_f64;
            for i in 0..n {
                for j in (i + 1)..n {
                    max_dist = max_dist.max(points[i].dist(points[j].x, points[j].y));
                }
            }
            max_dist / 2.0
        }
    };
    if !max_lag.is_finite() || max_lag <= 0.0 {
        return Err(Error::validation("max_lag", format!("{max_lag} must be positive")));
    }

    let bin_width = max_lag / n_lags as f64;
    let lags: Vec<f64> = (0..n_lags).map(|k| (k as f64 + 0.5) * bin_width).collect();
    let mut sums = vec![0.0_f64; n_lags];
    let mut pair_counts = vec![0_usize; n_lags];

    for i in 0..n {
        for j in (i + 1)..n {
            let d = points[i].dist(points[j].x, points[j].y);
            if d > max_lag {
                continue;
            }
            let bin = ((d / bin_width) as usize).min(n_lags - 1);
            let dz = points[i].value - points[j].value;
            sums[bin] += dz * dz;
            pair_counts[bin] += 1;
        }
    }

    let semivariance = sums
        .iter()
        .zip(&pair_counts)
        .map(|(s, &c)| if c > 0 { s / (2.0 * c as f64) } else { f64::NAN })
        .collect();

    Ok(EmpiricalVariogram {
        lags,
        semivariance,
        pair_counts,
    })
}
