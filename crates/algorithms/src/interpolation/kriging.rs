//! Ordinary Kriging interpolation
//!
//! Best Linear Unbiased Estimator (BLUE) for spatial data. Uses a variogram
//! model to compute interpolation weights that minimize estimation variance
//! while satisfying an unbiasedness constraint.
//!
//! The kriging system for n sample points:
//! ```text
//! [γ(x₁,x₁) ... γ(x₁,xₙ) 1] [w₁]   [γ(x₁,x₀)]
//! [   ...     ...    ...    .]  [. ] = [   ...    ]
//! [γ(xₙ,x₁) ... γ(xₙ,xₙ) 1] [wₙ]   [γ(xₙ,x₀)]
//! [  1       ...    1       0] [μ ]   [    1     ]
//! ```
//! where γ is the semivariance from the variogram, x₀ is the target
//! location, and μ is the Lagrange multiplier ensuring Σwᵢ = 1.
//!
//! Reference:
//! Matheron, G. (1963). Principles of geostatistics. Economic Geology.
//! Cressie, N. (1993). Statistics for Spatial Data. Wiley.

use mangrove_core::{CancelToken, Error, GridSpec, Raster, Result};
use serde::{Deserialize, Serialize};

use super::solve::gauss_solve;
use super::variogram::Variogram;
use super::{check_samples, evaluate_cells, grid_raster, require_non_collinear, SamplePoint};

/// Parameters for Ordinary Kriging interpolation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KrigingParams {
    /// Variogram model (nugget, sill, range). Never fitted automatically.
    pub variogram: Variogram,
    /// Maximum number of nearest samples per estimation (default 16).
    pub max_points: usize,
    /// Maximum search radius in metres. `None` means global search.
    pub max_radius: Option<f64>,
    /// Whether to produce a kriging variance raster alongside the estimate.
    pub compute_variance: bool,
}

impl Default for KrigingParams {
    fn default() -> Self {
        Self {
            variogram: Variogram::default(),
            max_points: 16,
            max_radius: None,
            compute_variance: false,
        }
    }
}

impl KrigingParams {
    pub fn validate(&self) -> Result<()> {
        self.variogram.validate()?;
        if self.max_points == 0 {
            return Err(Error::validation("max_points", "must be at least 1"));
        }
        if let Some(r) = self.max_radius {
            if !r.is_finite() || r <= 0.0 {
                return Err(Error::validation("max_radius", format!("{r} must be positive")));
            }
        }
        Ok(())
    }
}

/// Result of Ordinary Kriging interpolation
#[derive(Debug, Clone)]
pub struct KrigingOutput {
    /// Interpolated values
    pub estimate: Raster,
    /// Kriging variance (estimation uncertainty). `None` if not requested.
    pub variance: Option<Raster>,
}

/// Perform Ordinary Kriging from scattered points onto `grid`.
///
/// A single sample produces a uniform grid of its value. Otherwise at least
/// three non-collinear samples are required.
///
/// # Errors
/// - [`Error::Validation`] for empty input or bad parameters
/// - [`Error::SingularMatrix`] for degenerate sample layouts, or if the
///   kriging system at any cell cannot be solved
/// - [`Error::Cancelled`] if `cancel` fires
pub fn ordinary_kriging(
    points: &[SamplePoint],
    grid: &GridSpec,
    params: &KrigingParams,
    cancel: &CancelToken,
) -> Result<KrigingOutput> {
    check_samples(points)?;
    params.validate()?;
    if points.len() > 1 {
        require_non_collinear(points, "kriging")?;
    }

    let variogram = &params.variogram;
    let max_pts = params.max_points.min(points.len());

    let cells = evaluate_cells(grid, cancel, |x0, y0| {
        // (distance, input index): ties broken by index
        let mut dists: Vec<(f64, usize)> = points
            .iter()
            .enumerate()
            .map(|(i, pt)| (pt.dist(x0, y0), i))
            .filter(|(d, _)| params.max_radius.map_or(true, |r| *d <= r))
            .collect();

        if dists.is_empty() {
            return Ok((f64::NAN, f64::NAN));
        }

        dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        dists.truncate(max_pts);
        // Accumulate in input order
        let mut neighbors = dists;
        neighbors.sort_by_key(|&(_, i)| i);

        if let Some(&(_, idx)) = neighbors.iter().find(|(d, _)| *d < 1e-12) {
            return Ok((points[idx].value, 0.0));
        }

        let k = neighbors.len();
        let m = k + 1;
        let mut mat = vec![0.0_f64; m * m];
        let mut rhs = vec![0.0_f64; m];

        for (i, &(di, pi)) in neighbors.iter().enumerate() {
            let a = &points[pi];
            for (j, &(_, pj)) in neighbors.iter().enumerate() {
                if i != j {
                    let b = &points[pj];
                    mat[i * m + j] = variogram.evaluate(a.dist(b.x, b.y));
                }
            }
            mat[i * m + k] = 1.0;
            mat[k * m + i] = 1.0;
            rhs[i] = variogram.evaluate(di);
        }
        rhs[k] = 1.0;
        let gamma0 = rhs.clone();

        let solution = gauss_solve(m, &mut mat, &mut rhs, "kriging system")?;

        let mut estimate = 0.0;
        let mut variance = solution[k];
        for (i, &(_, pi)) in neighbors.iter().enumerate() {
            estimate += solution[i] * points[pi].value;
            variance += solution[i] * gamma0[i];
        }

        Ok((estimate, variance.max(0.0)))
    })?;

    let (est_data, var_data): (Vec<f64>, Vec<f64>) = cells.into_iter().unzip();
    let estimate = grid_raster(grid, est_data)?;
    let variance = if params.compute_variance {
        Some(grid_raster(grid, var_data)?)
    } else {
        None
    };

    Ok(KrigingOutput { estimate, variance })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::{project_samples, VariogramModel};
    use mangrove_core::{BoundingBox, GeoPosition};

    fn grid() -> GridSpec {
        GridSpec::new(BoundingBox::new(103.810, 1.350, 103.820, 1.360), 0.001)
    }

    fn samples(grid: &GridSpec) -> Vec<SamplePoint> {
        let raw = vec![
            (GeoPosition::new(1.3595, 103.8105), 10.0),
            (GeoPosition::new(1.3595, 103.8195), 20.0),
            (GeoPosition::new(1.3505, 103.8105), 30.0),
            (GeoPosition::new(1.3505, 103.8195), 40.0),
            (GeoPosition::new(1.3545, 103.8155), 25.0),
        ];
        project_samples(&raw, &grid.projection())
    }

    fn params() -> KrigingParams {
        KrigingParams {
            variogram: Variogram::new(VariogramModel::Spherical, 0.0, 100.0, 1500.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_kriging_fills_grid() {
        let g = grid();
        let out = ordinary_kriging(&samples(&g), &g, &params(), &CancelToken::new()).unwrap();
        assert_eq!(out.estimate.shape(), (10, 10));
        assert_eq!(out.estimate.valid_count(), 100);
        assert!(out.variance.is_none());
    }

    #[test]
    fn test_kriging_reproduces_samples() {
        let g = grid();
        let out = ordinary_kriging(&samples(&g), &g, &params(), &CancelToken::new()).unwrap();
        // Exact interpolator with zero nugget
        assert!((out.estimate.get(0, 0).unwrap() - 10.0).abs() < 1e-6);
        assert!((out.estimate.get(9, 9).unwrap() - 40.0).abs() < 1e-6);
        assert!((out.estimate.get(5, 5).unwrap() - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_kriging_estimates_within_sample_range() {
        let g = grid();
        let out = ordinary_kriging(&samples(&g), &g, &params(), &CancelToken::new()).unwrap();
        let (min, max) = out.estimate.value_range().unwrap();
        assert!(min > 5.0 && max < 45.0, "range {min}..{max}");
    }

    #[test]
    fn test_kriging_variance() {
        let g = grid();
        let p = KrigingParams {
            compute_variance: true,
            ..params()
        };
        let out = ordinary_kriging(&samples(&g), &g, &p, &CancelToken::new()).unwrap();
        let var = out.variance.unwrap();
        assert!(var.data().iter().all(|v| *v >= 0.0));
        // Lower uncertainty at a sample than between samples
        assert!(var.get(0, 0).unwrap() < var.get(2, 7).unwrap());
    }

    #[test]
    fn test_kriging_single_point_uniform() {
        let g = grid();
        let pts = project_samples(&[(GeoPosition::new(1.3531, 103.8188), 85.0)], &g.projection());
        let out = ordinary_kriging(&pts, &g, &params(), &CancelToken::new()).unwrap();
        assert!(out.estimate.data().iter().all(|&v| (v - 85.0).abs() < 1e-12));
    }

    #[test]
    fn test_kriging_two_points_singular() {
        let g = grid();
        let pts = samples(&g)[..2].to_vec();
        let result = ordinary_kriging(&pts, &g, &params(), &CancelToken::new());
        assert!(matches!(result, Err(Error::SingularMatrix(_))));
    }

    #[test]
    fn test_kriging_collinear_singular() {
        let g = grid();
        let line: Vec<_> = (0..5).map(|i| SamplePoint::new(i as f64 * 50.0, 0.0, i as f64)).collect();
        let result = ordinary_kriging(&line, &g, &params(), &CancelToken::new());
        assert!(matches!(result, Err(Error::SingularMatrix(_))));
    }

    #[test]
    fn test_kriging_duplicate_samples_singular() {
        let g = grid();
        let mut pts = samples(&g);
        pts.push(pts[0]);
        let result = ordinary_kriging(&pts, &g, &params(), &CancelToken::new());
        assert!(matches!(result, Err(Error::SingularMatrix(_))), "got {result:?}");
    }

    #[test]
    fn test_kriging_radius_leaves_nan() {
        let g = grid();
        let p = KrigingParams {
            max_radius: Some(100.0),
            ..params()
        };
        let out = ordinary_kriging(&samples(&g), &g, &p, &CancelToken::new()).unwrap();
        assert!(out.estimate.get(2, 2).unwrap().is_nan());
    }

    #[test]
    fn test_kriging_invalid_variogram() {
        let g = grid();
        let p = KrigingParams {
            variogram: Variogram::new(VariogramModel::Exponential, 0.0, 1.0, -5.0),
            ..Default::default()
        };
        let result = ordinary_kriging(&samples(&g), &g, &p, &CancelToken::new());
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_kriging_deterministic() {
        let g = grid();
        let pts = samples(&g);
        let a = ordinary_kriging(&pts, &g, &params(), &CancelToken::new()).unwrap();
        let b = ordinary_kriging(&pts, &g, &params(), &CancelToken::new()).unwrap();
        assert_eq!(a.estimate.to_bits(), b.estimate.to_bits());
    }
}
