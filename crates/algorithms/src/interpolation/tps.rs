//! Thin Plate Spline (TPS) interpolation
//!
//! Constructs a smooth surface that passes exactly through all sample points
//! while minimizing the bending energy (integral of squared second derivatives).
//!
//! The TPS interpolant has the form:
//! ```text
//! f(x,y) = a₁ + a₂·x + a₃·y + Σᵢ wᵢ · U(‖(x,y) - (xᵢ,yᵢ)‖)
//! ```
//! where U(r) = r²·ln(r) is the TPS radial basis function in 2D.
//!
//! Requires solving an (n+3)×(n+3) linear system, so it is practical
//! for up to a few thousand points.
//!
//! Reference:
//! Duchon, J. (1976). Interpolation des fonctions de deux variables suivant
//! le principe de la flexion des plaques minces. RAIRO Analyse Numérique.
//! Wahba, G. (1990). Spline Models for Observational Data. SIAM.

use mangrove_core::{CancelToken, Error, GridSpec, Raster, Result};
use serde::{Deserialize, Serialize};

use super::solve::gauss_solve;
use super::{check_samples, evaluate_grid, require_non_collinear, SamplePoint};

/// Parameters for TPS interpolation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplineParams {
    /// Smoothing parameter (λ ≥ 0). Default 0.0 = exact interpolation.
    /// Positive values add regularization: larger λ gives a smoother surface
    /// that no longer passes through the samples. Applied in coordinates
    /// normalised to the sample extent.
    pub smoothing: f64,
}

impl Default for SplineParams {
    fn default() -> Self {
        Self { smoothing: 0.0 }
    }
}

impl SplineParams {
    pub fn validate(&self) -> Result<()> {
        if !self.smoothing.is_finite() || self.smoothing < 0.0 {
            return Err(Error::validation(
                "smoothing",
                format!("{} must be finite and >= 0", self.smoothing),
            ));
        }
        Ok(())
    }
}

/// TPS radial basis function: U(r) = r² · ln(r), with U(0) = 0
#[inline]
fn tps_kernel(r: f64) -> f64 {
    if r < 1e-15 {
        0.0
    } else {
        r * r * r.ln()
    }
}

/// Affine map of sample coordinates onto roughly [-1, 1]
#[derive(Debug, Clone, Copy)]
struct Normalize {
    cx: f64,
    cy: f64,
    scale: f64,
}

impl Normalize {
    fn fit(points: &[SamplePoint]) -> Self {
        let n = points.len() as f64;
        let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
        let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
        let scale = points
            .iter()
            .map(|p| p.dist(cx, cy))
            .fold(0.0_f64, f64::max);
        Self {
            cx,
            cy,
            scale: if scale > 0.0 { scale } else { 1.0 },
        }
    }

    #[inline]
    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.cx) / self.scale, (y - self.cy) / self.scale)
    }
}

/// Perform Thin Plate Spline interpolation from scattered points onto `grid`.
///
/// Cells outside the convex hull of the samples are extrapolated; values may
/// be unreliable far from the data.
///
/// # Errors
/// - [`Error::Validation`] for empty input or a negative smoothing parameter
/// - [`Error::SingularMatrix`] if 2+ samples are given but fewer than 3 are
///   non-collinear, or if the spline system cannot be solved
/// - [`Error::Cancelled`] if `cancel` fires
pub fn tps_interpolation(
    points: &[SamplePoint],
    grid: &GridSpec,
    params: &SplineParams,
    cancel: &CancelToken,
) -> Result<Raster> {
    check_samples(points)?;
    params.validate()?;

    if let [only] = points {
        let value = only.value;
        return evaluate_grid(grid, cancel, |_, _| Ok(value));
    }
    require_non_collinear(points, "spline")?;

    let norm = Normalize::fit(points);
    let local: Vec<(f64, f64)> = points.iter().map(|p| norm.apply(p.x, p.y)).collect();

    // Build the (n+3) × (n+3) system:
    // [K + λI  P] [w]   [z]
    // [Pᵀ      0] [a] = [0]
    let n = points.len();
    let m = n + 3;
    let mut mat = vec![0.0_f64; m * m];
    let mut rhs = vec![0.0_f64; m];

    for (i, &(xi, yi)) in local.iter().enumerate() {
        for (j, &(xj, yj)) in local.iter().enumerate() {
            mat[i * m + j] = if i == j {
                params.smoothing
            } else {
                tps_kernel(((xi - xj).powi(2) + (yi - yj).powi(2)).sqrt())
            };
        }

        mat[i * m + n] = 1.0;
        mat[i * m + n + 1] = xi;
        mat[i * m + n + 2] = yi;
        mat[n * m + i] = 1.0;
        mat[(n + 1) * m + i] = xi;
        mat[(n + 2) * m + i] = yi;

        rhs[i] = points[i].value;
    }

    let coeffs = gauss_solve(m, &mut mat, &mut rhs, "spline system")?;
    let weights = &coeffs[..n];
    let (a1, a2, a3) = (coeffs[n], coeffs[n + 1], coeffs[n + 2]);

    evaluate_grid(grid, cancel, |x, y| {
        let (x, y) = norm.apply(x, y);
        let mut val = a1 + a2 * x + a3 * y;
        for (w, &(xi, yi)) in weights.iter().zip(&local) {
            let r = ((x - xi).powi(2) + (y - yi).powi(2)).sqrt();
            val += w * tps_kernel(r);
        }
        Ok(val)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::project_samples;
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
            (GeoPosition::new(1.3545, 103.8155), 31.0), // off the corner plane
        ];
        project_samples(&raw, &grid.projection())
    }

    #[test]
    fn test_tps_exact_at_samples() {
        let g = grid();
        let out = tps_interpolation(&samples(&g), &g, &SplineParams::default(), &CancelToken::new()).unwrap();
        assert_eq!(out.valid_count(), 100);
        assert!((out.get(0, 0).unwrap() - 10.0).abs() < 1e-6);
        assert!((out.get(0, 9).unwrap() - 20.0).abs() < 1e-6);
        assert!((out.get(5, 5).unwrap() - 31.0).abs() < 1e-6);
    }

    #[test]
    fn test_tps_reproduces_plane() {
        // An affine field is reproduced everywhere with zero bending weights
        let raw: Vec<_> = [(1.351, 103.811), (1.359, 103.812), (1.352, 103.818), (1.358, 103.819)]
            .iter()
            .map(|&(lat, lng)| (GeoPosition::new(lat, lng), 0.0))
            .collect();
        let g = grid();
        let mut pts = project_samples(&raw, &g.projection());
        for p in &mut pts {
            p.value = 5.0 + 0.01 * p.x - 0.02 * p.y;
        }
        let out = tps_interpolation(&pts, &g, &SplineParams::default(), &CancelToken::new()).unwrap();

        let (lng, lat) = g.transform().pixel_to_geo(3, 7);
        let (x, y) = g.projection().forward(lng, lat);
        let expected = 5.0 + 0.01 * x - 0.02 * y;
        assert!((out.get(7, 3).unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_tps_smoothing_departs_from_samples() {
        let g = grid();
        let params = SplineParams { smoothing: 10.0 };
        let out = tps_interpolation(&samples(&g), &g, &params, &CancelToken::new()).unwrap();
        assert!((out.get(5, 5).unwrap() - 31.0).abs() > 1e-3);
    }

    #[test]
    fn test_tps_single_point_uniform() {
        let g = grid();
        let pts = project_samples(&[(GeoPosition::new(1.3531, 103.8188), 85.0)], &g.projection());
        let out = tps_interpolation(&pts, &g, &SplineParams::default(), &CancelToken::new()).unwrap();
        assert!(out.data().iter().all(|&v| v == 85.0));
    }

    #[test]
    fn test_tps_collinear_singular() {
        let g = grid();
        let line: Vec<_> = (0..4).map(|i| SamplePoint::new(i as f64 * 10.0, i as f64 * 10.0, 1.0)).collect();
        let result = tps_interpolation(&line, &g, &SplineParams::default(), &CancelToken::new());
        assert!(matches!(result, Err(Error::SingularMatrix(_))));
    }

    #[test]
    fn test_tps_negative_smoothing() {
        let g = grid();
        let result = tps_interpolation(&samples(&g), &g, &SplineParams { smoothing: -1.0 }, &CancelToken::new());
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_tps_cancelled() {
        let g = grid();
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = tps_interpolation(&samples(&g), &g, &SplineParams::default(), &cancel);
        assert_eq!(result.unwrap_err(), Error::Cancelled);
    }
}
