//! Inverse Distance Weighting (IDW) interpolation
//!
//! Estimates values at unknown locations as a weighted average of the
//! samples, with weights inversely proportional to distance raised to a
//! power parameter.
//!
//! Reference:
//! Shepard, D. (1968). A two-dimensional interpolation function for
//! irregularly-spaced data. ACM National Conference.

use mangrove_core::{CancelToken, Error, GridSpec, Raster, Result};
use serde::{Deserialize, Serialize};

use super::{check_samples, evaluate_grid, SamplePoint};

/// Parameters for IDW interpolation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdwParams {
    /// Power parameter (default: 2.0).
    /// Higher values give more weight to nearby samples.
    pub power: f64,
    /// Maximum search radius in metres. `None` uses every sample.
    /// Cells with no sample inside the radius are NaN.
    pub max_radius: Option<f64>,
    /// Maximum number of nearest samples to use. `None` uses all.
    pub max_points: Option<usize>,
    /// A sample closer than this (metres) to a cell centre supplies the
    /// cell's value directly, avoiding the singularity at distance 0.
    pub snap_distance: f64,
}

impl Default for IdwParams {
    fn default() -> Self {
        Self {
            power: 2.0,
            max_radius: None,
            max_points: None,
            snap_distance: 1e-10,
        }
    }
}

impl IdwParams {
    pub fn validate(&self) -> Result<()> {
        if !self.power.is_finite() || self.power <= 0.0 {
            return Err(Error::validation("power", format!("{} must be positive", self.power)));
        }
        if let Some(r) = self.max_radius {
            if !r.is_finite() || r <= 0.0 {
                return Err(Error::validation("max_radius", format!("{r} must be positive")));
            }
        }
        if self.max_points == Some(0) {
            return Err(Error::validation("max_points", "must be at least 1"));
        }
        if !self.snap_distance.is_finite() || self.snap_distance < 0.0 {
            return Err(Error::validation("snap_distance", "must be finite and >= 0"));
        }
        Ok(())
    }
}

/// Interpolate `points` onto `grid` by inverse distance weighting.
///
/// ```text
/// z(x,y) = Σ(wᵢ · zᵢ) / Σ(wᵢ),   wᵢ = 1 / d(x,y, xᵢ,yᵢ)^p
/// ```
///
/// Weights are scaled by the nearest candidate's, `wᵢ = (d_min / dᵢ)^p`,
/// which leaves the average unchanged but keeps every weight in (0, 1] with
/// the nearest at 1, so large powers cannot underflow or overflow.
///
/// A cell within `snap_distance` of a sample takes that sample's value (the
/// first such sample in input order). A cell influenced by a single sample
/// takes its value exactly.
pub fn idw(
    points: &[SamplePoint],
    grid: &GridSpec,
    params: &IdwParams,
    cancel: &CancelToken,
) -> Result<Raster> {
    check_samples(points)?;
    params.validate()?;

    let snap_sq = params.snap_distance * params.snap_distance;
    let max_radius_sq = params.max_radius.map(|r| r * r);

    evaluate_grid(grid, cancel, |cx, cy| {
        let mut candidates: Vec<(f64, f64)> = Vec::with_capacity(points.len());

        for pt in points {
            let dsq = pt.dist_sq(cx, cy);
            if dsq <= snap_sq {
                return Ok(pt.value);
            }
            if max_radius_sq.is_some_and(|max_sq| dsq > max_sq) {
                continue;
            }
            candidates.push((dsq, pt.value));
        }

        if let Some(k) = params.max_points {
            if candidates.len() > k {
                // Stable: ties keep input order
                candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
                candidates.truncate(k);
            }
        }

        match candidates.as_slice() {
            [] => Ok(f64::NAN),
            [(_, only)] => Ok(*only),
            _ => {
                let d_min = candidates.iter().map(|c| c.0).fold(f64::INFINITY, f64::min).sqrt();
                let mut sum_w = 0.0;
                let mut sum_wz = 0.0;
                for &(dsq, val) in &candidates {
                    let w = (d_min / dsq.sqrt()).powf(params.power);
                    sum_w += w;
                    sum_wz += w * val;
                }
                Ok(sum_wz / sum_w)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::project_samples;
    use mangrove_core::{BoundingBox, GeoPosition};

    /// 10x10 grid of 0.001° cells around Singapore's mangrove sites
    fn grid() -> GridSpec {
        GridSpec::new(BoundingBox::new(103.810, 1.350, 103.820, 1.360), 0.001)
    }

    fn corner_samples(grid: &GridSpec) -> Vec<SamplePoint> {
        let raw = vec![
            (GeoPosition::new(1.3595, 103.8105), 10.0), // top-left cell centre
            (GeoPosition::new(1.3595, 103.8195), 20.0), // top-right
            (GeoPosition::new(1.3505, 103.8105), 30.0), // bottom-left
            (GeoPosition::new(1.3505, 103.8195), 40.0), // bottom-right
        ];
        project_samples(&raw, &grid.projection())
    }

    #[test]
    fn test_idw_basic() {
        let g = grid();
        let result = idw(&corner_samples(&g), &g, &IdwParams::default(), &CancelToken::new()).unwrap();
        assert_eq!(result.shape(), (10, 10));
        assert_eq!(result.valid_count(), 100, "global IDW should fill every cell");
    }

    #[test]
    fn test_idw_at_sample_points() {
        let g = grid();
        let result = idw(&corner_samples(&g), &g, &IdwParams { snap_distance: 1e-3, ..Default::default() }, &CancelToken::new()).unwrap();

        // Cell centres coincide with samples (to projection precision)
        assert!((result.get(0, 0).unwrap() - 10.0).abs() < 1e-9);
        assert!((result.get(9, 9).unwrap() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_idw_center_is_average() {
        let g = grid();
        let result = idw(&corner_samples(&g), &g, &IdwParams::default(), &CancelToken::new()).unwrap();
        let center = result.get(5, 5).unwrap();
        assert!((center - 25.0).abs() < 5.0, "center should be ~25.0, got {center}");
    }

    #[test]
    fn test_idw_with_radius() {
        let g = grid();
        let params = IdwParams {
            max_radius: Some(200.0),
            ..Default::default()
        };
        let result = idw(&corner_samples(&g), &g, &params, &CancelToken::new()).unwrap();
        assert!(result.get(5, 5).unwrap().is_nan(), "no sample within 200 m of the centre");
        assert!(!result.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn test_idw_with_max_points() {
        let g = grid();
        let params = IdwParams {
            max_points: Some(1),
            ..Default::default()
        };
        let result = idw(&corner_samples(&g), &g, &params, &CancelToken::new()).unwrap();
        // Nearest-sample behaviour
        assert_eq!(result.get(1, 1).unwrap(), 10.0);
        assert_eq!(result.get(8, 8).unwrap(), 40.0);
    }

    #[test]
    fn test_idw_power_effect() {
        let g = grid();
        let pts = corner_samples(&g);
        let low = idw(&pts, &g, &IdwParams { power: 1.0, ..Default::default() }, &CancelToken::new()).unwrap();
        let high = idw(&pts, &g, &IdwParams { power: 4.0, ..Default::default() }, &CancelToken::new()).unwrap();

        let near_low = low.get(1, 1).unwrap();
        let near_high = high.get(1, 1).unwrap();
        assert!(
            (near_high - 10.0).abs() < (near_low - 10.0).abs(),
            "higher power should weight nearby samples more: low={near_low}, high={near_high}"
        );
    }

    #[test]
    fn test_idw_large_power_stays_finite() {
        // Two samples ~12 km apart; 1/d^100 underflows at these distances
        let g = GridSpec::new(BoundingBox::new(103.70, 1.30, 103.80, 1.40), 0.01);
        let raw = [(GeoPosition::new(1.32, 103.72), 10.0), (GeoPosition::new(1.38, 103.78), 30.0)];
        let pts = project_samples(&raw, &g.projection());
        let params = IdwParams { power: 100.0, ..Default::default() };
        let result = idw(&pts, &g, &params, &CancelToken::new()).unwrap();

        assert_eq!(result.valid_count(), 100);
        assert!(result.data().iter().all(|v| (10.0..=30.0).contains(v)));
        // Power 100 is effectively nearest-sample
        assert!((result.get(9, 0).unwrap() - 10.0).abs() < 1e-9);
        assert!((result.get(0, 9).unwrap() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_idw_tiny_distances_stay_finite() {
        // Samples a few millimetres from the cell centre; 1/d^150 overflows
        let p = GeoPosition::new(1.3531, 103.8188);
        let g = GridSpec::centered_on(p, 0.0001);
        let near = [(GeoPosition::new(p.lat + 2e-8, p.lng), 1.0), (GeoPosition::new(p.lat - 4e-8, p.lng), 4.0)];
        let pts = project_samples(&near, &g.projection());
        let params = IdwParams { power: 150.0, ..Default::default() };
        let v = idw(&pts, &g, &params, &CancelToken::new()).unwrap().get(0, 0).unwrap();
        assert!((v - 1.0).abs() < 1e-9, "{v}");
    }

    #[test]
    fn test_idw_empty_points() {
        let result = idw(&[], &grid(), &IdwParams::default(), &CancelToken::new());
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_idw_invalid_power() {
        let g = grid();
        let params = IdwParams { power: 0.0, ..Default::default() };
        assert!(idw(&corner_samples(&g), &g, &params, &CancelToken::new()).is_err());
    }

    #[test]
    fn test_idw_single_point_uniform() {
        let g = grid();
        let pts = project_samples(&[(GeoPosition::new(1.3531, 103.8188), 42.0)], &g.projection());
        let result = idw(&pts, &g, &IdwParams::default(), &CancelToken::new()).unwrap();
        assert!(result.data().iter().all(|&v| v == 42.0));
    }

    #[test]
    fn test_idw_single_cell_on_sample_is_exact() {
        let p = GeoPosition::new(1.3531, 103.8188);
        let g = GridSpec::centered_on(p, 0.0001);
        let pts = project_samples(&[(p, 85.0)], &g.projection());
        let result = idw(&pts, &g, &IdwParams::default(), &CancelToken::new()).unwrap();
        assert_eq!(result.shape(), (1, 1));
        assert_eq!(result.get(0, 0).unwrap(), 85.0);
    }

    #[test]
    fn test_idw_deterministic() {
        let g = grid();
        let pts = corner_samples(&g);
        let a = idw(&pts, &g, &IdwParams::default(), &CancelToken::new()).unwrap();
        let b = idw(&pts, &g, &IdwParams::default(), &CancelToken::new()).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
