//! Spatial interpolation of scattered samples onto regular grids
//!
//! - IDW: Inverse Distance Weighting
//! - Ordinary Kriging with a caller-supplied variogram
//! - TPS: Thin Plate Spline
//! - Variogram: model evaluation and empirical variogram diagnostics
//!
//! Samples and grid cells are compared in planar metres: callers project
//! sample positions with the grid's [`LocalProjection`] (see
//! [`project_samples`]) and every evaluator projects cell centres the same way.
//!
//! All evaluators are deterministic. Cells are computed row-parallel, but each
//! cell accumulates over the samples in their input order, so identical input
//! yields bit-identical output regardless of thread count.

mod idw;
mod kriging;
mod solve;
mod tps;
mod variogram;

pub use idw::{idw, IdwParams};
pub use kriging::{ordinary_kriging, KrigingOutput, KrigingParams};
pub use tps::{tps_interpolation, SplineParams};
pub use variogram::{empirical_variogram, EmpiricalVariogram, Variogram, VariogramModel};

use mangrove_core::{CancelToken, Error, GeoPosition, GridSpec, LocalProjection, Raster, Result};

use crate::maybe_rayon::*;

/// A sample with planar coordinates in metres and a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl SamplePoint {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }

    /// Squared Euclidean distance to another location
    #[inline]
    pub fn dist_sq(&self, x: f64, y: f64) -> f64 {
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn dist(&self, x: f64, y: f64) -> f64 {
        self.dist_sq(x, y).sqrt()
    }
}

/// Project `(position, value)` pairs into the plane of `projection`,
/// preserving input order.
pub fn project_samples(samples: &[(GeoPosition, f64)], projection: &LocalProjection) -> Vec<SamplePoint> {
    samples
        .iter()
        .map(|(pos, value)| {
            let (x, y) = projection.forward_position(pos);
            SamplePoint::new(x, y, *value)
        })
        .collect()
}

/// Reject empty input and non-finite coordinates or values.
pub(crate) fn check_samples(points: &[SamplePoint]) -> Result<()> {
    if points.is_empty() {
        return Err(Error::validation("samples", "no sample points provided"));
    }
    if let Some(i) = points
        .iter()
        .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.value.is_finite()))
    {
        return Err(Error::validation(
            "samples",
            format!("sample {i} has a non-finite coordinate or value"),
        ));
    }
    Ok(())
}

/// Require at least three samples that do not all lie on one line.
pub(crate) fn require_non_collinear(points: &[SamplePoint], method: &str) -> Result<()> {
    let singular = || {
        Error::SingularMatrix(format!(
            "{method} requires at least 3 non-collinear samples, got {}",
            points.len()
        ))
    };
    if points.len() < 3 {
        return Err(singular());
    }

    let extent = points
        .iter()
        .map(|p| p.dist(points[0].x, points[0].y))
        .fold(0.0_f64, f64::max);
    if extent == 0.0 {
        return Err(singular());
    }
    let tol = 1e-9 * extent * extent;

    let a = points[0];
    let Some(b) = points.iter().find(|p| p.dist(a.x, a.y) > 1e-9 * extent) else {
        return Err(singular());
    };
    let non_collinear = points.iter().any(|c| {
        let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
        cross.abs() > tol
    });
    if non_collinear {
        Ok(())
    } else {
        Err(singular())
    }
}

/// Evaluate `cell` at the projected centre of every grid cell, returning
/// the values in row-major order.
///
/// Rows run in parallel. Cancellation is checked before each row and once
/// more at the end; a cancelled run never returns a partial grid.
pub(crate) fn evaluate_cells<T, F>(grid: &GridSpec, cancel: &CancelToken, cell: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(f64, f64) -> Result<T> + Sync + Send,
{
    let cols = grid.cols();
    let transform = grid.transform();
    let projection = grid.projection();

    let row_data: Vec<Vec<T>> = (0..grid.rows())
        .into_par_iter()
        .map(|row| {
            cancel.check()?;
            let mut values = Vec::with_capacity(cols);
            for col in 0..cols {
                let (lng, lat) = transform.pixel_to_geo(col, row);
                let (x, y) = projection.forward(lng, lat);
                values.push(cell(x, y)?);
            }
            Ok(values)
        })
        .collect::<Result<Vec<_>>>()?;
    cancel.check()?;

    Ok(row_data.into_iter().flatten().collect())
}

/// Wrap row-major cell values as a raster georeferenced to `grid`.
pub(crate) fn grid_raster(grid: &GridSpec, values: Vec<f64>) -> Result<Raster> {
    let mut output = Raster::from_vec(values, grid.rows(), grid.cols())?;
    output.set_transform(grid.transform());
    Ok(output)
}

/// [`evaluate_cells`] for scalar surfaces.
pub(crate) fn evaluate_grid<F>(grid: &GridSpec, cancel: &CancelToken, cell: F) -> Result<Raster>
where
    F: Fn(f64, f64) -> Result<f64> + Sync + Send,
{
    let values = evaluate_cells(grid, cancel, cell)?;
    grid_raster(grid, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mangrove_core::BoundingBox;

    #[test]
    fn test_collinear_rejected() {
        let line: Vec<_> = (0..5).map(|i| SamplePoint::new(i as f64, 2.0 * i as f64, 1.0)).collect();
        assert!(matches!(
            require_non_collinear(&line, "kriging"),
            Err(Error::SingularMatrix(_))
        ));

        let mut tri = line.clone();
        tri.push(SamplePoint::new(0.0, 5.0, 1.0));
        assert!(require_non_collinear(&tri, "kriging").is_ok());
    }

    #[test]
    fn test_duplicates_only_rejected() {
        let same = vec![SamplePoint::new(1.0, 1.0, 1.0); 4];
        assert!(require_non_collinear(&same, "spline").is_err());
        assert!(require_non_collinear(&same[..2], "spline").is_err());
    }

    #[test]
    fn test_check_samples() {
        assert!(matches!(check_samples(&[]), Err(Error::Validation { .. })));
        assert!(check_samples(&[SamplePoint::new(0.0, f64::NAN, 1.0)]).is_err());
        assert!(check_samples(&[SamplePoint::new(0.0, 0.0, 1.0)]).is_ok());
    }

    #[test]
    fn test_evaluate_grid_cancelled() {
        let grid = GridSpec::new(BoundingBox::new(0.0, 0.0, 0.01, 0.01), 0.001);
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = evaluate_grid(&grid, &cancel, |_, _| Ok(1.0));
        assert_eq!(result.unwrap_err(), Error::Cancelled);
    }

    #[test]
    fn test_project_samples_preserves_order() {
        let proj = LocalProjection::new(GeoPosition::new(1.354, 103.818));
        let samples = vec![
            (GeoPosition::new(1.3531, 103.8188), 85.0),
            (GeoPosition::new(1.3541, 103.8178), 72.0),
        ];
        let projected = project_samples(&samples, &proj);
        assert_eq!(projected[0].value, 85.0);
        assert_eq!(projected[1].value, 72.0);
        assert!(projected[0].x > projected[1].x);
    }
}
