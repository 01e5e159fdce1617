//! Output grid specification for interpolation

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geodesy::{BoundingBox, GeoPosition, LocalProjection};
use crate::raster::GeoTransform;

/// Tolerance applied before rounding cell counts up, so an extent that is an
/// exact multiple of the cell size does not gain a spurious extra cell.
const CELL_COUNT_EPS: f64 = 1e-9;

/// A regular lng/lat grid: bounding box plus square cell size in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub bbox: BoundingBox,
    /// Cell edge length in degrees
    pub cell_size: f64,
}

impl GridSpec {
    pub fn new(bbox: BoundingBox, cell_size: f64) -> Self {
        Self { bbox, cell_size }
    }

    /// A single-cell grid whose centre is `center`.
    pub fn centered_on(center: GeoPosition, cell_size: f64) -> Self {
        let h = cell_size / 2.0;
        Self::new(
            BoundingBox::new(center.lng - h, center.lat - h, center.lng + h, center.lat + h),
            cell_size,
        )
    }

    /// Grid covering all `positions`, padded by `margin` degrees.
    ///
    /// Returns `None` for an empty input.
    pub fn covering<'a>(
        positions: impl IntoIterator<Item = &'a GeoPosition>,
        cell_size: f64,
        margin: f64,
    ) -> Option<Self> {
        BoundingBox::enclosing(positions).map(|bb| Self::new(bb.expanded(margin), cell_size))
    }

    pub fn rows(&self) -> usize {
        cell_count(self.bbox.height(), self.cell_size)
    }

    pub fn cols(&self) -> usize {
        cell_count(self.bbox.width(), self.cell_size)
    }

    pub fn cell_total(&self) -> usize {
        self.rows().saturating_mul(self.cols())
    }

    /// North-up transform anchored at the upper-left corner of the box
    pub fn transform(&self) -> GeoTransform {
        GeoTransform::new(self.bbox.min_lng, self.bbox.max_lat, self.cell_size, -self.cell_size)
    }

    /// Equal-area projection centred on the grid, used for metric distances
    pub fn projection(&self) -> LocalProjection {
        LocalProjection::new(self.bbox.center())
    }

    /// Check the extent and cell size, and that the grid stays within
    /// `max_cells` cells.
    pub fn validate(&self, max_cells: usize) -> Result<()> {
        self.bbox.validate()?;
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(Error::validation(
                "cell_size",
                format!("{} must be positive and finite", self.cell_size),
            ));
        }
        let total = self.cell_total();
        if total > max_cells {
            return Err(Error::validation(
                "grid",
                format!(
                    "{}x{} = {} cells exceeds the limit of {}",
                    self.rows(),
                    self.cols(),
                    total,
                    max_cells
                ),
            ));
        }
        Ok(())
    }
}

fn cell_count(extent: f64, cell_size: f64) -> usize {
    if cell_size.is_nan() || cell_size <= 0.0 || !extent.is_finite() {
        return 1;
    }
    ((extent / cell_size) - CELL_COUNT_EPS).ceil().max(1.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_exact_multiple() {
        let spec = GridSpec::new(BoundingBox::new(103.0, 1.0, 103.01, 1.02), 0.001);
        assert_eq!(spec.cols(), 10);
        assert_eq!(spec.rows(), 20);
        assert_eq!(spec.cell_total(), 200);
    }

    #[test]
    fn test_dimensions_round_up() {
        let spec = GridSpec::new(BoundingBox::new(0.0, 0.0, 1.05, 0.5), 0.5);
        assert_eq!(spec.cols(), 3);
        assert_eq!(spec.rows(), 1);
    }

    #[test]
    fn test_centered_single_cell() {
        let p = GeoPosition::new(1.3531, 103.8188);
        let spec = GridSpec::centered_on(p, 0.001);
        assert_eq!((spec.rows(), spec.cols()), (1, 1));
        let (lng, lat) = spec.transform().pixel_to_geo(0, 0);
        assert!((lng - p.lng).abs() < 1e-12);
        assert!((lat - p.lat).abs() < 1e-12);
    }

    #[test]
    fn test_validate_limits() {
        let spec = GridSpec::new(BoundingBox::new(0.0, 0.0, 1.0, 1.0), 0.01);
        assert!(spec.validate(10_000).is_ok());
        assert!(spec.validate(9_999).is_err());

        let bad = GridSpec::new(BoundingBox::new(0.0, 0.0, 1.0, 1.0), 0.0);
        assert!(bad.validate(usize::MAX).is_err());
    }

    #[test]
    fn test_covering_padded() {
        let pts = [GeoPosition::new(1.0, 2.0), GeoPosition::new(1.5, 2.5)];
        let spec = GridSpec::covering(&pts, 0.1, 0.05).unwrap();
        assert!((spec.bbox.min_lng - 1.95).abs() < 1e-12);
        assert!((spec.bbox.max_lat - 1.55).abs() < 1e-12);
    }
}
