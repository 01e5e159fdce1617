//! North-up affine transform between grid cells and lng/lat

use serde::{Deserialize, Serialize};

/// Maps cell indices to geographic coordinates for a north-up grid:
/// ```text
/// lng = origin_lng + col * cell_width
/// lat = origin_lat + row * cell_height      (cell_height < 0)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// Longitude of the upper-left corner
    pub origin_lng: f64,
    /// Latitude of the upper-left corner
    pub origin_lat: f64,
    /// Cell size along longitude (degrees)
    pub cell_width: f64,
    /// Cell size along latitude (degrees, negative for north-up)
    pub cell_height: f64,
}

impl GeoTransform {
    pub fn new(origin_lng: f64, origin_lat: f64, cell_width: f64, cell_height: f64) -> Self {
        Self {
            origin_lng,
            origin_lat,
            cell_width,
            cell_height,
        }
    }

    /// Coordinates (lng, lat) of the centre of cell (col, row)
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        let lng = self.origin_lng + (col as f64 + 0.5) * self.cell_width;
        let lat = self.origin_lat + (row as f64 + 0.5) * self.cell_height;
        (lng, lat)
    }

    /// Fractional (col, row) of a geographic coordinate.
    ///
    /// Use `.floor()` to get integer indices. Degenerate transforms yield NaN.
    pub fn geo_to_pixel(&self, lng: f64, lat: f64) -> (f64, f64) {
        if self.cell_width.abs() < 1e-15 || self.cell_height.abs() < 1e-15 {
            return (f64::NAN, f64::NAN);
        }
        (
            (lng - self.origin_lng) / self.cell_width,
            (lat - self.origin_lat) / self.cell_height,
        )
    }

    /// Extent (min_lng, min_lat, max_lng, max_lat) of a `rows` × `cols` grid
    pub fn bounds(&self, rows: usize, cols: usize) -> (f64, f64, f64, f64) {
        let x1 = self.origin_lng + cols as f64 * self.cell_width;
        let y1 = self.origin_lat + rows as f64 * self.cell_height;
        (
            self.origin_lng.min(x1),
            self.origin_lat.min(y1),
            self.origin_lng.max(x1),
            self.origin_lat.max(y1),
        )
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_to_geo_roundtrip() {
        let gt = GeoTransform::new(103.81, 1.36, 0.001, -0.001);

        let (lng, lat) = gt.pixel_to_geo(5, 10);
        let (col, row) = gt.geo_to_pixel(lng, lat);

        assert_relative_eq!(col, 5.5, epsilon = 1e-9);
        assert_relative_eq!(row, 10.5, epsilon = 1e-9);
    }

    #[test]
    fn test_bounds() {
        let gt = GeoTransform::new(0.0, 100.0, 1.0, -1.0);
        let (min_x, min_y, max_x, max_y) = gt.bounds(100, 100);

        assert_relative_eq!(min_x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(min_y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(max_x, 100.0, epsilon = 1e-10);
        assert_relative_eq!(max_y, 100.0, epsilon = 1e-10);
    }

    #[test]
    fn test_degenerate_transform() {
        let gt = GeoTransform::new(0.0, 0.0, 0.0, -1.0);
        let (col, _) = gt.geo_to_pixel(1.0, 1.0);
        assert!(col.is_nan());
    }
}
