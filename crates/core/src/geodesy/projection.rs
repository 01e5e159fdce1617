//! Local Lambert azimuthal equal-area projection.
//!
//! The sphere has the GRS80 authalic radius (`HaversineMeasure::GRS80_EQUAL_AREA`
//! in `geo`), so areas computed in the projected plane match ellipsoidal areas
//! to within a few parts in 10⁴.
//!
//! Reference: Snyder, J.P. (1987). Map Projections: A Working Manual.
//! USGS Professional Paper 1395, §24.

use serde::{Deserialize, Serialize};

use super::GeoPosition;

/// Radius of the sphere with the same surface area as the GRS80 ellipsoid (m).
pub const AUTHALIC_RADIUS: f64 = 6_371_007.181;

/// Lambert azimuthal equal-area projection centred on a fixed point.
///
/// Maps positions to planar metres. Areas are preserved exactly on the
/// sphere and distances from the centre are preserved to within r³/24R²,
/// which is sub-millimetre for monitoring-site extents. The antipode of the
/// centre has no image.
///
/// Longitudes are treated modulo 360°, and [`inverse`](Self::inverse) returns
/// longitudes continuous around the centre (`center.lng ± 180`), so a shape
/// straddling the antimeridian comes back in one piece.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalProjection {
    center: GeoPosition,
    sin_phi0: f64,
    cos_phi0: f64,
}

impl LocalProjection {
    pub fn new(center: GeoPosition) -> Self {
        let phi0 = center.lat.to_radians();
        Self {
            center,
            sin_phi0: phi0.sin(),
            cos_phi0: phi0.cos(),
        }
    }

    pub fn center(&self) -> GeoPosition {
        self.center
    }

    /// Project a (lng, lat) pair to planar (x, y) metres.
    pub fn forward(&self, lng: f64, lat: f64) -> (f64, f64) {
        let phi = lat.to_radians();
        let dlambda = (lng - self.center.lng).to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let cos_dl = dlambda.cos();

        let denom = 1.0 + self.sin_phi0 * sin_phi + self.cos_phi0 * cos_phi * cos_dl;
        let k = (2.0 / denom).sqrt();

        let x = AUTHALIC_RADIUS * k * cos_phi * dlambda.sin();
        let y = AUTHALIC_RADIUS * k * (self.cos_phi0 * sin_phi - self.sin_phi0 * cos_phi * cos_dl);
        (x, y)
    }

    /// Inverse of [`forward`](Self::forward): planar metres to (lng, lat).
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let rho = (x * x + y * y).sqrt();
        if rho < 1e-12 {
            return (self.center.lng, self.center.lat);
        }
        let c = 2.0 * (rho / (2.0 * AUTHALIC_RADIUS)).min(1.0).asin();
        let (sin_c, cos_c) = c.sin_cos();

        let phi = (cos_c * self.sin_phi0 + y * sin_c * self.cos_phi0 / rho)
            .clamp(-1.0, 1.0)
            .asin();
        let lambda = (x * sin_c).atan2(rho * self.cos_phi0 * cos_c - y * self.sin_phi0 * sin_c);

        (self.center.lng + lambda.to_degrees(), phi.to_degrees())
    }

    pub fn forward_position(&self, p: &GeoPosition) -> (f64, f64) {
        self.forward(p.lng, p.lat)
    }
}
