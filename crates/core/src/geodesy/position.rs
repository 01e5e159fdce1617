//! Geographic positions and extents in WGS84 degrees

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A position on the Earth in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPosition {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check that latitude is within ±90 and longitude within ±180.
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::validation(
                "lat",
                format!("{} is outside [-90, 90]", self.lat),
            ));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(Error::validation(
                "lng",
                format!("{} is outside [-180, 180]", self.lng),
            ));
        }
        Ok(())
    }
}

/// Axis-aligned longitude/latitude extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    /// Smallest box containing every position. `None` for an empty input.
    pub fn enclosing<'a>(positions: impl IntoIterator<Item = &'a GeoPosition>) -> Option<Self> {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(first.lng, first.lat, first.lng, first.lat);
        for p in iter {
            bbox.min_lng = bbox.min_lng.min(p.lng);
            bbox.min_lat = bbox.min_lat.min(p.lat);
            bbox.max_lng = bbox.max_lng.max(p.lng);
            bbox.max_lat = bbox.max_lat.max(p.lat);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn center(&self) -> GeoPosition {
        GeoPosition::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    pub fn contains(&self, p: &GeoPosition) -> bool {
        p.lng >= self.min_lng && p.lng <= self.max_lng && p.lat >= self.min_lat && p.lat <= self.max_lat
    }

    /// Grow the box by `margin` degrees on every side, clamped to the globe.
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min_lng: (self.min_lng - margin).max(-180.0),
            min_lat: (self.min_lat - margin).max(-90.0),
            max_lng: (self.max_lng + margin).min(180.0),
            max_lat: (self.max_lat + margin).min(90.0),
        }
    }

    pub fn validate(&self) -> Result<()> {
        GeoPosition::new(self.min_lat, self.min_lng).validate()?;
        GeoPosition::new(self.max_lat, self.max_lng).validate()?;
        if self.min_lng > self.max_lng || self.min_lat > self.max_lat {
            return Err(Error::validation("bbox", "min corner exceeds max corner"));
        }
        Ok(())
    }
}
