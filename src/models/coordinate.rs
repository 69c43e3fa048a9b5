//! Coordinate model for WGS84 positions

use serde::{Deserialize, Serialize};

/// A WGS84 position in degrees, serialized GeoJSON-style as `[lon, lat]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Coordinate {
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Latitude in decimal degrees
    pub latitude: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Shift by a planar offset in degrees (`dx` on longitude, `dy` on latitude)
    #[must_use]
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.longitude + dx, self.latitude + dy)
    }

    /// Planar distance in degrees, the metric `ST_DWithin` uses on SRID 4326
    #[must_use]
    pub fn planar_distance(&self, other: &Coordinate) -> f64 {
        (self.longitude - other.longitude).hypot(self.latitude - other.latitude)
    }
}

impl TryFrom<Vec<f64>> for Coordinate {
    type Error = String;

    // Providers may append elevation as a third element
    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        match values.as_slice() {
            [longitude, latitude, ..] => Ok(Self::new(*longitude, *latitude)),
            _ => Err(format!(
                "coordinate needs [longitude, latitude], got {} value(s)",
                values.len()
            )),
        }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coordinate: Coordinate) -> Self {
        [coordinate.longitude, coordinate.latitude]
    }
}
