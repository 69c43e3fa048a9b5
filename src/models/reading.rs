//! Monitoring sites and the pollution readings they report

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Coordinate;

/// A fixed monitoring site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Site {
    /// Unique site code, e.g. `"PER_AIRMON_MONITOR1135100"`
    pub system_code_number: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Site {
    /// Point geometry used for proximity queries
    #[must_use]
    pub fn location(&self) -> Coordinate {
        Coordinate::new(self.longitude, self.latitude)
    }
}

/// A timestamped sample from one site
///
/// Every pollutant is optional: sensors drop channels independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PollutionReading {
    /// Owning site
    pub system_code_number: String,
    /// Carbon monoxide in ppm
    pub co: Option<f64>,
    /// Nitric oxide in ppb
    pub no: Option<f64>,
    /// Nitrogen dioxide in ppb
    pub no2: Option<f64>,
    /// Temperature in Celsius
    pub temperature: Option<f64>,
    /// Relative humidity in percent
    pub rh: Option<f64>,
    /// Noise level in dB
    pub noise: Option<f64>,
    /// Battery level
    pub battery: Option<f64>,
    /// When the site reported this sample
    pub last_updated: NaiveDateTime,
}

impl PollutionReading {
    /// A reading with no channels set, for building fixtures
    #[must_use]
    pub fn empty(system_code_number: impl Into<String>, last_updated: NaiveDateTime) -> Self {
        Self {
            system_code_number: system_code_number.into(),
            co: None,
            no: None,
            no2: None,
            temperature: None,
            rh: None,
            noise: None,
            battery: None,
            last_updated,
        }
    }
}

/// Latest reading for one site, as served by the heatmap endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteReadingSummary {
    pub system_code_number: String,
    pub latitude: f64,
    pub longitude: f64,
    pub readings: ReadingSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingSnapshot {
    pub co: Option<f64>,
    pub no: Option<f64>,
    pub no2: Option<f64>,
    pub noise: Option<f64>,
    pub last_updated: NaiveDateTime,
}

impl SiteReadingSummary {
    #[must_use]
    pub fn new(site: &Site, reading: &PollutionReading) -> Self {
        Self {
            system_code_number: site.system_code_number.clone(),
            latitude: site.latitude,
            longitude: site.longitude,
            readings: ReadingSnapshot {
                co: reading.co,
                no: reading.no,
                no2: reading.no2,
                noise: reading.noise,
                last_updated: reading.last_updated,
            },
        }
    }
}
