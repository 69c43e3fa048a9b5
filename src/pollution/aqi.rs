//! AQI normalization
//!
//! Maps raw pollutant concentrations onto a shared 0-10 severity scale using
//! per-pollutant calibration ranges, and combines them into a composite index
//! driven by the single worst pollutant.

use std::str::FromStr;

use crate::models::PollutionReading;

/// Linear calibration window for one pollutant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationRange {
    pub low: f64,
    pub high: f64,
}

/// Carbon monoxide, ppm
pub const CO_RANGE: CalibrationRange = CalibrationRange { low: 0.1, high: 5.0 };
/// Nitric oxide, ppb
pub const NO_RANGE: CalibrationRange = CalibrationRange { low: 1.0, high: 150.0 };
/// Nitrogen dioxide, ppb
pub const NO2_RANGE: CalibrationRange = CalibrationRange { low: 5.0, high: 300.0 };
/// Noise, dB
pub const NOISE_RANGE: CalibrationRange = CalibrationRange { low: 30.0, high: 100.0 };

/// Top of the normalized scale
pub const MAX_SCORE: f64 = 10.0;

impl CalibrationRange {
    /// Clamp into the window and map linearly onto 0-10, rounded to 2 decimals.
    ///
    /// An absent value scores 0.0, the same as a clean one.
    #[must_use]
    pub fn normalize(&self, value: Option<f64>) -> f64 {
        let Some(value) = value else {
            return 0.0;
        };
        let clamped = value.clamp(self.low, self.high);
        round2((clamped - self.low) / (self.high - self.low) * MAX_SCORE)
    }
}

/// Round to two decimal places, ties to even on the exact binary value.
///
/// Float formatting is correctly rounded, so a value stored as exactly
/// `0.125` becomes `0.12` while the literal `3.235` (stored just below)
/// becomes `3.23`.
#[must_use]
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.2}").parse().unwrap_or(value)
}

#[must_use]
pub fn normalize_co(value: Option<f64>) -> f64 {
    CO_RANGE.normalize(value)
}

#[must_use]
pub fn normalize_no(value: Option<f64>) -> f64 {
    NO_RANGE.normalize(value)
}

#[must_use]
pub fn normalize_no2(value: Option<f64>) -> f64 {
    NO2_RANGE.normalize(value)
}

#[must_use]
pub fn normalize_noise(value: Option<f64>) -> f64 {
    NOISE_RANGE.normalize(value)
}

/// Composite index: the worst of the normalized CO, NO and NO2 scores.
///
/// Noise does not contribute.
#[must_use]
pub fn compute_custom_aqi(reading: &PollutionReading) -> f64 {
    normalize_co(reading.co)
        .max(normalize_no(reading.no))
        .max(normalize_no2(reading.no2))
}

/// Pollutant selector accepted by the routing endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pollutant {
    Co,
    No,
    No2,
    Noise,
    /// The composite index
    Aqi,
}

impl FromStr for Pollutant {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "co" => Ok(Pollutant::Co),
            "no" => Ok(Pollutant::No),
            "no2" => Ok(Pollutant::No2),
            "noise" => Ok(Pollutant::Noise),
            "aqi" => Ok(Pollutant::Aqi),
            other => Err(format!("unsupported pollutant '{other}'")),
        }
    }
}

impl Pollutant {
    /// Score a reading for this pollutant
    #[must_use]
    pub fn score(self, reading: &PollutionReading) -> f64 {
        match self {
            Pollutant::Co => normalize_co(reading.co),
            // NO is scored on the NO2 curve here; the composite uses the NO curve
            Pollutant::No => normalize_no2(reading.no),
            Pollutant::No2 => normalize_no2(reading.no2),
            Pollutant::Noise => normalize_noise(reading.noise),
            Pollutant::Aqi => compute_custom_aqi(reading),
        }
    }
}

/// Score a reading by pollutant name (case-insensitive).
///
/// Unknown names yield `None` rather than an error.
#[must_use]
pub fn score_for(reading: &PollutionReading, pollutant: &str) -> Option<f64> {
    pollutant
        .parse::<Pollutant>()
        .ok()
        .map(|pollutant| pollutant.score(reading))
}
