//! Pollution scoring

pub mod aqi;

pub use aqi::{Pollutant, compute_custom_aqi, score_for};
