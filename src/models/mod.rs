//! Data models for the CleanRoute service
//!
//! This module contains the core domain models organized by concern:
//! - Coordinate: WGS84 positions in GeoJSON order
//! - Reading: monitoring sites and their pollution samples
//! - Route: provider GeoJSON routes and their pollution-scored form

pub mod coordinate;
pub mod reading;
pub mod route;

// Re-export all public types for convenient access
pub use coordinate::Coordinate;
pub use reading::{PollutionReading, ReadingSnapshot, Site, SiteReadingSummary};
pub use route::{Route, ScoredRoute};
