//! `CleanRoute` - pollution-aware route planning
//!
//! This library scores routes from a directions provider against readings
//! from air-quality monitoring sites and picks the least polluted option.

pub mod api;
pub mod config;
pub mod directions;
pub mod error;
pub mod logging;
pub mod models;
pub mod pollution;
pub mod routing;
pub mod store;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use config::CleanRouteConfig;
pub use directions::{DirectionsProvider, OpenRouteServiceClient};
pub use error::{CleanRouteError, ProviderError, StoreError};
pub use models::{Coordinate, PollutionReading, Route, ScoredRoute, Site, SiteReadingSummary};
pub use pollution::{Pollutant, compute_custom_aqi, score_for};
pub use routing::{RouteEnricher, RoutePlanner, RouteRequest};
pub use store::{InMemoryReadingStore, PostgisReadingStore, ReadingStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CleanRouteError>;
