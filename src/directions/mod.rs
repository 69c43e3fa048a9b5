//! Directions providers
//!
//! A provider turns two or more waypoints and a travel profile into a
//! road-following route. This service never computes paths itself.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::models::{Coordinate, Route};

pub mod openrouteservice;

pub use openrouteservice::OpenRouteServiceClient;

#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Route through `coordinates` in order, using `profile` verbatim
    /// (e.g. `"foot-walking"`, `"driving-car"`).
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] when the provider is unreachable, rejects
    /// the request, or answers with something that is not a route.
    async fn directions(
        &self,
        coordinates: &[Coordinate],
        profile: &str,
    ) -> Result<Route, ProviderError>;
}
