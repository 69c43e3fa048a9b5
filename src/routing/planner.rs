//! Cleanest-route selection
//!
//! Requests a base route, derives three detour routes by nudging waypoints
//! taken at a quarter, half and three quarters of the base path, scores every
//! candidate and keeps the one with the lowest average exposure.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{info, instrument, warn};

use super::enrichment::RouteEnricher;
use crate::directions::DirectionsProvider;
use crate::error::{CleanRouteError, ProviderError, StoreError};
use crate::models::{Coordinate, Route, ScoredRoute};
use crate::pollution::aqi::round2;

/// Minimum base-route length from which detour waypoints can be picked
pub const MIN_BASE_POINTS: usize = 4;

/// Planar nudges in degrees (lon, lat) for the quarter, half and
/// three-quarter waypoints; each is well under 100 m
pub const WAYPOINT_OFFSETS: [(f64, f64); 3] = [(0.0003, 0.0002), (0.0007, 0.0005), (0.0002, 0.0001)];

/// What the caller asked for
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub start: Coordinate,
    pub end: Coordinate,
    /// Travel profile, forwarded to the provider untouched
    pub mode: String,
    /// Pollutant name to score by; unknown names score as absent
    pub pollutant: String,
}

pub struct RoutePlanner {
    provider: Arc<dyn DirectionsProvider>,
    enricher: RouteEnricher,
    provider_timeout: Duration,
}

impl RoutePlanner {
    #[must_use]
    pub fn new(
        provider: Arc<dyn DirectionsProvider>,
        enricher: RouteEnricher,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            enricher,
            provider_timeout,
        }
    }

    /// Find the least polluted of the base route and its detours.
    ///
    /// The returned route's average is rounded to two decimals, or `None`
    /// when no point along it had usable data.
    ///
    /// # Errors
    ///
    /// - [`CleanRouteError::Provider`] if the base route cannot be fetched
    /// - [`CleanRouteError::Validation`] if the base route is too short
    /// - [`CleanRouteError::Store`] if pollution lookups fail
    ///
    /// A failing detour request is not an error; that detour is skipped.
    #[instrument(skip(self), fields(mode = %request.mode, pollutant = %request.pollutant))]
    pub async fn cleanest_route(&self, request: &RouteRequest) -> crate::Result<ScoredRoute> {
        let base_route = self
            .fetch(&[request.start, request.end], &request.mode)
            .await?;
        let base = self.enricher.enrich(&base_route, &request.pollutant).await?;

        let waypoints = detour_waypoints(base_route.path())?;

        let detours = join_all(
            waypoints
                .iter()
                .map(|waypoint| self.detour(request, *waypoint)),
        )
        .await;

        let mut candidates = vec![base];
        for (index, detour) in detours.into_iter().enumerate() {
            match detour {
                Ok(Ok(scored)) => candidates.push(scored),
                Ok(Err(provider_error)) => {
                    warn!("Skipping detour {}: {}", index + 1, provider_error);
                }
                Err(store_error) => return Err(store_error.into()),
            }
        }

        let count = candidates.len();
        let best = select_cleanest(candidates)
            .ok_or_else(|| CleanRouteError::validation("No candidate routes"))?;
        let reported = best.average().filter(|average| average.is_finite()).map(round2);

        info!(
            "Selected route with average score {:?} from {} candidate(s)",
            reported, count
        );
        Ok(best.with_average(reported))
    }

    /// Fetch and score one detour. The outer error is fatal to the request
    /// (store failure); the inner one only drops this detour.
    async fn detour(
        &self,
        request: &RouteRequest,
        waypoint: Coordinate,
    ) -> Result<Result<ScoredRoute, ProviderError>, StoreError> {
        let route = match self
            .fetch(&[request.start, waypoint, request.end], &request.mode)
            .await
        {
            Ok(route) => route,
            Err(error) => return Ok(Err(error)),
        };
        self.enricher
            .enrich(&route, &request.pollutant)
            .await
            .map(Ok)
    }

    async fn fetch(
        &self,
        coordinates: &[Coordinate],
        profile: &str,
    ) -> Result<Route, ProviderError> {
        tokio::time::timeout(
            self.provider_timeout,
            self.provider.directions(coordinates, profile),
        )
        .await
        .map_err(|_| ProviderError::Timeout(self.provider_timeout.as_secs()))?
    }
}

/// Offset waypoints at indices `len/4`, `len/2` and `3*len/4` of `path`.
///
/// # Errors
///
/// Returns [`CleanRouteError::Validation`] for paths shorter than
/// [`MIN_BASE_POINTS`].
pub fn detour_waypoints(path: &[Coordinate]) -> crate::Result<[Coordinate; 3]> {
    let len = path.len();
    if len < MIN_BASE_POINTS {
        return Err(CleanRouteError::validation(
            "Base route too short to extract waypoints",
        ));
    }

    let indices = [len / 4, len / 2, 3 * len / 4];
    Ok(std::array::from_fn(|i| {
        let (dx, dy) = WAYPOINT_OFFSETS[i];
        path[indices[i]].offset(dx, dy)
    }))
}

/// The candidate with the lowest average; absent averages rank last and
/// ties go to the earlier candidate.
#[must_use]
pub fn select_cleanest(candidates: Vec<ScoredRoute>) -> Option<ScoredRoute> {
    candidates
        .into_iter()
        .reduce(|best, candidate| {
            if ranking_key(&candidate).total_cmp(&ranking_key(&best)) == Ordering::Less {
                candidate
            } else {
                best
            }
        })
}

fn ranking_key(route: &ScoredRoute) -> f64 {
    route
        .average()
        .filter(|average| !average.is_nan())
        .unwrap_or(f64::INFINITY)
}
