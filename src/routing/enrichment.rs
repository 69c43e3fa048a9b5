//! Route enrichment
//!
//! Attaches a pollution score to every coordinate of a route by looking up
//! the newest reading near that coordinate and scoring it for the requested
//! pollutant.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, instrument};

use crate::config::LookupConfig;
use crate::error::StoreError;
use crate::models::{Coordinate, Route, ScoredRoute};
use crate::pollution::score_for;
use crate::store::ReadingStore;

/// Scores routes against a reading store
#[derive(Clone)]
pub struct RouteEnricher {
    store: Arc<dyn ReadingStore>,
    radius_degrees: f64,
    concurrency: usize,
    lookup_timeout: Duration,
}

impl RouteEnricher {
    #[must_use]
    pub fn new(store: Arc<dyn ReadingStore>, config: &LookupConfig) -> Self {
        Self {
            store,
            radius_degrees: config.radius_degrees,
            concurrency: config.concurrency.max(1),
            lookup_timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    /// Score every coordinate of `route` for `pollutant`.
    ///
    /// The result carries one entry per coordinate, in path order; entries are
    /// `None` where no reading was found or the score was not finite. Lookups
    /// run concurrently but results keep their position.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if a lookup fails or times out.
    #[instrument(skip(self, route), fields(points = route.path().len()))]
    pub async fn enrich(&self, route: &Route, pollutant: &str) -> Result<ScoredRoute, StoreError> {
        let scores: Vec<Option<f64>> = stream::iter(route.path().iter().copied())
            .map(|coordinate| self.score_point(coordinate, pollutant))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let scored = ScoredRoute::new(route.clone(), scores);
        debug!(
            "Scored {} points, {} with data, average {:?}",
            scored.scores().len(),
            scored.scores().iter().flatten().count(),
            scored.average()
        );
        Ok(scored)
    }

    async fn score_point(
        &self,
        coordinate: Coordinate,
        pollutant: &str,
    ) -> Result<Option<f64>, StoreError> {
        let reading = tokio::time::timeout(
            self.lookup_timeout,
            self.store.nearest_reading(coordinate, self.radius_degrees),
        )
        .await
        .map_err(|_| StoreError::Timeout(self.lookup_timeout.as_secs()))??;

        Ok(sanitize(
            reading.and_then(|reading| score_for(&reading, pollutant)),
        ))
    }
}

/// Drop scores that cannot be reported (infinite or NaN)
#[must_use]
pub fn sanitize(score: Option<f64>) -> Option<f64> {
    score.filter(|value| value.is_finite())
}
