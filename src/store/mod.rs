//! Spatial reading store
//!
//! The routing core only ever reads pollution data. It does so through the
//! [`ReadingStore`] trait so the PostGIS database and the in-memory store used
//! for local runs and tests are interchangeable.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Coordinate, PollutionReading, Site, SiteReadingSummary};

pub mod memory;
pub mod postgis;

pub use memory::InMemoryReadingStore;
pub use postgis::PostgisReadingStore;

/// Default lookup radius in degrees, roughly 200 m at mid latitudes
pub const DEFAULT_RADIUS_DEGREES: f64 = 0.002;

#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Most recent reading from any site within `radius_degrees` of `coordinate`.
    ///
    /// Returns `Ok(None)` when no site is in range or the sites in range have
    /// not reported yet.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backing store cannot be queried.
    async fn nearest_reading(
        &self,
        coordinate: Coordinate,
        radius_degrees: f64,
    ) -> Result<Option<PollutionReading>, StoreError>;

    /// All monitoring sites.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backing store cannot be queried.
    async fn sites(&self) -> Result<Vec<Site>, StoreError>;

    /// The newest reading of every site that has reported at least once.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backing store cannot be queried.
    async fn latest_readings(&self) -> Result<Vec<SiteReadingSummary>, StoreError>;
}
