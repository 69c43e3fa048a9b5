use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::ReadingStore;
use crate::error::StoreError;
use crate::models::{Coordinate, PollutionReading, Site, SiteReadingSummary};

/// Reading store held entirely in memory
#[derive(Debug, Default, Clone)]
pub struct InMemoryReadingStore {
    sites: Vec<Site>,
    readings: HashMap<String, Vec<PollutionReading>>,
}

/// On-disk layout of a seed file
#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    sites: Vec<Site>,
    #[serde(default)]
    readings: Vec<PollutionReading>,
}

impl InMemoryReadingStore {
    #[must_use]
    pub fn new(sites: Vec<Site>, readings: Vec<PollutionReading>) -> Self {
        let mut store = Self {
            sites,
            readings: HashMap::new(),
        };
        for reading in readings {
            store.add_reading(reading);
        }
        store
    }

    /// Load sites and readings from a JSON seed file
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Seed`] if the file cannot be read or parsed.
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Seed(format!("{}: {e}", path.display())))?;
        let seed: SeedFile = serde_json::from_str(&content)
            .map_err(|e| StoreError::Seed(format!("{}: {e}", path.display())))?;

        info!(
            "Loaded {} sites and {} readings from {}",
            seed.sites.len(),
            seed.readings.len(),
            path.display()
        );
        Ok(Self::new(seed.sites, seed.readings))
    }

    pub fn add_site(&mut self, site: Site) {
        self.sites.push(site);
    }

    /// Readings are append-only; a site may report many times
    pub fn add_reading(&mut self, reading: PollutionReading) {
        self.readings
            .entry(reading.system_code_number.clone())
            .or_default()
            .push(reading);
    }

    fn latest_for(&self, system_code_number: &str) -> Option<&PollutionReading> {
        self.readings
            .get(system_code_number)?
            .iter()
            .max_by_key(|reading| reading.last_updated)
    }
}

#[async_trait]
impl ReadingStore for InMemoryReadingStore {
    async fn nearest_reading(
        &self,
        coordinate: Coordinate,
        radius_degrees: f64,
    ) -> Result<Option<PollutionReading>, StoreError> {
        let newest = self
            .sites
            .iter()
            .filter(|site| site.location().planar_distance(&coordinate) <= radius_degrees)
            .filter_map(|site| self.latest_for(&site.system_code_number))
            .max_by_key(|reading| reading.last_updated)
            .cloned();

        debug!(
            lon = coordinate.longitude,
            lat = coordinate.latitude,
            found = newest.is_some(),
            "Radius lookup"
        );
        Ok(newest)
    }

    async fn sites(&self) -> Result<Vec<Site>, StoreError> {
        Ok(self.sites.clone())
    }

    async fn latest_readings(&self) -> Result<Vec<SiteReadingSummary>, StoreError> {
        Ok(self
            .sites
            .iter()
            .filter_map(|site| {
                self.latest_for(&site.system_code_number)
                    .map(|reading| SiteReadingSummary::new(site, reading))
            })
            .collect())
    }
}
