//! PostGIS-backed reading store
//!
//! Expects the `sites` table (with a `location geometry(POINT, 4326)` column)
//! and the `dynamic_readings` table keyed by `system_code_number`.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, instrument};

use super::ReadingStore;
use crate::error::StoreError;
use crate::models::{Coordinate, PollutionReading, Site, SiteReadingSummary};

const NEAREST_READING_SQL: &str = r"
SELECT r.system_code_number, r.co, r.no, r.no2, r.temperature, r.rh, r.noise, r.battery, r.last_updated
FROM dynamic_readings r
JOIN sites s ON s.system_code_number = r.system_code_number
WHERE ST_DWithin(s.location, ST_SetSRID(ST_Point($1, $2), 4326), $3)
ORDER BY r.last_updated DESC
LIMIT 1";

const SITES_SQL: &str = r"
SELECT system_code_number, latitude, longitude
FROM sites
ORDER BY system_code_number";

const LATEST_READINGS_SQL: &str = r"
SELECT DISTINCT ON (s.system_code_number)
    s.system_code_number, s.latitude, s.longitude,
    r.co, r.no, r.no2, r.noise, r.last_updated
FROM sites s
JOIN dynamic_readings r ON r.system_code_number = s.system_code_number
ORDER BY s.system_code_number, r.last_updated DESC";

#[derive(Debug, sqlx::FromRow)]
struct LatestReadingRow {
    system_code_number: String,
    latitude: f64,
    longitude: f64,
    co: Option<f64>,
    no: Option<f64>,
    no2: Option<f64>,
    noise: Option<f64>,
    last_updated: NaiveDateTime,
}

impl From<LatestReadingRow> for SiteReadingSummary {
    fn from(row: LatestReadingRow) -> Self {
        let site = Site {
            system_code_number: row.system_code_number,
            latitude: row.latitude,
            longitude: row.longitude,
        };
        let mut reading = PollutionReading::empty(site.system_code_number.clone(), row.last_updated);
        reading.co = row.co;
        reading.no = row.no;
        reading.no2 = row.no2;
        reading.noise = row.noise;
        SiteReadingSummary::new(&site, &reading)
    }
}

pub struct PostgisReadingStore {
    pool: PgPool,
}

impl PostgisReadingStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool against `database_url`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the database is unreachable.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!("Connected to reading database (pool size {})", max_connections);
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ReadingStore for PostgisReadingStore {
    #[instrument(level = "trace", skip(self))]
    async fn nearest_reading(
        &self,
        coordinate: Coordinate,
        radius_degrees: f64,
    ) -> Result<Option<PollutionReading>, StoreError> {
        let reading = sqlx::query_as::<_, PollutionReading>(NEAREST_READING_SQL)
            .bind(coordinate.longitude)
            .bind(coordinate.latitude)
            .bind(radius_degrees)
            .fetch_optional(&self.pool)
            .await?;
        Ok(reading)
    }

    async fn sites(&self) -> Result<Vec<Site>, StoreError> {
        let sites = sqlx::query_as::<_, Site>(SITES_SQL)
            .fetch_all(&self.pool)
            .await?;
        Ok(sites)
    }

    async fn latest_readings(&self) -> Result<Vec<SiteReadingSummary>, StoreError> {
        let rows = sqlx::query_as::<_, LatestReadingRow>(LATEST_READINGS_SQL)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(SiteReadingSummary::from).collect())
    }
}
