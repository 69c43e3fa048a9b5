use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use cleanroute::{
    AppState, CleanRouteConfig, InMemoryReadingStore, OpenRouteServiceClient, PostgisReadingStore,
    ReadingStore, RouteEnricher, RoutePlanner, logging, web,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Optional explicit config file as the only argument
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = CleanRouteConfig::load_from_path(config_path)?;

    logging::init(&config.logging)?;
    info!("Starting CleanRoute {}", cleanroute::VERSION);

    let store = open_store(&config).await?;

    let provider = OpenRouteServiceClient::new(&config.directions)
        .context("Failed to create directions client")?;
    let enricher = RouteEnricher::new(store.clone(), &config.lookup);
    // Retries happen inside the client; this bounds the whole exchange
    let provider_timeout = Duration::from_secs(
        config.directions.timeout_seconds * (u64::from(config.directions.max_retries) + 1),
    );
    let planner = RoutePlanner::new(Arc::new(provider), enricher, provider_timeout);

    web::run(&config.server, AppState::new(store, planner)).await?;
    Ok(())
}

async fn open_store(config: &CleanRouteConfig) -> Result<Arc<dyn ReadingStore>> {
    if let Some(url) = &config.database.url {
        let store = PostgisReadingStore::connect(url, config.database.max_connections)
            .await
            .context("Failed to connect to the reading database")?;
        return Ok(Arc::new(store));
    }

    if let Some(seed_file) = &config.database.seed_file {
        let store = InMemoryReadingStore::from_seed_file(seed_file)
            .with_context(|| format!("Failed to load seed file {seed_file}"))?;
        info!("Serving readings from seed file {}", seed_file);
        return Ok(Arc::new(store));
    }

    warn!("No database configured; every route will score as having no data");
    Ok(Arc::new(InMemoryReadingStore::default()))
}
