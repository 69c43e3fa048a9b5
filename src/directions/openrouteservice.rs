//! OpenRouteService directions client
//!
//! Posts waypoints to the ORS v2 directions API and asks for GeoJSON back.
//! Transient failures (connect errors, 5xx, 429) are retried with
//! exponential backoff before the call is reported as failed.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::DirectionsProvider;
use crate::config::DirectionsConfig;
use crate::error::ProviderError;
use crate::models::{Coordinate, Route};

#[derive(Debug, Serialize)]
struct DirectionsRequest<'a> {
    coordinates: &'a [Coordinate],
}

pub struct OpenRouteServiceClient {
    client: ClientWithMiddleware,
    api_key: Option<String>,
    base_url: String,
}

impl OpenRouteServiceClient {
    /// Create a new client from the directions configuration
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Network`] if the HTTP client cannot be built.
    pub fn new(config: &DirectionsConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("CleanRoute/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Network(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        if config.api_key.is_none() {
            warn!("No OpenRouteService API key configured; requests will likely be rejected");
        }

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn directions_url(&self, profile: &str) -> String {
        format!("{}/v2/directions/{}/geojson", self.base_url, profile)
    }
}

#[async_trait]
impl DirectionsProvider for OpenRouteServiceClient {
    #[instrument(skip(self, coordinates), fields(waypoints = coordinates.len()))]
    async fn directions(
        &self,
        coordinates: &[Coordinate],
        profile: &str,
    ) -> Result<Route, ProviderError> {
        let url = self.directions_url(profile);
        debug!("Requesting directions from {}", url);
        let start_time = Instant::now();

        let mut request = self
            .client
            .post(&url)
            .json(&DirectionsRequest { coordinates });
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
            warn!("Directions request failed with {}: {}", status, message);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let route: Route = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if route.features.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "response contains no route features".to_string(),
            ));
        }

        info!(
            "Received route with {} points in {:.3}s",
            route.path().len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(route)
    }
}

/// Pull a human-readable message out of an ORS error body.
///
/// ORS answers either `{"error": {"code": .., "message": ".."}}` or
/// `{"error": ".."}`; anything else falls back to the raw text.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed: Option<Value> = serde_json::from_str(trimmed).ok();
    let from_json = parsed.as_ref().and_then(|value| match &value["error"] {
        Value::String(message) => Some(message.clone()),
        Value::Object(error) => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    });

    Some(from_json.unwrap_or_else(|| trimmed.to_string()))
}
