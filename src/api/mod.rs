//! HTTP handlers

use std::sync::Arc;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    response::Json,
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::error::CleanRouteError;
use crate::models::{Coordinate, Route, SiteReadingSummary};
use crate::routing::{RoutePlanner, RouteRequest};
use crate::store::ReadingStore;

const MISSING_FIELDS: &str = "Missing required input fields";
const REQUIRED_FIELDS: [&str; 4] = ["start", "end", "mode", "pollutant"];

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReadingStore>,
    pub planner: Arc<RoutePlanner>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn ReadingStore>, planner: RoutePlanner) -> Self {
        Self {
            store,
            planner: Arc::new(planner),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/routing/route", post(post_route))
        .route("/sites", get(get_sites))
        .route("/heatmap/latest_readings", get(get_latest_readings))
        .route("/health", get(get_health))
        .with_state(state)
}

async fn post_route(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> crate::Result<Json<Route>> {
    let request = parse_route_request(payload.ok().map(|Json(body)| body))?;
    info!(
        "Route request {:?} -> {:?} by {} for {}",
        request.start, request.end, request.mode, request.pollutant
    );

    let best = state.planner.cleanest_route(&request).await?;
    Ok(Json(best.into_geojson()))
}

/// Validate a route request body.
///
/// A missing body, a non-object body or an absent (or `null`) required field
/// is reported as missing input; a field that is present but has the wrong
/// shape names that field.
///
/// # Errors
///
/// Returns [`CleanRouteError::Validation`] describing the first problem.
pub fn parse_route_request(body: Option<Value>) -> crate::Result<RouteRequest> {
    let Some(Value::Object(fields)) = body else {
        return Err(CleanRouteError::validation(MISSING_FIELDS));
    };
    if REQUIRED_FIELDS
        .iter()
        .any(|name| fields.get(*name).is_none_or(Value::is_null))
    {
        return Err(CleanRouteError::validation(MISSING_FIELDS));
    }

    Ok(RouteRequest {
        start: field::<Coordinate>(&fields, "start")?,
        end: field::<Coordinate>(&fields, "end")?,
        mode: field::<String>(&fields, "mode")?,
        pollutant: field::<String>(&fields, "pollutant")?,
    })
}

fn field<T: DeserializeOwned>(fields: &Map<String, Value>, name: &str) -> crate::Result<T> {
    let value = fields.get(name).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|e| CleanRouteError::validation(format!("Invalid '{name}' field: {e}")))
}

async fn get_sites(State(state): State<AppState>) -> crate::Result<Json<Value>> {
    let sites = state.store.sites().await?;

    let features: Vec<Value> = sites
        .iter()
        .map(|site| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [site.longitude, site.latitude],
                },
                "properties": {
                    "systemCodeNumber": site.system_code_number,
                },
            })
        })
        .collect();

    Ok(Json(json!({
        "type": "FeatureCollection",
        "features": features,
    })))
}

async fn get_latest_readings(
    State(state): State<AppState>,
) -> crate::Result<Json<Vec<SiteReadingSummary>>> {
    Ok(Json(state.store.latest_readings().await?))
}

async fn get_health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}
