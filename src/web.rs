use std::time::Duration;

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState};
use crate::config::ServerConfig;
use crate::Result;

/// Full application: API routes plus CORS, request timeout and tracing.
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::router(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::map_response(json_timeout_body))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// The timeout layer answers 408 with an empty body; give it the same
/// `{"error": ..}` shape as every other failure.
async fn json_timeout_body(response: Response) -> Response {
    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response;
    }
    (
        StatusCode::REQUEST_TIMEOUT,
        Json(json!({ "error": "Request timed out" })),
    )
        .into_response()
}

/// Serve until Ctrl-C.
///
/// # Errors
///
/// Returns [`crate::CleanRouteError::Io`] if the listener cannot be bound or the
/// server stops with an error.
pub async fn run(config: &ServerConfig, state: AppState) -> Result<()> {
    let app = app(state, Duration::from_secs(config.request_timeout_seconds));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
