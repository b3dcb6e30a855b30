use std::time::Duration;

use anyhow::Context;
use axum::{Router, http::StatusCode};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState};
use crate::config::ServerConfig;

/// Full application: `/api` routes, optional static frontend, shared layers
pub fn app(state: AppState, server: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new().nest("/api", api::router(state));
    if let Some(dir) = &server.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(RequestBodyLimitLayer::new(server.body_limit_kb * 1024))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout_seconds.into()),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run(server: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = app(state, server);

    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
        .context("Web server failed")
}
