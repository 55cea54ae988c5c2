// ABOUTME: HTTP server assembly: router, middleware layers, startup recovery, and graceful shutdown
// ABOUTME: Request timeout applies to every route except multipart uploads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use crate::config::ServerConfig;
use crate::middleware::{
    create_request_span, json_request_timeout, setup_cors, MakeRequestUuid, REQUEST_ID_HEADER,
};
use crate::resources::ServerResources;
use crate::routes::{HealthRoutes, JobRoutes, NutritionRoutes, RecipeRoutes};
use anyhow::{Context, Result};
use axum::{body::Body, http::Request, http::Uri, middleware::from_fn_with_state, Router};
use clipchef_core::errors::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the full application router
pub fn build_router(resources: &Arc<ServerResources>) -> Router {
    let config = &resources.config;
    let timeout_secs = config.limits.request_timeout_secs;

    let timed = Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(JobRoutes::routes(resources.clone()))
        .merge(RecipeRoutes::routes(resources.clone()))
        .merge(NutritionRoutes::routes(resources.clone()))
        .layer(TimeoutLayer::new(Duration::from_secs(timeout_secs)))
        .layer(from_fn_with_state(timeout_secs, json_request_timeout));

    Router::new()
        .merge(timed)
        .merge(JobRoutes::upload_routes(resources.clone()))
        .fallback(handle_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &Request<Body>| create_request_span(request)),
                )
                .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
                .layer(setup_cors(config)),
        )
}

async fn handle_not_found(uri: Uri) -> AppError {
    AppError::not_found(format!("Route {}", uri.path()))
}

/// Start the API server and run until a shutdown signal arrives
///
/// Jobs interrupted by a previous shutdown are marked failed before the
/// listener opens.
///
/// # Errors
///
/// Returns an error if resources cannot be built, the port cannot be bound,
/// or the server fails
pub async fn run_server(config: ServerConfig) -> Result<()> {
    config.ensure_data_dirs()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.http_port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.http_port))?;

    let resources = Arc::new(
        ServerResources::from_config(config)
            .await
            .context("Failed to initialize server resources")?,
    );

    let recovered = resources
        .runner
        .recover_interrupted()
        .await
        .context("Failed to recover interrupted jobs")?;
    info!(recovered, "Startup recovery finished");

    let app = build_router(&resources);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("Clipchef API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received terminate signal, shutting down"),
    }
}
