// ABOUTME: Health check route handlers for service monitoring and status endpoints
// ABOUTME: Liveness reports the process is up; readiness checks the job store and the LLM provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! Health check routes for service monitoring
//!
//! `/health` never touches dependencies. `/ready` answers 503 while the job
//! store is unusable. An unreachable LLM is reported without failing
//! readiness.

use crate::resources::ServerResources;
use crate::utils::timeout::with_stage_timeout;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clipchef_core::constants::defaults::LLM_HEALTH_TIMEOUT_SECS;
use clipchef_core::constants::service_names::CLIPCHEF_SERVER;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .route("/ready", get(Self::handle_ready))
            .with_state(resources)
    }

    async fn handle_health() -> Json<serde_json::Value> {
        Json(json!({
            "status": "healthy",
            "service": CLIPCHEF_SERVER,
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    }

    async fn handle_ready(State(resources): State<Arc<ServerResources>>) -> Response {
        let store = resources.store.health_check().await;
        let llm = resources.recipes.llm();
        let llm_error = match with_stage_timeout(
            "LLM health check",
            LLM_HEALTH_TIMEOUT_SECS,
            llm.health_check(),
        )
        .await
        {
            Ok(true) => None,
            Ok(false) => Some(format!("{} reported unhealthy", llm.display_name())),
            Err(e) => Some(e.message),
        };
        if let Some(ref error) = llm_error {
            warn!(provider = llm.name(), error = %error, "LLM provider unreachable");
        }

        let (status, label, store_error) = match store {
            Ok(()) => (StatusCode::OK, "ready", None),
            Err(e) => {
                warn!(error = %e, "Readiness check failed");
                (StatusCode::SERVICE_UNAVAILABLE, "not_ready", Some(e.message))
            }
        };

        let body = json!({
            "status": label,
            "job_store": {
                "backend": resources.store.backend_name(),
                "reachable": store_error.is_none(),
                "error": store_error,
            },
            "llm": {
                "provider": llm.name(),
                "display_name": llm.display_name(),
                "model": llm.default_model(),
                "vision": llm.capabilities().supports_vision(),
                "reachable": llm_error.is_none(),
                "error": llm_error,
            },
            "speech_to_text": resources.runner.accepts_video_uploads(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        (status, Json(body)).into_response()
    }
}
