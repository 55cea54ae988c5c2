// ABOUTME: Route module organization for Clipchef HTTP endpoints
// ABOUTME: Groups route definitions by domain with thin handlers over the service layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! Route module for the Clipchef server
//!
//! Each domain module exposes a `*Routes` type whose `routes()` builds an
//! axum router. Handlers only translate HTTP to service calls; every failure
//! is an `AppError` rendered as an `ErrorResponse`.

/// Health and readiness routes
pub mod health;
/// Recipe job submission and polling routes
pub mod jobs;
/// Daily nutrition target routes
pub mod nutrition;
/// Recipe macro, goal variant, and dietary routes
pub mod recipes;

pub use health::HealthRoutes;
pub use jobs::JobRoutes;
pub use nutrition::NutritionRoutes;
pub use recipes::RecipeRoutes;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use clipchef_core::errors::{AppError, AppResult};

/// Unwrap a JSON body, turning axum's rejection into an `InvalidInput` error
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::invalid_input(rejection.body_text()))
}
