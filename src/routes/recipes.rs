// ABOUTME: Route handlers for recipe macro estimation, goal variants, and dietary checks
// ABOUTME: Operate on a recipe supplied in the request body, typically a completed job's result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use super::json_body;
use super::nutrition::ProfileInput;
use crate::resources::ServerResources;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use clipchef_core::errors::AppError;
use clipchef_intelligence::{
    flag_ingredients, ConfidenceLevel, DietaryCondition, DietaryFlag, Goal, MacroTotals, Recipe,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for `POST /api/recipes/macros`
#[derive(Debug, Deserialize)]
pub struct MacrosRequest {
    /// Recipe to estimate
    pub recipe: Recipe,
}

/// Recipe with derived per-serving values
#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeResponse {
    /// The recipe
    pub recipe: Recipe,
    /// Macros for one serving
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_serving: Option<MacroTotals>,
    /// Overall confidence bucket
    pub confidence_level: ConfidenceLevel,
}

impl From<Recipe> for RecipeResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            per_serving: recipe.per_serving_macros(),
            confidence_level: recipe.confidence.level(),
            recipe,
        }
    }
}

/// Request body for `POST /api/recipes/goal-variant`
#[derive(Debug, Deserialize)]
pub struct GoalVariantRequest {
    /// Recipe to rewrite
    pub recipe: Recipe,
    /// Target goal
    pub goal: Goal,
    /// Quiz answers; without them the recipe's own macros are scaled
    #[serde(default)]
    pub profile: Option<ProfileInput>,
    /// Meals per day for the per-serving target
    #[serde(default)]
    pub meals_per_day: Option<u8>,
}

/// Request body for `POST /api/recipes/dietary-check`
#[derive(Debug, Deserialize)]
pub struct DietaryCheckRequest {
    /// Recipe to check
    pub recipe: Recipe,
    /// Conditions to check against
    pub conditions: Vec<DietaryCondition>,
}

/// Response for `POST /api/recipes/dietary-check`
#[derive(Debug, Serialize, Deserialize)]
pub struct DietaryCheckResponse {
    /// True when no ingredient matched
    pub compatible: bool,
    /// Ingredient matches
    pub flags: Vec<DietaryFlag>,
}

/// Recipe routes handler
pub struct RecipeRoutes;

impl RecipeRoutes {
    /// Create recipe routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/recipes/macros", post(Self::handle_macros))
            .route("/api/recipes/goal-variant", post(Self::handle_goal_variant))
            .route("/api/recipes/dietary-check", post(Self::handle_dietary_check))
            .with_state(resources)
    }

    /// Handle POST /api/recipes/macros - Re-estimate macros for a recipe
    async fn handle_macros(
        State(resources): State<Arc<ServerResources>>,
        payload: Result<Json<MacrosRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let request = json_body(payload)?;
        let recipe = resources.recipes.estimate_macros(request.recipe).await?;
        Ok((StatusCode::OK, Json(RecipeResponse::from(recipe))).into_response())
    }

    /// Handle POST /api/recipes/goal-variant - Rewrite a recipe toward a goal
    async fn handle_goal_variant(
        State(resources): State<Arc<ServerResources>>,
        payload: Result<Json<GoalVariantRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let request = json_body(payload)?;
        let meals_per_day = request
            .meals_per_day
            .unwrap_or(resources.config.meals_per_day);
        let profile = request
            .profile
            .map(|profile| profile.into_profile(Some(request.goal)))
            .transpose()?;

        let variant = resources
            .recipes
            .generate_goal_variant(request.recipe, request.goal, profile.as_ref(), meals_per_day)
            .await?;
        Ok((StatusCode::OK, Json(variant)).into_response())
    }

    /// Handle POST /api/recipes/dietary-check - Flag ingredients against conditions
    async fn handle_dietary_check(
        payload: Result<Json<DietaryCheckRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let request = json_body(payload)?;
        let recipe = request.recipe.normalized()?;
        let flags = flag_ingredients(&recipe.ingredients, &request.conditions);
        let response = DietaryCheckResponse {
            compatible: flags.is_empty(),
            flags,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
