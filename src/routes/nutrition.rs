// ABOUTME: Route handler for daily calorie and macro targets from quiz/profile input
// ABOUTME: Accepts metric or imperial body stats and returns daily plus per-meal targets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use super::json_body;
use crate::resources::ServerResources;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use clipchef_core::errors::{AppError, AppResult};
use clipchef_intelligence::{
    calculate_daily_targets, calculate_meal_target, ActivityLevel, BodyStats, DailyTargets,
    DietaryCondition, Goal, MacroTotals, NutritionProfile, Sex, UnitSystem,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Quiz answers as the client sends them
///
/// Weight and height are in kilograms and centimeters for `metric`, pounds
/// and inches for `imperial`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileInput {
    /// Unit system for `weight` and `height`
    #[serde(default)]
    pub unit_system: UnitSystem,
    /// Body weight
    pub weight: f64,
    /// Height
    pub height: f64,
    /// Age in years
    pub age: u32,
    /// Biological sex
    pub sex: Sex,
    /// Activity level
    pub activity_level: ActivityLevel,
    /// Nutrition goal; optional where the request names one separately
    #[serde(default)]
    pub goal: Option<Goal>,
    /// Allergens and dietary conditions
    #[serde(default)]
    pub dietary_conditions: Vec<DietaryCondition>,
}

impl ProfileInput {
    /// Convert to a metric profile, using `fallback_goal` when none was given
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredField` if neither the input nor the caller has a goal
    pub fn into_profile(self, fallback_goal: Option<Goal>) -> AppResult<NutritionProfile> {
        let goal = self
            .goal
            .or(fallback_goal)
            .ok_or_else(|| AppError::missing_field("goal"))?;
        Ok(NutritionProfile {
            stats: BodyStats::from_units(
                self.unit_system,
                self.weight,
                self.height,
                self.age,
                self.sex,
            ),
            activity_level: self.activity_level,
            goal,
            dietary_conditions: self.dietary_conditions,
        })
    }
}

/// Request body for `POST /api/nutrition/targets`
#[derive(Debug, Deserialize)]
pub struct TargetsRequest {
    /// Quiz answers
    #[serde(flatten)]
    pub profile: ProfileInput,
    /// Meals per day for the per-meal split
    #[serde(default)]
    pub meals_per_day: Option<u8>,
}

/// Response for `POST /api/nutrition/targets`
#[derive(Debug, Serialize, Deserialize)]
pub struct TargetsResponse {
    /// Daily targets
    pub targets: DailyTargets,
    /// Meals the day was split into
    pub meals_per_day: u8,
    /// Targets for one meal
    pub per_meal: MacroTotals,
}

/// Nutrition routes handler
pub struct NutritionRoutes;

impl NutritionRoutes {
    /// Create nutrition routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/nutrition/targets", post(Self::handle_targets))
            .with_state(resources)
    }

    /// Handle POST /api/nutrition/targets - BMR, TDEE, goal calories, and macros
    async fn handle_targets(
        State(resources): State<Arc<ServerResources>>,
        payload: Result<Json<TargetsRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let request = json_body(payload)?;
        let meals_per_day = request
            .meals_per_day
            .unwrap_or(resources.config.meals_per_day);
        let profile = request.profile.into_profile(None)?;

        let targets = calculate_daily_targets(&profile, resources.recipes.nutrition())?;
        let per_meal = calculate_meal_target(&targets, meals_per_day)?;

        let response = TargetsResponse {
            targets,
            meals_per_day,
            per_meal,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
