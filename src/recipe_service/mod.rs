// ABOUTME: Recipe extraction, macro estimation, and goal variant generation over the LLM provider
// ABOUTME: Combines prompts, JSON parsing, and the deterministic calculators into recipe operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! # Recipe Service
//!
//! The LLM does the reading and the estimating; everything it returns is
//! normalized and checked with the pure functions from
//! `clipchef_intelligence` before it leaves this module.

mod llm_output;

use crate::llm::{extract_json_object, prompts, ChatMessage, ChatRequest, LlmProvider};
use crate::logging::AppLogger;
use crate::sources::SourceMaterial;
use clipchef_core::constants::limits::MAX_COMPLETION_TOKENS;
use clipchef_core::errors::{AppError, AppResult, ErrorCode};
use clipchef_intelligence::{
    calculate_daily_targets, check_goal_variant, flag_ingredients, plan_goal_variant,
    reconcile_macros, DailyTargets, DietaryCondition, DietaryFlag, Goal, GoalVariantPlan,
    NutritionConfig, NutritionProfile, Recipe,
};
use llm_output::{ExtractedRecipe, MacroEstimate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Confidence ceiling for recipes read from a caption alone
const CAPTION_ONLY_CONFIDENCE: f64 = 0.35;

/// A recipe rewritten toward a nutrition goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalVariant {
    /// Goal the variant targets
    pub goal: Goal,
    /// Rewritten recipe
    pub recipe: Recipe,
    /// Per-serving target and guidance the rewrite aimed at
    pub plan: GoalVariantPlan,
    /// Daily targets used, when a profile was supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_targets: Option<DailyTargets>,
    /// Problems found comparing the variant to the original
    pub warnings: Vec<String>,
    /// Variant ingredients that conflict with the profile's dietary conditions
    pub dietary_flags: Vec<DietaryFlag>,
}

/// Recipe operations backed by an LLM provider
#[derive(Clone)]
pub struct RecipeService {
    llm: Arc<dyn LlmProvider>,
    nutrition: NutritionConfig,
}

impl RecipeService {
    /// Create a service around a provider and nutrition configuration
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>, nutrition: NutritionConfig) -> Self {
        Self { llm, nutrition }
    }

    /// The underlying provider
    #[must_use]
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Nutrition coefficients in use
    #[must_use]
    pub const fn nutrition(&self) -> &NutritionConfig {
        &self.nutrition
    }

    /// True if image uploads can be processed
    #[must_use]
    pub fn supports_vision(&self) -> bool {
        self.llm.capabilities().supports_vision()
    }

    /// Run a JSON-mode completion and return the JSON object text
    async fn complete_json(&self, purpose: &str, messages: Vec<ChatMessage>) -> AppResult<String> {
        let request = ChatRequest::new(messages)
            .with_max_tokens(MAX_COMPLETION_TOKENS)
            .with_json_mode();
        let started = Instant::now();
        let response = self.llm.complete(&request).await?;

        AppLogger::log_llm_call(
            self.llm.name(),
            &response.model,
            purpose,
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            response.usage.as_ref().map(|usage| usage.total_tokens),
        );

        if response.finish_reason.as_deref() == Some("length") {
            warn!(purpose, "LLM response was cut off at the token limit");
        }

        extract_json_object(&response.content).map(ToOwned::to_owned)
    }

    fn parse_recipe(json_text: &str) -> AppResult<Recipe> {
        let extracted: ExtractedRecipe = serde_json::from_str(json_text).map_err(|e| {
            AppError::invalid_format(format!("Model returned malformed recipe JSON: {e}"))
        })?;
        Ok(extracted.into_recipe())
    }

    /// Extract a structured recipe from source material
    ///
    /// Caption-only material produces a low-confidence recipe.
    ///
    /// # Errors
    ///
    /// Fails if the provider cannot accept an attached image, the LLM call
    /// fails, or the response holds no ingredients and no steps.
    #[instrument(skip(self, material), fields(kind = ?material.kind))]
    pub async fn extract_recipe(&self, material: &SourceMaterial) -> AppResult<Recipe> {
        let mut user = ChatMessage::user(material.prompt_context());
        if let Some(ref image) = material.image {
            if !self.supports_vision() {
                return Err(AppError::new(
                    ErrorCode::ResourceUnavailable,
                    format!(
                        "{} cannot read images; configure a vision-capable model",
                        self.llm.display_name()
                    ),
                ));
            }
            user = user.with_image(image.data_url());
        }

        let messages = vec![
            ChatMessage::system(prompts::recipe_extraction_prompt()),
            user,
        ];
        let json_text = self.complete_json("recipe_extraction", messages).await?;

        let mut recipe = Self::parse_recipe(&json_text)?;
        recipe.source_url.clone_from(&material.source_url);
        let mut recipe = recipe.normalized().map_err(|_| {
            AppError::invalid_input("No recipe could be found in the video or image")
        })?;

        if material.is_caption_only() {
            recipe.confidence.cap(
                CAPTION_ONLY_CONFIDENCE,
                "Extracted from the video caption only; no transcript was available",
            );
        }
        if reconcile_macros(&mut recipe, self.nutrition.macro_tolerance) {
            debug!("Adjusted extracted calories to match macros");
        }

        info!(
            title = %recipe.title,
            ingredients = recipe.ingredients.len(),
            steps = recipe.steps.len(),
            has_macros = recipe.macros.is_some(),
            "Recipe extracted"
        );
        Ok(recipe)
    }

    /// Estimate whole-recipe macros from the ingredient list
    ///
    /// Replaces any existing macros, sets the macro confidence, and appends
    /// the model's assumptions.
    ///
    /// # Errors
    ///
    /// Fails if the LLM call fails or returns no usable estimate.
    #[instrument(skip(self, recipe), fields(title = %recipe.title))]
    pub async fn estimate_macros(&self, recipe: Recipe) -> AppResult<Recipe> {
        let mut recipe = recipe.normalized()?;

        let payload = json!({
            "title": recipe.title,
            "servings": recipe.servings,
            "ingredients": recipe.ingredients,
        });
        let messages = vec![
            ChatMessage::system(prompts::macro_estimation_prompt()),
            ChatMessage::user(serde_json::to_string_pretty(&payload)?),
        ];
        let json_text = self.complete_json("macro_estimation", messages).await?;

        let estimate: MacroEstimate = serde_json::from_str(&json_text).map_err(|e| {
            AppError::invalid_format(format!("Model returned malformed macro JSON: {e}"))
        })?;
        let totals = estimate
            .macros
            .and_then(|macros| macros.into_totals())
            .ok_or_else(|| AppError::invalid_format("Model returned an empty macro estimate"))?;

        recipe.macros = Some(totals);
        recipe.confidence.macros = estimate
            .confidence
            .unwrap_or(recipe.confidence.macros);
        recipe.assumptions.extend(estimate.assumptions);

        let mut recipe = recipe.normalized()?;
        reconcile_macros(&mut recipe, self.nutrition.macro_tolerance);
        Ok(recipe)
    }

    /// Estimate macros only if the recipe has none
    ///
    /// # Errors
    ///
    /// Propagates [`Self::estimate_macros`] failures.
    pub async fn ensure_macros(&self, recipe: Recipe) -> AppResult<Recipe> {
        if recipe.macros.is_some_and(|macros| !macros.is_empty()) {
            return Ok(recipe);
        }
        self.estimate_macros(recipe).await
    }

    /// Rewrite a recipe toward a goal
    ///
    /// With a profile, the per-serving target comes from the profile's daily
    /// targets (computed for the requested goal) divided by `meals_per_day`.
    /// Without one, the recipe's own macros are scaled by the goal.
    ///
    /// # Errors
    ///
    /// Fails on invalid profile stats or meal counts, or if an LLM call fails.
    #[instrument(skip(self, recipe, profile), fields(title = %recipe.title, goal = %goal))]
    pub async fn generate_goal_variant(
        &self,
        recipe: Recipe,
        goal: Goal,
        profile: Option<&NutritionProfile>,
        meals_per_day: u8,
    ) -> AppResult<GoalVariant> {
        let original = self.ensure_macros(recipe).await?;

        let daily_targets = profile
            .map(|profile| {
                let for_goal = NutritionProfile {
                    goal,
                    ..profile.clone()
                };
                calculate_daily_targets(&for_goal, &self.nutrition)
            })
            .transpose()?;

        let plan = plan_goal_variant(
            &original,
            goal,
            daily_targets.as_ref(),
            meals_per_day,
            &self.nutrition.goals,
        )?;

        let conditions: &[DietaryCondition] =
            profile.map(|profile| profile.dietary_conditions.as_slice()).unwrap_or_default();

        let payload = json!({
            "goal": goal,
            "target_per_serving": plan.target_per_serving,
            "guidance": plan.guidance,
            "dietary_restrictions": conditions.iter().map(DietaryCondition::as_str).collect::<Vec<_>>(),
            "recipe": original,
        });
        let messages = vec![
            ChatMessage::system(prompts::goal_variant_prompt()),
            ChatMessage::user(serde_json::to_string_pretty(&payload)?),
        ];
        let json_text = self.complete_json("goal_variant", messages).await?;

        let mut variant = Self::parse_recipe(&json_text)?;
        variant.source_url.clone_from(&original.source_url);
        let variant = variant
            .normalized()
            .map_err(|_| AppError::invalid_format("Model returned an empty recipe variant"))?;
        let mut variant = self.ensure_macros(variant).await?;
        reconcile_macros(&mut variant, self.nutrition.macro_tolerance);

        let warnings = match (original.per_serving_macros(), variant.per_serving_macros()) {
            (Some(before), Some(after)) => check_goal_variant(&before, &after, goal),
            _ => Vec::new(),
        };
        let dietary_flags = flag_ingredients(&variant.ingredients, conditions);

        if !warnings.is_empty() || !dietary_flags.is_empty() {
            warn!(
                warnings = warnings.len(),
                dietary_flags = dietary_flags.len(),
                "Goal variant needs review"
            );
        }

        Ok(GoalVariant {
            goal,
            recipe: variant,
            plan,
            daily_targets,
            warnings,
            dietary_flags,
        })
    }
}
