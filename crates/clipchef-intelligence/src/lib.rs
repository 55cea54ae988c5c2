// ABOUTME: Nutrition and recipe calculation engine for the Clipchef recipe service
// ABOUTME: Pure functions with no I/O, shared by the API server and its tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

#![deny(unsafe_code)]

//! # Clipchef Intelligence
//!
//! Deterministic calculations behind the recipe service:
//!
//! - **`nutrition_calculator`**: BMR (Mifflin-St Jeor), TDEE, goal calorie offset, macro split
//! - **config**: tunable coefficients and goal tables with validated defaults
//! - **recipe**: the recipe record produced by extraction, with Atwater reconciliation
//! - **`goal_variant`**: per-serving targets and sanity checks for bulk/cut variants
//! - **dietary**: keyword flags for allergens and dietary conditions
//!
//! Every function here is pure: the same inputs always produce the same outputs.

/// Calculation coefficients and goal tables
pub mod config;
/// Dietary condition keyword matching
pub mod dietary;
/// Goal-driven recipe variant planning and validation
pub mod goal_variant;
/// BMR, TDEE, and goal-based macro calculations
pub mod nutrition_calculator;
/// Recipe record and macro reconciliation
pub mod recipe;

pub use config::{
    ActivityFactorsConfig, BmrConfig, ConfigError, GoalConfig, GoalTable, MacroDistribution,
    NutritionConfig,
};
pub use dietary::{flag_ingredients, DietaryCondition, DietaryFlag};
pub use goal_variant::{check_goal_variant, plan_goal_variant, GoalVariantPlan};
pub use nutrition_calculator::{
    calculate_bmr, calculate_daily_targets, calculate_macro_split, calculate_meal_target,
    calculate_target_calories, calculate_tdee, goal_calorie_offset, ActivityLevel, BodyStats,
    DailyTargets, Goal, MacroPercentages, MacroSplit, NutritionProfile, Sex, UnitSystem,
};
pub use recipe::{
    reconcile_macros, Confidence, ConfidenceLevel, Ingredient, MacroTotals, Recipe,
    DEFAULT_MACRO_TOLERANCE,
};
