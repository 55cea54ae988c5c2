// ABOUTME: Deterministic BMR, TDEE, goal calorie, and macro split calculations
// ABOUTME: Turns quiz body stats and a goal into daily and per-meal macro targets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! Nutrition Calculator Module
//!
//! Pure formula evaluation: every function takes its coefficients from
//! [`NutritionConfig`] and performs no I/O, so the same inputs always give the
//! same outputs.
//!
//! Pipeline: BMR → TDEE → goal calorie offset → target calories → macro split.
//!
//! # Scientific References
//!
//! - Mifflin, M.D., et al. (1990). A new predictive equation for resting energy expenditure.
//!   *American Journal of Clinical Nutrition*, 51(2), 241-247.
//!   <https://doi.org/10.1093/ajcn/51.2.241>
//!
//! - `McArdle`, W.D., Katch, F.I., & Katch, V.L. (2010). *Exercise Physiology*.

use crate::config::{ActivityFactorsConfig, BmrConfig, GoalConfig, NutritionConfig};
use crate::dietary::DietaryCondition;
use crate::recipe::MacroTotals;
use clipchef_core::constants::{energy, limits, units};
use clipchef_core::errors::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Biological sex for BMR calculations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    /// Male (+5 kcal constant)
    Male,
    /// Female (-161 kcal constant)
    Female,
}

/// Activity level for TDEE calculation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Sedentary (little/no exercise)
    Sedentary,
    /// Lightly active (1-3 days/week)
    LightlyActive,
    /// Moderately active (3-5 days/week)
    ModeratelyActive,
    /// Very active (6-7 days/week)
    VeryActive,
    /// Extra active (hard training 2x/day)
    ExtraActive,
}

/// Body composition goal chosen in the quiz
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    /// Calorie surplus for muscle gain
    Bulk,
    /// Small surplus for slow gain with minimal fat
    LeanBulk,
    /// Calorie deficit for fat loss
    Cut,
    /// Calorie balance
    Maintain,
}

impl Goal {
    /// Wire name of the goal
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bulk => "bulk",
            Self::LeanBulk => "lean_bulk",
            Self::Cut => "cut",
            Self::Maintain => "maintain",
        }
    }

    /// Every goal, in display order
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Bulk, Self::LeanBulk, Self::Cut, Self::Maintain]
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Goal {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "bulk" => Ok(Self::Bulk),
            "lean_bulk" | "leanbulk" => Ok(Self::LeanBulk),
            "cut" => Ok(Self::Cut),
            "maintain" | "maintenance" => Ok(Self::Maintain),
            other => Err(AppError::invalid_input(format!(
                "Unknown goal '{other}', expected one of bulk, lean_bulk, cut, maintain"
            ))),
        }
    }
}

/// Measurement system used for quiz input
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    /// Kilograms and centimeters
    #[default]
    Metric,
    /// Pounds and inches
    Imperial,
}

/// Body stats in metric units
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BodyStats {
    /// Body weight in kilograms
    pub weight_kg: f64,
    /// Height in centimeters
    pub height_cm: f64,
    /// Age in years
    pub age: u32,
    /// Biological sex
    pub sex: Sex,
}

impl BodyStats {
    /// Build stats from pounds and inches
    #[must_use]
    pub fn from_imperial(weight_lb: f64, height_in: f64, age: u32, sex: Sex) -> Self {
        Self {
            weight_kg: weight_lb * units::KG_PER_LB,
            height_cm: height_in * units::CM_PER_INCH,
            age,
            sex,
        }
    }

    /// Build stats from raw quiz input in either unit system
    #[must_use]
    pub fn from_units(system: UnitSystem, weight: f64, height: f64, age: u32, sex: Sex) -> Self {
        match system {
            UnitSystem::Metric => Self {
                weight_kg: weight,
                height_cm: height,
                age,
                sex,
            },
            UnitSystem::Imperial => Self::from_imperial(weight, height, age, sex),
        }
    }
}

/// Quiz answers needed to compute targets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NutritionProfile {
    /// Body stats in metric units
    pub stats: BodyStats,
    /// Self-reported activity level
    pub activity_level: ActivityLevel,
    /// Body composition goal
    pub goal: Goal,
    /// Allergens and dietary restrictions
    #[serde(default)]
    pub dietary_conditions: Vec<DietaryCondition>,
}

/// Macronutrient percentage breakdown
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MacroPercentages {
    /// Protein as percentage of total calories
    pub protein_percent: f64,
    /// Carbohydrates as percentage of total calories
    pub carbs_percent: f64,
    /// Fat as percentage of total calories
    pub fat_percent: f64,
}

/// Grams of each macro for a calorie budget
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MacroSplit {
    /// Protein (grams)
    pub protein_g: f64,
    /// Carbohydrates (grams)
    pub carbs_g: f64,
    /// Fat (grams)
    pub fat_g: f64,
    /// Percentages the grams were derived from
    pub percentages: MacroPercentages,
}

/// Complete daily target calculation result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyTargets {
    /// Basal Metabolic Rate (BMR) in kcal/day
    pub bmr: f64,
    /// Total Daily Energy Expenditure (TDEE) in kcal/day
    pub tdee: f64,
    /// Goal offset applied to TDEE (kcal/day)
    pub calorie_offset: f64,
    /// Daily calorie target after offset and floor
    pub target_calories: f64,
    /// Daily protein (grams)
    pub protein_g: f64,
    /// Daily carbohydrates (grams)
    pub carbs_g: f64,
    /// Daily fat (grams)
    pub fat_g: f64,
    /// Macronutrient percentages
    pub macro_percentages: MacroPercentages,
    /// Goal used
    pub goal: Goal,
    /// Activity level used
    pub activity_level: ActivityLevel,
    /// Calculation method used
    pub method: String,
}

/// Calculate Basal Metabolic Rate using the Mifflin-St Jeor equation (1990)
///
/// Formula: BMR = (10 x `weight_kg`) + (6.25 x `height_cm`) - (5 x age) + `sex_constant`
/// - Male: +5
/// - Female: -161
///
/// # Arguments
/// * `stats` - Body stats in metric units
/// * `config` - BMR configuration with formula coefficients and floor
///
/// # Reference
/// Mifflin et al. (1990) DOI: 10.1093/ajcn/51.2.241
///
/// # Errors
///
/// Returns an error if input values are out of valid ranges
pub fn calculate_bmr(stats: &BodyStats, config: &BmrConfig) -> Result<f64, AppError> {
    if !(stats.weight_kg > 0.0 && stats.weight_kg <= 300.0) {
        return Err(AppError::invalid_input(
            "Weight must be between 0 and 300 kg",
        ));
    }
    if !(stats.height_cm > 0.0 && stats.height_cm <= 300.0) {
        return Err(AppError::invalid_input(
            "Height must be between 0 and 300 cm",
        ));
    }
    if !(10..=120).contains(&stats.age) {
        return Err(AppError::invalid_input(
            "Age must be between 10 and 120 years (Mifflin-St Jeor formula validated for ages 10+)",
        ));
    }

    let weight_component = config.msj_weight_coef * stats.weight_kg;
    let height_component = config.msj_height_coef * stats.height_cm;
    let age_component = config.msj_age_coef * f64::from(stats.age);

    let sex_constant = match stats.sex {
        Sex::Male => config.msj_male_constant,
        Sex::Female => config.msj_female_constant,
    };

    let bmr = weight_component + height_component + age_component + sex_constant;

    Ok(bmr.max(config.minimum_bmr_kcal))
}

/// Calculate Total Daily Energy Expenditure (TDEE)
///
/// Formula: TDEE = BMR x Activity Factor
///
/// # Reference
/// `McArdle` et al. (2010) - Exercise Physiology
///
/// # Errors
///
/// Returns an error if BMR is not positive
pub fn calculate_tdee(
    bmr: f64,
    activity_level: ActivityLevel,
    config: &ActivityFactorsConfig,
) -> Result<f64, AppError> {
    if bmr.is_nan() || bmr <= 0.0 {
        return Err(AppError::invalid_input("BMR must be positive"));
    }

    let activity_factor = match activity_level {
        ActivityLevel::Sedentary => config.sedentary,
        ActivityLevel::LightlyActive => config.lightly_active,
        ActivityLevel::ModeratelyActive => config.moderately_active,
        ActivityLevel::VeryActive => config.very_active,
        ActivityLevel::ExtraActive => config.extra_active,
    };

    Ok(bmr * activity_factor)
}

/// Daily calorie offset for a goal (kcal, may be negative)
#[must_use]
pub const fn goal_calorie_offset(goal: Goal, config: &GoalConfig) -> f64 {
    config.calorie_offsets.get(goal)
}

/// Daily calorie target: TDEE plus the goal offset, floored at the configured minimum
///
/// # Errors
///
/// Returns an error if TDEE is not positive
pub fn calculate_target_calories(
    tdee: f64,
    goal: Goal,
    config: &GoalConfig,
) -> Result<f64, AppError> {
    if tdee.is_nan() || tdee <= 0.0 {
        return Err(AppError::invalid_input("TDEE must be positive"));
    }
    let target = tdee + goal_calorie_offset(goal, config);
    Ok(target.max(config.minimum_target_kcal))
}

/// Split a calorie budget into macro grams using the goal's percentage table
///
/// Grams = kcal x pct / 100 / energy density (4 kcal/g protein and carbs, 9 kcal/g fat).
///
/// # Errors
///
/// Returns an error if calories are negative or not finite
pub fn calculate_macro_split(
    target_calories: f64,
    goal: Goal,
    config: &GoalConfig,
) -> Result<MacroSplit, AppError> {
    if !target_calories.is_finite() || target_calories < 0.0 {
        return Err(AppError::invalid_input(
            "Target calories must be a non-negative number",
        ));
    }

    let (protein_pct, carbs_pct, fat_pct) = config.macro_distributions.get(goal).as_tuple();
    let share = |pct: u8| target_calories * f64::from(pct) / 100.0;

    Ok(MacroSplit {
        protein_g: share(protein_pct) / energy::KCAL_PER_G_PROTEIN,
        carbs_g: share(carbs_pct) / energy::KCAL_PER_G_CARBS,
        fat_g: share(fat_pct) / energy::KCAL_PER_G_FAT,
        percentages: MacroPercentages {
            protein_percent: f64::from(protein_pct),
            carbs_percent: f64::from(carbs_pct),
            fat_percent: f64::from(fat_pct),
        },
    })
}

/// Calculate complete daily targets for a quiz profile
///
/// # Errors
///
/// Returns an error if any body stat is out of range
pub fn calculate_daily_targets(
    profile: &NutritionProfile,
    config: &NutritionConfig,
) -> Result<DailyTargets, AppError> {
    let bmr = calculate_bmr(&profile.stats, &config.bmr)?;
    let tdee = calculate_tdee(bmr, profile.activity_level, &config.activity_factors)?;
    let calorie_offset = goal_calorie_offset(profile.goal, &config.goals);
    let target_calories = calculate_target_calories(tdee, profile.goal, &config.goals)?;
    let split = calculate_macro_split(target_calories, profile.goal, &config.goals)?;

    Ok(DailyTargets {
        bmr,
        tdee,
        calorie_offset,
        target_calories,
        protein_g: split.protein_g,
        carbs_g: split.carbs_g,
        fat_g: split.fat_g,
        macro_percentages: split.percentages,
        goal: profile.goal,
        activity_level: profile.activity_level,
        method: "Mifflin-St Jeor BMR + activity factor + goal offset".to_owned(),
    })
}

/// Divide daily targets evenly into one meal
///
/// # Errors
///
/// Returns an error if `meals_per_day` is outside 1..=8
pub fn calculate_meal_target(
    daily: &DailyTargets,
    meals_per_day: u8,
) -> Result<MacroTotals, AppError> {
    if !(1..=limits::MAX_MEALS_PER_DAY).contains(&meals_per_day) {
        return Err(AppError::invalid_input(format!(
            "meals_per_day must be between 1 and {}",
            limits::MAX_MEALS_PER_DAY
        )));
    }
    let meals = f64::from(meals_per_day);
    Ok(MacroTotals {
        calories: daily.target_calories / meals,
        protein_g: daily.protein_g / meals,
        carbs_g: daily.carbs_g / meals,
        fat_g: daily.fat_g / meals,
    })
}
