// ABOUTME: Plans and checks goal-driven recipe variants (bulk, lean bulk, cut, maintain)
// ABOUTME: Derives per-serving macro targets and flags variants that move the wrong way
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! Goal variant planning
//!
//! The LLM rewrites a recipe toward a goal; this module decides the numbers
//! it should aim for and checks what comes back.

use crate::config::GoalConfig;
use crate::nutrition_calculator::{calculate_meal_target, DailyTargets, Goal};
use crate::recipe::{MacroTotals, Recipe};
use clipchef_core::constants::energy;
use clipchef_core::errors::AppError;
use serde::{Deserialize, Serialize};

/// Maintain variants may drift this far from the original calories
const MAINTAIN_CALORIE_BAND: f64 = 0.10;

/// Numeric plan handed to the variant prompt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalVariantPlan {
    /// Goal the variant targets
    pub goal: Goal,
    /// Original per-serving macros, if known
    pub original: Option<MacroTotals>,
    /// Macros one serving of the variant should land near
    pub target_per_serving: MacroTotals,
    /// Target calories divided by original calories
    pub calorie_scale: f64,
    /// Cooking guidance for the goal
    pub guidance: Vec<String>,
}

/// Build the per-serving target for a goal variant
///
/// With daily targets the variant aims at one meal's share of the day.
/// Without them the original per-serving macros are scaled by the goal's
/// recipe scale, keeping protein at least level for every goal except maintain.
///
/// # Errors
///
/// Returns `InvalidInput` if the recipe has no macros and no daily targets are
/// given, or if `meals_per_day` is out of range
pub fn plan_goal_variant(
    recipe: &Recipe,
    goal: Goal,
    daily: Option<&DailyTargets>,
    meals_per_day: u8,
    config: &GoalConfig,
) -> Result<GoalVariantPlan, AppError> {
    let original = recipe.per_serving_macros().filter(|m| !m.is_empty());

    let (target_per_serving, calorie_scale) = if let Some(daily) = daily {
        let target = calculate_meal_target(daily, meals_per_day)?;
        let scale = original
            .filter(|m| m.calories > 0.0)
            .map_or(1.0, |m| target.calories / m.calories);
        (target, scale)
    } else {
        let base = original.ok_or_else(|| {
            AppError::invalid_input(
                "Recipe has no macro estimate; provide a profile or estimate macros first",
            )
        })?;
        let scale = config.recipe_calorie_scale.get(goal);
        (scale_toward_goal(&base, goal, scale), scale)
    };

    Ok(GoalVariantPlan {
        goal,
        original,
        target_per_serving,
        calorie_scale,
        guidance: guidance_for(goal),
    })
}

fn scale_toward_goal(base: &MacroTotals, goal: Goal, scale: f64) -> MacroTotals {
    let protein_factor = if goal == Goal::Maintain {
        1.0
    } else {
        scale.max(1.0)
    };
    let calories = base.calories * scale;
    let protein_g = base.protein_g * protein_factor;

    // Remaining energy keeps the original carb:fat energy ratio
    let remaining = (calories - protein_g * energy::KCAL_PER_G_PROTEIN).max(0.0);
    let carb_kcal = base.carbs_g * energy::KCAL_PER_G_CARBS;
    let fat_kcal = base.fat_g * energy::KCAL_PER_G_FAT;
    let non_protein = carb_kcal + fat_kcal;
    let (carbs_g, fat_g) = if non_protein > 0.0 {
        (
            remaining * carb_kcal / non_protein / energy::KCAL_PER_G_CARBS,
            remaining * fat_kcal / non_protein / energy::KCAL_PER_G_FAT,
        )
    } else {
        (base.carbs_g * scale, base.fat_g * scale)
    };

    MacroTotals {
        calories,
        protein_g,
        carbs_g,
        fat_g,
    }
}

fn guidance_for(goal: Goal) -> Vec<String> {
    let lines: &[&str] = match goal {
        Goal::Bulk => &[
            "Increase portion size and add calorie-dense sides such as rice, pasta, or bread",
            "Add healthy fats like olive oil, nuts, or avocado",
            "Keep a generous protein source in every serving",
        ],
        Goal::LeanBulk => &[
            "Add a modest amount of complex carbohydrates",
            "Increase lean protein slightly",
            "Avoid adding extra oil, butter, or sugary sauces",
        ],
        Goal::Cut => &[
            "Keep or increase lean protein",
            "Reduce added oils, butter, cheese, and sugar",
            "Bulk the dish up with non-starchy vegetables",
            "Swap refined carbs for smaller portions or lower-calorie alternatives",
        ],
        Goal::Maintain => &[
            "Keep calories close to the original",
            "Balance the plate with protein, vegetables, and whole grains",
        ],
    };
    lines.iter().map(|line| (*line).to_owned()).collect()
}

/// Warn when a variant moves calories or protein the wrong way for its goal
#[must_use]
pub fn check_goal_variant(original: &MacroTotals, variant: &MacroTotals, goal: Goal) -> Vec<String> {
    let mut warnings = Vec::new();
    let calorie_delta = variant.calories - original.calories;

    match goal {
        Goal::Bulk | Goal::LeanBulk if calorie_delta < 0.0 => warnings.push(format!(
            "{goal} variant lowers calories ({:.0} → {:.0} kcal per serving)",
            original.calories, variant.calories
        )),
        Goal::Cut if calorie_delta > 0.0 => warnings.push(format!(
            "cut variant raises calories ({:.0} → {:.0} kcal per serving)",
            original.calories, variant.calories
        )),
        Goal::Maintain if original.calories > 0.0 => {
            let drift = calorie_delta.abs() / original.calories;
            if drift > MAINTAIN_CALORIE_BAND {
                warnings.push(format!(
                    "maintain variant changes calories by {:.0}% (more than {:.0}%)",
                    drift * 100.0,
                    MAINTAIN_CALORIE_BAND * 100.0
                ));
            }
        }
        _ => {}
    }

    if matches!(goal, Goal::Cut | Goal::LeanBulk) && variant.protein_g < original.protein_g {
        warnings.push(format!(
            "{goal} variant lowers protein ({:.0} g → {:.0} g per serving)",
            original.protein_g, variant.protein_g
        ));
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{Confidence, Ingredient};

    fn recipe() -> Recipe {
        Recipe {
            title: "Pasta".to_owned(),
            servings: 2,
            ingredients: vec![Ingredient::new("pasta", "200 g")],
            steps: vec!["Boil".to_owned()],
            macros: Some(MacroTotals {
                calories: 1200.0,
                protein_g: 60.0,
                carbs_g: 160.0,
                fat_g: 35.0,
            }),
            assumptions: vec![],
            confidence: Confidence::default(),
            source_url: None,
        }
    }

    #[test]
    fn test_cut_scale_keeps_protein() {
        let plan =
            plan_goal_variant(&recipe(), Goal::Cut, None, 3, &GoalConfig::default()).unwrap();
        assert!((plan.calorie_scale - 0.8).abs() < f64::EPSILON);
        assert!((plan.target_per_serving.calories - 480.0).abs() < 1e-9);
        assert!((plan.target_per_serving.protein_g - 30.0).abs() < 1e-9);
        assert!(!plan.guidance.is_empty());
    }

    #[test]
    fn test_bulk_scales_protein_up() {
        let plan =
            plan_goal_variant(&recipe(), Goal::Bulk, None, 3, &GoalConfig::default()).unwrap();
        assert!((plan.target_per_serving.calories - 720.0).abs() < 1e-9);
        assert!((plan.target_per_serving.protein_g - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_plan_requires_macros_without_profile() {
        let mut bare = recipe();
        bare.macros = None;
        assert!(plan_goal_variant(&bare, Goal::Cut, None, 3, &GoalConfig::default()).is_err());
    }

    #[test]
    fn test_check_flags_wrong_direction() {
        let original = MacroTotals {
            calories: 600.0,
            protein_g: 30.0,
            carbs_g: 70.0,
            fat_g: 20.0,
        };
        let higher = original.scaled(1.2);
        let lower = original.scaled(0.8);

        assert!(check_goal_variant(&original, &higher, Goal::Bulk).is_empty());
        assert_eq!(check_goal_variant(&original, &lower, Goal::Bulk).len(), 1);
        assert_eq!(check_goal_variant(&original, &higher, Goal::Cut).len(), 1);
        // cut variant that also drops protein
        assert_eq!(check_goal_variant(&original, &lower, Goal::Cut).len(), 1);
        assert_eq!(check_goal_variant(&original, &higher, Goal::Maintain).len(), 1);
        assert!(check_goal_variant(&original, &original.scaled(1.05), Goal::Maintain).is_empty());
    }
}
