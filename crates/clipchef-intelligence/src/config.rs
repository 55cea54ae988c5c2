// ABOUTME: Nutrition configuration for BMR, activity factors, and goal tables
// ABOUTME: Holds the coefficients behind every calculation with validated defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! Nutrition Calculation Configuration
//!
//! Every constant used by the calculator lives here so the formulas themselves
//! stay free of magic numbers and tests can run against alternate tables.
//!
//! # Scientific References
//!
//! - BMR: Mifflin et al. (1990) DOI: 10.1093/ajcn/51.2.241
//! - Activity factors: `McArdle`, Katch & Katch (2010) Exercise Physiology

use crate::nutrition_calculator::Goal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Macro percentages do not add up to 100
    #[error("invalid macro distribution: {0}")]
    InvalidDistribution(String),
    /// A numeric setting is outside its accepted range
    #[error("value out of range: {0}")]
    ValueOutOfRange(String),
}

/// Complete configuration for the nutrition calculator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutritionConfig {
    /// Basal Metabolic Rate (BMR) calculation settings
    pub bmr: BmrConfig,
    /// Activity factor multipliers for TDEE calculation
    pub activity_factors: ActivityFactorsConfig,
    /// Goal offsets, macro ratios, and recipe scaling
    pub goals: GoalConfig,
    /// Fractional tolerance between stated calories and Atwater energy
    #[serde(default = "default_macro_tolerance")]
    pub macro_tolerance: f64,
}

const fn default_macro_tolerance() -> f64 {
    0.15
}

impl NutritionConfig {
    /// Validate every section of the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` naming the first invalid value found
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bmr.validate()?;
        self.activity_factors.validate()?;
        self.goals.validate()?;
        if !(0.0..1.0).contains(&self.macro_tolerance) {
            return Err(ConfigError::ValueOutOfRange(format!(
                "macro_tolerance must be in [0, 1), got {}",
                self.macro_tolerance
            )));
        }
        Ok(())
    }
}

/// BMR (Basal Metabolic Rate) calculation configuration
///
/// Reference: Mifflin, M.D., et al. (1990). A new predictive equation for resting energy expenditure.
/// American Journal of Clinical Nutrition, 51(2), 241-247. DOI: 10.1093/ajcn/51.2.241
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BmrConfig {
    /// Mifflin-St Jeor weight coefficient (10.0)
    pub msj_weight_coef: f64,
    /// Mifflin-St Jeor height coefficient (6.25)
    pub msj_height_coef: f64,
    /// Mifflin-St Jeor age coefficient (-5.0)
    pub msj_age_coef: f64,
    /// Mifflin-St Jeor male constant (+5)
    pub msj_male_constant: f64,
    /// Mifflin-St Jeor female constant (-161)
    pub msj_female_constant: f64,
    /// Safety floor applied to the computed BMR (kcal/day)
    pub minimum_bmr_kcal: f64,
}

impl Default for BmrConfig {
    fn default() -> Self {
        Self {
            msj_weight_coef: 10.0,
            msj_height_coef: 6.25,
            msj_age_coef: -5.0,
            msj_male_constant: 5.0,
            msj_female_constant: -161.0,
            minimum_bmr_kcal: 1000.0,
        }
    }
}

impl BmrConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.msj_weight_coef <= 0.0 || self.msj_height_coef <= 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "BMR weight and height coefficients must be positive".to_owned(),
            ));
        }
        if self.minimum_bmr_kcal < 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "minimum_bmr_kcal must not be negative".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Activity factor multipliers for TDEE calculation
///
/// Reference: `McArdle`, W.D., Katch, F.I., & Katch, V.L. (2010). Exercise Physiology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityFactorsConfig {
    /// Sedentary (little/no exercise): 1.2
    pub sedentary: f64,
    /// Lightly active (1-3 days/week): 1.375
    pub lightly_active: f64,
    /// Moderately active (3-5 days/week): 1.55
    pub moderately_active: f64,
    /// Very active (6-7 days/week): 1.725
    pub very_active: f64,
    /// Extra active (hard training 2x/day): 1.9
    pub extra_active: f64,
}

impl Default for ActivityFactorsConfig {
    fn default() -> Self {
        Self {
            sedentary: 1.2,
            lightly_active: 1.375,
            moderately_active: 1.55,
            very_active: 1.725,
            extra_active: 1.9,
        }
    }
}

impl ActivityFactorsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let factors = [
            ("sedentary", self.sedentary),
            ("lightly_active", self.lightly_active),
            ("moderately_active", self.moderately_active),
            ("very_active", self.very_active),
            ("extra_active", self.extra_active),
        ];
        for (name, factor) in factors {
            if !(1.0..=2.5).contains(&factor) {
                return Err(ConfigError::ValueOutOfRange(format!(
                    "{name} activity factor must be between 1.0 and 2.5, got {factor}"
                )));
            }
        }
        Ok(())
    }
}

/// Macro distribution as whole percentages of calories (protein, carbs, fat)
///
/// All percentages must sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroDistribution {
    /// Protein percentage (0-100)
    pub protein_pct: u8,
    /// Carbohydrate percentage (0-100)
    pub carbs_pct: u8,
    /// Fat percentage (0-100)
    pub fat_pct: u8,
}

impl MacroDistribution {
    /// Create a new macro distribution
    ///
    /// # Panics
    ///
    /// Panics in debug mode if percentages don't sum to 100
    #[must_use]
    pub const fn new(protein_pct: u8, carbs_pct: u8, fat_pct: u8) -> Self {
        debug_assert!(
            protein_pct
                .saturating_add(carbs_pct)
                .saturating_add(fat_pct)
                == 100,
            "Macro percentages must sum to 100"
        );
        Self {
            protein_pct,
            carbs_pct,
            fat_pct,
        }
    }

    /// Get as a tuple (protein, carbs, fat)
    #[must_use]
    pub const fn as_tuple(&self) -> (u8, u8, u8) {
        (self.protein_pct, self.carbs_pct, self.fat_pct)
    }

    const fn sum(&self) -> u16 {
        self.protein_pct as u16 + self.carbs_pct as u16 + self.fat_pct as u16
    }
}

/// One value per goal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalTable<T> {
    /// Value for `bulk`
    pub bulk: T,
    /// Value for `lean_bulk`
    pub lean_bulk: T,
    /// Value for `cut`
    pub cut: T,
    /// Value for `maintain`
    pub maintain: T,
}

impl<T: Copy> GoalTable<T> {
    /// Look up the value for a goal
    #[must_use]
    pub const fn get(&self, goal: Goal) -> T {
        match goal {
            Goal::Bulk => self.bulk,
            Goal::LeanBulk => self.lean_bulk,
            Goal::Cut => self.cut,
            Goal::Maintain => self.maintain,
        }
    }

    fn entries(&self) -> [(Goal, T); 4] {
        [
            (Goal::Bulk, self.bulk),
            (Goal::LeanBulk, self.lean_bulk),
            (Goal::Cut, self.cut),
            (Goal::Maintain, self.maintain),
        ]
    }
}

/// Goal-specific calorie offsets, macro ratios, and recipe scaling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalConfig {
    /// Daily kcal added to TDEE for each goal
    pub calorie_offsets: GoalTable<f64>,
    /// Macro split of the target calories for each goal
    pub macro_distributions: GoalTable<MacroDistribution>,
    /// Calorie multiplier applied to a recipe when no profile is known
    pub recipe_calorie_scale: GoalTable<f64>,
    /// Floor for daily target calories (kcal)
    pub minimum_target_kcal: f64,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            calorie_offsets: GoalTable {
                bulk: 500.0,
                lean_bulk: 250.0,
                cut: -500.0,
                maintain: 0.0,
            },
            macro_distributions: GoalTable {
                // Surplus carried mostly by carbs to fuel training volume
                bulk: MacroDistribution::new(25, 50, 25),
                lean_bulk: MacroDistribution::new(30, 45, 25),
                // High protein protects lean mass in a deficit
                cut: MacroDistribution::new(40, 30, 30),
                maintain: MacroDistribution::new(30, 40, 30),
            },
            recipe_calorie_scale: GoalTable {
                bulk: 1.20,
                lean_bulk: 1.10,
                cut: 0.80,
                maintain: 1.00,
            },
            minimum_target_kcal: 1200.0,
        }
    }
}

impl GoalConfig {
    /// Validate goal tables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDistribution` if a macro split does not sum to 100,
    /// or `ConfigError::ValueOutOfRange` for non-positive scales or floors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (goal, distribution) in self.macro_distributions.entries() {
            let sum = distribution.sum();
            if sum != 100 {
                return Err(ConfigError::InvalidDistribution(format!(
                    "{} macro percentages must sum to 100, got {sum}",
                    goal.as_str()
                )));
            }
        }
        for (goal, scale) in self.recipe_calorie_scale.entries() {
            if scale <= 0.0 {
                return Err(ConfigError::ValueOutOfRange(format!(
                    "{} recipe scale must be positive, got {scale}",
                    goal.as_str()
                )));
            }
        }
        if self.minimum_target_kcal <= 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "minimum_target_kcal must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}
