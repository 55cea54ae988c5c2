// ABOUTME: Recipe data model with ingredients, steps, macro totals, and confidence
// ABOUTME: Normalizes LLM output and reconciles stated calories against Atwater energy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! Recipe model
//!
//! Recipes arrive from the LLM with loose shapes. [`Recipe::normalized`] turns
//! them into a consistent record and [`reconcile_macros`] keeps the calorie
//! figure honest relative to the macro grams.

use clipchef_core::constants::energy;
use clipchef_core::errors::AppError;
use serde::{Deserialize, Serialize};

/// Default allowed drift between stated calories and Atwater energy (15%)
pub const DEFAULT_MACRO_TOLERANCE: f64 = 0.15;

const UNTITLED_RECIPE: &str = "Untitled recipe";

/// One ingredient line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ingredient {
    /// Ingredient name ("chicken thigh")
    pub name: String,
    /// Free-text quantity ("2 cups"), may be empty
    #[serde(default)]
    pub quantity: String,
}

impl Ingredient {
    /// Create an ingredient
    #[must_use]
    pub fn new(name: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
        }
    }
}

/// Calories and macro grams
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MacroTotals {
    /// Energy (kcal)
    #[serde(default)]
    pub calories: f64,
    /// Protein (grams)
    #[serde(default)]
    pub protein_g: f64,
    /// Carbohydrates (grams)
    #[serde(default)]
    pub carbs_g: f64,
    /// Fat (grams)
    #[serde(default)]
    pub fat_g: f64,
}

impl MacroTotals {
    /// Energy implied by the macro grams (Atwater 4/4/9)
    #[must_use]
    pub fn energy_from_macros(&self) -> f64 {
        self.protein_g * energy::KCAL_PER_G_PROTEIN
            + self.carbs_g * energy::KCAL_PER_G_CARBS
            + self.fat_g * energy::KCAL_PER_G_FAT
    }

    /// Divide totals across servings (servings below 1 are treated as 1)
    #[must_use]
    pub fn per_serving(&self, servings: u32) -> Self {
        self.scaled(1.0 / f64::from(servings.max(1)))
    }

    /// Multiply every value by `factor`
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein_g: self.protein_g * factor,
            carbs_g: self.carbs_g * factor,
            fat_g: self.fat_g * factor,
        }
    }

    /// True when every value is zero
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calories == 0.0 && self.protein_g == 0.0 && self.carbs_g == 0.0 && self.fat_g == 0.0
    }

    fn sanitized(self) -> Self {
        let clean = |value: f64| if value.is_finite() { value.max(0.0) } else { 0.0 };
        Self {
            calories: clean(self.calories),
            protein_g: clean(self.protein_g),
            carbs_g: clean(self.carbs_g),
            fat_g: clean(self.fat_g),
        }
    }
}

/// Coarse confidence bucket shown in the app
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    /// Below 0.4
    Low,
    /// 0.4 up to 0.75
    Medium,
    /// 0.75 and above
    High,
}

/// How much the extraction and estimate can be trusted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Confidence {
    /// Confidence in the recipe text itself (0-1)
    #[serde(default)]
    pub recipe: f64,
    /// Confidence in the macro estimate (0-1)
    #[serde(default)]
    pub macros: f64,
    /// Free-text reasons behind the scores
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Default for Confidence {
    fn default() -> Self {
        Self {
            recipe: 0.5,
            macros: 0.5,
            notes: Vec::new(),
        }
    }
}

impl Confidence {
    /// Overall bucket, driven by the weaker of the two scores
    #[must_use]
    pub fn level(&self) -> ConfidenceLevel {
        let score = self.recipe.min(self.macros);
        if score < 0.4 {
            ConfidenceLevel::Low
        } else if score < 0.75 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::High
        }
    }

    /// Cap both scores at `ceiling` and record why
    pub fn cap(&mut self, ceiling: f64, note: impl Into<String>) {
        self.recipe = self.recipe.min(ceiling);
        self.macros = self.macros.min(ceiling);
        self.notes.push(note.into());
    }

    fn clamped(mut self) -> Self {
        let clamp = |value: f64| if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
        self.recipe = clamp(self.recipe);
        self.macros = clamp(self.macros);
        self.notes = clean_lines(self.notes);
        self
    }
}

/// Structured recipe extracted from a video, caption, or image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    /// Dish name
    #[serde(default)]
    pub title: String,
    /// Number of servings the totals cover
    #[serde(default = "default_servings")]
    pub servings: u32,
    /// Ingredient list
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    /// Ordered method steps
    #[serde(default)]
    pub steps: Vec<String>,
    /// Whole-recipe macro totals, absent until estimated
    #[serde(default)]
    pub macros: Option<MacroTotals>,
    /// Assumptions made while extracting or estimating
    #[serde(default)]
    pub assumptions: Vec<String>,
    /// Confidence metadata
    #[serde(default)]
    pub confidence: Confidence,
    /// Link the recipe came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

const fn default_servings() -> u32 {
    1
}

impl Recipe {
    /// Clean up a recipe
    ///
    /// Trims text, drops blank ingredients and steps, forces at least one
    /// serving, clamps negative macros to zero, and defaults the title.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if neither ingredients nor steps remain
    pub fn normalized(mut self) -> Result<Self, AppError> {
        self.title = self.title.trim().to_owned();
        if self.title.is_empty() {
            UNTITLED_RECIPE.clone_into(&mut self.title);
        }
        self.servings = self.servings.max(1);

        self.ingredients = self
            .ingredients
            .into_iter()
            .filter_map(|ingredient| {
                let name = ingredient.name.trim();
                (!name.is_empty()).then(|| Ingredient::new(name, ingredient.quantity.trim()))
            })
            .collect();
        self.steps = clean_lines(self.steps);
        self.assumptions = clean_lines(self.assumptions);
        self.macros = self.macros.map(MacroTotals::sanitized);
        self.confidence = self.confidence.clamped();
        self.source_url = self
            .source_url
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty());

        if self.ingredients.is_empty() && self.steps.is_empty() {
            return Err(AppError::invalid_input(
                "Recipe has no ingredients and no steps",
            ));
        }
        Ok(self)
    }

    /// Macro totals for one serving, if macros are known
    #[must_use]
    pub fn per_serving_macros(&self) -> Option<MacroTotals> {
        self.macros.map(|totals| totals.per_serving(self.servings))
    }
}

fn clean_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| line.trim().to_owned())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Bring stated calories in line with the macro grams
///
/// Missing or zero calories are filled from the Atwater energy. Stated
/// calories further than `tolerance` (a fraction) from the Atwater energy are
/// replaced by it, and an assumption is recorded. Returns `true` if the
/// calorie figure changed.
pub fn reconcile_macros(recipe: &mut Recipe, tolerance: f64) -> bool {
    let Some(totals) = recipe.macros.as_mut() else {
        return false;
    };
    let atwater = totals.energy_from_macros();
    if atwater <= 0.0 {
        return false;
    }

    if totals.calories <= 0.0 {
        totals.calories = atwater.round();
        recipe
            .assumptions
            .push("Calories derived from protein, carbs, and fat (4/4/9 kcal per gram)".to_owned());
        return true;
    }

    let drift = (totals.calories - atwater).abs() / atwater;
    if drift > tolerance {
        let stated = totals.calories;
        totals.calories = atwater.round();
        recipe.assumptions.push(format!(
            "Stated calories ({stated:.0} kcal) did not match macros; using {:.0} kcal from 4/4/9 kcal per gram",
            totals.calories
        ));
        return true;
    }
    false
}
