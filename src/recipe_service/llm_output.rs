// ABOUTME: Lenient wire types for recipe and macro JSON returned by the LLM
// ABOUTME: Accepts string-or-object ingredients, numeric-or-string servings, and loose macro keys
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use clipchef_intelligence::{Confidence, Ingredient, MacroTotals, Recipe};
use serde::Deserialize;
use serde_json::Value;

/// Recipe object as a model actually writes it
#[derive(Debug, Default, Deserialize)]
pub(super) struct ExtractedRecipe {
    #[serde(default, alias = "name")]
    title: Option<String>,
    #[serde(default, alias = "serves", alias = "yield")]
    servings: Option<Value>,
    #[serde(default)]
    ingredients: Vec<ExtractedIngredient>,
    #[serde(default, alias = "instructions", alias = "method")]
    steps: Vec<Value>,
    #[serde(default, alias = "nutrition")]
    macros: Option<ExtractedMacros>,
    #[serde(default)]
    assumptions: Vec<String>,
    #[serde(default)]
    confidence: Option<ExtractedConfidence>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExtractedIngredient {
    Structured {
        #[serde(alias = "ingredient", alias = "item")]
        name: String,
        #[serde(default, alias = "amount")]
        quantity: Option<Value>,
    },
    Plain(String),
}

/// Macro totals with the key spellings models commonly use
#[derive(Debug, Default, Deserialize)]
pub(super) struct ExtractedMacros {
    #[serde(default, alias = "kcal", alias = "energy_kcal")]
    calories: Option<f64>,
    #[serde(default, alias = "protein")]
    protein_g: Option<f64>,
    #[serde(default, alias = "carbs", alias = "carbohydrates_g", alias = "carbohydrates")]
    carbs_g: Option<f64>,
    #[serde(default, alias = "fat")]
    fat_g: Option<f64>,
}

impl ExtractedMacros {
    /// Convert to totals, or `None` when nothing was estimated
    pub(super) fn into_totals(self) -> Option<MacroTotals> {
        let totals = MacroTotals {
            calories: self.calories.unwrap_or_default(),
            protein_g: self.protein_g.unwrap_or_default(),
            carbs_g: self.carbs_g.unwrap_or_default(),
            fat_g: self.fat_g.unwrap_or_default(),
        };
        (!totals.is_empty()).then_some(totals)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExtractedConfidence {
    Score(f64),
    Detailed {
        #[serde(default)]
        recipe: Option<f64>,
        #[serde(default)]
        macros: Option<f64>,
        #[serde(default)]
        notes: Vec<String>,
    },
}

/// Macro estimate response
#[derive(Debug, Deserialize)]
pub(super) struct MacroEstimate {
    #[serde(default, alias = "nutrition", alias = "totals")]
    pub macros: Option<ExtractedMacros>,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Object(map) => ["text", "instruction", "step", "description"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(ToOwned::to_owned)
            .unwrap_or_default(),
        other => other.to_string(),
    }
}

fn servings_from(value: &Value) -> u32 {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text
            .split(|c: char| !c.is_ascii_digit())
            .find(|part| !part.is_empty())
            .and_then(|digits| digits.parse::<f64>().ok()),
        _ => None,
    };
    parsed
        .filter(|n| n.is_finite() && *n >= 1.0)
        .map_or(1, |n| n.round().min(f64::from(u16::MAX)) as u32)
}

impl ExtractedRecipe {
    /// Build a recipe record (not yet normalized)
    pub(super) fn into_recipe(self) -> Recipe {
        let ingredients = self
            .ingredients
            .into_iter()
            .map(|ingredient| match ingredient {
                ExtractedIngredient::Structured { name, quantity } => {
                    Ingredient::new(name, quantity.as_ref().map(value_text).unwrap_or_default())
                }
                ExtractedIngredient::Plain(line) => Ingredient::new(line, ""),
            })
            .collect();

        let confidence = match self.confidence {
            Some(ExtractedConfidence::Score(score)) => Confidence {
                recipe: score,
                macros: score,
                notes: Vec::new(),
            },
            Some(ExtractedConfidence::Detailed {
                recipe,
                macros,
                notes,
            }) => {
                let fallback = Confidence::default();
                Confidence {
                    recipe: recipe.unwrap_or(fallback.recipe),
                    macros: macros.unwrap_or(fallback.macros),
                    notes,
                }
            }
            None => Confidence::default(),
        };

        Recipe {
            title: self.title.unwrap_or_default(),
            servings: self.servings.as_ref().map_or(1, servings_from),
            ingredients,
            steps: self.steps.iter().map(value_text).collect(),
            macros: self.macros.and_then(ExtractedMacros::into_totals),
            assumptions: self.assumptions,
            confidence,
            source_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loose_shapes_are_accepted() {
        let extracted: ExtractedRecipe = serde_json::from_str(
            r#"{
                "name": "Overnight oats",
                "serves": "2 people",
                "ingredients": ["1 cup oats", {"item": "milk", "amount": 250}],
                "instructions": [{"text": "Mix"}, "Chill overnight"],
                "nutrition": {"kcal": 620, "protein": 24, "carbs": 90, "fat": 16},
                "confidence": 0.8
            }"#,
        )
        .unwrap();

        let recipe = extracted.into_recipe();
        assert_eq!(recipe.title, "Overnight oats");
        assert_eq!(recipe.servings, 2);
        assert_eq!(recipe.ingredients[1], Ingredient::new("milk", "250"));
        assert_eq!(recipe.steps, vec!["Mix", "Chill overnight"]);
        assert!((recipe.macros.unwrap().calories - 620.0).abs() < f64::EPSILON);
        assert!((recipe.confidence.macros - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_all_zero_macros_are_absent() {
        let macros = ExtractedMacros {
            calories: Some(0.0),
            ..ExtractedMacros::default()
        };
        assert!(macros.into_totals().is_none());
    }

    #[test]
    fn test_servings_fallback() {
        assert_eq!(servings_from(&Value::String("a few".to_owned())), 1);
        assert_eq!(servings_from(&serde_json::json!(0)), 1);
        assert_eq!(servings_from(&serde_json::json!(3.6)), 4);
    }
}
