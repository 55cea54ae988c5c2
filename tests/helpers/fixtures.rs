// ABOUTME: Recipe and LLM response fixtures shared by integration tests
// ABOUTME: Macro figures are internally consistent (4/4/9 kcal per gram)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use clipchef_intelligence::{Confidence, Ingredient, MacroTotals, Recipe};
use serde_json::{json, Value};

/// Whole-recipe macros for the chicken rice bowl: 60 P, 100 C, 20 F
pub fn bowl_macros() -> MacroTotals {
    MacroTotals {
        calories: 820.0,
        protein_g: 60.0,
        carbs_g: 100.0,
        fat_g: 20.0,
    }
}

/// Recipe JSON as the extraction prompt asks the model to write it
pub fn extracted_recipe_json() -> String {
    json!({
        "title": "Chicken Rice Bowl",
        "servings": 2,
        "ingredients": [
            {"name": "chicken breast", "quantity": "300 g"},
            {"name": "white rice", "quantity": "200 g"},
            {"name": "olive oil", "quantity": "1 tbsp"}
        ],
        "steps": [
            "Cook the rice",
            "Grill the chicken",
            "Slice and serve over rice"
        ],
        "macros": {"calories": 820, "protein_g": 60, "carbs_g": 100, "fat_g": 20},
        "assumptions": ["Rice weight is dry weight"],
        "confidence": {"recipe": 0.9, "macros": 0.7}
    })
    .to_string()
}

/// Same recipe with no macro estimate
pub fn extracted_recipe_without_macros_json() -> String {
    let mut value: Value = serde_json::from_str(&extracted_recipe_json()).unwrap();
    value.as_object_mut().unwrap().remove("macros");
    value.to_string()
}

/// Macro estimation response for the bowl
pub fn macro_estimate_json() -> String {
    json!({
        "macros": {"calories": 820, "protein_g": 60, "carbs_g": 100, "fat_g": 20},
        "assumptions": ["Chicken weighed raw"],
        "confidence": 0.65
    })
    .to_string()
}

/// A higher-protein, higher-calorie bulk rewrite of the bowl: 90 P, 150 C, 30 F
pub fn bulk_variant_json() -> String {
    json!({
        "title": "Chicken Rice Bowl (Bulk)",
        "servings": 2,
        "ingredients": [
            {"name": "chicken breast", "quantity": "450 g"},
            {"name": "white rice", "quantity": "300 g"},
            {"name": "olive oil", "quantity": "1.5 tbsp"},
            {"name": "cheddar cheese", "quantity": "40 g"}
        ],
        "steps": ["Cook the rice", "Grill the chicken", "Top with cheese and serve"],
        "macros": {"calories": 1230, "protein_g": 90, "carbs_g": 150, "fat_g": 30},
        "confidence": {"recipe": 0.8, "macros": 0.6}
    })
    .to_string()
}

/// A cut rewrite that accidentally raises calories: 60 P, 140 C, 30 F
pub fn heavier_cut_variant_json() -> String {
    json!({
        "title": "Chicken Rice Bowl (Cut)",
        "servings": 2,
        "ingredients": [
            {"name": "chicken breast", "quantity": "300 g"},
            {"name": "white rice", "quantity": "280 g"}
        ],
        "steps": ["Cook the rice", "Grill the chicken"],
        "macros": {"calories": 1070, "protein_g": 60, "carbs_g": 140, "fat_g": 30}
    })
    .to_string()
}

/// The bowl as a normalized recipe record
pub fn bowl_recipe() -> Recipe {
    Recipe {
        title: "Chicken Rice Bowl".to_owned(),
        servings: 2,
        ingredients: vec![
            Ingredient::new("chicken breast", "300 g"),
            Ingredient::new("white rice", "200 g"),
            Ingredient::new("olive oil", "1 tbsp"),
        ],
        steps: vec!["Cook the rice".to_owned(), "Grill the chicken".to_owned()],
        macros: Some(bowl_macros()),
        assumptions: Vec::new(),
        confidence: Confidence {
            recipe: 0.9,
            macros: 0.7,
            notes: Vec::new(),
        },
        source_url: None,
    }
}

/// A recipe with ingredients that trip common dietary flags
pub fn pasta_recipe() -> Recipe {
    Recipe {
        title: "Creamy Shrimp Pasta".to_owned(),
        servings: 4,
        ingredients: vec![
            Ingredient::new("spaghetti", "400 g"),
            Ingredient::new("shrimp", "300 g"),
            Ingredient::new("heavy cream", "200 ml"),
            Ingredient::new("garlic", "3 cloves"),
        ],
        steps: vec!["Boil pasta".to_owned(), "Make sauce".to_owned()],
        macros: None,
        assumptions: Vec::new(),
        confidence: Confidence::default(),
        source_url: None,
    }
}
