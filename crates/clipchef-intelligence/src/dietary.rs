// ABOUTME: Keyword-based dietary restriction and allergen flags for recipe ingredients
// ABOUTME: Matches ingredients against static keyword tables per dietary condition
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! Dietary condition checks
//!
//! Flags are hints for the user, not guarantees: matching is a
//! case-insensitive whole-word search over ingredient names.

use crate::recipe::Ingredient;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Allergen or diet chosen in the quiz
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DietaryCondition {
    /// Avoid wheat, barley, rye
    GlutenFree,
    /// Avoid milk products
    DairyFree,
    /// Tree nut allergy
    NutAllergy,
    /// Peanut allergy
    PeanutAllergy,
    /// Shellfish allergy
    ShellfishAllergy,
    /// Egg allergy
    EggAllergy,
    /// Soy allergy
    SoyAllergy,
    /// No meat or fish
    Vegetarian,
    /// No animal products
    Vegan,
    /// User-entered ingredient to avoid
    Custom(String),
}

impl DietaryCondition {
    /// Wire name of the condition
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::GlutenFree => "gluten_free",
            Self::DairyFree => "dairy_free",
            Self::NutAllergy => "nut_allergy",
            Self::PeanutAllergy => "peanut_allergy",
            Self::ShellfishAllergy => "shellfish_allergy",
            Self::EggAllergy => "egg_allergy",
            Self::SoyAllergy => "soy_allergy",
            Self::Vegetarian => "vegetarian",
            Self::Vegan => "vegan",
            Self::Custom(term) => term,
        }
    }

    fn keywords(&self) -> Vec<&str> {
        match self {
            Self::GlutenFree => GLUTEN.to_vec(),
            Self::DairyFree => DAIRY.to_vec(),
            Self::NutAllergy => TREE_NUTS.to_vec(),
            Self::PeanutAllergy => PEANUTS.to_vec(),
            Self::ShellfishAllergy => SHELLFISH.to_vec(),
            Self::EggAllergy => EGGS.to_vec(),
            Self::SoyAllergy => SOY.to_vec(),
            Self::Vegetarian => [MEAT, FISH].concat(),
            Self::Vegan => [MEAT, FISH, SHELLFISH, DAIRY, EGGS, ANIMAL_OTHER].concat(),
            Self::Custom(term) => vec![term.as_str()],
        }
    }

    /// Phrases that contain a keyword but name a compliant ingredient
    const fn exemptions(&self) -> &'static [&'static str] {
        match self {
            Self::DairyFree | Self::Vegan => PLANT_BASED_DAIRY,
            _ => &[],
        }
    }
}

impl fmt::Display for DietaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DietaryCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Ok(match normalized.as_str() {
            "" => return Err("dietary condition must not be empty".to_owned()),
            "gluten_free" | "gluten" | "celiac" => Self::GlutenFree,
            "dairy_free" | "dairy" | "lactose_intolerant" => Self::DairyFree,
            "nut_allergy" | "tree_nut_allergy" | "nuts" => Self::NutAllergy,
            "peanut_allergy" | "peanuts" => Self::PeanutAllergy,
            "shellfish_allergy" | "shellfish" => Self::ShellfishAllergy,
            "egg_allergy" | "eggs" => Self::EggAllergy,
            "soy_allergy" | "soy" => Self::SoyAllergy,
            "vegetarian" => Self::Vegetarian,
            "vegan" => Self::Vegan,
            _ => Self::Custom(s.trim().to_lowercase()),
        })
    }
}

impl TryFrom<String> for DietaryCondition {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DietaryCondition> for String {
    fn from(condition: DietaryCondition) -> Self {
        condition.as_str().to_owned()
    }
}

const GLUTEN: &[&str] = &[
    "wheat", "flour", "barley", "rye", "bread", "breadcrumbs", "panko", "pasta", "spaghetti",
    "noodles", "couscous", "semolina", "bulgur", "seitan", "tortilla", "soy sauce",
];
const DAIRY: &[&str] = &[
    "milk", "butter", "cheese", "cream", "yogurt", "yoghurt", "ghee", "parmesan", "mozzarella",
    "cheddar", "ricotta", "feta", "whey", "buttermilk", "mascarpone",
];
const PLANT_BASED_DAIRY: &[&str] = &[
    "peanut butter", "almond butter", "cashew butter", "sunflower butter", "sunflower seed butter",
    "nut butter", "seed butter", "apple butter", "cocoa butter", "coconut butter", "vegan butter",
    "coconut milk", "almond milk", "oat milk", "soy milk", "rice milk", "cashew milk", "hemp milk",
    "coconut cream", "coconut yogurt", "cream of tartar", "vegan cheese",
];
const TREE_NUTS: &[&str] = &[
    "almond", "almonds", "cashew", "cashews", "walnut", "walnuts", "pecan", "pecans",
    "pistachio", "pistachios", "hazelnut", "hazelnuts", "macadamia", "pine nuts", "nut",
    "nuts",
];
const PEANUTS: &[&str] = &["peanut", "peanuts", "peanut butter"];
const SHELLFISH: &[&str] = &[
    "shrimp", "prawn", "prawns", "crab", "lobster", "scallop", "scallops", "clam", "clams",
    "mussel", "mussels", "oyster", "oysters", "crayfish",
];
const EGGS: &[&str] = &["egg", "eggs", "mayonnaise", "mayo", "meringue"];
const SOY: &[&str] = &["soy", "soya", "tofu", "tempeh", "edamame", "miso", "soy sauce"];
const MEAT: &[&str] = &[
    "beef", "steak", "pork", "bacon", "ham", "chicken", "turkey", "lamb", "veal", "sausage",
    "chorizo", "prosciutto", "salami", "pepperoni", "duck", "mince", "gelatin",
];
const FISH: &[&str] = &[
    "fish", "salmon", "tuna", "cod", "anchovy", "anchovies", "sardine", "sardines", "tilapia",
    "fish sauce",
];
const ANIMAL_OTHER: &[&str] = &["honey"];

/// One ingredient that conflicts with a dietary condition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DietaryFlag {
    /// Condition the ingredient conflicts with
    pub condition: DietaryCondition,
    /// Ingredient name as written in the recipe
    pub ingredient: String,
    /// Keyword that matched
    pub keyword: String,
}

/// Flag every ingredient that matches a keyword for one of the conditions
///
/// Each (condition, ingredient) pair is reported at most once, with the first
/// matching keyword.
#[must_use]
pub fn flag_ingredients(
    ingredients: &[Ingredient],
    conditions: &[DietaryCondition],
) -> Vec<DietaryFlag> {
    let mut flags = Vec::new();
    for condition in conditions {
        let matchers: Vec<(&str, Regex)> = condition
            .keywords()
            .into_iter()
            .filter_map(|keyword| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(keyword.trim()));
                match Regex::new(&pattern) {
                    Ok(regex) => Some((keyword, regex)),
                    Err(e) => {
                        warn!(keyword, error = %e, "Skipping unmatchable dietary keyword");
                        None
                    }
                }
            })
            .collect();

        let exempt = exemption_matcher(condition.exemptions());

        for ingredient in ingredients {
            let name = match exempt {
                Some(ref regex) => regex.replace_all(&ingredient.name, " "),
                None => Cow::Borrowed(ingredient.name.as_str()),
            };
            if let Some((keyword, _)) = matchers.iter().find(|(_, regex)| regex.is_match(&name)) {
                flags.push(DietaryFlag {
                    condition: condition.clone(),
                    ingredient: ingredient.name.clone(),
                    keyword: (*keyword).to_owned(),
                });
            }
        }
    }
    flags
}

fn exemption_matcher(phrases: &[&str]) -> Option<Regex> {
    if phrases.is_empty() {
        return None;
    }
    let alternatives: Vec<String> = phrases.iter().map(|p| regex::escape(p)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
        .map_err(|e| warn!(error = %e, "Ignoring dietary exemptions"))
        .ok()
}
