// ABOUTME: HTTP integration tests for recipe macro, goal variant, and dietary check routes
// ABOUTME: Uses scripted LLM responses so every figure in the assertions is known up front
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

//! HTTP tests for `/api/recipes/*`

mod helpers;

use clipchef_core::constants::limits::MAX_COMPLETION_TOKENS;
use clipchef_intelligence::Recipe;
use clipchef_server::errors::AppError;
use helpers::axum_test::AxumTestRequest;
use helpers::fixtures::{
    bowl_recipe, bulk_variant_json, heavier_cut_variant_json, macro_estimate_json, pasta_recipe,
};
use helpers::harness::TestHarness;
use serde_json::{json, Value};

fn bowl_without_macros() -> Recipe {
    Recipe {
        macros: None,
        ..bowl_recipe()
    }
}

fn approx(value: &Value, expected: f64) -> bool {
    (value.as_f64().expect("number") - expected).abs() < 0.01
}

// ============================================================================
// POST /api/recipes/macros
// ============================================================================

#[tokio::test]
async fn test_estimate_macros() {
    let harness = TestHarness::builder().build();
    harness.llm.push(macro_estimate_json());

    let response = AxumTestRequest::post("/api/recipes/macros")
        .json(&json!({ "recipe": bowl_without_macros() }))
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert!(approx(&body["recipe"]["macros"]["calories"], 820.0));
    assert!(approx(&body["per_serving"]["calories"], 410.0));
    assert!(approx(&body["per_serving"]["protein_g"], 30.0));
    assert_eq!(body["confidence_level"], "medium");

    let request = &harness.llm.requests()[0];
    assert!(request.json_mode);
    assert_eq!(request.max_tokens, Some(MAX_COMPLETION_TOKENS));
    assert!(request.messages[1].content.contains("chicken breast"));
}

#[tokio::test]
async fn test_estimate_macros_rejects_empty_recipe() {
    let harness = TestHarness::builder().build();

    let response = AxumTestRequest::post("/api/recipes/macros")
        .json(&json!({"recipe": {"title": "Nothing", "ingredients": [], "steps": []}}))
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(harness.llm.call_count(), 0);
}

#[tokio::test]
async fn test_estimate_macros_rejects_empty_estimate() {
    let harness = TestHarness::builder().build();
    harness.llm.push(r#"{"macros": {}, "assumptions": []}"#);

    let response = AxumTestRequest::post("/api/recipes/macros")
        .json(&json!({ "recipe": bowl_without_macros() }))
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INVALID_FORMAT");
}

#[tokio::test]
async fn test_estimate_macros_reports_llm_outage() {
    let harness = TestHarness::builder().build();
    harness
        .llm
        .push_error(AppError::external_service("scripted", "HTTP 500"));

    let response = AxumTestRequest::post("/api/recipes/macros")
        .json(&json!({ "recipe": bowl_without_macros() }))
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 502);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "EXTERNAL_SERVICE_ERROR");
}

// ============================================================================
// POST /api/recipes/goal-variant
// ============================================================================

#[tokio::test]
async fn test_goal_variant_without_profile_scales_recipe() {
    let harness = TestHarness::builder().build();
    harness.llm.push(bulk_variant_json());

    let response = AxumTestRequest::post("/api/recipes/goal-variant")
        .json(&json!({ "recipe": bowl_recipe(), "goal": "bulk" }))
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["goal"], "bulk");
    assert_eq!(body["recipe"]["title"], "Chicken Rice Bowl (Bulk)");
    assert!(approx(&body["plan"]["calorie_scale"], 1.2));
    assert!(approx(&body["plan"]["target_per_serving"]["calories"], 492.0));
    assert!(body["daily_targets"].is_null());
    assert_eq!(body["warnings"].as_array().unwrap().len(), 0);
    assert_eq!(body["dietary_flags"].as_array().unwrap().len(), 0);

    // Original macros were present, so only the rewrite call happens
    assert_eq!(harness.llm.call_count(), 1);
    let prompt = &harness.llm.requests()[0].messages[1].content;
    assert!(prompt.contains("target_per_serving"));
}

#[tokio::test]
async fn test_goal_variant_with_profile_uses_daily_targets_and_flags() {
    let harness = TestHarness::builder().build();
    harness.llm.push(bulk_variant_json());

    let response = AxumTestRequest::post("/api/recipes/goal-variant")
        .json(&json!({
            "recipe": bowl_recipe(),
            "goal": "bulk",
            "meals_per_day": 4,
            "profile": {
                "weight": 80,
                "height": 180,
                "age": 30,
                "sex": "male",
                "activity_level": "moderately_active",
                "goal": "cut",
                "dietary_conditions": ["dairy_free"]
            }
        }))
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();

    // The request goal wins over the quiz goal: 1780 * 1.55 + 500
    assert_eq!(body["daily_targets"]["goal"], "bulk");
    assert!(approx(&body["daily_targets"]["target_calories"], 3259.0));
    assert!(approx(
        &body["plan"]["target_per_serving"]["calories"],
        3259.0 / 4.0
    ));

    let flags = body["dietary_flags"].as_array().unwrap();
    assert_eq!(flags.len(), 1);
    assert_eq!(flags[0]["condition"], "dairy_free");
    assert_eq!(flags[0]["ingredient"], "cheddar cheese");

    let prompt = &harness.llm.requests()[0].messages[1].content;
    assert!(prompt.contains("dairy_free"));
}

#[tokio::test]
async fn test_goal_variant_warns_when_cut_adds_calories() {
    let harness = TestHarness::builder().build();
    harness.llm.push(heavier_cut_variant_json());

    let response = AxumTestRequest::post("/api/recipes/goal-variant")
        .json(&json!({ "recipe": bowl_recipe(), "goal": "cut" }))
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    let warnings = body["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0]
        .as_str()
        .unwrap()
        .starts_with("cut variant raises calories"));
}

#[tokio::test]
async fn test_goal_variant_estimates_missing_macros_first() {
    let harness = TestHarness::builder().build();
    harness
        .llm
        .push(macro_estimate_json())
        .push(bulk_variant_json());

    let response = AxumTestRequest::post("/api/recipes/goal-variant")
        .json(&json!({ "recipe": bowl_without_macros(), "goal": "lean_bulk" }))
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert!(approx(&body["plan"]["original"]["calories"], 410.0));
    assert_eq!(harness.llm.call_count(), 2);
}

#[tokio::test]
async fn test_goal_variant_rejects_unknown_goal() {
    let harness = TestHarness::builder().build();

    let response = AxumTestRequest::post("/api/recipes/goal-variant")
        .json(&json!({ "recipe": bowl_recipe(), "goal": "shred" }))
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(harness.llm.call_count(), 0);
}

#[tokio::test]
async fn test_goal_variant_rejects_bad_meal_count() {
    let harness = TestHarness::builder().build();

    let response = AxumTestRequest::post("/api/recipes/goal-variant")
        .json(&json!({
            "recipe": bowl_recipe(),
            "goal": "maintain",
            "meals_per_day": 12,
            "profile": {
                "weight": 60, "height": 165, "age": 25,
                "sex": "female", "activity_level": "sedentary"
            }
        }))
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(harness.llm.call_count(), 0);
}

// ============================================================================
// POST /api/recipes/dietary-check
// ============================================================================

#[tokio::test]
async fn test_dietary_check_flags_ingredients() {
    let harness = TestHarness::builder().build();

    let response = AxumTestRequest::post("/api/recipes/dietary-check")
        .json(&json!({
            "recipe": pasta_recipe(),
            "conditions": ["gluten_free", "shellfish", "Dairy Free", "garlic"]
        }))
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["compatible"], false);

    let flagged: Vec<(String, String)> = body["flags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|flag| {
            (
                flag["condition"].as_str().unwrap().to_owned(),
                flag["ingredient"].as_str().unwrap().to_owned(),
            )
        })
        .collect();
    assert_eq!(
        flagged,
        vec![
            ("gluten_free".to_owned(), "spaghetti".to_owned()),
            ("shellfish_allergy".to_owned(), "shrimp".to_owned()),
            ("dairy_free".to_owned(), "heavy cream".to_owned()),
            ("garlic".to_owned(), "garlic".to_owned()),
        ]
    );
    assert_eq!(harness.llm.call_count(), 0);
}

#[tokio::test]
async fn test_dietary_check_compatible_recipe() {
    let harness = TestHarness::builder().build();

    let response = AxumTestRequest::post("/api/recipes/dietary-check")
        .json(&json!({ "recipe": bowl_recipe(), "conditions": ["gluten_free", "peanut_allergy"] }))
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["compatible"], true);
    assert!(body["flags"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_dietary_check_rejects_blank_condition() {
    let harness = TestHarness::builder().build();

    let response = AxumTestRequest::post("/api/recipes/dietary-check")
        .json(&json!({ "recipe": bowl_recipe(), "conditions": ["  "] }))
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 400);
}
