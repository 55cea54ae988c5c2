// ABOUTME: System prompts for LLM interactions loaded at compile time
// ABOUTME: Recipe extraction, macro estimation, and goal variant prompts kept as markdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! # System Prompts
//!
//! Prompts are loaded at compile time from markdown files so they can be
//! edited without touching code. Each one ends with the JSON shape the
//! caller parses.

/// Turns transcript, caption, or image material into a recipe object
pub const RECIPE_EXTRACTION_PROMPT: &str = include_str!("recipe_extraction.md");

/// Estimates whole-recipe macros from ingredients and quantities
pub const MACRO_ESTIMATION_PROMPT: &str = include_str!("macro_estimation.md");

/// Rewrites a recipe toward a bulk, cut, or maintenance target
pub const GOAL_VARIANT_PROMPT: &str = include_str!("goal_variant.md");

/// Get the recipe extraction system prompt
#[must_use]
pub const fn recipe_extraction_prompt() -> &'static str {
    RECIPE_EXTRACTION_PROMPT
}

/// Get the macro estimation system prompt
#[must_use]
pub const fn macro_estimation_prompt() -> &'static str {
    MACRO_ESTIMATION_PROMPT
}

/// Get the goal variant system prompt
#[must_use]
pub const fn goal_variant_prompt() -> &'static str {
    GOAL_VARIANT_PROMPT
}
