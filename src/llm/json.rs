// ABOUTME: Extracts a JSON object from free-form LLM output
// ABOUTME: Handles markdown code fences, leading prose, and braces inside strings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use clipchef_core::errors::AppError;
use serde_json::Value;

/// Extract the first balanced JSON object from an LLM response
///
/// Models asked for JSON still wrap it in fences or prefix it with a sentence
/// now and then. The whole response is tried first, then every `{` in order
/// until one starts an object that parses.
///
/// # Errors
///
/// Returns `InvalidFormat` when the text contains no parseable JSON object.
pub fn extract_json_object(text: &str) -> Result<&str, AppError> {
    let trimmed = strip_code_fence(text.trim());
    if trimmed.starts_with('{') && serde_json::from_str::<Value>(trimmed).is_ok() {
        return Ok(trimmed);
    }

    let mut offset = 0;
    while let Some(pos) = text[offset..].find('{') {
        let start = offset + pos;
        if let Some(end) = balanced_object_end(&text[start..]) {
            let candidate = &text[start..start + end];
            if serde_json::from_str::<Value>(candidate).is_ok() {
                return Ok(candidate);
            }
        }
        offset = start + 1;
    }

    Err(AppError::invalid_format(format!(
        "Model response did not contain a JSON object: {}",
        text.chars().take(120).collect::<String>()
    )))
}

/// Remove a surrounding ```json ... ``` fence if present
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the info string ("json", "JSON", or nothing)
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Byte length of the object starting at `text[0] == '{'`, if it closes
fn balanced_object_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        assert_eq!(extract_json_object(r#"{"a": 1}"#).unwrap(), r#"{"a": 1}"#);
    }

    #[test]
    fn test_fenced_object() {
        let text = "```json\n{\"title\": \"Soup\"}\n```";
        assert_eq!(extract_json_object(text).unwrap(), "{\"title\": \"Soup\"}");
    }

    #[test]
    fn test_prose_and_braces_in_strings() {
        let text = r#"Sure! Here it is: {"step": "add {salt}", "n": {"x": 2}} hope that helps {"#;
        assert_eq!(
            extract_json_object(text).unwrap(),
            r#"{"step": "add {salt}", "n": {"x": 2}}"#
        );
    }

    #[test]
    fn test_no_object() {
        let error = extract_json_object("I could not find a recipe.").unwrap_err();
        assert_eq!(error.code, clipchef_core::errors::ErrorCode::InvalidFormat);
    }
}
