//! JSON extraction utilities
//!
//! Text-generation models are asked for bare JSON but do not always comply.
//! Extraction tries, in order:
//! 1. a ```json code block
//! 2. the first array or object found in the text
//! 3. the whole trimmed text, if it looks like JSON
//!
//! Nothing here parses the JSON; callers decode the returned slice and map
//! their own shape errors.

use crate::types::*;
use regex::Regex;
use lazy_static::lazy_static;

lazy_static! {
    static ref CODE_BLOCK_REGEX: Regex = Regex::new(r"```(?:json)?\s*\n([\s\S]*?)\n?```").unwrap();
    static ref JSON_OBJECT_REGEX: Regex = Regex::new(r"\{[\s\S]*\}").unwrap();
    static ref JSON_ARRAY_REGEX: Regex = Regex::new(r"\[[\s\S]*\]").unwrap();
}

/// Extract a JSON document from free-form model text
///
/// # Example
///
/// ```
/// use lazada_rs::utils::json_extractor::extract_json;
///
/// let text = "Here you go:\n```json\n[\"a\", \"b\"]\n```";
/// assert_eq!(extract_json(text).unwrap(), "[\"a\", \"b\"]");
/// ```
pub fn extract_json(text: &str) -> ApiResult<String> {
    extract_from_code_block(text)
        .or_else(|| extract_from_brackets(text))
        .or_else(|| extract_raw_text(text))
        .ok_or_else(|| {
            ApiError::protocol_error(
                "No JSON content found in generated text",
                None,
                Some(sanitize_error_message(text)),
                None::<serde_json::Error>,
                None,
            )
        })
}

fn extract_from_code_block(text: &str) -> Option<String> {
    CODE_BLOCK_REGEX
        .captures(text)
        .map(|captures| captures[1].trim().to_string())
}

/// Arrays first: title lists are arrays, and an array of objects would
/// otherwise be cut down to its inner object span.
fn extract_from_brackets(text: &str) -> Option<String> {
    let array = JSON_ARRAY_REGEX.find(text);
    let object = JSON_OBJECT_REGEX.find(text);
    match (array, object) {
        (Some(a), Some(o)) if o.start() < a.start() => Some(o.as_str().to_string()),
        (Some(a), _) => Some(a.as_str().to_string()),
        (None, Some(o)) => Some(o.as_str().to_string()),
        (None, None) => None,
    }
}

fn extract_raw_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        Some(trimmed.to_string())
    } else {
        None
    }
}
