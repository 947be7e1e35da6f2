//! JSON recovery from model responses.

use serde_json::Value;

use super::types::DraftPayload;
use crate::error::EngineError;

/// Extract a JSON object from response text.
///
/// Tries a direct parse, then a fenced code block, then the first
/// balanced `{...}` span (string-aware).
///
/// # Errors
///
/// Returns [`EngineError::JsonParseFailed`] if nothing parses.
pub fn extract_json(text: &str) -> Result<Value, EngineError> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    if let Some(block) = extract_from_code_block(trimmed) {
        if let Ok(value) = serde_json::from_str(&block) {
            return Ok(value);
        }
    }

    if let Some(span) = extract_balanced_braces(trimmed) {
        return serde_json::from_str(&span).map_err(|e| EngineError::JsonParseFailed {
            message: format!(
                "Failed to parse JSON: {e}. Preview: {}",
                truncate_for_preview(text, 100)
            ),
        });
    }

    Err(EngineError::JsonParseFailed {
        message: format!(
            "No JSON object found in response: {}",
            truncate_for_preview(text, 100)
        ),
    })
}

/// Extract and decode a draft payload.
///
/// # Errors
///
/// Returns [`EngineError::JsonParseFailed`] if no JSON is found or the
/// top level is not an object of the expected shape.
pub fn parse_draft(text: &str) -> Result<DraftPayload, EngineError> {
    let value = extract_json(text)?;
    serde_json::from_value(value).map_err(|e| EngineError::JsonParseFailed {
        message: format!("Response JSON does not match the cluster schema: {e}"),
    })
}

fn extract_from_code_block(text: &str) -> Option<String> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let body_start = after_fence.find('\n')?;
    let body = &after_fence[body_start + 1..];
    let end = body.find("```")?;
    let content = body[..end].trim();
    (!content.is_empty()).then(|| content.to_string())
}

fn extract_balanced_braces(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(text[start..=start + i].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

fn truncate_for_preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    }
}
