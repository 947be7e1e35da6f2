//! Repair prompt for rejected cluster payloads.

use std::fmt::Display;

/// Build a repair prompt pairing the validation findings with the rejected
/// payload and the first request.
///
/// `previous_json` is embedded verbatim.
#[must_use]
pub fn repair_prompt<E: Display>(original_prompt: &str, previous_json: &str, issues: &[E]) -> String {
    let error_text = issues
        .iter()
        .map(|issue| format!("- {issue}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Your previous JSON did not meet requirements. Fix it.\n\n\
         Errors:\n{error_text}\n\n\
         Original instructions:\n{original_prompt}\n\n\
         Your previous JSON:\n{previous_json}\n\n\
         Return corrected JSON only. Do not add extra text."
    )
}
