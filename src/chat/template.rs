//! Pre-templating of outgoing text.
//!
//! Error reports pasted from automation tooling arrive as JSON blobs. When the
//! input is valid JSON it is wrapped into a fixed remediation prompt for the
//! agent; the JSON is only validity-checked as the trigger condition, never
//! interpreted.

/// Wraps `text` into the remediation prompt when it parses as JSON, otherwise
/// returns it verbatim. Any JSON value triggers the rewrite, matching the
/// behavior of `JSON.parse` in the original widget.
pub fn rewrite_json_report(text: &str) -> String {
    if serde_json::from_str::<serde_json::Value>(text).is_ok() {
        format!(
            "Find a job template to solve the following error: '{}' \
             If you find a solution, launch the job template with the relevant inventory. \
             If you need an incident number, obtain one with the create_incident tool.",
            text
        )
    } else {
        text.to_string()
    }
}
