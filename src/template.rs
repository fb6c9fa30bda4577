//! Placeholder substitution for endpoint bodies and query templates.
//!
//! Templates carry two kinds of markers: `{{name}}`, resolved from the
//! caller's arguments, and `{{env:NAME}}`, resolved from the process
//! environment after all argument markers have been applied.

use serde_json::{Map, Value};

const ENV_MARKER: &str = "{{env:";

/// Substitute `{{name}}` and `{{env:NAME}}` markers in `template`.
///
/// Argument substitution is plain textual replacement: string values are
/// inserted as-is, everything else uses its JSON rendering. Markers that
/// match no argument key are left verbatim. Unset environment variables
/// become the empty string; an unterminated `{{env:` marker stops the
/// environment scan and leaves the rest of the string untouched.
pub fn substitute(template: &str, args: &Map<String, Value>) -> String {
    let mut result = template.to_string();

    for (key, value) in args {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, &render_value(value));
    }

    substitute_env(result)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn substitute_env(mut result: String) -> String {
    while let Some(start) = result.find(ENV_MARKER) {
        let Some(end) = result[start..].find("}}").map(|i| start + i) else {
            // Unterminated marker: stop scanning instead of looping forever.
            break;
        };
        let name = &result[start + ENV_MARKER.len()..end];
        let value = std::env::var(name).unwrap_or_default();
        result.replace_range(start..end + 2, &value);
    }
    result
}
