//! Cache key canonicalization
//!
//! Keys are canonical strings of the form `workspace:tool:argsJSON` so that
//! path- and tool-based invalidation can match on key segments. Object keys
//! are serialized in sorted order; two argument maps that differ only in key
//! order produce the same key. Array element order is preserved.

use serde_json::Value;

/// Key segment used when a call has no workspace
pub const GLOBAL_WORKSPACE: &str = "global";

/// Serialize a JSON value with object keys sorted recursively
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            // serde_json string serialization is infallible
            out.push_str(&Value::String(s.clone()).to_string());
        }
        Value::Array(arr) => {
            out.push('[');
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                if let Some(v) = obj.get(key) {
                    write_canonical(v, out);
                }
            }
            out.push('}');
        }
    }
}

/// Build the canonical cache key for a call
pub fn cache_key(workspace: Option<&str>, tool: &str, arguments: &Value) -> String {
    format!(
        "{}:{}:{}",
        workspace.unwrap_or(GLOBAL_WORKSPACE),
        tool,
        canonical_json(arguments)
    )
}

/// Key prefix shared by every entry of a workspace
pub fn workspace_prefix(workspace: Option<&str>) -> String {
    format!("{}:", workspace.unwrap_or(GLOBAL_WORKSPACE))
}
