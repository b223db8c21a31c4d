// storefront/src/services/templates.rs

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

static PLACEHOLDER: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").expect("placeholder pattern is valid"));

/// Replaces every `{{ key }}` with the matching top-level value of `data`.
/// Strings are inserted as-is, other values as JSON text. Unknown keys stay in place.
pub fn render(template: &str, data: &Value) -> String {
  PLACEHOLDER
    .replace_all(template, |caps: &Captures| match data.get(&caps[1]) {
      Some(Value::String(s)) => s.clone(),
      Some(other) => other.to_string(),
      None => caps[0].to_string(),
    })
    .into_owned()
}

pub fn fallback_body(template_name: &str, data: &Value) -> String {
  format!("<html><body>Template: {}, Data: {}</body></html>", template_name, data)
}
