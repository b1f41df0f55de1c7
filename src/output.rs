//! Output formatting and control utilities.
//!
//! CHANGELOG:
//! - 10/16/2026 - Char-safe truncation; drop unused minimal preset
//! - 01/10/2026 - Initial implementation

use serde::Serialize;
use serde_json::{json, Value};

/// Output control settings from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct OutputControls {
    pub json: bool,
    pub compact: bool,
    pub fields: Option<String>,
    pub max_text_chars: Option<u32>,
}

impl OutputControls {
    /// Emit data according to output controls.
    pub fn emit<T: Serialize>(&self, data: &T) -> String {
        let value = serde_json::to_value(data).unwrap_or(json!(null));

        let filtered = match self.fields {
            Some(ref fields) => filter_fields(&value, fields),
            None => value,
        };

        let truncated = match self.max_text_chars {
            Some(max_chars) => truncate_text_fields(&filtered, max_chars as usize),
            None => filtered,
        };

        if self.compact {
            serde_json::to_string(&truncated).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string_pretty(&truncated).unwrap_or_else(|_| "{}".to_string())
        }
    }

    /// Print data to stdout according to output controls.
    pub fn print<T: Serialize>(&self, data: &T) {
        println!("{}", self.emit(data));
    }

    /// Same controls, forced onto one line (for streamed events).
    pub fn line(&self) -> Self {
        Self {
            compact: true,
            ..self.clone()
        }
    }
}

/// Filter JSON value to only include specified fields.
///
/// Applies to objects inside arrays and to the values of single-key wrapper
/// objects such as `{"messages": [...]}`.
fn filter_fields(value: &Value, fields: &str) -> Value {
    let field_list: Vec<&str> = fields.split(',').map(|s| s.trim()).collect();

    match value {
        Value::Array(arr) => Value::Array(arr.iter().map(|v| filter_fields(v, fields)).collect()),
        Value::Object(map) if map.len() == 1 && map.values().all(Value::is_array) => {
            let mut wrapped = serde_json::Map::new();
            for (k, v) in map {
                wrapped.insert(k.clone(), filter_fields(v, fields));
            }
            Value::Object(wrapped)
        }
        Value::Object(map) => {
            let mut filtered = serde_json::Map::new();
            for field in &field_list {
                if let Some(v) = map.get(*field) {
                    filtered.insert(field.to_string(), v.clone());
                }
            }
            Value::Object(filtered)
        }
        _ => value.clone(),
    }
}

/// Truncate string fields in JSON value.
fn truncate_text_fields(value: &Value, max_chars: usize) -> Value {
    match value {
        Value::String(s) if s.chars().count() > max_chars => {
            let head: String = s.chars().take(max_chars).collect();
            Value::String(format!("{}...", head))
        }
        Value::Array(arr) => {
            Value::Array(arr.iter().map(|v| truncate_text_fields(v, max_chars)).collect())
        }
        Value::Object(map) => {
            let mut truncated = serde_json::Map::new();
            for (k, v) in map {
                truncated.insert(k.clone(), truncate_text_fields(v, max_chars));
            }
            Value::Object(truncated)
        }
        _ => value.clone(),
    }
}

/// Format error as JSON.
pub fn format_error(code: &str, error: &str) -> String {
    serde_json::to_string(&json!({
        "error": error,
        "code": code,
        "success": false
    }))
    .unwrap_or_else(|_| format!(r#"{{"error":"{}"}}"#, error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_inside_wrapper() {
        let controls = OutputControls {
            json: true,
            compact: true,
            fields: Some("id,date".to_string()),
            max_text_chars: None,
        };
        let data = json!({"messages": [{"id": "1", "date": 5, "body": "x"}]});
        assert_eq!(controls.emit(&data), r#"{"messages":[{"date":5,"id":"1"}]}"#);
    }

    #[test]
    fn test_truncation_is_char_safe() {
        let controls = OutputControls {
            compact: true,
            max_text_chars: Some(3),
            ..Default::default()
        };
        assert_eq!(controls.emit(&json!("₦₦₦₦₦")), r#""₦₦₦...""#);
    }

    #[test]
    fn test_format_error() {
        let out: Value = serde_json::from_str(&format_error("INVALID_ARGUMENT", "No senders specified")).unwrap();
        assert_eq!(out["success"], json!(false));
        assert_eq!(out["code"], json!("INVALID_ARGUMENT"));
    }
}
