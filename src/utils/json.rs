use serde_json::Value;

pub enum NullableValue {
    Omitted,
    Null,
    String(String),
}

pub fn classify_nullable(optional_value: Option<&Value>) -> Result<NullableValue, String> {
    match optional_value {
        None => Ok(NullableValue::Omitted),
        Some(Value::Null) => Ok(NullableValue::Null),
        Some(Value::String(s)) => Ok(NullableValue::String(s.to_owned())),
        Some(other) => Err(format!("expected string or null, got {other}")),
    }
}

/// Returns the trimmed string under `field`, rejecting absent, null,
/// non-string and blank values.
pub fn required_text(body: &Value, field: &str) -> Result<String, String> {
    match classify_nullable(body.get(field))? {
        NullableValue::String(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(format!("{field} must not be empty")),
    }
}

pub fn optional_text(body: &Value, field: &str) -> Result<Option<String>, String> {
    match classify_nullable(body.get(field))? {
        NullableValue::Omitted | NullableValue::Null => Ok(None),
        NullableValue::String(text) => {
            let trimmed = text.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
    }
}

pub fn optional_i32(body: &Value, field: &str) -> Result<Option<i32>, String> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_i64()
            .and_then(|value| i32::try_from(value).ok())
            .map(Some)
            .ok_or_else(|| format!("{field} must be a 32-bit integer")),
        Some(other) => Err(format!("expected integer or null for {field}, got {other}")),
    }
}
