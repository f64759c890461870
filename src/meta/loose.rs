//! @acp:module "Loose Equality"
//! @acp:summary "Coercive value comparison used by lookup-by-value"
//! @acp:domain metadata
//! @acp:layer model
//!
//! Rules:
//! - numbers compare numerically, also against numeric strings
//! - two strings compare numerically when both are numeric, else exactly
//! - `null` and booleans compare by truthiness
//! - arrays compare element-wise, objects key-wise

use serde_json::Value;

/// @acp:summary "Loosely compare two values"
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), other) | (other, Value::Bool(x)) => *x == truthy(other),
        (Value::Null, other) | (other, Value::Null) => !truthy(other),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            numeric(s).is_some_and(|f| Some(f) == n.as_f64())
        }
        (Value::String(x), Value::String(y)) => match (numeric(x), numeric(y)) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| loose_eq(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| loose_eq(v, w)))
        }
        _ => false,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn numeric(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strings() {
        assert!(loose_eq(&json!("draft"), &json!("draft")));
        assert!(!loose_eq(&json!("draft"), &json!("Draft")));
        assert!(loose_eq(&json!("1e1"), &json!("10")));
    }

    #[test]
    fn test_numbers_and_numeric_strings() {
        assert!(loose_eq(&json!(1), &json!("1")));
        assert!(loose_eq(&json!("2.0"), &json!(2)));
        assert!(loose_eq(&json!(1), &json!(1.0)));
        assert!(!loose_eq(&json!(1), &json!("one")));
    }

    #[test]
    fn test_truthiness() {
        assert!(loose_eq(&Value::Null, &json!(false)));
        assert!(loose_eq(&Value::Null, &json!("")));
        assert!(loose_eq(&json!(true), &json!("yes")));
        assert!(loose_eq(&json!(false), &json!("0")));
        assert!(!loose_eq(&Value::Null, &json!("draft")));
    }

    #[test]
    fn test_collections() {
        assert!(loose_eq(&json!([1, "2"]), &json!(["1", 2])));
        assert!(loose_eq(&json!({"a": 1}), &json!({"a": "1"})));
        assert!(!loose_eq(&json!([1]), &json!([1, 2])));
    }
}
