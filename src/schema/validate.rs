//! Recursive validation and canonicalization.
//!
//! [`check`] walks a value alongside its schema, records every violation
//! with its field path, and builds the canonical form as it goes: undeclared
//! object keys are dropped, `null` optionals are removed, and defaults are
//! filled in.

use super::{FieldSchema, NumberRules, StringRules};
use crate::error::Violation;
use crate::media::DataUri;
use serde_json::{Map, Number, Value};

fn child_path(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", parent, field)
    }
}

fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(expected: &str, value: &Value) -> String {
    format!("expected {}, got {}", expected, type_name(value))
}

/// Validate `value` against `schema` at `path`, pushing violations and
/// returning the canonical value (meaningless if violations were pushed).
pub(crate) fn check(
    schema: &FieldSchema,
    value: &Value,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Value {
    match schema {
        FieldSchema::String(rules) => check_string(rules, value, path, violations),
        FieldSchema::Number(rules) => check_number(rules, value, path, violations),
        FieldSchema::Boolean => {
            if !value.is_boolean() {
                violations.push(Violation::new(path, mismatch("boolean", value)));
            }
            value.clone()
        }
        FieldSchema::DataUri => match value {
            Value::String(s) => {
                if let Err(e) = DataUri::parse(s) {
                    violations.push(Violation::new(path, e.to_string()));
                }
                value.clone()
            }
            other => {
                violations.push(Violation::new(path, mismatch("data URI string", other)));
                value.clone()
            }
        },
        FieldSchema::Array(element) => match value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| check(element, item, &index_path(path, i), violations))
                    .collect(),
            ),
            other => {
                violations.push(Violation::new(path, mismatch("array", other)));
                value.clone()
            }
        },
        FieldSchema::Object(obj) => match value {
            Value::Object(map) => {
                let mut out = Map::new();
                for (name, field) in obj.fields() {
                    let field_path = child_path(path, name);
                    match (map.get(name), field) {
                        (None | Some(Value::Null), FieldSchema::Optional(_)) => {}
                        (None | Some(Value::Null), FieldSchema::Defaulted(_, default)) => {
                            out.insert(name.to_string(), default.clone());
                        }
                        (None | Some(Value::Null), _) => {
                            violations.push(Violation::new(field_path, "is required"));
                        }
                        // An empty optional attachment slot means "no attachment".
                        (Some(Value::String(s)), FieldSchema::Optional(inner))
                            if s.is_empty() && matches!(inner.inner(), FieldSchema::DataUri) => {}
                        (Some(v), _) => {
                            let canonical = check(field, v, &field_path, violations);
                            out.insert(name.to_string(), canonical);
                        }
                    }
                }
                Value::Object(out)
            }
            other => {
                violations.push(Violation::new(path, mismatch("object", other)));
                value.clone()
            }
        },
        // Reached only for a root-level or array-element wrapper; object
        // fields handle absence above.
        FieldSchema::Optional(inner) => {
            if value.is_null() {
                Value::Null
            } else {
                check(inner, value, path, violations)
            }
        }
        FieldSchema::Defaulted(inner, default) => {
            if value.is_null() {
                default.clone()
            } else {
                check(inner, value, path, violations)
            }
        }
    }
}

fn check_string(
    rules: &StringRules,
    value: &Value,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Value {
    let Value::String(s) = value else {
        violations.push(Violation::new(path, mismatch("string", value)));
        return value.clone();
    };
    let len = s.chars().count();
    if let Some(min) = rules.min_len {
        if len < min {
            let constraint = if min == 1 {
                "must not be empty".to_string()
            } else {
                format!("must be at least {} characters", min)
            };
            violations.push(Violation::new(path, constraint));
        }
    }
    if let Some(max) = rules.max_len {
        if len > max {
            violations.push(Violation::new(
                path,
                format!("must be at most {} characters", max),
            ));
        }
    }
    value.clone()
}

fn fmt_bound(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn check_number(
    rules: &NumberRules,
    value: &Value,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Value {
    let Some(n) = value.as_f64() else {
        violations.push(Violation::new(path, mismatch("number", value)));
        return value.clone();
    };
    if rules.integer && n.fract() != 0.0 {
        violations.push(Violation::new(path, "must be an integer"));
        return value.clone();
    }
    if let Some(min) = rules.min {
        if n < min {
            violations.push(Violation::new(
                path,
                format!("must be at least {}", fmt_bound(min)),
            ));
        }
    }
    if let Some(max) = rules.max {
        if n > max {
            violations.push(Violation::new(
                path,
                format!("must be at most {}", fmt_bound(max)),
            ));
        }
    }
    // Integral floats (`3.0`) canonicalize to integers.
    if rules.integer && !value.is_i64() && !value.is_u64() {
        // `i64::MAX as f64` rounds up to 2^63, which is itself out of range.
        if n < i64::MIN as f64 || n >= i64::MAX as f64 {
            violations.push(Violation::new(path, "is out of integer range"));
            return value.clone();
        }
        return Value::Number(Number::from(n as i64));
    }
    value.clone()
}
