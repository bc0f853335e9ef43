//! Schema descriptors and the flow registry.
//!
//! A [`FieldSchema`] is a tagged tree describing the shape of a flow's input
//! or output value. Each node carries its own constraints (string length,
//! numeric bounds, integrality), so validation is a single recursive walk
//! that both checks the value and produces its canonical form.
//!
//! ```
//! use flowai_studio::schema::FieldSchema;
//! use serde_json::json;
//!
//! let schema = FieldSchema::object([
//!     ("topic", FieldSchema::string().min_len(1)),
//!     ("numberOfSlides", FieldSchema::integer().range(1.0, 10.0)),
//!     ("style", FieldSchema::string().optional()),
//! ]);
//!
//! let ok = schema.validate(&json!({"topic": "Rust", "numberOfSlides": 5}));
//! assert!(ok.is_ok());
//!
//! let err = schema.validate(&json!({"topic": "Rust", "numberOfSlides": 15}));
//! assert_eq!(err.unwrap_err()[0].path, "numberOfSlides");
//! ```

pub mod registry;
pub mod validate;

pub use registry::{FlowDefinition, SchemaRegistry};

use serde_json::{json, Map, Value};

/// Length constraints for string fields (counted in characters).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringRules {
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
}

/// Bounds for numeric fields (inclusive).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberRules {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub integer: bool,
}

/// Ordered set of named fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    fields: Vec<(String, FieldSchema)>,
}

impl ObjectSchema {
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A structural type with constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSchema {
    String(StringRules),
    Number(NumberRules),
    Boolean,
    /// A string holding a `data:<mime>;base64,<payload>` URI.
    DataUri,
    Array(Box<FieldSchema>),
    Object(ObjectSchema),
    /// May be absent or `null`.
    Optional(Box<FieldSchema>),
    /// Filled with the given value when absent or `null`.
    Defaulted(Box<FieldSchema>, Value),
}

impl FieldSchema {
    pub fn string() -> Self {
        FieldSchema::String(StringRules::default())
    }

    pub fn number() -> Self {
        FieldSchema::Number(NumberRules::default())
    }

    pub fn integer() -> Self {
        FieldSchema::Number(NumberRules {
            integer: true,
            ..Default::default()
        })
    }

    pub fn boolean() -> Self {
        FieldSchema::Boolean
    }

    pub fn data_uri() -> Self {
        FieldSchema::DataUri
    }

    pub fn array(element: FieldSchema) -> Self {
        FieldSchema::Array(Box::new(element))
    }

    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, FieldSchema)>,
    {
        FieldSchema::Object(ObjectSchema {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    /// An object with no fields; accepts any object and canonicalizes it to `{}`.
    pub fn empty_object() -> Self {
        FieldSchema::Object(ObjectSchema::default())
    }

    /// Set the minimum string length. No effect on non-string schemas.
    pub fn min_len(mut self, n: usize) -> Self {
        if let FieldSchema::String(ref mut rules) = self {
            rules.min_len = Some(n);
        }
        self
    }

    /// Set the maximum string length. No effect on non-string schemas.
    pub fn max_len(mut self, n: usize) -> Self {
        if let FieldSchema::String(ref mut rules) = self {
            rules.max_len = Some(n);
        }
        self
    }

    /// Set the inclusive lower bound. No effect on non-numeric schemas.
    pub fn min(mut self, min: f64) -> Self {
        if let FieldSchema::Number(ref mut rules) = self {
            rules.min = Some(min);
        }
        self
    }

    /// Set the inclusive upper bound. No effect on non-numeric schemas.
    pub fn max(mut self, max: f64) -> Self {
        if let FieldSchema::Number(ref mut rules) = self {
            rules.max = Some(max);
        }
        self
    }

    /// Set both inclusive bounds.
    pub fn range(self, min: f64, max: f64) -> Self {
        self.min(min).max(max)
    }

    pub fn optional(self) -> Self {
        FieldSchema::Optional(Box::new(self))
    }

    pub fn with_default(self, value: Value) -> Self {
        FieldSchema::Defaulted(Box::new(self), value)
    }

    /// The schema with `Optional`/`Defaulted` wrappers removed.
    pub fn inner(&self) -> &FieldSchema {
        match self {
            FieldSchema::Optional(inner) | FieldSchema::Defaulted(inner, _) => inner.inner(),
            other => other,
        }
    }

    /// Whether the field may be omitted by callers.
    pub fn is_optional(&self) -> bool {
        matches!(self, FieldSchema::Optional(_) | FieldSchema::Defaulted(..))
    }

    /// Element schema, if this is (possibly optional) an array.
    pub fn element(&self) -> Option<&FieldSchema> {
        match self.inner() {
            FieldSchema::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Field schema, if this is (possibly optional) an object declaring `name`.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        match self.inner() {
            FieldSchema::Object(obj) => obj.field(name),
            _ => None,
        }
    }

    /// Follow a dotted path of field names through nested objects.
    pub fn resolve<'a, I>(&self, segments: I) -> Option<&FieldSchema>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut current = self;
        for segment in segments {
            current = current.field(segment)?;
        }
        Some(current)
    }

    /// Check `value` and return its canonical form, or every violation found.
    pub fn validate(&self, value: &Value) -> Result<Value, Vec<crate::error::Violation>> {
        let mut violations = Vec::new();
        let canonical = validate::check(self, value, "", &mut violations);
        if violations.is_empty() {
            Ok(canonical)
        } else {
            Err(violations)
        }
    }

    /// A compact JSON-schema rendering, used to tell the model what shape
    /// its structured output must take.
    pub fn describe(&self) -> Value {
        match self {
            FieldSchema::String(rules) => {
                let mut out = json!({"type": "string"});
                if let Some(n) = rules.min_len {
                    out["minLength"] = json!(n);
                }
                if let Some(n) = rules.max_len {
                    out["maxLength"] = json!(n);
                }
                out
            }
            FieldSchema::Number(rules) => {
                let kind = if rules.integer { "integer" } else { "number" };
                let mut out = json!({"type": kind});
                if let Some(min) = rules.min {
                    out["minimum"] = json!(min);
                }
                if let Some(max) = rules.max {
                    out["maximum"] = json!(max);
                }
                out
            }
            FieldSchema::Boolean => json!({"type": "boolean"}),
            FieldSchema::DataUri => json!({"type": "string", "format": "data-uri"}),
            FieldSchema::Array(elem) => json!({"type": "array", "items": elem.describe()}),
            FieldSchema::Object(obj) => {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for (name, field) in obj.fields() {
                    properties.insert(name.to_string(), field.describe());
                    if !field.is_optional() {
                        required.push(Value::String(name.to_string()));
                    }
                }
                json!({
                    "type": "object",
                    "properties": properties,
                    "required": required,
                })
            }
            FieldSchema::Optional(inner) => inner.describe(),
            FieldSchema::Defaulted(inner, default) => {
                let mut out = inner.describe();
                out["default"] = default.clone();
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide() -> FieldSchema {
        FieldSchema::object([
            ("title", FieldSchema::string()),
            ("content", FieldSchema::array(FieldSchema::string())),
        ])
    }

    #[test]
    fn test_builders_only_touch_matching_kind() {
        assert_eq!(FieldSchema::boolean().min_len(3), FieldSchema::Boolean);
        let s = FieldSchema::string().min(1.0);
        assert_eq!(s, FieldSchema::string());
    }

    #[test]
    fn test_resolve_nested_through_optional() {
        let schema = FieldSchema::object([(
            "profile",
            FieldSchema::object([("jobTitle", FieldSchema::string().optional())]).optional(),
        )]);
        let found = schema.resolve(["profile", "jobTitle"]).unwrap();
        assert!(found.is_optional());
        assert!(schema.resolve(["profile", "salary"]).is_none());
    }

    #[test]
    fn test_element_of_optional_array() {
        let schema = FieldSchema::array(slide()).optional();
        assert_eq!(schema.element(), Some(&slide()));
        assert!(FieldSchema::string().element().is_none());
    }

    #[test]
    fn test_describe_marks_required_fields() {
        let schema = FieldSchema::object([
            ("correctedText", FieldSchema::string()),
            ("note", FieldSchema::string().optional()),
        ]);
        let described = schema.describe();
        assert_eq!(described["type"], "object");
        assert_eq!(described["required"], json!(["correctedText"]));
        assert_eq!(described["properties"]["note"]["type"], "string");
    }

    #[test]
    fn test_describe_number_bounds_and_default() {
        let described = FieldSchema::integer()
            .range(1.0, 4.0)
            .with_default(json!(3))
            .describe();
        assert_eq!(described["type"], "integer");
        assert_eq!(described["minimum"], 1.0);
        assert_eq!(described["maximum"], 4.0);
        assert_eq!(described["default"], 3);
    }
}
