//! The flow registry: one [`FlowDefinition`] per capability.
//!
//! Built once at startup and then shared read-only (usually behind an
//! `Arc`) by every [`FlowEngine`](crate::flow::FlowEngine).

use super::FieldSchema;
use crate::error::{FlowError, Result, SchemaStage};
use crate::flow::Flow;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// One capability: its name, its contracts and how it talks to the model.
#[derive(Clone)]
pub struct FlowDefinition {
    pub name: String,
    pub input: FieldSchema,
    pub output: FieldSchema,
    pub flow: Arc<dyn Flow>,
}

impl FlowDefinition {
    pub fn new(
        name: impl Into<String>,
        input: FieldSchema,
        output: FieldSchema,
        flow: Arc<dyn Flow>,
    ) -> Self {
        Self {
            name: name.into(),
            input,
            output,
            flow,
        }
    }
}

impl std::fmt::Debug for FlowDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowDefinition")
            .field("name", &self.name)
            .field("kind", &self.flow.kind())
            .finish()
    }
}

/// Registry of flow definitions keyed by name.
///
/// # Example
///
/// ```
/// use flowai_studio::flow::PromptFlow;
/// use flowai_studio::schema::{FieldSchema, FlowDefinition, SchemaRegistry};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let input = FieldSchema::object([("text", FieldSchema::string().min_len(1))]);
/// let output = FieldSchema::object([("summary", FieldSchema::string())]);
/// let flow = PromptFlow::new("googleai/gemini-2.0-flash", "Summarize: {{{text}}}").unwrap();
///
/// let mut registry = SchemaRegistry::new();
/// registry
///     .register(FlowDefinition::new("summarizeText", input, output, Arc::new(flow)))
///     .unwrap();
///
/// assert!(registry.validate_input("summarizeText", &json!({"text": "long"})).is_ok());
/// assert!(registry.validate_input("summarizeText", &json!({"text": ""})).is_err());
/// ```
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    flows: HashMap<String, FlowDefinition>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition. The flow's templates are checked against the input
    /// schema here, so a bad placeholder fails at startup rather than per call.
    pub fn register(&mut self, definition: FlowDefinition) -> Result<()> {
        if self.flows.contains_key(&definition.name) {
            return Err(FlowError::DuplicateFlowName(definition.name));
        }
        definition.flow.check(&definition.name, &definition.input)?;
        tracing::debug!(flow = %definition.name, kind = definition.flow.kind(), "registered flow");
        self.flows.insert(definition.name.clone(), definition);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&FlowDefinition> {
        self.flows
            .get(name)
            .ok_or_else(|| FlowError::UnknownFlow(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flows.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.flows.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Check a caller-supplied value and return its canonical form.
    pub fn validate_input(&self, name: &str, value: &Value) -> Result<Value> {
        let definition = self.get(name)?;
        validate_against(name, &definition.input, SchemaStage::Input, value)
    }

    /// Check a model-produced value and return its canonical form.
    pub fn validate_output(&self, name: &str, value: &Value) -> Result<Value> {
        let definition = self.get(name)?;
        validate_against(name, &definition.output, SchemaStage::Output, value)
    }
}

/// Validate `value` and wrap any violations in a [`FlowError::SchemaValidation`].
pub(crate) fn validate_against(
    flow: &str,
    schema: &FieldSchema,
    stage: SchemaStage,
    value: &Value,
) -> Result<Value> {
    schema
        .validate(value)
        .map_err(|violations| FlowError::SchemaValidation {
            flow: flow.to_string(),
            stage,
            violations,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::PromptFlow;
    use serde_json::json;

    fn grammar() -> FlowDefinition {
        FlowDefinition::new(
            "checkGrammar",
            FieldSchema::object([("text", FieldSchema::string().min_len(1))]),
            FieldSchema::object([("correctedText", FieldSchema::string())]),
            Arc::new(PromptFlow::new("m", "Correct: \"{{{text}}}\"").unwrap()),
        )
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = SchemaRegistry::new();
        registry.register(grammar()).unwrap();
        let err = registry.register(grammar()).unwrap_err();
        assert!(matches!(err, FlowError::DuplicateFlowName(ref n) if n == "checkGrammar"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unresolved_placeholder_fails_registration() {
        let mut registry = SchemaRegistry::new();
        let def = FlowDefinition::new(
            "summarizeText",
            FieldSchema::object([("text", FieldSchema::string())]),
            FieldSchema::object([("summary", FieldSchema::string())]),
            Arc::new(PromptFlow::new("m", "Summarize {{content}}").unwrap()),
        );
        let err = registry.register(def).unwrap_err();
        assert!(matches!(
            err,
            FlowError::UnresolvedPlaceholder { ref flow, ref placeholder }
                if flow == "summarizeText" && placeholder == "content"
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_flow() {
        let registry = SchemaRegistry::new();
        assert!(matches!(
            registry.validate_input("nope", &json!({})),
            Err(FlowError::UnknownFlow(_))
        ));
    }

    #[test]
    fn test_stage_is_reported() {
        let mut registry = SchemaRegistry::new();
        registry.register(grammar()).unwrap();

        let input_err = registry.validate_input("checkGrammar", &json!({})).unwrap_err();
        assert!(matches!(
            input_err,
            FlowError::SchemaValidation { stage: SchemaStage::Input, .. }
        ));
        assert_eq!(input_err.field_paths(), vec!["text"]);

        let output_err = registry
            .validate_output("checkGrammar", &json!({"text": "wrong key"}))
            .unwrap_err();
        assert!(matches!(
            output_err,
            FlowError::SchemaValidation { stage: SchemaStage::Output, .. }
        ));
        assert_eq!(output_err.field_paths(), vec!["correctedText"]);
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = SchemaRegistry::new();
        registry.register(grammar()).unwrap();
        let mut other = grammar();
        other.name = "analyzeSentiment".into();
        registry.register(other).unwrap();
        assert_eq!(registry.names(), vec!["analyzeSentiment", "checkGrammar"]);
    }
}
