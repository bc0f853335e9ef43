//! The FlowAI Studio flow catalog.
//!
//! Every product capability as a registered flow: its input and output
//! schemas, its prompt template and the model serving it. Each submodule
//! also exposes typed request/response structs for use with
//! [`FlowEngine::execute_typed`](crate::flow::FlowEngine::execute_typed).
//!
//! ```
//! use flowai_studio::catalog::{self, text_toolkit};
//! use flowai_studio::config::ModelIds;
//!
//! let registry = catalog::studio_registry(&ModelIds::default()).unwrap();
//! assert!(registry.contains(text_toolkit::CHECK_GRAMMAR));
//! assert_eq!(registry.len(), catalog::FLOW_NAMES.len());
//! ```

pub mod creative;
pub mod presentation;
pub mod resume;
pub mod text_toolkit;
pub mod voice;
pub mod writing;

use crate::config::ModelIds;
use crate::error::Result;
use crate::flow::PromptFlow;
use crate::schema::{FieldSchema, FlowDefinition, SchemaRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Every flow name registered by [`studio_registry`].
pub const FLOW_NAMES: &[&str] = &[
    text_toolkit::CHECK_GRAMMAR,
    text_toolkit::SUMMARIZE_TEXT,
    text_toolkit::EXTRACT_KEYWORDS,
    text_toolkit::ANALYZE_SENTIMENT,
    text_toolkit::TRANSLATE_TEXT,
    writing::GENERATE_BLOG,
    writing::GENERATE_EMAIL_TEMPLATE,
    writing::GENERATE_PRODUCT_DESCRIPTION,
    writing::GENERATE_SOCIAL_MEDIA_CAPTIONS,
    writing::GENERATE_RESUME_BULLET_POINTS,
    resume::AI_RESUME_ENHANCER,
    resume::PROACTIVE_RESUME_ANALYST,
    presentation::GENERATE_PRESENTATION,
    presentation::EXPAND_SLIDE_CONTENT,
    presentation::SHORTEN_SLIDE_CONTENT,
    presentation::REVISE_PRESENTATION,
    presentation::PRESENTATION_COACH,
    presentation::AI_DEBRIEFER,
    presentation::REGENERATE_SLIDE_IMAGE,
    presentation::ENHANCE_PPT_SLIDE,
    creative::GET_CREATIVE_SPARK,
    creative::EXPAND_CREATIVE_SPARK,
    creative::ENHANCE_PROMPT,
    creative::ANALYZE_IMAGE_STYLE,
    creative::GENERATE_PREVIEW_IMAGES,
    voice::TEXT_TO_SPEECH,
];

/// Build the registry holding every studio flow.
///
/// Fails only if a template does not match its input schema, which is a
/// programming error caught by this module's tests.
pub fn studio_registry(models: &ModelIds) -> Result<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    text_toolkit::register(&mut registry, models)?;
    writing::register(&mut registry, models)?;
    resume::register(&mut registry, models)?;
    presentation::register(&mut registry, models)?;
    creative::register(&mut registry, models)?;
    voice::register(&mut registry, models)?;
    tracing::debug!(flows = registry.len(), "studio registry built");
    Ok(registry)
}

/// Register a structured-output prompt flow.
fn register_prompt(
    registry: &mut SchemaRegistry,
    name: &str,
    input: FieldSchema,
    output: FieldSchema,
    model: &str,
    template: &str,
) -> Result<()> {
    let flow = PromptFlow::new(model, template)?;
    registry.register(FlowDefinition::new(name, input, output, Arc::new(flow)))
}

/// Optional professional background used to personalize writing flows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_of_experience: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<String>,
}

pub(crate) fn user_profile_schema() -> FieldSchema {
    let text = || FieldSchema::string().optional();
    FieldSchema::object([
        ("name", text()),
        ("jobTitle", text()),
        ("company", text()),
        ("industry", text()),
        ("yearsOfExperience", FieldSchema::number().optional()),
        ("education", text()),
        ("bio", text()),
        ("skills", text()),
        ("experience", text()),
        ("goals", text()),
    ])
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_flow_registers() {
        let registry = studio_registry(&ModelIds::default()).unwrap();
        let mut expected: Vec<&str> = FLOW_NAMES.to_vec();
        expected.sort_unstable();
        assert_eq!(registry.names(), expected);
    }

    #[test]
    fn test_flow_names_unique() {
        let unique: HashSet<_> = FLOW_NAMES.iter().collect();
        assert_eq!(unique.len(), FLOW_NAMES.len());
    }

    #[test]
    fn test_profile_is_optional() {
        let schema = FieldSchema::object([("profile", user_profile_schema())]);
        assert_eq!(schema.validate(&serde_json::json!({})).unwrap(), serde_json::json!({}));
        let err = schema
            .validate(&serde_json::json!({"profile": {"yearsOfExperience": "ten"}}))
            .unwrap_err();
        assert_eq!(err[0].path, "profile.yearsOfExperience");
    }
}
