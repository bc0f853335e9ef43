//! Creative tools: idea sparks, prompt enhancement, style analysis and
//! image previews.

use super::register_prompt;
use crate::config::ModelIds;
use crate::error::Result;
use crate::flow::BatchImageFlow;
use crate::schema::{FieldSchema, FlowDefinition, SchemaRegistry};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

pub const GET_CREATIVE_SPARK: &str = "getCreativeSpark";
pub const EXPAND_CREATIVE_SPARK: &str = "expandCreativeSpark";
pub const ENHANCE_PROMPT: &str = "enhancePrompt";
pub const ANALYZE_IMAGE_STYLE: &str = "analyzeImageStyle";
pub const GENERATE_PREVIEW_IMAGES: &str = "generatePreviewImages";

/// Bounds on `numImages` for preview generation.
pub const MIN_PREVIEWS: u32 = 1;
pub const MAX_PREVIEWS: u32 = 4;

const SPARK_TEMPLATE: &str = r#"You are a creativity assistant. Come up with one short, random, open-ended creative idea in simple, clear English.

For example:
- A world where animals can talk.
- A detective who solves crimes using dreams.
- A musician who can play emotions.
"#;

const EXPAND_SPARK_TEMPLATE: &str = r#"You are a creativity assistant. Expand the creative spark below into one detailed paragraph that can serve as the foundation for new content. Use simple, easy-to-understand English.

Creative Spark: {{{spark}}}
"#;

const ENHANCE_PROMPT_TEMPLATE: &str = r#"You are an expert at writing prompts for generative AI. Turn the user's simple prompt into a detailed, effective one using clear, descriptive English.
Consider the subject, the setting, the artistic style (photorealistic, cartoon, watercolor...), the lighting (cinematic, soft, neon...), the composition (close-up, wide shot...) and the mood.

User Prompt: {{{prompt}}}
"#;

const ANALYZE_STYLE_TEMPLATE: &str = r#"You are an expert art critic. Analyze the artistic style of the attached image and write a text prompt describing that style in clear, simple English.
Image: {{media url=photoDataUri}}
"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparkOutput {
    pub spark: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandSparkInput {
    pub spark: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandSparkOutput {
    pub expanded_spark: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancePromptInput {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancePromptOutput {
    pub enhanced_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeStyleInput {
    /// Data URI of the image to analyze.
    pub photo_data_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeStyleOutput {
    pub prompt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewImagesInput {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_image1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_image2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_image3: Option<String>,
    /// Defaults to 3 when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_images: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewImagesOutput {
    pub images: Vec<String>,
}

pub(super) fn register(registry: &mut SchemaRegistry, models: &ModelIds) -> Result<()> {
    let text = models.text.as_str();
    register_prompt(
        registry,
        GET_CREATIVE_SPARK,
        FieldSchema::empty_object(),
        FieldSchema::object([("spark", FieldSchema::string())]),
        text,
        SPARK_TEMPLATE,
    )?;
    register_prompt(
        registry,
        EXPAND_CREATIVE_SPARK,
        FieldSchema::object([("spark", FieldSchema::string())]),
        FieldSchema::object([("expandedSpark", FieldSchema::string())]),
        text,
        EXPAND_SPARK_TEMPLATE,
    )?;
    register_prompt(
        registry,
        ENHANCE_PROMPT,
        FieldSchema::object([("prompt", FieldSchema::string())]),
        FieldSchema::object([("enhancedPrompt", FieldSchema::string())]),
        text,
        ENHANCE_PROMPT_TEMPLATE,
    )?;
    register_prompt(
        registry,
        ANALYZE_IMAGE_STYLE,
        FieldSchema::object([("photoDataUri", FieldSchema::data_uri())]),
        FieldSchema::object([("prompt", FieldSchema::string())]),
        text,
        ANALYZE_STYLE_TEMPLATE,
    )?;

    let reference = || FieldSchema::data_uri().optional();
    registry.register(FlowDefinition::new(
        GENERATE_PREVIEW_IMAGES,
        FieldSchema::object([
            ("prompt", FieldSchema::string()),
            ("referenceImage1", reference()),
            ("referenceImage2", reference()),
            ("referenceImage3", reference()),
            (
                "numImages",
                FieldSchema::integer()
                    .range(f64::from(MIN_PREVIEWS), f64::from(MAX_PREVIEWS))
                    .with_default(json!(3)),
            ),
        ]),
        FieldSchema::object([("images", FieldSchema::array(FieldSchema::data_uri()))]),
        Arc::new(BatchImageFlow::new(&models.image)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::PromptFlow;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        register(&mut registry, &ModelIds::default()).unwrap();
        registry
    }

    #[test]
    fn test_spark_accepts_empty_input() {
        let registry = registry();
        assert_eq!(registry.validate_input(GET_CREATIVE_SPARK, &json!({})).unwrap(), json!({}));
        assert_eq!(
            registry
                .validate_input(GET_CREATIVE_SPARK, &json!({"mood": "dark"}))
                .unwrap(),
            json!({})
        );
    }

    #[test]
    fn test_preview_count_defaults_and_bounds() {
        let registry = registry();
        let input = serde_json::to_value(PreviewImagesInput {
            prompt: "A red fox".into(),
            ..Default::default()
        })
        .unwrap();
        let canonical = registry.validate_input(GENERATE_PREVIEW_IMAGES, &input).unwrap();
        assert_eq!(canonical["numImages"], 3);

        let err = registry
            .validate_input(GENERATE_PREVIEW_IMAGES, &json!({"prompt": "x", "numImages": 5}))
            .unwrap_err();
        assert_eq!(err.field_paths(), vec!["numImages"]);
    }

    #[test]
    fn test_style_analysis_attaches_photo() {
        let flow = PromptFlow::new("m", ANALYZE_STYLE_TEMPLATE).unwrap();
        let input = json!({"photoDataUri": "data:image/jpeg;base64,/9j/4AAQ"});
        let request = flow.request(&input, &FieldSchema::object([("prompt", FieldSchema::string())]));
        let media: Vec<_> = request.media().collect();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].mime_type(), "image/jpeg");
        assert!(request.prompt_text().contains("Image: \n"));
    }

    #[test]
    fn test_photo_must_be_data_uri() {
        let err = registry()
            .validate_input(ANALYZE_IMAGE_STYLE, &json!({"photoDataUri": "/tmp/cat.png"}))
            .unwrap_err();
        assert_eq!(err.field_paths(), vec!["photoDataUri"]);
    }
}
