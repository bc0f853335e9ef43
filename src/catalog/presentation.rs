//! Presentation studio: generation, per-slide editing, revision, coaching,
//! slide images and the slide enhancer.

use super::register_prompt;
use crate::config::ModelIds;
use crate::error::Result;
use crate::flow::{Branch, BranchFlow, ImageFlow, PromptFlow};
use crate::schema::{FieldSchema, FlowDefinition, SchemaRegistry};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub const GENERATE_PRESENTATION: &str = "generatePresentation";
pub const EXPAND_SLIDE_CONTENT: &str = "expandSlideContent";
pub const SHORTEN_SLIDE_CONTENT: &str = "shortenSlideContent";
pub const REVISE_PRESENTATION: &str = "revisePresentation";
pub const PRESENTATION_COACH: &str = "presentationCoach";
pub const AI_DEBRIEFER: &str = "aiDebriefer";
pub const REGENERATE_SLIDE_IMAGE: &str = "regenerateSlideImage";
pub const ENHANCE_PPT_SLIDE: &str = "enhancePptSlide";

/// Most slides one generation request may ask for.
pub const MAX_SLIDES: u32 = 10;

const GENERATE_TEMPLATE: &str = r#"You are an expert presentation creator. Build a presentation with exactly {{numberOfSlides}} slides for the topic below.
For each slide give a concise title and 3-4 insightful bullet points. Every bullet point is a complete sentence directly related to the slide title.
Use simple, easy-to-understand English words and sentence structures that a general audience can follow.

Topic: {{{topic}}}
Visual Style: {{{style}}}
Writing Style: {{{writingStyle}}}
Number of Slides: {{numberOfSlides}}
"#;

const EXPAND_TEMPLATE: &str = r#"You are an expert at refining presentation content.
Expand each bullet point of the slide below so it is more detailed and descriptive. Keep the same number of bullet points and use simple English.

Title: {{{title}}}
Content:
{{#each content}}
- {{{this}}}
{{/each}}
"#;

const SHORTEN_TEMPLATE: &str = r#"You are an expert at refining presentation content.
Shorten each bullet point of the slide below so it is concise and punchy. Keep the same number of bullet points and use simple English.

Title: {{{title}}}
Content:
{{#each content}}
- {{{this}}}
{{/each}}
"#;

const REVISE_TEMPLATE: &str = r#"You are an AI Presentation Director. Revise the presentation below according to the user's feedback and the requested writing style.
You may add, remove or edit slides, and change titles, content and structure. Follow the feedback as closely as possible.
Use simple, easy-to-understand English words and sentence structures that a general audience can follow.

Original Topic: {{{topic}}}
Writing Style: {{{writingStyle}}}
User Feedback: "{{{feedback}}}"

Current Presentation Slides:
{{#each slides}}
Slide {{@index}}:
Title: {{this.title}}
Content:
{{#each this.content}}
- {{this}}
{{/each}}
---
{{/each}}

Return the full revised presentation.
"#;

const COACH_TEMPLATE: &str = r#"You are an expert presentation coach. Analyze the slides and speech script below and give constructive feedback.

Assess:
1. Clarity and Conciseness: is the message clear and the language simple?
2. Content-Slide Sync: does the script add value to each slide rather than read it aloud?
3. Structure and Flow: is there a logical progression with an introduction, body and conclusion?
4. Engagement: does it use storytelling, questions or strong statements?

Provide an overall score from 1 to 10, a list of specific feedback items (each with a category and, where it applies, the slide number) and a revised script that applies your feedback.

Presentation content:
{{#each slides}}
---
Slide {{@index}}: {{this.title}}
Content:
{{#each this.content}}
- {{this}}
{{/each}}
{{/each}}
---

Speech script:
"{{{script}}}"
"#;

const DEBRIEF_TEMPLATE: &str = r#"You are an expert presentation coach and debriefer. Analyze the slides and speech script below and give constructive feedback.
Write all feedback and the revised script in simple, easy-to-understand English.

Assess:
1. Clarity and Conciseness: is the message clear and the language simple?
2. Content-Slide Sync: does the script add value to each slide rather than read it aloud?
3. Structure and Flow: is there a logical progression with an introduction, body and conclusion?
4. Engagement: does it use storytelling, questions or strong statements?
5. Inclusivity & Bias: is any language biased, stereotyped or insensitive toward a diverse audience?

Provide an overall score from 1 to 10, a list of specific feedback items (each with a category and, where it applies, the slide number; use the 'Inclusivity & Bias' category for any bias found) and a revised script that applies your feedback and improves inclusivity.

Presentation content:
{{#each slides}}
---
Slide {{@index}}: {{this.title}}
Content:
{{#each this.content}}
- {{this}}
{{/each}}
{{/each}}
---

Speech script:
"{{{script}}}"
"#;

const SLIDE_IMAGE_TEMPLATE: &str = r#"Generate a single image for a presentation slide. It should be visually appealing, suit a presentation and match the slide below.
Topic: {{topic}}
Style: {{style}}
Slide Title: {{slideTitle}}
Slide Content:
{{#each slideContent}}
- {{this}}
{{/each}}
"#;

const REDESIGN_TEMPLATE: &str = r#"You are an expert in designing visually appealing, effective presentation slides.
Redesign the slide in the attached image so it looks modern and engaging while keeping the same content. Return a new image.

Slide Image: {{media url=imageUri}}
"#;

const TEXT_TO_SLIDES_TEMPLATE: &str = r#"You are an expert in creating presentations. Break the text below into a structured presentation.
Identify the main sections and order them logically. For each slide give a concise title and 3-4 insightful bullet points, each a complete sentence.
Use simple, easy-to-understand English words and sentence structures that a general audience can follow.

Text Content: {{{text}}}
"#;

/// One presentation slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    pub content: Vec<String>,
    /// Data URI of the slide image, once generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Slide {
    pub fn new<I, S>(title: impl Into<String>, content: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            content: content.into_iter().map(Into::into).collect(),
            image: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePresentationInput {
    pub topic: String,
    pub style: String,
    pub writing_style: String,
    pub number_of_slides: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidesOutput {
    pub slides: Vec<Slide>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideContentInput {
    pub title: String,
    pub content: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideContentOutput {
    pub content: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisePresentationInput {
    pub topic: String,
    pub writing_style: String,
    pub slides: Vec<Slide>,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachInput {
    pub slides: Vec<Slide>,
    pub script: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackItem {
    pub category: String,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_reference: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachOutput {
    pub overall_score: f64,
    pub feedback: Vec<FeedbackItem>,
    pub revised_script: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideImageInput {
    pub topic: String,
    pub style: String,
    pub slide_title: String,
    pub slide_content: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageOutput {
    pub image: String,
}

/// Either `image_uri` (redesign) or `text` (new deck) must be set; the
/// image wins when both are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceSlideInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhanceSlideOutput {
    pub slides: Vec<Slide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

pub fn slide_schema() -> FieldSchema {
    FieldSchema::object([
        ("title", FieldSchema::string()),
        ("content", FieldSchema::array(FieldSchema::string())),
        ("image", FieldSchema::data_uri().optional()),
    ])
}

fn slides_schema() -> FieldSchema {
    FieldSchema::object([("slides", FieldSchema::array(slide_schema()))])
}

fn slide_content_schema() -> FieldSchema {
    FieldSchema::object([
        ("title", FieldSchema::string()),
        ("content", FieldSchema::array(FieldSchema::string())),
    ])
}

fn coach_input() -> FieldSchema {
    FieldSchema::object([
        ("slides", FieldSchema::array(slide_schema())),
        ("script", FieldSchema::string()),
    ])
}

fn coach_output() -> FieldSchema {
    FieldSchema::object([
        ("overallScore", FieldSchema::number().range(1.0, 10.0)),
        (
            "feedback",
            FieldSchema::array(FieldSchema::object([
                ("category", FieldSchema::string()),
                ("comment", FieldSchema::string()),
                ("slideReference", FieldSchema::integer().optional()),
            ])),
        ),
        ("revisedScript", FieldSchema::string()),
    ])
}

fn redesign_to_slides(image: Value) -> Value {
    json!({ "slides": [], "image": image["image"] })
}

pub(super) fn register(registry: &mut SchemaRegistry, models: &ModelIds) -> Result<()> {
    let text = models.text.as_str();
    let required = || FieldSchema::string().min_len(1);

    register_prompt(
        registry,
        GENERATE_PRESENTATION,
        FieldSchema::object([
            ("topic", FieldSchema::string()),
            ("style", FieldSchema::string()),
            ("writingStyle", required()),
            (
                "numberOfSlides",
                FieldSchema::integer().range(1.0, f64::from(MAX_SLIDES)),
            ),
        ]),
        slides_schema(),
        text,
        GENERATE_TEMPLATE,
    )?;
    register_prompt(
        registry,
        EXPAND_SLIDE_CONTENT,
        slide_content_schema(),
        FieldSchema::object([("content", FieldSchema::array(FieldSchema::string()))]),
        text,
        EXPAND_TEMPLATE,
    )?;
    register_prompt(
        registry,
        SHORTEN_SLIDE_CONTENT,
        slide_content_schema(),
        FieldSchema::object([("content", FieldSchema::array(FieldSchema::string()))]),
        text,
        SHORTEN_TEMPLATE,
    )?;
    register_prompt(
        registry,
        REVISE_PRESENTATION,
        FieldSchema::object([
            ("topic", FieldSchema::string()),
            ("writingStyle", required()),
            ("slides", FieldSchema::array(slide_schema())),
            ("feedback", FieldSchema::string()),
        ]),
        slides_schema(),
        text,
        REVISE_TEMPLATE,
    )?;
    register_prompt(
        registry,
        PRESENTATION_COACH,
        coach_input(),
        coach_output(),
        text,
        COACH_TEMPLATE,
    )?;
    register_prompt(
        registry,
        AI_DEBRIEFER,
        coach_input(),
        coach_output(),
        text,
        DEBRIEF_TEMPLATE,
    )?;

    let image_output = FieldSchema::object([("image", FieldSchema::data_uri())]);
    registry.register(FlowDefinition::new(
        REGENERATE_SLIDE_IMAGE,
        FieldSchema::object([
            ("topic", FieldSchema::string()),
            ("style", FieldSchema::string()),
            ("slideTitle", FieldSchema::string()),
            ("slideContent", FieldSchema::array(FieldSchema::string())),
        ]),
        image_output.clone(),
        Arc::new(ImageFlow::new(&models.image, SLIDE_IMAGE_TEMPLATE)?),
    ))?;

    let redesign = Branch::new(
        "imageUri",
        Arc::new(ImageFlow::new(&models.image, REDESIGN_TEMPLATE)?),
        image_output,
    )
    .map(redesign_to_slides);
    let from_text = Branch::new(
        "text",
        Arc::new(PromptFlow::new(text, TEXT_TO_SLIDES_TEMPLATE)?),
        FieldSchema::object([("slides", FieldSchema::array(slide_content_schema()))]),
    );
    registry.register(FlowDefinition::new(
        ENHANCE_PPT_SLIDE,
        FieldSchema::object([
            ("imageUri", FieldSchema::data_uri().optional()),
            ("text", FieldSchema::string().optional()),
            ("style", FieldSchema::string().optional()),
        ]),
        FieldSchema::object([
            ("slides", FieldSchema::array(slide_schema())),
            ("image", FieldSchema::data_uri().optional()),
        ]),
        Arc::new(BranchFlow::new(redesign, from_text)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowError;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        register(&mut registry, &ModelIds::default()).unwrap();
        registry
    }

    fn deck() -> Vec<Slide> {
        vec![
            Slide::new("Why solar", ["Cheap", "Clean"]),
            Slide::new("How it works", ["Photons", "Inverters"]),
        ]
    }

    #[test]
    fn test_slide_count_bounds() {
        let registry = registry();
        let input = |n: u32| {
            serde_json::to_value(GeneratePresentationInput {
                topic: "Solar".into(),
                style: "Minimal".into(),
                writing_style: "Professional".into(),
                number_of_slides: n,
            })
            .unwrap()
        };
        assert!(registry.validate_input(GENERATE_PRESENTATION, &input(10)).is_ok());
        for n in [0, 11, 15] {
            let err = registry.validate_input(GENERATE_PRESENTATION, &input(n)).unwrap_err();
            assert_eq!(err.field_paths(), vec!["numberOfSlides"]);
        }
    }

    #[test]
    fn test_debriefer_adds_inclusivity_review() {
        let input = serde_json::to_value(CoachInput {
            slides: deck(),
            script: "Hello everyone".into(),
        })
        .unwrap();
        let input = registry().validate_input(AI_DEBRIEFER, &input).unwrap();
        let prompt = |template| {
            PromptFlow::new("m", template)
                .unwrap()
                .request(&input, &coach_output())
                .prompt_text()
        };

        let coach = prompt(COACH_TEMPLATE);
        let debrief = prompt(DEBRIEF_TEMPLATE);
        assert!(!coach.contains("Inclusivity & Bias"));
        assert!(debrief.contains("Inclusivity & Bias"));
        assert!(coach.contains("Slide 1: How it works\nContent:\n- Photons\n- Inverters\n---\n"));
        assert!(debrief.contains("Speech script:\n\"Hello everyone\""));
    }

    #[test]
    fn test_revise_lists_every_slide() {
        let flow = PromptFlow::new("m", REVISE_TEMPLATE).unwrap();
        let input = serde_json::to_value(RevisePresentationInput {
            topic: "Solar".into(),
            writing_style: "Casual".into(),
            slides: deck(),
            feedback: "Add a slide on costs".into(),
        })
        .unwrap();
        let input = registry().validate_input(REVISE_PRESENTATION, &input).unwrap();
        let prompt = flow.request(&input, &slides_schema()).prompt_text();
        assert!(prompt.contains("Slide 0:\nTitle: Why solar\nContent:\n- Cheap\n- Clean\n---\n"));
        assert!(prompt.contains("User Feedback: \"Add a slide on costs\""));
    }

    #[test]
    fn test_coach_score_bounds() {
        let err = registry()
            .validate_output(
                PRESENTATION_COACH,
                &json!({"overallScore": 11, "feedback": [], "revisedScript": "x"}),
            )
            .unwrap_err();
        assert!(matches!(err, FlowError::SchemaValidation { .. }));
        assert_eq!(err.field_paths(), vec!["overallScore"]);
    }

    #[test]
    fn test_enhancer_is_a_branch() {
        let registry = registry();
        assert_eq!(registry.get(ENHANCE_PPT_SLIDE).unwrap().flow.kind(), "branch");
        let err = registry
            .validate_input(ENHANCE_PPT_SLIDE, &json!({"imageUri": "https://example.com/a.png"}))
            .unwrap_err();
        assert_eq!(err.field_paths(), vec!["imageUri"]);
    }

    #[test]
    fn test_redesign_reshape() {
        assert_eq!(
            redesign_to_slides(json!({"image": "data:image/png;base64,AA"})),
            json!({"slides": [], "image": "data:image/png;base64,AA"})
        );
    }
}
