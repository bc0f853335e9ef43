//! Writing assistant: blog posts, emails, product copy, captions and
//! resume bullet points, optionally personalized by a [`UserProfile`].

use super::{register_prompt, user_profile_schema, UserProfile};
use crate::config::ModelIds;
use crate::error::Result;
use crate::schema::{FieldSchema, SchemaRegistry};
use serde::{Deserialize, Serialize};

pub const GENERATE_BLOG: &str = "generateBlog";
pub const GENERATE_EMAIL_TEMPLATE: &str = "generateEmailTemplate";
pub const GENERATE_PRODUCT_DESCRIPTION: &str = "generateProductDescription";
pub const GENERATE_SOCIAL_MEDIA_CAPTIONS: &str = "generateSocialMediaCaptions";
pub const GENERATE_RESUME_BULLET_POINTS: &str = "generateResumeBulletPoints";

const BLOG_TEMPLATE: &str = r#"You are an expert blog writer and content strategist. Write a complete, well-structured and engaging blog post for the request below.
Use simple, easy-to-understand English that a general audience can follow.
{{#if profile}}
Write from the perspective of a {{profile.jobTitle}} with {{profile.yearsOfExperience}} years in the {{profile.industry}} industry.
Their professional background: {{profile.bio}}
{{/if}}

Topic: {{{topic}}}
Tone: {{{tone}}}
Keywords: {{{keywords}}}

The post must include:
1. A catchy, relevant title as a markdown H1.
2. A short introduction that hooks the reader.
3. A main body with H2 headings and H3 subheadings, using lists where they help readability.
4. A conclusion summarizing the key points, with a call to action if it fits.

Return the whole post as a single markdown string.
"#;

const EMAIL_TEMPLATE: &str = r#"You are an expert at writing professional, effective emails. Write a ready-to-use email template in simple English.

Purpose: {{{purpose}}}
Context/Details: {{{context}}}
{{#if profile}}

The email is sent by:
Name: {{profile.name}}
Title: {{profile.jobTitle}}
Company: {{profile.company}}
Use these details for the signature.
{{/if}}

Include a clear subject line, a courteous body, placeholders such as [Recipient Name] or [Date] wherever the sender must fill something in, and a proper closing with signature.
"#;

const PRODUCT_TEMPLATE: &str = r#"You are a skilled e-commerce copywriter. Write a compelling product description in simple, clear English.

Product Name: {{{productName}}}
Key Features:
{{{features}}}
Target Audience: {{{targetAudience}}}

The description should open with a catchy headline, turn each feature into a benefit, stay easy to skim (short paragraphs, checkmark bullet points, bold emphasis) and end with a clear call to action.
"#;

const CAPTIONS_TEMPLATE: &str = r#"You are a social media marketing expert. Write 3-4 distinct, engaging captions for a post, in simple language.

Platform: {{{platform}}}
Context for the post: {{{context}}}
{{#if profile}}
The post is from {{profile.name}}, a {{profile.jobTitle}}. Keep this professional persona in mind, especially for LinkedIn.
Their professional goals: {{profile.goals}}. Align the captions with these goals where it makes sense.
{{/if}}

Tailor each caption to the platform's audience, make it spark conversation, add relevant popular and niche hashtags, and use emojis where they help engagement.
"#;

const BULLET_POINTS_TEMPLATE: &str = r#"You are a top-tier resume writer and career coach. Turn the role below into 4-5 concise, impactful resume bullet points written in clear English.

Job Title: {{{jobTitle}}}
Company: {{{company}}}
Description of duties and accomplishments: {{{description}}}
{{#if profile}}

Take the user's overall profile into account:
- Key Skills: {{profile.skills}}
- Career Goals: {{profile.goals}}
- Past Experience Summary: {{profile.experience}}
{{/if}}

Every bullet point MUST start with a strong, varied action verb, quantify results wherever possible, focus on achievements over duties and fit on a single line.
"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogInput {
    pub topic: String,
    pub tone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogOutput {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailInput {
    pub purpose: String,
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailOutput {
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDescriptionInput {
    pub product_name: String,
    pub features: String,
    pub target_audience: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDescriptionOutput {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionsInput {
    pub platform: String,
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionsOutput {
    pub captions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletPointsInput {
    pub job_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletPointsOutput {
    pub bullet_points: Vec<String>,
}

fn required() -> FieldSchema {
    FieldSchema::string().min_len(1)
}

pub(super) fn register(registry: &mut SchemaRegistry, models: &ModelIds) -> Result<()> {
    let model = models.text.as_str();
    register_prompt(
        registry,
        GENERATE_BLOG,
        FieldSchema::object([
            ("topic", required()),
            ("tone", FieldSchema::string()),
            ("keywords", FieldSchema::string().optional()),
            ("profile", user_profile_schema()),
        ]),
        FieldSchema::object([("content", FieldSchema::string())]),
        model,
        BLOG_TEMPLATE,
    )?;
    register_prompt(
        registry,
        GENERATE_EMAIL_TEMPLATE,
        FieldSchema::object([
            ("purpose", FieldSchema::string()),
            ("context", required()),
            ("profile", user_profile_schema()),
        ]),
        FieldSchema::object([("template", FieldSchema::string())]),
        model,
        EMAIL_TEMPLATE,
    )?;
    register_prompt(
        registry,
        GENERATE_PRODUCT_DESCRIPTION,
        FieldSchema::object([
            ("productName", required()),
            ("features", required()),
            ("targetAudience", required()),
            ("profile", user_profile_schema()),
        ]),
        FieldSchema::object([("description", FieldSchema::string())]),
        model,
        PRODUCT_TEMPLATE,
    )?;
    register_prompt(
        registry,
        GENERATE_SOCIAL_MEDIA_CAPTIONS,
        FieldSchema::object([
            ("platform", FieldSchema::string()),
            ("context", required()),
            ("profile", user_profile_schema()),
        ]),
        FieldSchema::object([("captions", FieldSchema::array(FieldSchema::string()))]),
        model,
        CAPTIONS_TEMPLATE,
    )?;
    register_prompt(
        registry,
        GENERATE_RESUME_BULLET_POINTS,
        FieldSchema::object([
            ("jobTitle", required()),
            ("company", FieldSchema::string().optional()),
            ("description", required()),
            ("profile", user_profile_schema()),
        ]),
        FieldSchema::object([("bulletPoints", FieldSchema::array(FieldSchema::string()))]),
        model,
        BULLET_POINTS_TEMPLATE,
    )
}
