//! Resume tools: whole-resume enhancement and per-entry suggestions.

use super::register_prompt;
use crate::config::ModelIds;
use crate::error::Result;
use crate::schema::{FieldSchema, SchemaRegistry};
use serde::{Deserialize, Serialize};

pub const AI_RESUME_ENHANCER: &str = "aiResumeEnhancer";
pub const PROACTIVE_RESUME_ANALYST: &str = "proactiveResumeAnalyst";

const ENHANCER_TEMPLATE: &str = r#"You are a top-tier professional resume writer and career coach. Improve the resume data below, using simple and clear English.

1. Rewrite the profile summary: 2-3 sentences, based on the name, job title, skills and work experience, highlighting key strengths and career focus.
2. For every work experience entry, turn the free-text description into 3-4 action-oriented bullet points. Each starts with a strong action verb, quantifies results where possible and focuses on achievements. Return them as one string, one bullet per line, each starting with '• '. Refer to each entry by its Entry Index.

Resume data:
- Full Name: {{fullName}}
- Job Title: {{jobTitle}}
- Current Profile Summary: "{{profileSummary}}"
- Key Skills: {{#each skills}}{{this.value}}, {{/each}}
- Work Experience:
{{#each workExperience}}
---
Entry Index: {{@index}}
Job Title: {{this.jobTitle}}
Company: {{this.company}}
Description: "{{this.description}}"
{{/each}}
"#;

const ANALYST_TEMPLATE: &str = r#"You are a proactive resume coach. Review the single work experience description below and give ONE concise, actionable suggestion in simple English.

Look for:
1. Passive voice ("was responsible for...") that should become active ("Managed...").
2. Missing numbers or metrics, e.g. suggest "Increased sales by 15% over six months".
3. Vague points that should be more specific and results-oriented.

Description:
"{{{description}}}"

If there is a clear improvement, set hasSuggestion to true and give the suggestion. If the description is already strong, set hasSuggestion to false and leave the suggestion out.
"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperience {
    pub job_title: String,
    pub company: String,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeEnhancerInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_experience: Option<Vec<WorkExperience>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<Skill>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedExperience {
    /// Position of the entry in the input's `workExperience`.
    pub original_index: usize,
    pub enhanced_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeEnhancerOutput {
    pub profile_summary: String,
    pub enhanced_work_experience: Vec<EnhancedExperience>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystInput {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalystOutput {
    pub has_suggestion: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

fn work_experience_schema() -> FieldSchema {
    let required = || FieldSchema::string().min_len(1);
    FieldSchema::object([
        ("jobTitle", required()),
        ("company", required()),
        ("startDate", required()),
        ("endDate", FieldSchema::string().optional()),
        ("description", required()),
    ])
}

pub(super) fn register(registry: &mut SchemaRegistry, models: &ModelIds) -> Result<()> {
    let model = models.text.as_str();
    register_prompt(
        registry,
        AI_RESUME_ENHANCER,
        FieldSchema::object([
            ("fullName", FieldSchema::string().optional()),
            ("jobTitle", FieldSchema::string().optional()),
            ("profileSummary", FieldSchema::string().optional()),
            (
                "workExperience",
                FieldSchema::array(work_experience_schema()).optional(),
            ),
            (
                "skills",
                FieldSchema::array(FieldSchema::object([("value", FieldSchema::string())]))
                    .optional(),
            ),
        ]),
        FieldSchema::object([
            ("profileSummary", FieldSchema::string()),
            (
                "enhancedWorkExperience",
                FieldSchema::array(FieldSchema::object([
                    ("originalIndex", FieldSchema::integer().min(0.0)),
                    ("enhancedDescription", FieldSchema::string()),
                ])),
            ),
        ]),
        model,
        ENHANCER_TEMPLATE,
    )?;
    register_prompt(
        registry,
        PROACTIVE_RESUME_ANALYST,
        FieldSchema::object([("description", FieldSchema::string())]),
        FieldSchema::object([
            ("hasSuggestion", FieldSchema::boolean()),
            ("suggestion", FieldSchema::string().optional()),
        ]),
        model,
        ANALYST_TEMPLATE,
    )
}
