//! Text toolkit: grammar, summary, keywords, sentiment, translation.

use super::register_prompt;
use crate::config::ModelIds;
use crate::error::Result;
use crate::schema::{FieldSchema, SchemaRegistry};
use serde::{Deserialize, Serialize};

pub const CHECK_GRAMMAR: &str = "checkGrammar";
pub const SUMMARIZE_TEXT: &str = "summarizeText";
pub const EXTRACT_KEYWORDS: &str = "extractKeywords";
pub const ANALYZE_SENTIMENT: &str = "analyzeSentiment";
pub const TRANSLATE_TEXT: &str = "translateText";

const GRAMMAR_TEMPLATE: &str = r#"You are an expert English grammar and spelling checker.
Correct the following text while keeping its meaning and tone.
If nothing needs fixing, return the text unchanged. Use simple, clear English.

Text: "{{{text}}}"
"#;

const SUMMARY_TEMPLATE: &str = r#"You are an expert at summarizing text.
Write a concise, clear summary of the content below that captures its main points and key information in simple English.

Content: "{{{text}}}"
"#;

const KEYWORDS_TEMPLATE: &str = r#"You are an expert at identifying important keywords.
Extract the most relevant keywords from the content below.

Content: "{{{text}}}"
"#;

const SENTIMENT_TEMPLATE: &str = r#"You are an expert in sentiment analysis.
Classify the emotional tone of the text below as 'Positive', 'Negative' or 'Neutral', and explain your reasoning briefly in simple English.

Text: "{{{text}}}"
"#;

const TRANSLATE_TEMPLATE: &str = r#"You are a language translator. Translate the text below into the target language.
For Hinglish, produce the natural mix of Hindi and English used in everyday conversation.

Text: "{{{text}}}"
Target Language: {{targetLanguage}}
"#;

/// Input shared by the single-text tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextInput {
    pub text: String,
}

impl TextInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarOutput {
    pub corrected_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryOutput {
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordsOutput {
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentOutput {
    pub sentiment: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateInput {
    pub text: String,
    pub target_language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateOutput {
    pub translated_text: String,
}

fn text_input() -> FieldSchema {
    FieldSchema::object([("text", FieldSchema::string().min_len(1))])
}

pub(super) fn register(registry: &mut SchemaRegistry, models: &ModelIds) -> Result<()> {
    let model = models.text.as_str();
    register_prompt(
        registry,
        CHECK_GRAMMAR,
        text_input(),
        FieldSchema::object([("correctedText", FieldSchema::string())]),
        model,
        GRAMMAR_TEMPLATE,
    )?;
    register_prompt(
        registry,
        SUMMARIZE_TEXT,
        text_input(),
        FieldSchema::object([("summary", FieldSchema::string())]),
        model,
        SUMMARY_TEMPLATE,
    )?;
    register_prompt(
        registry,
        EXTRACT_KEYWORDS,
        text_input(),
        FieldSchema::object([("keywords", FieldSchema::array(FieldSchema::string()))]),
        model,
        KEYWORDS_TEMPLATE,
    )?;
    register_prompt(
        registry,
        ANALYZE_SENTIMENT,
        text_input(),
        FieldSchema::object([
            ("sentiment", FieldSchema::string()),
            ("explanation", FieldSchema::string()),
        ]),
        model,
        SENTIMENT_TEMPLATE,
    )?;
    register_prompt(
        registry,
        TRANSLATE_TEXT,
        FieldSchema::object([
            ("text", FieldSchema::string().min_len(1)),
            ("targetLanguage", FieldSchema::string().min_len(1)),
        ]),
        FieldSchema::object([("translatedText", FieldSchema::string())]),
        model,
        TRANSLATE_TEMPLATE,
    )
}
