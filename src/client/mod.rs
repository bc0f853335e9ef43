//! Model invocation: the [`Backend`] trait and normalized request/response types.
//!
//! A flow turns its rendered prompt into a [`ModelRequest`]; the backend
//! translates that into one provider-specific HTTP exchange and maps the
//! reply back into a [`ModelResponse`]. There is no retry layer: a failed
//! exchange surfaces directly as an error.
//!
//! ```text
//! Flow ──► ModelRequest ──► Backend::invoke() ──► ModelResponse
//!                                  │
//!               ┌──────────────────┼──────────────────┐
//!          HttpBackend       GeminiBackend        MockBackend
//!          POST /generate    :generateContent     canned replies
//! ```

#[cfg(feature = "gemini")]
pub mod gemini;
pub mod http;
pub mod mock;
pub mod parsing;

#[cfg(feature = "gemini")]
pub use gemini::GeminiBackend;
pub use http::HttpBackend;
pub use mock::{MockBackend, MockReply};

use crate::error::Result;
use crate::media::DataUri;
use crate::types::{Modality, PromptPart};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

/// Voice selection for speech output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechConfig {
    /// One narrator.
    Single { voice: String },
    /// Named speakers, each with its own voice, in order.
    MultiSpeaker { speakers: Vec<(String, String)> },
}

/// Generation options for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// What the model should produce. Defaults to text only.
    pub response_modalities: Vec<Modality>,
    /// Ask the model for a JSON value instead of free text.
    pub structured_output: bool,
    /// JSON-schema-like description of the expected structured value.
    pub output_schema: Option<Value>,
    pub speech: Option<SpeechConfig>,
    pub temperature: Option<f64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            response_modalities: vec![Modality::Text],
            structured_output: false,
            output_schema: None,
            speech: None,
            temperature: None,
        }
    }
}

/// A normalized model request, independent of the wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Model identifier (e.g. `"googleai/gemini-2.0-flash"`).
    pub model: String,
    /// Ordered prompt: text and inline media.
    pub parts: Vec<PromptPart>,
    pub system: Option<String>,
    pub config: GenerationConfig,
}

impl ModelRequest {
    pub fn new(model: impl Into<String>, parts: Vec<PromptPart>) -> Self {
        Self {
            model: model.into(),
            parts,
            system: None,
            config: GenerationConfig::default(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// All text parts concatenated.
    pub fn prompt_text(&self) -> String {
        self.parts.iter().filter_map(PromptPart::as_text).collect()
    }

    /// Inline media attachments in prompt order.
    pub fn media(&self) -> impl Iterator<Item = &DataUri> {
        self.parts.iter().filter_map(|p| match p {
            PromptPart::Media(m) => Some(m),
            PromptPart::Text(_) => None,
        })
    }
}

/// What came back from one exchange. Any field may be absent; which one a
/// flow needs depends on its modality.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub structured: Option<Value>,
    pub text: Option<String>,
    pub media: Option<DataUri>,
}

impl ModelResponse {
    pub fn structured(value: Value) -> Self {
        Self {
            structured: Some(value),
            ..Default::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn media(media: DataUri) -> Self {
        Self {
            media: Some(media),
            ..Default::default()
        }
    }

    /// True when nothing usable came back.
    pub fn is_empty(&self) -> bool {
        self.structured.is_none()
            && self.media.is_none()
            && self.text.as_deref().map_or(true, |t| t.trim().is_empty())
    }
}

/// A model provider: one request in, one response out.
///
/// Implementations must perform exactly one outbound exchange per call and
/// must not retry.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn invoke(
        &self,
        client: &Client,
        base_url: &str,
        request: &ModelRequest,
    ) -> Result<ModelResponse>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_text() {
        let config = GenerationConfig::default();
        assert_eq!(config.response_modalities, vec![Modality::Text]);
        assert!(!config.structured_output);
    }

    #[test]
    fn test_request_text_and_media() {
        let uri = DataUri::new("image/png", "AAAA");
        let req = ModelRequest::new(
            "m",
            vec![
                PromptPart::text("a "),
                PromptPart::Media(uri.clone()),
                PromptPart::text("b"),
            ],
        );
        assert_eq!(req.prompt_text(), "a b");
        assert_eq!(req.media().collect::<Vec<_>>(), vec![&uri]);
    }

    #[test]
    fn test_response_emptiness() {
        assert!(ModelResponse::default().is_empty());
        assert!(ModelResponse::text("  ").is_empty());
        assert!(!ModelResponse::text("hi").is_empty());
        assert!(!ModelResponse::structured(serde_json::json!({})).is_empty());
    }
}
