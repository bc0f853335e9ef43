//! Backend for the Google Gemini `generateContent` REST API.
//!
//! Differences from the gateway wire shape:
//! - `contents[].parts[]` with `text` or `inline_data { mime_type, data }`
//! - system text goes in a top-level `system_instruction`
//! - options live under `generationConfig`; structured output is requested
//!   with `responseMimeType: application/json`
//! - response parts come back as `text` or `inlineData { mimeType, data }`
//! - the key travels in the `x-goog-api-key` header

use super::parsing::structured_from_text;
use super::{Backend, ModelRequest, ModelResponse, SpeechConfig};
use crate::error::{FlowError, Result};
use crate::media::DataUri;
use crate::types::PromptPart;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Default endpoint when the context's base URL is left empty.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Clone)]
pub struct GeminiBackend {
    api_key: String,
    api_version: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("api_key", &"***")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_version: "v1beta".to_string(),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// `googleai/gemini-2.0-flash` → `gemini-2.0-flash`.
    fn model_name(model: &str) -> &str {
        model.strip_prefix("googleai/").unwrap_or(model)
    }

    fn url(&self, base_url: &str, model: &str) -> String {
        let base = base_url.trim_end_matches('/');
        let base = if base.is_empty() { GEMINI_BASE_URL } else { base };
        format!(
            "{}/{}/models/{}:generateContent",
            base,
            self.api_version,
            Self::model_name(model)
        )
    }

    fn parts_json(parts: &[PromptPart]) -> Vec<Value> {
        parts
            .iter()
            .map(|part| match part {
                PromptPart::Text(text) => json!({ "text": text }),
                PromptPart::Media(uri) => json!({
                    "inline_data": { "mime_type": uri.mime_type(), "data": uri.base64_data() }
                }),
            })
            .collect()
    }

    pub(crate) fn build_body(request: &ModelRequest) -> Value {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": Self::parts_json(&request.parts) }],
        });
        if let Some(ref system) = request.system {
            body["system_instruction"] = json!({ "parts": [{ "text": system }] });
        }

        let config = &request.config;
        let modalities: Vec<&str> = config.response_modalities.iter().map(|m| m.as_str()).collect();
        let mut gen_config = json!({ "responseModalities": modalities });
        if config.structured_output {
            gen_config["responseMimeType"] = json!("application/json");
        }
        if let Some(t) = config.temperature {
            gen_config["temperature"] = json!(t);
        }
        if let Some(ref speech) = config.speech {
            gen_config["speechConfig"] = match speech {
                SpeechConfig::Single { voice } => json!({
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
                }),
                SpeechConfig::MultiSpeaker { speakers } => json!({
                    "multiSpeakerVoiceConfig": {
                        "speakerVoiceConfigs": speakers.iter().map(|(speaker, voice)| json!({
                            "speaker": speaker,
                            "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
                        })).collect::<Vec<_>>()
                    }
                }),
            };
        }
        body["generationConfig"] = gen_config;
        body
    }

    pub(crate) fn parse_body(request: &ModelRequest, body: &Value) -> ModelResponse {
        let parts = body
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();
        let text = (!text.is_empty()).then_some(text);

        let media = parts.iter().find_map(|p| {
            let inline = p.get("inlineData").or_else(|| p.get("inline_data"))?;
            let mime = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)?;
            let data = inline.get("data").and_then(Value::as_str)?;
            Some(DataUri::new(mime, data))
        });

        let structured = if request.config.structured_output {
            text.as_deref().and_then(structured_from_text)
        } else {
            None
        };

        if let Some(reason) = body.pointer("/candidates/0/finishReason").and_then(Value::as_str) {
            if reason != "STOP" {
                tracing::warn!(finish_reason = reason, "gemini stopped early");
            }
        }

        ModelResponse {
            structured,
            text,
            media,
        }
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    async fn invoke(
        &self,
        client: &Client,
        base_url: &str,
        request: &ModelRequest,
    ) -> Result<ModelResponse> {
        let url = self.url(base_url, &request.model);
        let body = Self::build_body(request);

        tracing::debug!(url = %url, "sending generateContent request");

        let resp = client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(FlowError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let text = resp.text().await?;
        let json_resp: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(model = %request.model, error = %e, "reply body is not JSON");
                return Ok(ModelResponse::default());
            }
        };
        Ok(Self::parse_body(request, &json_resp))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GenerationConfig;
    use crate::types::Modality;

    #[test]
    fn test_url_strips_provider_prefix() {
        let backend = GeminiBackend::new("k");
        assert_eq!(
            backend.url("", "googleai/gemini-2.0-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(
            backend.url("http://proxy/", "gemini-2.5-flash-preview-tts"),
            "http://proxy/v1beta/models/gemini-2.5-flash-preview-tts:generateContent"
        );
    }

    #[test]
    fn test_build_body_inline_data_and_json_mode() {
        let request = ModelRequest::new(
            "googleai/gemini-2.0-flash",
            vec![
                PromptPart::text("Describe the style: "),
                PromptPart::Media(DataUri::new("image/jpeg", "/9j/")),
            ],
        )
        .with_system("art critic")
        .with_config(GenerationConfig {
            structured_output: true,
            ..Default::default()
        });
        let body = GeminiBackend::build_body(&request);
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "Describe the style: ");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "/9j/");
        assert_eq!(body["system_instruction"]["parts"][0]["text"], "art critic");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_parse_body_text_and_image() {
        let request = ModelRequest::new("img", vec![]).with_config(GenerationConfig {
            response_modalities: vec![Modality::Text, Modality::Image],
            ..Default::default()
        });
        let body = json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "Here you go"},
                    {"inlineData": {"mimeType": "image/png", "data": "iVBOR"}}
                ]},
                "finishReason": "STOP"
            }]
        });
        let resp = GeminiBackend::parse_body(&request, &body);
        assert_eq!(resp.text.as_deref(), Some("Here you go"));
        assert_eq!(resp.media.unwrap().to_string(), "data:image/png;base64,iVBOR");
        assert!(resp.structured.is_none());
    }

    #[test]
    fn test_parse_body_structured_from_text() {
        let request = ModelRequest::new("m", vec![]).with_config(GenerationConfig {
            structured_output: true,
            ..Default::default()
        });
        let body = json!({"candidates": [{"content": {"parts": [{"text": "{\"summary\": \"short\"}"}]}}]});
        let resp = GeminiBackend::parse_body(&request, &body);
        assert_eq!(resp.structured, Some(json!({"summary": "short"})));
    }

    #[test]
    fn test_debug_hides_key() {
        let dbg = format!("{:?}", GeminiBackend::new("AIza-secret"));
        assert!(!dbg.contains("AIza"));
    }
}
