//! Backend for the studio's generation gateway.
//!
//! Endpoint: `POST {base_url}/generate`.
//!
//! Request body:
//!
//! ```text
//! { "model": "...",
//!   "prompt": [ {"text": "..."} | {"media": {"url": "data:...", "contentType": "..."}} ],
//!   "system": "...",
//!   "config": { "responseModalities": ["TEXT"], "structuredOutput": true,
//!               "outputSchema": {...}, "speechConfig": {...}, "temperature": 0.7 } }
//! ```
//!
//! Response body: `{ "structuredOutput"?: any, "text"?: "...", "media"?: {"url": "data:..."} }`.
//! A 2xx reply whose body is not JSON counts as an empty response, so the
//! flow reports it as [`FlowError::EmptyModelResponse`].

use super::parsing::structured_from_text;
use super::{Backend, ModelRequest, ModelResponse, SpeechConfig};
use crate::error::{FlowError, Result};
use crate::media::DataUri;
use crate::types::PromptPart;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Backend speaking the gateway's single JSON wire shape.
///
/// # Example
///
/// ```
/// use flowai_studio::client::HttpBackend;
///
/// let backend = HttpBackend::new().with_api_key("secret-token");
/// assert!(backend.has_api_key());
/// ```
#[derive(Clone, Default)]
pub struct HttpBackend {
    /// Sent as `Authorization: Bearer {key}` when set.
    pub(crate) api_key: Option<String>,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl HttpBackend {
    pub fn new() -> Self {
        Self { api_key: None }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn prompt_json(parts: &[PromptPart]) -> Vec<Value> {
        parts
            .iter()
            .map(|part| match part {
                PromptPart::Text(text) => json!({ "text": text }),
                PromptPart::Media(uri) => json!({
                    "media": { "url": uri.to_string(), "contentType": uri.mime_type() }
                }),
            })
            .collect()
    }

    pub(crate) fn speech_json(speech: &SpeechConfig) -> Value {
        match speech {
            SpeechConfig::Single { voice } => json!({
                "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
            }),
            SpeechConfig::MultiSpeaker { speakers } => {
                let configs: Vec<Value> = speakers
                    .iter()
                    .map(|(speaker, voice)| {
                        json!({
                            "speaker": speaker,
                            "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
                        })
                    })
                    .collect();
                json!({ "multiSpeakerVoiceConfig": { "speakerVoiceConfigs": configs } })
            }
        }
    }

    /// Build the JSON body for `/generate`.
    pub(crate) fn build_body(request: &ModelRequest) -> Value {
        let modalities: Vec<&str> = request
            .config
            .response_modalities
            .iter()
            .map(|m| m.as_str())
            .collect();
        let mut config = json!({ "responseModalities": modalities });
        if request.config.structured_output {
            config["structuredOutput"] = json!(true);
        }
        if let Some(ref schema) = request.config.output_schema {
            config["outputSchema"] = schema.clone();
        }
        if let Some(ref speech) = request.config.speech {
            config["speechConfig"] = Self::speech_json(speech);
        }
        if let Some(t) = request.config.temperature {
            config["temperature"] = json!(t);
        }

        let mut body = json!({
            "model": request.model,
            "prompt": Self::prompt_json(&request.parts),
            "config": config,
        });
        if let Some(ref system) = request.system {
            if !system.is_empty() {
                body["system"] = json!(system);
            }
        }
        body
    }

    /// Map the gateway's reply into a [`ModelResponse`].
    pub(crate) fn parse_body(request: &ModelRequest, body: &Value) -> ModelResponse {
        let text = body
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut structured = body
            .get("structuredOutput")
            .filter(|v| !v.is_null())
            .cloned();
        if structured.is_none() && request.config.structured_output {
            structured = text.as_deref().and_then(structured_from_text);
            if structured.is_some() {
                tracing::warn!(model = %request.model, "recovered structured output from text");
            }
        }

        let media = body
            .get("media")
            .and_then(|m| m.get("url"))
            .and_then(Value::as_str)
            .and_then(|url| match DataUri::parse(url) {
                Ok(uri) => Some(uri),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding media that is not a data URI");
                    None
                }
            });

        ModelResponse {
            structured,
            text,
            media,
        }
    }

    fn build_http_request(&self, client: &Client, url: &str, body: &Value) -> reqwest::RequestBuilder {
        let mut req = client.post(url).json(body);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }
        req
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn invoke(
        &self,
        client: &Client,
        base_url: &str,
        request: &ModelRequest,
    ) -> Result<ModelResponse> {
        let url = format!("{}/generate", base_url.trim_end_matches('/'));
        let body = Self::build_body(request);

        tracing::debug!(url = %url, model = %request.model, parts = request.parts.len(), "sending generate request");

        let resp = self.build_http_request(client, &url, &body).send().await?;

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
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GenerationConfig;
    use crate::types::Modality;

    fn structured_request() -> ModelRequest {
        ModelRequest::new("googleai/gemini-2.0-flash", vec![PromptPart::text("Fix: teh cat")])
            .with_config(GenerationConfig {
                structured_output: true,
                output_schema: Some(json!({"type": "object"})),
                ..Default::default()
            })
    }

    #[test]
    fn test_debug_redacts_key() {
        let backend = HttpBackend::new().with_api_key("sk-very-secret");
        let dbg = format!("{:?}", backend);
        assert!(!dbg.contains("very-secret"));
        assert!(dbg.contains("***"));
    }

    #[test]
    fn test_build_body_text_and_media() {
        let uri = DataUri::new("image/png", "AAAA");
        let request = ModelRequest::new(
            "img-model",
            vec![PromptPart::text("Redesign: "), PromptPart::Media(uri)],
        )
        .with_system("be brief")
        .with_config(GenerationConfig {
            response_modalities: vec![Modality::Text, Modality::Image],
            ..Default::default()
        });
        let body = HttpBackend::build_body(&request);
        assert_eq!(body["model"], "img-model");
        assert_eq!(body["system"], "be brief");
        assert_eq!(body["prompt"][0]["text"], "Redesign: ");
        assert_eq!(body["prompt"][1]["media"]["url"], "data:image/png;base64,AAAA");
        assert_eq!(body["prompt"][1]["media"]["contentType"], "image/png");
        assert_eq!(body["config"]["responseModalities"], json!(["TEXT", "IMAGE"]));
        assert!(body["config"].get("structuredOutput").is_none());
    }

    #[test]
    fn test_build_body_structured_and_speech() {
        let body = HttpBackend::build_body(&structured_request());
        assert_eq!(body["config"]["structuredOutput"], true);
        assert_eq!(body["config"]["outputSchema"]["type"], "object");
        assert!(body.get("system").is_none());

        let speech = HttpBackend::speech_json(&SpeechConfig::MultiSpeaker {
            speakers: vec![
                ("Speaker1".into(), "Algenib".into()),
                ("Speaker2".into(), "Achernar".into()),
            ],
        });
        let configs = &speech["multiSpeakerVoiceConfig"]["speakerVoiceConfigs"];
        assert_eq!(configs[0]["speaker"], "Speaker1");
        assert_eq!(configs[1]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"], "Achernar");
    }

    #[test]
    fn test_parse_body_prefers_structured_field() {
        let resp = HttpBackend::parse_body(
            &structured_request(),
            &json!({"structuredOutput": {"correctedText": "the cat"}, "text": "ignored"}),
        );
        assert_eq!(resp.structured, Some(json!({"correctedText": "the cat"})));
    }

    #[test]
    fn test_parse_body_recovers_json_from_text() {
        let resp = HttpBackend::parse_body(
            &structured_request(),
            &json!({"text": "```json\n{\"correctedText\": \"the cat\"}\n```"}),
        );
        assert_eq!(resp.structured, Some(json!({"correctedText": "the cat"})));
    }

    #[test]
    fn test_parse_body_media() {
        let request = ModelRequest::new("img", vec![PromptPart::text("draw")]);
        let resp = HttpBackend::parse_body(
            &request,
            &json!({"media": {"url": "data:image/png;base64,iVBOR"}}),
        );
        assert_eq!(resp.media.unwrap().mime_type(), "image/png");

        let bad = HttpBackend::parse_body(&request, &json!({"media": {"url": "https://x/y.png"}}));
        assert!(bad.media.is_none());
        assert!(bad.is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let backend = HttpBackend::new();
        let client = Client::new();
        let err = backend
            .invoke(&client, "http://127.0.0.1:1", &structured_request())
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Transport(_)));
    }
}
