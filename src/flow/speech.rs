//! Text-to-speech flow.
//!
//! Reads `text`, `multiSpeakerMode`, `voice1` and `voice2` from the input.
//! Raw PCM coming back from the model is wrapped into a WAV container, so
//! the output is always `{ "media": "data:audio/wav;base64,..." }`.

use super::{invoke, is_present, transition, BoxFut, Flow, FlowCall, FlowState};
use crate::client::{GenerationConfig, ModelRequest, SpeechConfig};
use crate::error::{FlowError, Result};
use crate::exec_ctx::ExecCtx;
use crate::media::{is_wav, pcm_to_wav, DataUri, PcmFormat};
use crate::schema::FieldSchema;
use crate::types::{Modality, PromptPart};
use serde_json::{json, Value};

pub const DEFAULT_SPEAKER1_VOICE: &str = "Algenib";
pub const DEFAULT_SPEAKER2_VOICE: &str = "Achernar";

pub const SPEAKER1: &str = "Speaker1";
pub const SPEAKER2: &str = "Speaker2";

#[derive(Debug, Clone)]
pub struct SpeechFlow {
    model: String,
    pcm: PcmFormat,
}

impl SpeechFlow {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            pcm: PcmFormat::default(),
        }
    }

    /// Format assumed for headerless audio returned by the model.
    pub fn with_pcm_format(mut self, pcm: PcmFormat) -> Self {
        self.pcm = pcm;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Voice selection for an input. Missing or empty voices fall back to
    /// the defaults.
    pub fn speech_config(input: &Value) -> SpeechConfig {
        let voice = |field: &str, default: &str| -> String {
            if is_present(input, field) {
                input[field].as_str().unwrap_or(default).to_string()
            } else {
                default.to_string()
            }
        };
        let voice1 = voice("voice1", DEFAULT_SPEAKER1_VOICE);

        let multi = input
            .get("multiSpeakerMode")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if multi {
            SpeechConfig::MultiSpeaker {
                speakers: vec![
                    (SPEAKER1.to_string(), voice1),
                    (SPEAKER2.to_string(), voice("voice2", DEFAULT_SPEAKER2_VOICE)),
                ],
            }
        } else {
            SpeechConfig::Single { voice: voice1 }
        }
    }

    pub fn request(&self, input: &Value) -> ModelRequest {
        let text = input.get("text").and_then(Value::as_str).unwrap_or_default();
        ModelRequest::new(&self.model, vec![PromptPart::text(text)]).with_config(
            GenerationConfig {
                response_modalities: vec![Modality::Audio],
                speech: Some(Self::speech_config(input)),
                ..Default::default()
            },
        )
    }

    fn to_wav_uri(&self, media: &DataUri) -> Result<DataUri> {
        let bytes = media.decode()?;
        if is_wav(&bytes) {
            return Ok(DataUri::new("audio/wav", media.base64_data()));
        }
        Ok(DataUri::from_bytes("audio/wav", &pcm_to_wav(&bytes, self.pcm)))
    }
}

impl Flow for SpeechFlow {
    fn kind(&self) -> &'static str {
        "speech"
    }

    fn check(&self, name: &str, input: &FieldSchema) -> Result<()> {
        match input.field("text").map(FieldSchema::inner) {
            Some(FieldSchema::String(_)) => Ok(()),
            _ => Err(FlowError::UnresolvedPlaceholder {
                flow: name.to_string(),
                placeholder: "text".to_string(),
            }),
        }
    }

    fn run<'a>(&'a self, ctx: &'a ExecCtx, call: FlowCall<'a>) -> BoxFut<'a, Result<Value>> {
        Box::pin(async move {
            transition(call.name, FlowState::Rendering);
            let request = self.request(call.input);

            let response = invoke(ctx, call.name, &request).await?;
            let media = response
                .media
                .ok_or_else(|| FlowError::EmptyModelResponse(call.name.to_string()))?;
            let wav = self.to_wav_uri(&media)?;
            tracing::debug!(flow = call.name, source_mime = media.mime_type(), "packaged audio");
            Ok(json!({ "media": wav.to_string() }))
        })
    }
}
