//! Text-to-speech.

use crate::config::ModelIds;
use crate::error::Result;
use crate::flow::SpeechFlow;
use crate::schema::{FieldSchema, FlowDefinition, SchemaRegistry};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

pub const TEXT_TO_SPEECH: &str = "textToSpeech";

/// In multi-speaker mode the text is a dialogue whose lines are prefixed
/// with `Speaker1:` / `Speaker2:`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechInput {
    pub text: String,
    #[serde(default)]
    pub multi_speaker_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice2: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechOutput {
    /// `data:audio/wav;base64,...`
    pub media: String,
}

pub fn speech_input_schema() -> FieldSchema {
    FieldSchema::object([
        ("text", FieldSchema::string()),
        ("multiSpeakerMode", FieldSchema::boolean().with_default(json!(false))),
        ("voice1", FieldSchema::string().optional()),
        ("voice2", FieldSchema::string().optional()),
    ])
}

pub(super) fn register(registry: &mut SchemaRegistry, models: &ModelIds) -> Result<()> {
    registry.register(FlowDefinition::new(
        TEXT_TO_SPEECH,
        speech_input_schema(),
        FieldSchema::object([("media", FieldSchema::data_uri())]),
        Arc::new(SpeechFlow::new(&models.speech)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_defaults_to_single() {
        let canonical = speech_input_schema()
            .validate(&json!({"text": "Welcome back."}))
            .unwrap();
        assert_eq!(canonical, json!({"text": "Welcome back.", "multiSpeakerMode": false}));
        let typed: SpeechInput = serde_json::from_value(canonical).unwrap();
        assert!(!typed.multi_speaker_mode);
    }

    #[test]
    fn test_uses_speech_model() {
        let mut registry = SchemaRegistry::new();
        let models = ModelIds {
            speech: "custom-tts".into(),
            ..Default::default()
        };
        register(&mut registry, &models).unwrap();
        assert_eq!(registry.get(TEXT_TO_SPEECH).unwrap().flow.kind(), "speech");
    }
}
