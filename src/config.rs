//! Studio configuration.
//!
//! [`StudioConfig`] gathers what an embedding application decides at
//! startup: where the generation service lives, time limits, credentials
//! and which model serves each modality. Every field has a default, so an
//! empty document is a valid configuration.
//!
//! ```
//! use flowai_studio::StudioConfig;
//!
//! let config = StudioConfig::from_json_str(r#"{"base_url": "http://ai.internal:3400"}"#).unwrap();
//! assert_eq!(config.models.text, "googleai/gemini-2.0-flash");
//! ```

use crate::error::{FlowError, Result};
use crate::exec_ctx::ExecCtx;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TEXT_MODEL: &str = "googleai/gemini-2.0-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "googleai/gemini-2.0-flash-preview-image-generation";
pub const DEFAULT_SPEECH_MODEL: &str = "googleai/gemini-2.5-flash-preview-tts";

/// Model identifier per output modality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelIds {
    pub text: String,
    pub image: String,
    pub speech: String,
}

impl Default for ModelIds {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT_MODEL.to_string(),
            image: DEFAULT_IMAGE_MODEL.to_string(),
            speech: DEFAULT_SPEECH_MODEL.to_string(),
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub base_url: String,
    /// Per-request HTTP timeout.
    pub timeout_secs: u64,
    /// Whole-invocation deadline; unset means none.
    pub deadline_secs: Option<u64>,
    /// Bearer token for the gateway.
    pub api_key: Option<String>,
    pub models: ModelIds,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3400".to_string(),
            timeout_secs: 60,
            deadline_secs: None,
            api_key: None,
            models: ModelIds::default(),
        }
    }
}

impl std::fmt::Debug for StudioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioConfig")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("deadline_secs", &self.deadline_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("models", &self.models)
            .finish()
    }
}

impl StudioConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(s).map_err(|e| FlowError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no context could be built from.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(FlowError::InvalidConfig("base_url must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(FlowError::InvalidConfig("timeout_secs must be positive".into()));
        }
        if self.deadline_secs == Some(0) {
            return Err(FlowError::InvalidConfig("deadline_secs must be positive".into()));
        }
        for (modality, id) in [
            ("text", &self.models.text),
            ("image", &self.models.image),
            ("speech", &self.models.speech),
        ] {
            if id.trim().is_empty() {
                return Err(FlowError::InvalidConfig(format!(
                    "model id for {} must not be empty",
                    modality
                )));
            }
        }
        Ok(())
    }

    /// Build an [`ExecCtx`] using the gateway backend.
    pub fn exec_ctx(&self) -> Result<ExecCtx> {
        self.validate()?;
        let mut builder =
            ExecCtx::builder(&self.base_url).timeout(Duration::from_secs(self.timeout_secs));
        if let Some(secs) = self.deadline_secs {
            builder = builder.deadline(Duration::from_secs(secs));
        }
        if let Some(ref key) = self.api_key {
            builder = builder.api_key(key.clone());
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = StudioConfig::from_json_str("{}").unwrap();
        assert_eq!(config, StudioConfig::default());
        assert_eq!(config.models.speech, DEFAULT_SPEECH_MODEL);
    }

    #[test]
    fn test_partial_models_override() {
        let config =
            StudioConfig::from_json_str(r#"{"models": {"text": "googleai/gemini-2.5-pro"}}"#).unwrap();
        assert_eq!(config.models.text, "googleai/gemini-2.5-pro");
        assert_eq!(config.models.image, DEFAULT_IMAGE_MODEL);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            StudioConfig::from_json_str(r#"{"timeout_secs": 0}"#),
            Err(FlowError::InvalidConfig(_))
        ));
        assert!(StudioConfig::from_json_str(r#"{"base_url": "  "}"#).is_err());
        assert!(StudioConfig::from_json_str(r#"{"models": {"image": ""}}"#).is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = StudioConfig {
            api_key: Some("top-secret".into()),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("top-secret"));
    }

    #[test]
    fn test_exec_ctx_carries_deadline() {
        let config = StudioConfig {
            deadline_secs: Some(5),
            ..Default::default()
        };
        let ctx = config.exec_ctx().unwrap();
        assert_eq!(ctx.deadline, Some(Duration::from_secs(5)));
        assert_eq!(ctx.base_url, "http://localhost:3400");
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_from_yaml() {
        let config = StudioConfig::from_yaml_str(
            "base_url: http://gateway:8080\ndeadline_secs: 20\nmodels:\n  speech: custom-tts\n",
        )
        .unwrap();
        assert_eq!(config.base_url, "http://gateway:8080");
        assert_eq!(config.deadline_secs, Some(20));
        assert_eq!(config.models.speech, "custom-tts");
        assert_eq!(config.models.text, DEFAULT_TEXT_MODEL);
    }
}
