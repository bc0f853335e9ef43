//! Concurrent image fan-out with best-effort aggregation.
//!
//! One request per image, all sharing the same prompt text and reference
//! attachments. Completions arrive in any order; the output keeps request
//! order and silently shrinks when some requests fail.

use super::{invoke, is_present, transition, BoxFut, Flow, FlowCall, FlowState};
use crate::client::{GenerationConfig, ModelRequest};
use crate::error::{FlowError, Result};
use crate::exec_ctx::ExecCtx;
use crate::media::DataUri;
use crate::schema::FieldSchema;
use crate::types::{Modality, RenderedPrompt};
use futures::future::join_all;
use serde_json::{json, Value};

pub const DEFAULT_IMAGE_COUNT: usize = 3;

/// Reads `prompt`, `numImages` and the reference image fields from the
/// input; returns `{ "images": [<data uri>, ...] }`.
#[derive(Debug, Clone)]
pub struct BatchImageFlow {
    model: String,
    reference_fields: Vec<String>,
}

impl BatchImageFlow {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            reference_fields: vec![
                "referenceImage1".to_string(),
                "referenceImage2".to_string(),
                "referenceImage3".to_string(),
            ],
        }
    }

    /// Input fields holding optional reference images, attached in order.
    pub fn with_reference_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reference_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Requested image count. Validation bounds it; this only defaults it.
    pub fn count(input: &Value) -> usize {
        input
            .get("numImages")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_IMAGE_COUNT)
    }

    /// The request shared by every item of the batch.
    pub fn request(&self, flow: &str, input: &Value) -> ModelRequest {
        let text = input.get("prompt").and_then(Value::as_str).unwrap_or_default();
        let mut prompt = RenderedPrompt::from_text(text);
        for field in &self.reference_fields {
            if !is_present(input, field) {
                continue;
            }
            match input[field].as_str().map(DataUri::parse) {
                Some(Ok(uri)) => prompt.push_media(uri),
                _ => tracing::warn!(flow = flow, field = %field, "skipping invalid reference image"),
            }
        }
        ModelRequest::new(&self.model, prompt.into_parts()).with_config(GenerationConfig {
            response_modalities: vec![Modality::Text, Modality::Image],
            ..Default::default()
        })
    }
}

impl Flow for BatchImageFlow {
    fn kind(&self) -> &'static str {
        "batch-image"
    }

    fn check(&self, name: &str, input: &FieldSchema) -> Result<()> {
        let fields = ["prompt", "numImages"]
            .into_iter()
            .chain(self.reference_fields.iter().map(String::as_str));
        for field in fields {
            if input.field(field).is_none() {
                return Err(FlowError::UnresolvedPlaceholder {
                    flow: name.to_string(),
                    placeholder: field.to_string(),
                });
            }
        }
        Ok(())
    }

    fn run<'a>(&'a self, ctx: &'a ExecCtx, call: FlowCall<'a>) -> BoxFut<'a, Result<Value>> {
        Box::pin(async move {
            transition(call.name, FlowState::Rendering);
            let n = Self::count(call.input);
            let request = self.request(call.name, call.input);

            let results = join_all((0..n).map(|_| invoke(ctx, call.name, &request))).await;

            let mut images = Vec::with_capacity(n);
            for (i, result) in results.into_iter().enumerate() {
                match result {
                    Ok(response) => match response.media {
                        Some(media) => images.push(Value::String(media.to_string())),
                        None => tracing::warn!(flow = call.name, item = i, "no image in response, dropped"),
                    },
                    Err(e) => tracing::warn!(flow = call.name, item = i, error = %e, "batch item failed, dropped"),
                }
            }

            if images.is_empty() {
                return Err(FlowError::BatchFailed {
                    flow: call.name.to_string(),
                    attempted: n,
                });
            }
            tracing::debug!(flow = call.name, requested = n, produced = images.len(), "batch complete");
            Ok(json!({ "images": images }))
        })
    }
}
