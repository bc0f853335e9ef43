//! Flow orchestration.
//!
//! A [`Flow`] knows how to turn one validated input into one model exchange
//! (or, for the batch kind, N of them) and back into an output value. The
//! [`FlowEngine`] wraps every call in the same lifecycle:
//!
//! ```text
//! Idle → Validating → Rendering → Invoking → ValidatingOutput → Succeeded | Failed
//! ```
//!
//! Input violations stop the call before `Rendering`, so a bad input never
//! reaches the network.
//!
//! Flow kinds:
//! - [`PromptFlow`]: template → structured JSON output
//! - [`ImageFlow`]: template → one generated image
//! - [`SpeechFlow`]: text → WAV audio, single or multi-speaker
//! - [`BranchFlow`]: picks one of two sub-flows by which input is present
//! - [`BatchImageFlow`]: N concurrent image requests, best-effort aggregation

pub mod batch;
pub mod branch;
pub mod engine;
pub mod prompt;
pub mod speech;

pub use batch::BatchImageFlow;
pub use branch::{Branch, BranchFlow};
pub use engine::FlowEngine;
pub use prompt::{ImageFlow, PromptFlow};
pub use speech::{SpeechFlow, DEFAULT_SPEAKER1_VOICE, DEFAULT_SPEAKER2_VOICE};

use crate::client::{ModelRequest, ModelResponse};
use crate::error::Result;
use crate::exec_ctx::ExecCtx;
use crate::schema::FieldSchema;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// A boxed, pinned, Send future: the return type of [`Flow::run`].
pub type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Lifecycle of one invocation, reported through `tracing` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Validating,
    Rendering,
    Invoking,
    ValidatingOutput,
    Succeeded,
    Failed,
}

impl FlowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::Validating => "validating",
            FlowState::Rendering => "rendering",
            FlowState::Invoking => "invoking",
            FlowState::ValidatingOutput => "validating-output",
            FlowState::Succeeded => "succeeded",
            FlowState::Failed => "failed",
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn transition(flow: &str, state: FlowState) {
    tracing::debug!(flow = flow, state = %state, "flow state");
}

/// One call as seen by a flow implementation.
#[derive(Debug, Clone, Copy)]
pub struct FlowCall<'a> {
    /// Registered flow name, for errors and logs.
    pub name: &'a str,
    /// Input in canonical form.
    pub input: &'a Value,
    /// Schema the produced value will be checked against.
    pub output: &'a FieldSchema,
}

/// Object-safe trait for executable flows.
///
/// Implementations are stored as `Arc<dyn Flow>` inside a
/// [`FlowDefinition`](crate::schema::FlowDefinition). Output validation is
/// the engine's job; `run` returns the raw value it built.
pub trait Flow: Send + Sync {
    /// Stable identifier for the flow kind (e.g. `"prompt"`, `"batch-image"`).
    fn kind(&self) -> &'static str;

    /// Registration-time check of everything the flow reads from its input.
    fn check(&self, name: &str, input: &FieldSchema) -> Result<()>;

    fn run<'a>(&'a self, ctx: &'a ExecCtx, call: FlowCall<'a>) -> BoxFut<'a, Result<Value>>;
}

/// Send one request through the context's backend.
pub(crate) async fn invoke(ctx: &ExecCtx, flow: &str, request: &ModelRequest) -> Result<ModelResponse> {
    transition(flow, FlowState::Invoking);
    tracing::debug!(
        flow = flow,
        backend = ctx.backend.name(),
        model = %request.model,
        prompt_chars = request.prompt_text().len(),
        attachments = request.media().count(),
        "invoking model"
    );
    ctx.backend.invoke(&ctx.client, &ctx.base_url, request).await
}

/// Whether an optional input field carries a value. Empty strings count as absent.
pub(crate) fn is_present(input: &Value, field: &str) -> bool {
    match input.get(field) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_presence() {
        let input = json!({"a": "x", "b": "", "c": null, "d": 0});
        assert!(is_present(&input, "a"));
        assert!(!is_present(&input, "b"));
        assert!(!is_present(&input, "c"));
        assert!(is_present(&input, "d"));
        assert!(!is_present(&input, "missing"));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(FlowState::ValidatingOutput.to_string(), "validating-output");
        assert_eq!(FlowState::Idle.as_str(), "idle");
    }
}
