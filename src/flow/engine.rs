//! The flow engine: one entry point for every registered flow.

use super::{transition, FlowCall, FlowState};
use crate::error::{FlowError, Result, SchemaStage};
use crate::exec_ctx::ExecCtx;
use crate::schema::registry::validate_against;
use crate::schema::{FlowDefinition, SchemaRegistry};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Runs flows by name against a shared registry and execution context.
///
/// Cheap to clone; every clone shares the same registry and context, and
/// calls may run concurrently.
///
/// # Example
///
/// ```
/// use flowai_studio::client::MockBackend;
/// use flowai_studio::flow::{FlowEngine, PromptFlow};
/// use flowai_studio::schema::{FieldSchema, FlowDefinition, SchemaRegistry};
/// use flowai_studio::ExecCtx;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let mut registry = SchemaRegistry::new();
/// registry.register(FlowDefinition::new(
///     "summarizeText",
///     FieldSchema::object([("text", FieldSchema::string().min_len(1))]),
///     FieldSchema::object([("summary", FieldSchema::string())]),
///     Arc::new(PromptFlow::new("m", "Summarize: {{{text}}}").unwrap()),
/// )).unwrap();
///
/// let mock = Arc::new(MockBackend::fixed_json(json!({"summary": "Short."})));
/// let ctx = ExecCtx::builder("http://unused").backend(mock).build().unwrap();
/// let engine = FlowEngine::new(Arc::new(registry), ctx);
///
/// let out = engine.execute("summarizeText", json!({"text": "A long text."})).await.unwrap();
/// assert_eq!(out["summary"], "Short.");
/// # });
/// ```
#[derive(Clone)]
pub struct FlowEngine {
    registry: Arc<SchemaRegistry>,
    ctx: Arc<ExecCtx>,
}

impl FlowEngine {
    pub fn new(registry: Arc<SchemaRegistry>, ctx: ExecCtx) -> Self {
        Self {
            registry,
            ctx: Arc::new(ctx),
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn ctx(&self) -> &ExecCtx {
        &self.ctx
    }

    /// Validate `input`, run the flow and validate what it produced.
    ///
    /// An invalid input fails before any model call. When the context
    /// carries a deadline, the whole invocation (batch fan-out included)
    /// must finish within it.
    pub async fn execute(&self, name: &str, input: Value) -> Result<Value> {
        let definition = self.registry.get(name)?;
        let started = Instant::now();
        tracing::info!(flow = name, kind = definition.flow.kind(), "flow started");

        let result = match self.ctx.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.run(definition, &input))
                .await
                .unwrap_or_else(|_| {
                    Err(FlowError::DeadlineExceeded {
                        flow: name.to_string(),
                        deadline,
                    })
                }),
            None => self.run(definition, &input).await,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => {
                transition(name, FlowState::Succeeded);
                tracing::info!(flow = name, elapsed_ms, "flow succeeded");
            }
            Err(e) => {
                transition(name, FlowState::Failed);
                tracing::info!(flow = name, elapsed_ms, error = %e, "flow failed");
            }
        }
        result
    }

    /// Typed wrapper around [`execute`](Self::execute).
    pub async fn execute_typed<I, O>(&self, name: &str, input: &I) -> Result<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let value = serde_json::to_value(input)?;
        let output = self.execute(name, value).await?;
        Ok(serde_json::from_value(output)?)
    }

    async fn run(&self, definition: &FlowDefinition, input: &Value) -> Result<Value> {
        let name = definition.name.as_str();
        transition(name, FlowState::Validating);
        let input = validate_against(name, &definition.input, SchemaStage::Input, input)?;

        let raw = definition
            .flow
            .run(
                &self.ctx,
                FlowCall {
                    name,
                    input: &input,
                    output: &definition.output,
                },
            )
            .await?;

        transition(name, FlowState::ValidatingOutput);
        validate_against(name, &definition.output, SchemaStage::Output, &raw)
    }
}

impl std::fmt::Debug for FlowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowEngine")
            .field("flows", &self.registry.len())
            .field("ctx", &self.ctx)
            .finish()
    }
}
