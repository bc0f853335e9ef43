//! Template-driven flows: structured text output and single images.

use super::{invoke, transition, BoxFut, Flow, FlowCall, FlowState};
use crate::client::parsing::structured_from_text;
use crate::client::{GenerationConfig, ModelRequest};
use crate::error::{FlowError, Result};
use crate::exec_ctx::ExecCtx;
use crate::schema::FieldSchema;
use crate::template::Template;
use crate::types::Modality;
use serde_json::{Map, Value};

/// Instruction appended to every structured prompt so models without a
/// native schema mode still see the expected shape.
fn format_instruction(schema: &Value) -> String {
    format!(
        "\n\nOutput should be in JSON format and conform to the following schema:\n\n```\n{}\n```\n",
        schema
    )
}

/// Renders a template and asks for a JSON value shaped like the output schema.
///
/// ```
/// use flowai_studio::flow::PromptFlow;
///
/// let flow = PromptFlow::new(
///     "googleai/gemini-2.0-flash",
///     "Extract the keywords from: \"{{{text}}}\"",
/// )
/// .unwrap()
/// .with_temperature(0.2);
/// assert_eq!(flow.model(), "googleai/gemini-2.0-flash");
/// ```
#[derive(Debug, Clone)]
pub struct PromptFlow {
    model: String,
    template: Template,
    system: Option<String>,
    temperature: Option<f64>,
}

impl PromptFlow {
    pub fn new(model: impl Into<String>, template: &str) -> Result<Self> {
        Ok(Self {
            model: model.into(),
            template: Template::parse(template)?,
            system: None,
            temperature: None,
        })
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// The exact request this flow would send for `input`.
    pub fn request(&self, input: &Value, output: &FieldSchema) -> ModelRequest {
        let schema = output.describe();
        let mut prompt = self.template.render(input);
        prompt.push_text(&format_instruction(&schema));

        let mut request = ModelRequest::new(&self.model, prompt.into_parts()).with_config(
            GenerationConfig {
                structured_output: true,
                output_schema: Some(schema),
                temperature: self.temperature,
                ..Default::default()
            },
        );
        request.system = self.system.clone();
        request
    }
}

impl Flow for PromptFlow {
    fn kind(&self) -> &'static str {
        "prompt"
    }

    fn check(&self, name: &str, input: &FieldSchema) -> Result<()> {
        self.template.check(name, input)
    }

    fn run<'a>(&'a self, ctx: &'a ExecCtx, call: FlowCall<'a>) -> BoxFut<'a, Result<Value>> {
        Box::pin(async move {
            transition(call.name, FlowState::Rendering);
            let request = self.request(call.input, call.output);

            let response = invoke(ctx, call.name, &request).await?;
            response
                .structured
                .or_else(|| response.text.as_deref().and_then(structured_from_text))
                .ok_or_else(|| FlowError::EmptyModelResponse(call.name.to_string()))
        })
    }
}

/// Renders a template and asks for one image, returned as
/// `{ <output_field>: "data:image/...;base64,..." }`.
#[derive(Debug, Clone)]
pub struct ImageFlow {
    model: String,
    template: Template,
    output_field: String,
}

impl ImageFlow {
    pub fn new(model: impl Into<String>, template: &str) -> Result<Self> {
        Ok(Self {
            model: model.into(),
            template: Template::parse(template)?,
            output_field: "image".to_string(),
        })
    }

    /// Name of the output field holding the image. Default: `image`.
    pub fn with_output_field(mut self, field: impl Into<String>) -> Self {
        self.output_field = field.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn request(&self, input: &Value) -> ModelRequest {
        let prompt = self.template.render(input);
        ModelRequest::new(&self.model, prompt.into_parts()).with_config(GenerationConfig {
            response_modalities: vec![Modality::Text, Modality::Image],
            ..Default::default()
        })
    }
}

impl Flow for ImageFlow {
    fn kind(&self) -> &'static str {
        "image"
    }

    fn check(&self, name: &str, input: &FieldSchema) -> Result<()> {
        self.template.check(name, input)
    }

    fn run<'a>(&'a self, ctx: &'a ExecCtx, call: FlowCall<'a>) -> BoxFut<'a, Result<Value>> {
        Box::pin(async move {
            transition(call.name, FlowState::Rendering);
            let request = self.request(call.input);

            let response = invoke(ctx, call.name, &request).await?;
            match response.media {
                Some(media) if media.is_image() => {
                    let mut out = Map::new();
                    out.insert(self.output_field.clone(), Value::String(media.to_string()));
                    Ok(Value::Object(out))
                }
                Some(media) => {
                    tracing::warn!(flow = call.name, mime = media.mime_type(), "expected an image");
                    Err(FlowError::EmptyModelResponse(call.name.to_string()))
                }
                None => Err(FlowError::EmptyModelResponse(call.name.to_string())),
            }
        })
    }
}
