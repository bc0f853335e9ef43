//! Conditional flow: exactly one of two sub-flows runs, chosen by which
//! optional input field is present.

use super::{is_present, BoxFut, Flow, FlowCall};
use crate::error::{FlowError, Result, SchemaStage};
use crate::exec_ctx::ExecCtx;
use crate::schema::registry::validate_against;
use crate::schema::FieldSchema;
use serde_json::Value;
use std::sync::Arc;

/// One arm of a [`BranchFlow`].
#[derive(Clone)]
pub struct Branch {
    field: String,
    flow: Arc<dyn Flow>,
    output: FieldSchema,
    finish: fn(Value) -> Value,
}

impl Branch {
    /// Runs `flow` when `field` is present; its result must match `output`.
    pub fn new(field: impl Into<String>, flow: Arc<dyn Flow>, output: FieldSchema) -> Self {
        Self {
            field: field.into(),
            flow,
            output,
            finish: std::convert::identity,
        }
    }

    /// Reshape the validated sub-flow output into the parent's output.
    pub fn map(mut self, finish: fn(Value) -> Value) -> Self {
        self.finish = finish;
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl std::fmt::Debug for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Branch")
            .field("field", &self.field)
            .field("kind", &self.flow.kind())
            .finish()
    }
}

/// Checks `first.field`, then `second.field`. When both are present the
/// first wins; when neither is, the call fails with
/// [`FlowError::MissingRequiredAlternative`] before any model call.
#[derive(Debug, Clone)]
pub struct BranchFlow {
    first: Branch,
    second: Branch,
}

impl BranchFlow {
    pub fn new(first: Branch, second: Branch) -> Self {
        Self { first, second }
    }

    /// The branch that would run for `input`, if any.
    pub fn select(&self, input: &Value) -> Option<&Branch> {
        [&self.first, &self.second]
            .into_iter()
            .find(|branch| is_present(input, &branch.field))
    }
}

impl Flow for BranchFlow {
    fn kind(&self) -> &'static str {
        "branch"
    }

    fn check(&self, name: &str, input: &FieldSchema) -> Result<()> {
        for branch in [&self.first, &self.second] {
            if input.field(&branch.field).is_none() {
                return Err(FlowError::UnresolvedPlaceholder {
                    flow: name.to_string(),
                    placeholder: branch.field.clone(),
                });
            }
            branch.flow.check(name, input)?;
        }
        Ok(())
    }

    fn run<'a>(&'a self, ctx: &'a ExecCtx, call: FlowCall<'a>) -> BoxFut<'a, Result<Value>> {
        Box::pin(async move {
            let branch = self.select(call.input).ok_or_else(|| {
                FlowError::MissingRequiredAlternative {
                    flow: call.name.to_string(),
                    alternatives: vec![self.first.field.clone(), self.second.field.clone()],
                }
            })?;
            tracing::debug!(flow = call.name, branch = %branch.field, "branch selected");

            let raw = branch
                .flow
                .run(
                    ctx,
                    FlowCall {
                        name: call.name,
                        input: call.input,
                        output: &branch.output,
                    },
                )
                .await?;
            let value = validate_against(call.name, &branch.output, SchemaStage::Output, &raw)?;
            Ok((branch.finish)(value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockBackend, MockReply};
    use crate::flow::{ImageFlow, PromptFlow};
    use crate::media::DataUri;
    use serde_json::json;

    fn slides_output() -> FieldSchema {
        FieldSchema::object([(
            "slides",
            FieldSchema::array(FieldSchema::object([
                ("title", FieldSchema::string()),
                ("content", FieldSchema::array(FieldSchema::string())),
            ])),
        )])
    }

    fn flow() -> BranchFlow {
        let image = Branch::new(
            "imageUri",
            Arc::new(ImageFlow::new("img", "Redesign: {{media url=imageUri}}").unwrap()),
            FieldSchema::object([("image", FieldSchema::data_uri())]),
        )
        .map(|v| json!({"slides": [], "image": v["image"]}));
        let text = Branch::new(
            "text",
            Arc::new(PromptFlow::new("m", "Text Content: {{{text}}}").unwrap()),
            slides_output(),
        );
        BranchFlow::new(image, text)
    }

    fn input_schema() -> FieldSchema {
        FieldSchema::object([
            ("imageUri", FieldSchema::data_uri().optional()),
            ("text", FieldSchema::string().optional()),
            ("style", FieldSchema::string().optional()),
        ])
    }

    #[test]
    fn test_selection_order() {
        let flow = flow();
        assert_eq!(flow.select(&json!({"imageUri": "data:image/png;base64,AA", "text": "t"})).unwrap().field(), "imageUri");
        assert_eq!(flow.select(&json!({"imageUri": "", "text": "t"})).unwrap().field(), "text");
        assert!(flow.select(&json!({"style": "Creative"})).is_none());
    }

    #[test]
    fn test_check_rejects_unknown_field() {
        let schema = FieldSchema::object([("text", FieldSchema::string().optional())]);
        assert!(matches!(
            flow().check("enhancePptSlide", &schema),
            Err(FlowError::UnresolvedPlaceholder { ref placeholder, .. }) if placeholder == "imageUri"
        ));
        assert!(flow().check("enhancePptSlide", &input_schema()).is_ok());
    }

    #[tokio::test]
    async fn test_neither_present_makes_no_call() {
        let mock = Arc::new(MockBackend::default());
        let ctx = ExecCtx::builder("http://unused").backend(mock.clone()).build().unwrap();
        let input = json!({"style": "Creative"});
        let output = FieldSchema::empty_object();
        let err = flow()
            .run(&ctx, FlowCall { name: "enhancePptSlide", input: &input, output: &output })
            .await
            .unwrap_err();
        match err {
            FlowError::MissingRequiredAlternative { alternatives, .. } => {
                assert_eq!(alternatives, vec!["imageUri", "text"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(mock.invocation_count(), 0);
    }

    #[tokio::test]
    async fn test_image_branch_reshapes_output() {
        let image = DataUri::new("image/png", "QUJD");
        let mock = Arc::new(MockBackend::fixed(MockReply::media(image.clone())));
        let ctx = ExecCtx::builder("http://unused").backend(mock.clone()).build().unwrap();
        let input = json!({"imageUri": "data:image/jpeg;base64,/9j/", "text": "ignored"});
        let output = FieldSchema::empty_object();
        let value = flow()
            .run(&ctx, FlowCall { name: "enhancePptSlide", input: &input, output: &output })
            .await
            .unwrap();
        assert_eq!(value, json!({"slides": [], "image": image.to_string()}));
        assert_eq!(mock.invocation_count(), 1);
        assert_eq!(mock.last_request().unwrap().media().count(), 1);
    }

    #[tokio::test]
    async fn test_sub_output_is_validated() {
        let mock = Arc::new(MockBackend::fixed_json(json!({"slides": [{"title": "A"}]})));
        let ctx = ExecCtx::builder("http://unused").backend(mock).build().unwrap();
        let input = json!({"text": "A long article"});
        let output = FieldSchema::empty_object();
        let err = flow()
            .run(&ctx, FlowCall { name: "enhancePptSlide", input: &input, output: &output })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FlowError::SchemaValidation { stage: SchemaStage::Output, .. }
        ));
        assert_eq!(err.field_paths(), vec!["slides[0].content"]);
    }
}
