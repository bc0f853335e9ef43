//! Example: running studio flows against MockBackend, no service needed.
//!
//! Run with: `RUST_LOG=flowai_studio=debug cargo run --example mock_studio`

use flowai_studio::catalog::{self, creative, text_toolkit};
use flowai_studio::{DataUri, ExecCtx, FlowEngine, MockBackend, MockReply, ModelIds};
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let registry = Arc::new(catalog::studio_registry(&ModelIds::default())?);
    println!("{} flows registered", registry.len());

    // Grammar check: one structured reply.
    let grammar = FlowEngine::new(
        registry.clone(),
        ExecCtx::builder("http://unused")
            .backend(Arc::new(MockBackend::fixed_json(
                json!({"correctedText": "They're going to the park tomorrow."}),
            )))
            .build()?,
    );
    let out: text_toolkit::GrammarOutput = grammar
        .execute_typed(
            text_toolkit::CHECK_GRAMMAR,
            &text_toolkit::TextInput::new("Their going to the park tomorow."),
        )
        .await?;
    println!("Corrected: {}", out.corrected_text);

    // Validation failures never reach the backend.
    if let Err(e) = grammar
        .execute(text_toolkit::CHECK_GRAMMAR, json!({"text": ""}))
        .await
    {
        println!("Rejected: {}", e.user_message());
    }

    // Preview batch: the second request fails and is dropped.
    let previews = FlowEngine::new(
        registry,
        ExecCtx::builder("http://unused")
            .backend(Arc::new(MockBackend::new(vec![
                MockReply::media(DataUri::from_bytes("image/png", b"first")),
                MockReply::http_error(503, "overloaded"),
                MockReply::media(DataUri::from_bytes("image/png", b"third")),
            ])))
            .build()?,
    );
    let out: creative::PreviewImagesOutput = previews
        .execute_typed(
            creative::GENERATE_PREVIEW_IMAGES,
            &creative::PreviewImagesInput {
                prompt: "A lighthouse on a cliff at dusk".into(),
                ..Default::default()
            },
        )
        .await?;
    println!("Previews: {} of 3", out.images.len());

    Ok(())
}
