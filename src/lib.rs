//! # FlowAI Studio
//!
//! Typed AI-flow contracts for the FlowAI Studio content tools.
//!
//! Every capability (presentation generation, resume enhancement,
//! text-to-speech, text analysis, image previews) is a **flow**: a strict
//! input schema, an output schema, a prompt template or payload builder,
//! and one request/response exchange with a remote generation service.
//!
//! ## Core Concepts
//!
//! - **[`FieldSchema`](schema::FieldSchema)**: structural type descriptors
//!   with constraints. Validation returns a canonical value or every
//!   violation with its field path.
//! - **[`Template`](template::Template)**: handlebars-style prompt
//!   templates, parsed once and checked against the input schema when the
//!   flow is registered.
//! - **[`Backend`](client::Backend)**: one model exchange. [`HttpBackend`]
//!   talks to a generation gateway, `GeminiBackend` (feature `gemini`) to
//!   the Gemini REST API, [`MockBackend`] to nobody.
//! - **[`Flow`](flow::Flow)**: what a registered flow does between input
//!   validation and output validation.
//! - **[`FlowEngine`]**: runs flows by name against a shared
//!   [`SchemaRegistry`] and [`ExecCtx`].
//! - **[`catalog`]**: the studio's flows, ready to register.
//!
//! ## Quick Start
//!
//! ```no_run
//! use flowai_studio::catalog::{self, text_toolkit};
//! use flowai_studio::{FlowEngine, StudioConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StudioConfig::from_json_str(r#"{"base_url": "http://localhost:3400"}"#)?;
//!     let registry = catalog::studio_registry(&config.models)?;
//!     let engine = FlowEngine::new(Arc::new(registry), config.exec_ctx()?);
//!
//!     let out: text_toolkit::GrammarOutput = engine
//!         .execute_typed(
//!             text_toolkit::CHECK_GRAMMAR,
//!             &text_toolkit::TextInput::new("Their going to the park tomorow."),
//!         )
//!         .await?;
//!     println!("{}", out.corrected_text);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod exec_ctx;
pub mod flow;
pub mod media;
pub mod schema;
pub mod template;
pub mod types;

pub use client::{Backend, HttpBackend, MockBackend, MockReply, ModelRequest, ModelResponse};
#[cfg(feature = "gemini")]
pub use client::GeminiBackend;
pub use config::{ModelIds, StudioConfig};
pub use error::{FlowError, Result, SchemaStage, Violation};
pub use exec_ctx::{ExecCtx, ExecCtxBuilder};
pub use flow::{Flow, FlowEngine};
pub use media::DataUri;
pub use schema::{FieldSchema, FlowDefinition, SchemaRegistry};
pub use template::Template;
pub use types::{Modality, PromptPart, RenderedPrompt};
