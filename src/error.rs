use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which side of a flow a schema check ran on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStage {
    /// Caller-supplied input, checked before any network call.
    Input,
    /// Model output, checked after the remote call.
    Output,
}

impl fmt::Display for SchemaStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaStage::Input => write!(f, "input"),
            SchemaStage::Output => write!(f, "output"),
        }
    }
}

/// A single constraint failure, located by its field path (`slides[2].title`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path to the offending field. Empty for the root value.
    pub path: String,
    /// Human-readable description of the violated constraint.
    pub constraint: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            constraint: constraint.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "<root>: {}", self.constraint)
        } else {
            write!(f, "{}: {}", self.path, self.constraint)
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors produced by the flow layer.
#[derive(Error, Debug)]
pub enum FlowError {
    /// A value did not satisfy a flow's input or output schema.
    #[error("{stage} of flow '{flow}' failed validation: {}", join_violations(.violations))]
    SchemaValidation {
        flow: String,
        stage: SchemaStage,
        violations: Vec<Violation>,
    },

    /// A template references a field that its input schema does not declare.
    #[error("template of flow '{flow}' references unknown field '{placeholder}'")]
    UnresolvedPlaceholder { flow: String, placeholder: String },

    /// A template could not be parsed.
    #[error("template syntax error at byte {offset}: {message}")]
    TemplateSyntax { offset: usize, message: String },

    /// A flow with this name is already registered.
    #[error("flow '{0}' is already registered")]
    DuplicateFlowName(String),

    /// No flow with this name is registered.
    #[error("unknown flow '{0}'")]
    UnknownFlow(String),

    /// The remote call could not complete (connection refused, timeout, etc.).
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The remote call completed but produced no usable content.
    #[error("model returned no usable content for flow '{0}'")]
    EmptyModelResponse(String),

    /// None of a flow's mutually exclusive inputs was supplied.
    #[error("flow '{flow}' requires one of: {}", .alternatives.join(", "))]
    MissingRequiredAlternative {
        flow: String,
        alternatives: Vec<String>,
    },

    /// Every sub-invocation of a batch failed.
    #[error("all {attempted} requests of batch flow '{flow}' failed")]
    BatchFailed { flow: String, attempted: usize },

    /// A string that must be a base64 data URI is not one.
    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    /// The caller-supplied deadline elapsed before the flow finished.
    #[error("flow '{flow}' exceeded its deadline of {deadline:?}")]
    DeadlineExceeded { flow: String, deadline: Duration },

    /// JSON (de)serialization failed at the serde level.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration detected at build time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl FlowError {
    /// Short message suitable for showing to an end user.
    ///
    /// Distinguishes "fix your input", "check your connection" and
    /// "try again" so the UI boundary can phrase them differently.
    pub fn user_message(&self) -> String {
        match self {
            FlowError::SchemaValidation {
                stage: SchemaStage::Input,
                violations,
                ..
            } => match violations.first() {
                Some(v) if !v.path.is_empty() => {
                    format!("Please check the '{}' field: {}.", v.path, v.constraint)
                }
                _ => "Please check your input and try again.".to_string(),
            },
            FlowError::SchemaValidation {
                stage: SchemaStage::Output,
                ..
            }
            | FlowError::EmptyModelResponse(_)
            | FlowError::BatchFailed { .. } => {
                "The AI could not produce a result. Please try again.".to_string()
            }
            FlowError::MissingRequiredAlternative { alternatives, .. } => {
                format!("Please provide one of: {}.", alternatives.join(" or "))
            }
            FlowError::Transport(_) | FlowError::DeadlineExceeded { .. } => {
                "Could not reach the AI service. Please check your connection.".to_string()
            }
            FlowError::Http { status, .. } if *status == 429 => {
                "The AI service is busy. Please wait a moment and try again.".to_string()
            }
            FlowError::Http { .. } => "The AI service returned an error.".to_string(),
            FlowError::InvalidDataUri(_) => "The attached file could not be read.".to_string(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }

    /// Field paths named by a validation error, empty for every other kind.
    pub fn field_paths(&self) -> Vec<&str> {
        match self {
            FlowError::SchemaValidation { violations, .. } => {
                violations.iter().map(|v| v.path.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl From<anyhow::Error> for FlowError {
    fn from(err: anyhow::Error) -> Self {
        FlowError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
