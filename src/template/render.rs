//! Node tree → prompt parts.

use super::{Node, Path};
use crate::media::DataUri;
use crate::types::RenderedPrompt;
use serde_json::Value;

/// Context stack: the input at the bottom, one entry per enclosing `each`.
pub(super) struct Frames<'v> {
    stack: Vec<(&'v Value, Option<usize>)>,
}

impl<'v> Frames<'v> {
    pub(super) fn new(root: &'v Value) -> Self {
        Self {
            stack: vec![(root, None)],
        }
    }

    fn lookup(&self, path: &Path) -> Option<&'v Value> {
        let (base, _) = *self.stack.last()?;
        // `this` and bare paths both start from the innermost context.
        path.segments
            .iter()
            .try_fold(base, |value, segment| value.get(segment.as_str()))
    }

    fn index(&self) -> Option<usize> {
        self.stack.last().and_then(|(_, i)| *i)
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

/// Plain-text form of a value as it appears inside a prompt.
pub(super) fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

pub(super) fn render_nodes<'v>(nodes: &[Node], frames: &mut Frames<'v>, out: &mut RenderedPrompt) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_text(text),
            Node::Field(path) => {
                if let Some(value) = frames.lookup(path) {
                    out.push_text(&display(value));
                }
            }
            Node::Index => {
                if let Some(i) = frames.index() {
                    out.push_text(&i.to_string());
                }
            }
            Node::Media(path) => match frames.lookup(path).and_then(Value::as_str) {
                Some(raw) => match DataUri::parse(raw) {
                    Ok(uri) => out.push_media(uri),
                    Err(e) => tracing::warn!(field = %path, error = %e, "skipping media attachment"),
                },
                None => tracing::debug!(field = %path, "media field absent"),
            },
            Node::If {
                path,
                then_body,
                else_body,
            } => {
                let body = if truthy(frames.lookup(path)) {
                    then_body
                } else {
                    else_body
                };
                render_nodes(body, frames, out);
            }
            Node::Each { path, body } => {
                let Some(Value::Array(items)) = frames.lookup(path) else {
                    continue;
                };
                for (i, item) in items.iter().enumerate() {
                    frames.stack.push((item, Some(i)));
                    render_nodes(body, frames, out);
                    frames.stack.pop();
                }
            }
        }
    }
}
