//! Prompt templates.
//!
//! Templates use the handlebars subset the studio prompts are written in:
//!
//! - `{{path}}` / `{{{path}}}`: insert a field (no escaping in either form)
//! - `{{this}}`, `{{this.field}}`: the current `each` element
//! - `{{@index}}`: 0-based position inside an `each` block
//! - `{{#each path}}…{{/each}}` and `{{#if path}}…{{else}}…{{/if}}`
//! - `{{media url=path}}`: attach the data URI held by `path`
//! - `{{! comment}}`, and `\{{` for a literal `{{`
//!
//! Source is parsed once into a node tree. [`Template::check`] runs when a
//! flow is registered and guarantees every reference resolves through the
//! input schema, so [`Template::render`] never fails.

mod parser;
mod render;

use crate::error::{FlowError, Result};
use crate::schema::FieldSchema;
use crate::types::RenderedPrompt;
use serde_json::Value;
use std::fmt;

/// Where a path starts looking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The innermost context: the input at top level, the element in `each`.
    Context,
    /// Explicit `this`.
    This,
}

/// A dotted field reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub scope: Scope,
    pub segments: Vec<String>,
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.scope, self.segments.is_empty()) {
            (Scope::This, true) => write!(f, "this"),
            (Scope::This, false) => write!(f, "this.{}", self.segments.join(".")),
            (Scope::Context, _) => write!(f, "{}", self.segments.join(".")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Field(Path),
    Index,
    Each {
        path: Path,
        body: Vec<Node>,
    },
    If {
        path: Path,
        then_body: Vec<Node>,
        else_body: Vec<Node>,
    },
    Media(Path),
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let nodes = parser::parse(&source)?;
        Ok(Self { source, nodes })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Verify every reference against the input schema of `flow`.
    pub fn check(&self, flow: &str, schema: &FieldSchema) -> Result<()> {
        let mut scopes = vec![schema];
        check_nodes(flow, &self.nodes, &mut scopes)
    }

    /// Render against a validated input value.
    pub fn render(&self, input: &Value) -> RenderedPrompt {
        let mut out = RenderedPrompt::new();
        render::render_nodes(&self.nodes, &mut render::Frames::new(input), &mut out);
        out
    }
}

fn unresolved(flow: &str, path: &Path) -> FlowError {
    FlowError::UnresolvedPlaceholder {
        flow: flow.to_string(),
        placeholder: path.to_string(),
    }
}

fn resolve_schema<'s>(scopes: &[&'s FieldSchema], path: &Path) -> Option<&'s FieldSchema> {
    let base = scopes.last()?;
    base.resolve(path.segments.iter().map(String::as_str))
}

fn check_nodes<'s>(flow: &str, nodes: &[Node], scopes: &mut Vec<&'s FieldSchema>) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(_) | Node::Index => {}
            Node::Field(path) => {
                resolve_schema(scopes, path).ok_or_else(|| unresolved(flow, path))?;
            }
            Node::Media(path) => {
                let schema = resolve_schema(scopes, path).ok_or_else(|| unresolved(flow, path))?;
                if !matches!(schema.inner(), FieldSchema::DataUri | FieldSchema::String(_)) {
                    return Err(unresolved(flow, path));
                }
            }
            Node::If {
                path,
                then_body,
                else_body,
            } => {
                resolve_schema(scopes, path).ok_or_else(|| unresolved(flow, path))?;
                check_nodes(flow, then_body, scopes)?;
                check_nodes(flow, else_body, scopes)?;
            }
            Node::Each { path, body } => {
                let element = resolve_schema(scopes, path)
                    .and_then(FieldSchema::element)
                    .ok_or_else(|| unresolved(flow, path))?;
                scopes.push(element);
                let result = check_nodes(flow, body, scopes);
                scopes.pop();
                result?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::DataUri;
    use crate::types::PromptPart;
    use serde_json::json;

    fn presentation_schema() -> FieldSchema {
        FieldSchema::object([
            ("topic", FieldSchema::string().min_len(1)),
            ("numberOfSlides", FieldSchema::integer().range(1.0, 10.0)),
            (
                "userProfile",
                FieldSchema::object([
                    ("name", FieldSchema::string().optional()),
                    ("jobTitle", FieldSchema::string().optional()),
                ])
                .optional(),
            ),
        ])
    }

    fn slides_schema() -> FieldSchema {
        FieldSchema::object([(
            "slides",
            FieldSchema::array(FieldSchema::object([
                ("title", FieldSchema::string()),
                ("content", FieldSchema::array(FieldSchema::string())),
            ])),
        )])
    }

    #[test]
    fn test_check_accepts_declared_fields() {
        let t = Template::parse(
            "Create {{numberOfSlides}} slides about {{{topic}}}.\n\
             {{#if userProfile}}Audience: {{userProfile.jobTitle}}{{/if}}",
        )
        .unwrap();
        assert!(t.check("generatePresentation", &presentation_schema()).is_ok());
    }

    #[test]
    fn test_check_rejects_unknown_field() {
        let t = Template::parse("Slides about {{subject}}").unwrap();
        let err = t.check("generatePresentation", &presentation_schema()).unwrap_err();
        assert!(matches!(
            err,
            FlowError::UnresolvedPlaceholder { ref placeholder, .. } if placeholder == "subject"
        ));
    }

    #[test]
    fn test_check_descends_into_each() {
        let ok = Template::parse(
            "{{#each slides}}{{@index}}: {{title}}{{#each content}}- {{this}}{{/each}}{{/each}}",
        )
        .unwrap();
        assert!(ok.check("revisePresentation", &slides_schema()).is_ok());

        let bad = Template::parse("{{#each slides}}{{this.notes}}{{/each}}").unwrap();
        let err = bad.check("revisePresentation", &slides_schema()).unwrap_err();
        assert!(matches!(
            err,
            FlowError::UnresolvedPlaceholder { ref placeholder, .. } if placeholder == "this.notes"
        ));
    }

    #[test]
    fn test_each_over_non_array_is_unresolved() {
        let t = Template::parse("{{#each topic}}x{{/each}}").unwrap();
        assert!(t.check("generatePresentation", &presentation_schema()).is_err());
    }

    #[test]
    fn test_media_requires_string_field() {
        let schema = FieldSchema::object([
            ("photoDataUri", FieldSchema::data_uri()),
            ("count", FieldSchema::integer()),
        ]);
        let ok = Template::parse("{{media url=photoDataUri}}").unwrap();
        assert!(ok.check("analyzeImageStyle", &schema).is_ok());
        let bad = Template::parse("{{media url=count}}").unwrap();
        assert!(bad.check("analyzeImageStyle", &schema).is_err());
    }

    #[test]
    fn test_render_slides_with_index() {
        let t = Template::parse(
            "Deck:\n{{#each slides}}\nSlide {{@index}}: {{this.title}}\n{{#each content}}\n  - {{this}}\n{{/each}}\n{{/each}}\nDone.",
        )
        .unwrap();
        let input = json!({
            "slides": [
                {"title": "Intro", "content": ["Why", "How"]},
                {"title": "End", "content": []}
            ]
        });
        assert_eq!(
            t.render(&input).text(),
            "Deck:\nSlide 0: Intro\n  - Why\n  - How\nSlide 1: End\nDone."
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let t = Template::parse("{{topic}} x{{numberOfSlides}} {{userProfile.name}}").unwrap();
        let input = json!({"topic": "Rust", "numberOfSlides": 5, "userProfile": {"name": "Ada"}});
        let first = t.render(&input);
        for _ in 0..10 {
            assert_eq!(t.render(&input), first);
        }
        assert_eq!(first.text(), "Rust x5 Ada");
    }

    #[test]
    fn test_missing_optional_renders_empty() {
        let t = Template::parse("[{{userProfile.jobTitle}}]{{#if userProfile}}yes{{else}}no{{/if}}")
            .unwrap();
        assert_eq!(t.render(&json!({"topic": "t"})).text(), "[]no");
    }

    #[test]
    fn test_render_media_part_in_position() {
        let t = Template::parse("Image: {{media url=photo}}\nDescribe it.").unwrap();
        let uri = "data:image/png;base64,iVBORw0KGgo=";
        let rendered = t.render(&json!({ "photo": uri }));
        assert_eq!(rendered.parts().len(), 3);
        assert_eq!(
            rendered.parts()[1],
            PromptPart::Media(DataUri::parse(uri).unwrap())
        );
    }

    #[test]
    fn test_path_display() {
        let this = Path {
            scope: Scope::This,
            segments: vec![],
        };
        assert_eq!(this.to_string(), "this");
    }
}
