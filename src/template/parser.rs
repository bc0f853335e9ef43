//! Template source → AST.

use super::{Node, Path, Scope};
use crate::error::{FlowError, Result};

/// What opened the block currently being filled.
enum Frame {
    Each { path: Path, body: Vec<Node> },
    If {
        path: Path,
        then_body: Vec<Node>,
        else_body: Option<Vec<Node>>,
    },
}

impl Frame {
    fn current(&mut self) -> &mut Vec<Node> {
        match self {
            Frame::Each { body, .. } => body,
            Frame::If {
                then_body,
                else_body,
                ..
            } => else_body.as_mut().unwrap_or(then_body),
        }
    }
}

fn syntax(offset: usize, message: impl Into<String>) -> FlowError {
    FlowError::TemplateSyntax {
        offset,
        message: message.into(),
    }
}

fn parse_path(raw: &str, offset: usize) -> Result<Path> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(syntax(offset, "empty placeholder"));
    }
    let valid = raw
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if !valid || raw.starts_with('.') || raw.ends_with('.') || raw.contains("..") {
        return Err(syntax(offset, format!("invalid placeholder '{}'", raw)));
    }
    let mut segments: Vec<String> = raw.split('.').map(str::to_string).collect();
    let scope = if segments[0] == "this" {
        segments.remove(0);
        Scope::This
    } else {
        Scope::Context
    };
    Ok(Path { scope, segments })
}

fn push_node(root: &mut Vec<Node>, stack: &mut [Frame], node: Node) {
    match stack.last_mut() {
        Some(frame) => frame.current().push(node),
        None => root.push(node),
    }
}

fn push_text(root: &mut Vec<Node>, stack: &mut [Frame], text: &str) {
    if text.is_empty() {
        return;
    }
    let target = match stack.last_mut() {
        Some(frame) => frame.current(),
        None => root,
    };
    if let Some(Node::Text(last)) = target.last_mut() {
        last.push_str(text);
    } else {
        target.push(Node::Text(text.to_string()));
    }
}

/// Number of blank bytes between the start of the line and `open`, if
/// nothing else precedes the tag on its line.
fn standalone_prefix(source: &str, open: usize) -> Option<usize> {
    let line_start = source[..open].rfind('\n').map(|i| i + 1).unwrap_or(0);
    source[line_start..open]
        .chars()
        .all(|c| c == ' ' || c == '\t')
        .then_some(open - line_start)
}

/// Length of the blanks-then-newline run at the start of `after`, if the
/// rest of the line is blank.
fn standalone_suffix(after: &str) -> Option<usize> {
    let line_end = after.find('\n');
    let rest = &after[..line_end.unwrap_or(after.len())];
    if !rest.chars().all(|c| c == ' ' || c == '\t' || c == '\r') {
        return None;
    }
    Some(line_end.map(|i| i + 1).unwrap_or(after.len()))
}

/// Parse template source into nodes.
///
/// Block tags (`#each`, `#if`, `else`, `/each`, `/if`) that sit alone on a
/// line consume that whole line, so block structure adds no blank lines.
pub(crate) fn parse(source: &str) -> Result<Vec<Node>> {
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut each_depth = 0usize;
    // Text waiting to be flushed; held back so a standalone block tag can
    // trim its line's leading blanks.
    let mut pending = String::new();
    let mut pos = 0usize;

    while pos < source.len() {
        let rest = &source[pos..];
        let Some(open_rel) = rest.find("{{") else {
            pending.push_str(rest);
            break;
        };
        let open = pos + open_rel;

        // `\{{` is a literal `{{`.
        if open > 0 && source.as_bytes()[open - 1] == b'\\' {
            pending.push_str(&source[pos..open - 1]);
            pending.push_str("{{");
            pos = open + 2;
            continue;
        }

        pending.push_str(&source[pos..open]);

        let triple = source[open..].starts_with("{{{");
        let (inner_start, closer) = if triple {
            (open + 3, "}}}")
        } else {
            (open + 2, "}}")
        };
        let close_rel = source[inner_start..]
            .find(closer)
            .ok_or_else(|| syntax(open, format!("unclosed tag, expected '{}'", closer)))?;
        let inner = source[inner_start..inner_start + close_rel].trim();
        let mut next = inner_start + close_rel + closer.len();

        let is_block = !triple
            && (inner.starts_with('#') || inner.starts_with('/') || inner == "else");
        if is_block {
            if let (Some(indent), Some(skip)) = (
                standalone_prefix(source, open),
                standalone_suffix(&source[next..]),
            ) {
                pending.truncate(pending.len().saturating_sub(indent));
                next += skip;
            }
        }
        push_text(&mut root, &mut stack, &pending);
        pending.clear();

        if triple {
            let path = parse_path(inner, open)?;
            push_node(&mut root, &mut stack, Node::Field(path));
        } else if let Some(arg) = inner.strip_prefix("#each") {
            let path = parse_path(arg, open)?;
            each_depth += 1;
            stack.push(Frame::Each {
                path,
                body: Vec::new(),
            });
        } else if let Some(arg) = inner.strip_prefix("#if") {
            let path = parse_path(arg, open)?;
            stack.push(Frame::If {
                path,
                then_body: Vec::new(),
                else_body: None,
            });
        } else if inner == "else" {
            match stack.last_mut() {
                Some(Frame::If { else_body, .. }) if else_body.is_none() => {
                    *else_body = Some(Vec::new());
                }
                _ => return Err(syntax(open, "'else' outside of an 'if' block")),
            }
        } else if let Some(name) = inner.strip_prefix('/') {
            let frame = stack
                .pop()
                .ok_or_else(|| syntax(open, format!("unexpected closing tag '{}'", inner)))?;
            let node = match (name.trim(), frame) {
                ("each", Frame::Each { path, body }) => {
                    each_depth -= 1;
                    Node::Each { path, body }
                }
                (
                    "if",
                    Frame::If {
                        path,
                        then_body,
                        else_body,
                    },
                ) => Node::If {
                    path,
                    then_body,
                    else_body: else_body.unwrap_or_default(),
                },
                (other, _) => {
                    return Err(syntax(open, format!("mismatched closing tag '/{}'", other)))
                }
            };
            push_node(&mut root, &mut stack, node);
        } else if inner.starts_with('!') {
            // comment
        } else if inner == "@index" {
            if each_depth == 0 {
                return Err(syntax(open, "'@index' used outside of an 'each' block"));
            }
            push_node(&mut root, &mut stack, Node::Index);
        } else if let Some(args) = inner.strip_prefix("media ") {
            let arg = args
                .trim()
                .strip_prefix("url=")
                .ok_or_else(|| syntax(open, "media tag requires 'url=<field>'"))?;
            let path = parse_path(arg, open)?;
            push_node(&mut root, &mut stack, Node::Media(path));
        } else if inner.starts_with('#') {
            return Err(syntax(open, format!("unsupported block '{}'", inner)));
        } else {
            let path = parse_path(inner, open)?;
            push_node(&mut root, &mut stack, Node::Field(path));
        }

        pos = next;
    }

    if let Some(frame) = stack.last() {
        let kind = match frame {
            Frame::Each { .. } => "each",
            Frame::If { .. } => "if",
        };
        return Err(syntax(source.len(), format!("unclosed '#{}' block", kind)));
    }
    push_text(&mut root, &mut stack, &pending);
    Ok(root)
}
