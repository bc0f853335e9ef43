//! Recovering structured output from model text.
//!
//! Providers asked for JSON sometimes answer with prose around it, a
//! markdown fence, a `<think>` preamble or a trailing comma. These helpers
//! dig the JSON value out. They never call the model again.

use serde_json::Value;

/// Split a `<think>...</think>` block off the front of a response.
///
/// Returns `(thinking, remainder)`; the remainder is trimmed.
pub fn extract_thinking(text: &str) -> (Option<String>, String) {
    const OPEN: &str = "<think>";
    const CLOSE: &str = "</think>";

    let (Some(start), Some(end)) = (text.find(OPEN), text.find(CLOSE)) else {
        return (None, text.to_string());
    };
    if end < start {
        return (None, text.to_string());
    }
    let thinking = text[start + OPEN.len()..end].trim();
    let remainder = format!("{}{}", &text[..start], &text[end + CLOSE.len()..]);
    let thinking = (!thinking.is_empty()).then(|| thinking.to_string());
    (thinking, remainder.trim().to_string())
}

/// Contents of the first markdown code fence (```` ```json ```` or bare).
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_marker = &text[start + 3..];
    // Skip an info string such as `json` up to the end of the line.
    let body_start = after_marker.find('\n').map(|i| i + 1).unwrap_or(0);
    let info = after_marker[..body_start].trim();
    if !info.is_empty() && !info.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let body = &after_marker[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// The first balanced `{...}` or `[...]` span in `text`, skipping brackets
/// inside string literals.
pub fn extract_balanced(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Drop commas that directly precede `}` or `]`, outside string literals.
pub fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            out.push(c);
            continue;
        }
        if c == '"' {
            in_string = true;
        }
        if c == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn parse_lenient(candidate: &str) -> Option<Value> {
    serde_json::from_str(candidate)
        .ok()
        .or_else(|| serde_json::from_str(&remove_trailing_commas(candidate)).ok())
}

/// Best-effort JSON value from free model text.
///
/// Tries, in order: the whole text, a fenced block, the first balanced
/// bracket span. Each candidate is also retried with trailing commas
/// removed. Only objects and arrays count; a bare string or number is not
/// structured output.
pub fn structured_from_text(text: &str) -> Option<Value> {
    let (_, text) = extract_thinking(text);
    let text = text.trim();

    let candidates = [
        Some(text),
        extract_json_block(text),
        extract_balanced(text),
    ];
    let found = candidates
        .into_iter()
        .flatten()
        .filter_map(parse_lenient)
        .find(|v| v.is_object() || v.is_array());
    found
}
