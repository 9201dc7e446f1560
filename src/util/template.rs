//! Placeholder substitution for manifest templates and docker arguments.
//!
//! Supported actions:
//! - `{{ .Field }}` and `{{ .Field.key }}` look up a value in the context
//! - `{{- ... }}` / `{{ ... -}}` trim whitespace before / after the action
//! - `{{/* comment */}}` renders nothing
//!
//! A top-level field that does not exist is an execution error; a missing
//! key below the top level renders as the empty string.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

static FIELD_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z0-9_\-]+)*$").expect("valid field regex")
});

/// Error rendering a template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("template execution error on line {line}: {message}")]
    Exec { line: usize, message: String },
}

/// Render `input` against `context`.
pub fn render(input: &str, context: &Value) -> Result<String, TemplateError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    let mut consumed = 0;
    let mut trim_next = false;

    while let Some(open) = rest.find("{{") {
        let line = line_of(input, consumed + open);
        let text = &rest[..open];
        push_text(&mut output, text, trim_next);

        let after_open = &rest[open + 2..];
        let close = after_open.find("}}").ok_or_else(|| TemplateError::Syntax {
            line,
            message: "unclosed action".to_string(),
        })?;
        let raw = &after_open[..close];

        let (action, trim_before, trim_after) = split_trim_markers(raw);
        if trim_before {
            let trimmed = output.trim_end().len();
            output.truncate(trimmed);
        }

        if !is_comment(action) {
            output.push_str(&evaluate(action, context, line)?);
        }

        trim_next = trim_after;
        let advance = open + 2 + close + 2;
        consumed += advance;
        rest = &rest[advance..];
    }

    push_text(&mut output, rest, trim_next);
    Ok(output)
}

fn push_text(output: &mut String, text: &str, trim_leading: bool) {
    if trim_leading {
        output.push_str(text.trim_start());
    } else {
        output.push_str(text);
    }
}

fn split_trim_markers(raw: &str) -> (&str, bool, bool) {
    let mut action = raw;
    let mut trim_before = false;
    let mut trim_after = false;

    if let Some(stripped) = action.strip_prefix("- ") {
        action = stripped;
        trim_before = true;
    }
    if let Some(stripped) = action.strip_suffix(" -") {
        action = stripped;
        trim_after = true;
    }

    (action.trim(), trim_before, trim_after)
}

fn is_comment(action: &str) -> bool {
    action.starts_with("/*") && action.ends_with("*/")
}

fn evaluate(action: &str, context: &Value, line: usize) -> Result<String, TemplateError> {
    if action.is_empty() {
        return Err(TemplateError::Syntax {
            line,
            message: "missing value for action".to_string(),
        });
    }
    if !FIELD_PATH.is_match(action) {
        return Err(TemplateError::Syntax {
            line,
            message: format!("unsupported action `{}`", action),
        });
    }

    let mut segments = action[1..].split('.');
    let field = segments.next().unwrap_or_default();
    let mut current = context.get(field).ok_or_else(|| TemplateError::Exec {
        line,
        message: format!("can't evaluate field {}", field),
    })?;

    for segment in segments {
        current = match current {
            Value::Object(map) => match map.get(segment) {
                Some(value) => value,
                None => return Ok(String::new()),
            },
            _ => {
                return Err(TemplateError::Exec {
                    line,
                    message: format!("can't evaluate field {} in {}", segment, action),
                })
            }
        };
    }

    Ok(format_value(current))
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => {
            let items: Vec<_> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(" "))
        }
        Value::Object(map) => {
            let entries: Vec<_> = map
                .iter()
                .map(|(k, v)| format!("{}:{}", k, format_value(v)))
                .collect();
            format!("map[{}]", entries.join(" "))
        }
    }
}

fn line_of(input: &str, offset: usize) -> usize {
    input[..offset].matches('\n').count() + 1
}
