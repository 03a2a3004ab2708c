//! Format-specific text extraction for the allowed upload types.

use std::path::Path;

use pulldown_cmark::{Event, Parser, TagEnd};
use serde_json::Value;

use super::ProcessingError;
use crate::ingest::FileKind;

/// Extract plain text from the staged file according to its resolved type.
pub(crate) fn extract_text(path: &Path, kind: FileKind) -> Result<String, ProcessingError> {
    match kind {
        FileKind::Txt => read_file(path),
        FileKind::Md => Ok(markdown_to_text(&read_file(path)?)),
        FileKind::Pdf => extract_pdf(path),
        FileKind::Json => extract_json(path),
    }
}

fn read_file(path: &Path) -> Result<String, ProcessingError> {
    std::fs::read_to_string(path).map_err(|source| ProcessingError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn extract_pdf(path: &Path) -> Result<String, ProcessingError> {
    let bytes = std::fs::read(path).map_err(|source| ProcessingError::Read {
        path: path.display().to_string(),
        source,
    })?;
    pdf_extract::extract_text_from_mem(&bytes).map_err(|err| ProcessingError::Extract {
        kind: FileKind::Pdf,
        message: err.to_string(),
    })
}

/// Strip Markdown markup, keeping text and code content.
fn markdown_to_text(source: &str) -> String {
    let mut out = String::new();
    for event in Parser::new(source) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            Event::End(
                TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock,
            ) => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
    out
}

fn extract_json(path: &Path) -> Result<String, ProcessingError> {
    let raw = read_file(path)?;
    let value: Value = serde_json::from_str(&raw).map_err(|err| ProcessingError::Extract {
        kind: FileKind::Json,
        message: err.to_string(),
    })?;

    let mut lines = Vec::new();
    flatten_json(None, &value, &mut lines);
    Ok(lines.join("\n"))
}

/// Walk a JSON value and collect its scalar leaves as `key: value` lines.
fn flatten_json(key: Option<&str>, value: &Value, lines: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::Bool(_) | Value::Number(_) => {
            lines.push(render_scalar(key, &value.to_string()));
        }
        Value::String(text) => {
            if !text.trim().is_empty() {
                lines.push(render_scalar(key, text));
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten_json(key, item, lines);
            }
        }
        Value::Object(map) => {
            for (field, item) in map {
                flatten_json(Some(field), item, lines);
            }
        }
    }
}

fn render_scalar(key: Option<&str>, rendered: &str) -> String {
    match key {
        Some(key) => format!("{key}: {rendered}"),
        None => rendered.to_string(),
    }
}
