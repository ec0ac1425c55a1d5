//! Source-located YAML diagnostics

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// YAML syntax error pointing at the offending character
#[derive(Debug, Error, Diagnostic)]
#[error("YAML syntax error in {file}: {message}")]
#[diagnostic(code(aula::yaml::syntax))]
pub struct YamlSyntaxError {
    file: String,
    message: String,

    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,
}

impl YamlSyntaxError {
    /// Build from a `serde_yml` error and the text it was parsing
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, file: &str) -> Self {
        let offset = err
            .location()
            .map(|loc| offset_of(source, loc.line(), loc.column()))
            .unwrap_or(0);
        let message = err.to_string();

        Self {
            file: file.to_string(),
            help: suggestion_for(&message),
            message,
            src: NamedSource::new(file, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1).min(source.len().max(1))),
        }
    }

    /// Error without a precise location; the first line is highlighted
    pub fn from_message(message: impl Into<String>, source: &str, file: &str) -> Self {
        let first_line = source.find('\n').unwrap_or(source.len());
        Self {
            file: file.to_string(),
            message: message.into(),
            src: NamedSource::new(file, source.to_string()),
            span: SourceSpan::from(0..first_line),
            help: None,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn offset(&self) -> usize {
        self.span.offset()
    }
}

/// Byte offset of a 1-based line and column, clamped to the text
pub(crate) fn offset_of(source: &str, line: usize, column: usize) -> usize {
    let line_start = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum::<usize>();
    if line_start >= source.len() {
        return source.len();
    }

    let column_offset = source[line_start..]
        .char_indices()
        .take_while(|(_, c)| *c != '\n')
        .nth(column.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or_else(|| {
            source[line_start..]
                .find('\n')
                .unwrap_or(source.len() - line_start)
        });

    line_start + column_offset
}

fn suggestion_for(message: &str) -> Option<String> {
    let lower = message.to_lowercase();
    let hint = if lower.contains("tab") {
        "indent with spaces; YAML does not allow tabs"
    } else if lower.contains("duplicate") {
        "each key may appear only once in a mapping"
    } else if lower.contains("mapping values are not allowed") {
        "put a space after ':' or quote values that contain colons"
    } else if lower.contains("did not find expected") || lower.contains("block end") {
        "check that sibling keys share the same indentation"
    } else if lower.contains("expected ','") || lower.contains("flow sequence") {
        "separate inline list items with commas: [a, b, c]"
    } else {
        return None;
    };
    Some(hint.to_string())
}
