//! JSON Schema validation of content files

use jsonschema::error::ValidationErrorKind;
use jsonschema::{validator_for, ValidationError as JsonSchemaError, Validator as JsonValidator};
use miette::{Diagnostic, NamedSource, SourceSpan};
use rust_embed::Embed;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use thiserror::Error;

use crate::content::ContentKind;

#[derive(Embed)]
#[folder = "schemas/"]
struct EmbeddedSchemas;

/// A content file that does not satisfy its schema
#[derive(Debug, Error, Diagnostic)]
#[error("{file} does not match the {kind} schema ({summary})")]
#[diagnostic(code(aula::content::schema))]
pub struct SchemaError {
    file: String,
    kind: ContentKind,
    summary: String,

    #[source_code]
    src: NamedSource<String>,

    #[related]
    violations: Vec<SchemaViolation>,
}

impl SchemaError {
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// Messages of every violation, in document order
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.message.clone()).collect()
    }
}

/// One schema violation located in the YAML source
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SchemaViolation {
    message: String,

    #[label("{hint}")]
    span: SourceSpan,

    hint: String,

    #[help]
    help: Option<String>,
}

/// Compiled schemas for every content kind
pub struct SchemaSet {
    compiled: HashMap<ContentKind, JsonValidator>,
}

impl SchemaSet {
    /// Compile the embedded schemas
    ///
    /// A schema that fails to compile is logged and skipped, so that kind
    /// is only checked by deserialization.
    pub fn embedded() -> Self {
        let mut compiled = HashMap::new();
        for kind in ContentKind::all() {
            let Some(file) = EmbeddedSchemas::get(kind.schema_name()) else {
                tracing::warn!("no embedded schema for {}", kind);
                continue;
            };
            let parsed = serde_json::from_slice::<JsonValue>(&file.data)
                .map_err(|e| e.to_string())
                .and_then(|schema| validator_for(&schema).map_err(|e| e.to_string()));
            match parsed {
                Ok(validator) => {
                    compiled.insert(*kind, validator);
                }
                Err(e) => tracing::warn!("schema for {} is unusable: {}", kind, e),
            }
        }
        Self { compiled }
    }

    pub fn has_schema(&self, kind: ContentKind) -> bool {
        self.compiled.contains_key(&kind)
    }

    /// Check a parsed document against the schema of `kind`
    pub fn check(
        &self,
        kind: ContentKind,
        document: &JsonValue,
        source: &str,
        file: &str,
    ) -> Result<(), SchemaError> {
        let Some(validator) = self.compiled.get(&kind) else {
            return Ok(());
        };

        let violations: Vec<SchemaViolation> = validator
            .iter_errors(document)
            .map(|e| violation(source, &e))
            .collect();

        if violations.is_empty() {
            return Ok(());
        }

        let summary = match violations.len() {
            1 => "1 problem".to_string(),
            n => format!("{} problems", n),
        };
        Err(SchemaError {
            file: file.to_string(),
            kind,
            summary,
            src: NamedSource::new(file, source.to_string()),
            violations,
        })
    }
}

fn violation(source: &str, error: &JsonSchemaError) -> SchemaViolation {
    let pointer = error.instance_path.to_string();
    let at = if pointer.is_empty() {
        "top level".to_string()
    } else {
        format!("'{}'", pointer)
    };

    let (message, hint, help) = match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            (
                format!("missing field {} at {}", name, at),
                "required field missing",
                Some(format!("add '{}'", name)),
            )
        }
        ValidationErrorKind::Enum { options } => (
            format!("value at {} is not allowed", at),
            "invalid value",
            Some(format!("allowed values: {}", list_options(options))),
        ),
        ValidationErrorKind::Type { kind } => (
            format!("wrong type at {}", at),
            "wrong type",
            Some(format!("expected {:?}", kind)),
        ),
        ValidationErrorKind::AdditionalProperties { unexpected } => (
            format!("unknown field(s) at {}: {}", at, unexpected.join(", ")),
            "unknown field",
            Some("remove the field or check its spelling".to_string()),
        ),
        ValidationErrorKind::Minimum { limit } => (
            format!("value at {} is below the minimum of {}", at, limit),
            "too small",
            None,
        ),
        ValidationErrorKind::Maximum { limit } => (
            format!("value at {} is above the maximum of {}", at, limit),
            "too large",
            None,
        ),
        ValidationErrorKind::MinItems { limit } => (
            format!("list at {} needs at least {} item(s)", at, limit),
            "too few items",
            None,
        ),
        _ => (format!("{} at {}", error, at), "schema violation", None),
    };

    SchemaViolation {
        message,
        span: span_for_pointer(source, &pointer),
        hint: hint.to_string(),
        help,
    }
}

fn list_options(options: &JsonValue) -> String {
    match options.as_array() {
        Some(values) => values
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join(", "),
        None => options.to_string(),
    }
}

/// Best-effort span for a JSON pointer: the line declaring its last named key
fn span_for_pointer(source: &str, pointer: &str) -> SourceSpan {
    let key = pointer
        .split('/')
        .rev()
        .find(|part| !part.is_empty() && part.parse::<usize>().is_err());

    if let Some(key) = key {
        let needle = format!("{}:", key);
        let mut offset = 0;
        for line in source.split_inclusive('\n') {
            let trimmed = line.trim_start().trim_start_matches("- ");
            if trimmed.starts_with(&needle) {
                let start = offset + (line.len() - trimmed.len());
                return (start, trimmed.trim_end().len().max(1)).into();
            }
            offset += line.len();
        }
    }

    (0, source.find('\n').unwrap_or(source.len()).max(1)).into()
}
