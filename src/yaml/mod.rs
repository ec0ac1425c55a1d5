//! YAML parsing with diagnostics

pub mod diagnostics;

pub use diagnostics::YamlSyntaxError;

use serde::de::DeserializeOwned;

/// Parse YAML text, reporting syntax errors against the source
pub fn parse_yaml<T: DeserializeOwned>(source: &str, file: &str) -> Result<T, YamlSyntaxError> {
    serde_yml::from_str(source).map_err(|e| YamlSyntaxError::from_serde_error(&e, source, file))
}

/// Parse YAML text into a JSON value for schema validation
pub fn parse_to_json(source: &str, file: &str) -> Result<serde_json::Value, YamlSyntaxError> {
    let value: serde_yml::Value = parse_yaml(source, file)?;
    serde_json::to_value(value).map_err(|e| {
        YamlSyntaxError::from_message(format!("cannot convert to JSON: {}", e), source, file)
    })
}
