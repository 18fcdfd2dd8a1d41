//! Configuration-related errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Config read error at {path}: {message}")]
    ReadError {
        /// Filesystem path that failed to read
        path: String,
        /// Description of the IO failure
        message: String,
    },

    /// Config file parse error (JSON)
    #[error("Config parse error: {message}")]
    ParseError {
        /// Description of the parse failure
        message: String,
    },

    /// Config validation error (invalid values)
    #[error("Config validation error for {field}: {message}")]
    ValidationError {
        /// Name of the field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },
}

impl ConfigError {
    /// Create a parse error from a serde_json error.
    pub fn from_json_error(e: &serde_json::Error) -> Self {
        Self::ParseError { message: e.to_string() }
    }

    /// Create a read error from an IO error.
    pub fn from_io_error(path: &std::path::Path, e: &std::io::Error) -> Self {
        Self::ReadError { path: path.display().to_string(), message: e.to_string() }
    }

    /// Flatten `validator` output into one error naming every offending field.
    pub fn from_validation(errors: &validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = Vec::new();
        collect_fields("", errors, &mut fields);
        fields.sort();
        Self::ValidationError { field: fields.join(", "), message: errors.to_string() }
    }
}

fn collect_fields(prefix: &str, errors: &validator::ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path =
            if prefix.is_empty() { field.to_string() } else { format!("{}.{}", prefix, field) };
        match kind {
            validator::ValidationErrorsKind::Struct(inner) => collect_fields(&path, inner, out),
            validator::ValidationErrorsKind::List(items) => {
                for inner in items.values() {
                    collect_fields(&path, inner, out);
                }
            },
            validator::ValidationErrorsKind::Field(_) => out.push(path),
        }
    }
}
