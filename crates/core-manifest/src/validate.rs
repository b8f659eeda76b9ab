//! JSON Schema validation for manifest documents
//!
//! Stored manifests are checked against the schema before they are turned
//! into typed values, so an off-schema document is reported with the JSON
//! pointer of every offending field instead of serde's first complaint.

use crate::error::{Error, Result};
use crate::Manifest;
use jsonschema::{ValidationError, Validator};
use serde_json::{json, Value};
use std::sync::OnceLock;

/// Validate a raw manifest document read from `location`
///
/// Returns `Error::Schema` listing every violation.
pub fn validate_manifest_value(location: &str, value: &Value) -> Result<()> {
    let violations = schema_violations(value)?;
    if violations.is_empty() {
        return Ok(());
    }

    Err(Error::Schema {
        location: location.to_string(),
        message: violations.join("\n  - "),
    })
}

/// Validate an in-memory manifest before it is written
///
/// Combines the schema check with the key uniqueness rules.
pub fn validate_manifest(manifest: &Manifest) -> Result<()> {
    let value = serde_json::to_value(manifest).map_err(Error::Serialize)?;
    let violations = schema_violations(&value)?;
    if !violations.is_empty() {
        return Err(Error::validation(format!(
            "Manifest validation failed:\n  - {}",
            violations.join("\n  - ")
        )));
    }

    manifest.validate()
}

fn schema_violations(value: &Value) -> Result<Vec<String>> {
    let compiled = compiled_schema()?;

    let violations = match compiled.validate(value) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.map(|e| format_validation_error(&e)).collect(),
    };
    Ok(violations)
}

/// The manifest schema, compiled on first use
fn compiled_schema() -> Result<&'static Validator> {
    static COMPILED: OnceLock<std::result::Result<Validator, String>> = OnceLock::new();

    COMPILED
        .get_or_init(|| Validator::new(&get_manifest_schema()).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| Error::validation(format!("Failed to compile schema: {}", e)))
}

/// Format a validation error into a readable string
fn format_validation_error(error: &ValidationError) -> String {
    format!("{}: {}", error.instance_path, error)
}

/// Get the manifest JSON Schema
fn get_manifest_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["name", "versions"],
        "properties": {
            "name": {
                "type": "string",
                "minLength": 1
            },
            "versions": {
                "type": "array",
                "items": {
                    "$ref": "#/$defs/version"
                }
            }
        },
        "$defs": {
            "version": {
                "type": "object",
                "required": ["version", "providers"],
                "properties": {
                    "version": {
                        "type": "string",
                        "minLength": 1
                    },
                    "providers": {
                        "type": "array",
                        "items": {
                            "$ref": "#/$defs/provider"
                        }
                    }
                }
            },
            "provider": {
                "type": "object",
                "required": ["name", "url", "checksum_type", "checksum"],
                "properties": {
                    "name": {
                        "type": "string",
                        "minLength": 1
                    },
                    "url": {
                        "type": "string",
                        "minLength": 1
                    },
                    "checksum_type": {
                        "type": "string",
                        "enum": ["sha256"]
                    },
                    "checksum": {
                        "type": "string",
                        "pattern": "^[0-9a-f]+$"
                    }
                }
            }
        }
    })
}
