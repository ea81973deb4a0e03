//! Structural validation of backend output.
//!
//! Parsing is all-or-nothing: either every field of the descriptor is
//! present with the right type and a fully populated [`CodeExplanation`] is
//! returned, or a [`ParseError`] names the first offending path.

use serde_json::Value;
use thiserror::Error;

use crate::schema::descriptor::{FieldDescriptor, FieldKind, SchemaDescriptor};
use crate::schema::types::CodeExplanation;

/// Why backend output was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    #[error("schema mismatch at '{path}': expected {expected}")]
    SchemaMismatch { path: String, expected: String },
}

impl ParseError {
    fn mismatch(path: &str, expected: impl Into<String>) -> Self {
        ParseError::SchemaMismatch {
            path: if path.is_empty() { "$".to_string() } else { path.to_string() },
            expected: expected.into(),
        }
    }
}

/// Validates raw model output against a [`SchemaDescriptor`].
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema: SchemaDescriptor,
}

impl SchemaValidator {
    pub fn new(schema: SchemaDescriptor) -> Self {
        Self { schema }
    }

    /// Validator for the [`CodeExplanation`] contract.
    pub fn for_explanations() -> Self {
        Self::new(CodeExplanation::schema())
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// Parse and validate `raw` as a [`CodeExplanation`].
    pub fn parse(&self, raw: &str) -> Result<CodeExplanation, ParseError> {
        let value = self.validate(raw)?;
        serde_json::from_value(value).map_err(|e| ParseError::mismatch("", e.to_string()))
    }

    /// Parse `raw` and check it against the descriptor, returning the JSON
    /// value untouched on success.
    pub fn validate(&self, raw: &str) -> Result<Value, ParseError> {
        let payload = strip_code_fence(raw);
        let value: Value =
            serde_json::from_str(payload).map_err(|e| ParseError::MalformedJson(e.to_string()))?;
        check_object(&value, &self.schema, "")?;
        Ok(value)
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::for_explanations()
    }
}

fn check_object(value: &Value, schema: &SchemaDescriptor, path: &str) -> Result<(), ParseError> {
    let object = value
        .as_object()
        .ok_or_else(|| ParseError::mismatch(path, format!("{} object", schema.name)))?;

    for field in &schema.fields {
        let field_path = join(path, field.name);
        let field_value = object
            .get(field.name)
            .ok_or_else(|| ParseError::mismatch(&field_path, "required field"))?;
        check_field(field_value, field, &field_path)?;
    }
    Ok(())
}

fn check_field(value: &Value, field: &FieldDescriptor, path: &str) -> Result<(), ParseError> {
    match &field.kind {
        FieldKind::String => {
            let s = value
                .as_str()
                .ok_or_else(|| ParseError::mismatch(path, "string"))?;
            if field.non_empty && s.trim().is_empty() {
                return Err(ParseError::mismatch(path, "non-empty string"));
            }
        }
        FieldKind::Integer { min } => {
            let n = value
                .as_i64()
                .ok_or_else(|| ParseError::mismatch(path, "integer"))?;
            if let Some(min) = min {
                if n < *min {
                    return Err(ParseError::mismatch(path, format!("integer >= {}", min)));
                }
            }
        }
        FieldKind::Array(items) => {
            let elements = value
                .as_array()
                .ok_or_else(|| ParseError::mismatch(path, "array"))?;
            for (i, element) in elements.iter().enumerate() {
                check_object(element, items, &format!("{}[{}]", path, i))?;
            }
        }
    }
    Ok(())
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

/// Strip surrounding whitespace and one markdown code fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(body) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };

    // Drop an info string such as `json` on the opening fence line.
    match body.find('\n') {
        Some(idx) if body[..idx].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            body[idx + 1..].trim()
        }
        _ => body.trim(),
    }
}
