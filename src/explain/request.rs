//! Inbound request model and input validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of `POST /explain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRequest {
    pub code: String,
    pub language: String,
}

/// Client input the pipeline refuses. Messages are returned verbatim as `detail`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    #[error("Code must be at most {max} characters.")]
    CodeTooLong { max: usize },

    #[error("Unsupported language. Use one of: {supported}")]
    UnsupportedLanguage { supported: String },

    #[error("Code cannot be empty.")]
    EmptyCode,
}

/// Case-insensitive set of accepted languages, kept in configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedLanguages {
    names: Vec<String>,
}

impl SupportedLanguages {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut canonical: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim().to_lowercase();
            if !name.is_empty() && !canonical.contains(&name) {
                canonical.push(name);
            }
        }
        Self { names: canonical }
    }

    /// Canonical (lowercase) name for `language`, if supported.
    pub fn resolve(&self, language: &str) -> Option<&str> {
        let wanted = language.trim().to_lowercase();
        self.names
            .iter()
            .find(|name| **name == wanted)
            .map(String::as_str)
    }

    pub fn contains(&self, language: &str) -> bool {
        self.resolve(language).is_some()
    }

    /// Comma-separated listing used in error messages.
    pub fn listing(&self) -> String {
        self.names.join(", ")
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A request that passed every input check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    /// Canonical language name.
    pub language: String,
    pub code: String,
}

/// Input checks in order: length, language, emptiness.
pub fn validate(
    request: CodeRequest,
    languages: &SupportedLanguages,
    max_code_chars: usize,
) -> Result<ValidatedRequest, ValidationError> {
    if request.code.chars().count() > max_code_chars {
        return Err(ValidationError::CodeTooLong {
            max: max_code_chars,
        });
    }

    let Some(language) = languages.resolve(&request.language) else {
        return Err(ValidationError::UnsupportedLanguage {
            supported: languages.listing(),
        });
    };

    if request.code.trim().is_empty() {
        return Err(ValidationError::EmptyCode);
    }

    Ok(ValidatedRequest {
        language: language.to_string(),
        code: request.code,
    })
}
