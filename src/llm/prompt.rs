//! Prompt rendering.

use crate::schema::SchemaDescriptor;

const EXPLAIN_TEMPLATE: &str = "You are a senior software developer who explains code to beginners. \
Be precise and friendly, and refer to lines by their 1-based number.

Analyze the following code snippet in {language}:
```{language}
{code}
```

{format_instructions}";

/// Renders model prompts from a fixed template.
///
/// Placeholders are `{language}`, `{code}` and `{format_instructions}`.
/// Substitution is single-pass, so braces inside the submitted code are
/// never mistaken for placeholders.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: String,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::with_template(EXPLAIN_TEMPLATE)
    }

    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn build(&self, language: &str, code: &str, schema: &SchemaDescriptor) -> String {
        let instructions = format_instructions(schema);
        render(&self.template, |name| match name {
            "language" => Some(language),
            "code" => Some(code),
            "format_instructions" => Some(instructions.as_str()),
            _ => None,
        })
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Instructions telling the model which JSON shape to produce.
pub fn format_instructions(schema: &SchemaDescriptor) -> String {
    let schema_json = serde_json::to_string_pretty(&schema.to_json_schema())
        .unwrap_or_else(|_| schema.to_json_schema().to_string());

    format!(
        "Respond with a single JSON object and nothing else. \
The object must be an instance of the JSON schema below. \
Every property listed in \"required\" must be present; use [] for an empty list, never null.
```json
{}
```",
        schema_json
    )
}

fn render<'a, F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}').and_then(|close| {
            lookup(&after[..close]).map(|value| (close, value))
        }) {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
