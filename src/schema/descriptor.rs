//! Machine-readable description of an expected JSON shape.
//!
//! A single descriptor feeds both the prompt's format instructions and the
//! validator, so what the model is asked for and what is accepted stay in
//! lockstep.

use serde_json::{json, Map, Value};

/// Named object shape: an ordered list of required fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: Vec<FieldDescriptor>,
}

/// One required field of an object shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    /// Strings only: reject `""`.
    pub non_empty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Integer { min: Option<i64> },
    Array(SchemaDescriptor),
}

impl SchemaDescriptor {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Render as a JSON Schema object.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            properties.insert(field.name.to_string(), field.to_json_schema());
        }
        let required: Vec<&str> = self.fields.iter().map(|f| f.name).collect();

        json!({
            "title": self.name,
            "description": self.description,
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

impl FieldDescriptor {
    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind: FieldKind::String,
            non_empty: false,
        }
    }

    pub fn integer(name: &'static str, description: &'static str, min: i64) -> Self {
        Self {
            name,
            description,
            kind: FieldKind::Integer { min: Some(min) },
            non_empty: false,
        }
    }

    pub fn array(name: &'static str, description: &'static str, items: SchemaDescriptor) -> Self {
        Self {
            name,
            description,
            kind: FieldKind::Array(items),
            non_empty: false,
        }
    }

    pub fn non_empty(mut self) -> Self {
        self.non_empty = true;
        self
    }

    fn to_json_schema(&self) -> Value {
        let mut schema = match &self.kind {
            FieldKind::String => {
                let mut s = json!({ "type": "string" });
                if self.non_empty {
                    s["minLength"] = json!(1);
                }
                s
            }
            FieldKind::Integer { min } => {
                let mut s = json!({ "type": "integer" });
                if let Some(min) = min {
                    s["minimum"] = json!(min);
                }
                s
            }
            FieldKind::Array(items) => json!({
                "type": "array",
                "items": items.to_json_schema(),
            }),
        };
        schema["description"] = json!(self.description);
        schema
    }
}
