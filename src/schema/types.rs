//! Structured explanation returned to clients.

use serde::{Deserialize, Serialize};

use crate::schema::descriptor::{FieldDescriptor, SchemaDescriptor};

/// The complete, structured explanation of a code snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExplanation {
    pub summary: String,
    pub line_by_line: Vec<LineExplanation>,
    pub suggested_tests: Vec<TestSuggestion>,
    pub potential_refactors: Vec<RefactorSuggestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineExplanation {
    /// 1-based line number in the submitted snippet.
    pub line: u32,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuggestion {
    pub test_case: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefactorSuggestion {
    pub area: String,
    pub suggestion: String,
}

impl CodeExplanation {
    /// Descriptor of the shape the backend must produce.
    pub fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new(
            "CodeExplanation",
            "The complete, structured explanation of a code snippet.",
        )
        .field(FieldDescriptor::string("summary", "A high-level summary."))
        .field(FieldDescriptor::array(
            "line_by_line",
            "Line-by-line breakdown.",
            SchemaDescriptor::new("LineExplanation", "Explanation of a single line.")
                .field(FieldDescriptor::integer("line", "The line number.", 1))
                .field(
                    FieldDescriptor::string("explanation", "A beginner-friendly explanation.")
                        .non_empty(),
                ),
        ))
        .field(FieldDescriptor::array(
            "suggested_tests",
            "Suggested test cases.",
            SchemaDescriptor::new("TestSuggestion", "A test worth writing for this code.")
                .field(FieldDescriptor::string(
                    "test_case",
                    "A description of the test case.",
                ))
                .field(FieldDescriptor::string(
                    "description",
                    "Why this test is important.",
                )),
        ))
        .field(FieldDescriptor::array(
            "potential_refactors",
            "Potential refactors.",
            SchemaDescriptor::new("RefactorSuggestion", "A possible improvement.")
                .field(FieldDescriptor::string("area", "The area for refactoring."))
                .field(FieldDescriptor::string("suggestion", "A concrete suggestion.")),
        ))
    }
}
