use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::column::ColumnDescriptor;
use crate::validation::{IssueCode, ValidationIssue, ValidationReport};

/// A persisted schema: formatting options plus its column set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaDefinition {
    /// Stable identifier used by dataset records.
    pub id: String,
    /// Display name, also used to build artifact names.
    pub name: String,
    /// Owning user identifier; scopes artifacts per owner.
    pub owner_id: String,
    #[serde(default = "default_separator")]
    pub column_separator: char,
    #[serde(default = "default_quote")]
    pub quote_character: char,
    pub columns: Vec<ColumnDescriptor>,
}

fn default_separator() -> char {
    ','
}

fn default_quote() -> char {
    '"'
}

impl SchemaDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        owner_id: impl Into<String>,
        columns: Vec<ColumnDescriptor>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner_id: owner_id.into(),
            column_separator: default_separator(),
            quote_character: default_quote(),
            columns,
        }
    }

    /// Check the formatting options; the CSV codec only handles ASCII bytes.
    pub fn validate_formatting(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        for (field, value) in [
            ("column_separator", self.column_separator),
            ("quote_character", self.quote_character),
        ] {
            if !value.is_ascii() || matches!(value, '\n' | '\r') {
                report.push(ValidationIssue::new(
                    IssueCode::InvalidFormatting,
                    format!("/{field}"),
                    format!("{field} must be a single ASCII character other than a line break"),
                ));
            }
        }
        report
    }
}
