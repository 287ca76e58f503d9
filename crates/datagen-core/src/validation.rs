use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-readable reason attached to a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    SchemaViolation,
    EmptySchema,
    EmptyColumnName,
    NegativeOrder,
    DuplicateColumnName,
    UnknownColumnType,
    MissingParam,
    UnknownParam,
    InvalidParamType,
    ParamOutOfBounds,
    MinGreaterThanMax,
    InvalidFormatting,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SchemaViolation => "schema_violation",
            Self::EmptySchema => "empty_schema",
            Self::EmptyColumnName => "empty_column_name",
            Self::NegativeOrder => "negative_order",
            Self::DuplicateColumnName => "duplicate_column_name",
            Self::UnknownColumnType => "unknown_column_type",
            Self::MissingParam => "missing_param",
            Self::UnknownParam => "unknown_param",
            Self::InvalidParamType => "invalid_param_type",
            Self::ParamOutOfBounds => "param_out_of_bounds",
            Self::MinGreaterThanMax => "min_greater_than_max",
            Self::InvalidFormatting => "invalid_formatting",
        }
    }

    /// True for codes raised while checking a column's parameter set.
    pub fn is_param_issue(self) -> bool {
        matches!(
            self,
            Self::MissingParam
                | Self::UnknownParam
                | Self::InvalidParamType
                | Self::ParamOutOfBounds
                | Self::MinGreaterThanMax
        )
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured validation issue with location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: IssueCode,
    /// JSON pointer into the schema document.
    pub path: String,
    /// Index of the offending column in input order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Parameters involved in the failed rule.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
    pub message: String,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(code: IssueCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            column: None,
            name: None,
            params: Vec::new(),
            message: message.into(),
        }
    }

    /// Attach the issue to a column, prefixing the path with its location.
    pub fn for_column(mut self, index: usize, name: &str) -> Self {
        self.path = format!("/columns/{index}{}", self.path);
        self.column = Some(index);
        self.name = Some(name.to_string());
        self
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }
}

/// Aggregated validation report.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
    }

    pub fn has_code(&self, code: IssueCode) -> bool {
        self.errors.iter().any(|issue| issue.code == code)
    }

    /// Issues raised for the column at `index`.
    pub fn for_column(&self, index: usize) -> impl Iterator<Item = &ValidationIssue> {
        self.errors
            .iter()
            .filter(move |issue| issue.column == Some(index))
    }

    /// Distinct column indexes with at least one issue.
    pub fn columns(&self) -> BTreeSet<usize> {
        self.errors.iter().filter_map(|issue| issue.column).collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} issue(s)", self.errors.len())?;
        for issue in &self.errors {
            write!(f, "; [{}] {}: {}", issue.path, issue.code, issue.message)?;
        }
        Ok(())
    }
}
