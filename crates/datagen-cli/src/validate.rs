use serde_json::Value;

use datagen_core::{
    ColumnRegistry, Error as CoreError, IssueCode, SchemaDefinition, ValidationIssue,
    ValidationReport, parse_schema_document,
};
use datagen_generate::compile_with;

/// Run every check a schema document must pass before it can be stored.
///
/// The outer error is reserved for failures of the checking itself; an
/// invalid document comes back as `Ok(Err(report))`.
pub fn check_document(
    document: Value,
) -> Result<Result<SchemaDefinition, ValidationReport>, CoreError> {
    let outcome = parse_schema_document(document).and_then(|schema| {
        compile_with(schema.columns.iter().cloned(), ColumnRegistry::builtin())?;
        Ok(schema)
    });

    match outcome {
        Ok(schema) => Ok(Ok(schema)),
        Err(CoreError::InvalidSchema(report)) => Ok(Err(report)),
        Err(CoreError::EmptySchema) => Ok(Err(single_issue(
            IssueCode::EmptySchema,
            "/columns",
            "schema has no columns",
        ))),
        Err(CoreError::Json(err)) => Ok(Err(single_issue(
            IssueCode::SchemaViolation,
            "/",
            err.to_string(),
        ))),
        Err(other) => Err(other),
    }
}

fn single_issue(code: IssueCode, path: &str, message: impl Into<String>) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.push(ValidationIssue::new(code, path, message));
    report
}
