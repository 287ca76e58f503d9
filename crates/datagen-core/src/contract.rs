use jsonschema::JSONSchema;
use schemars::schema_for;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::schema::SchemaDefinition;
use crate::validation::{IssueCode, ValidationIssue, ValidationReport};

/// JSON Schema describing a schema document.
pub fn schema_definition_json_schema() -> Result<Value> {
    Ok(serde_json::to_value(schema_for!(SchemaDefinition))?)
}

/// Validate a schema document against the JSON Schema contract.
pub fn validate_schema_document(document: &Value) -> Result<ValidationReport> {
    let contract = schema_definition_json_schema()?;
    let compiled = JSONSchema::compile(&contract).map_err(|err| Error::Contract(err.to_string()))?;

    let mut report = ValidationReport::default();
    if let Err(errors) = compiled.validate(document) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push(ValidationIssue::new(
                IssueCode::SchemaViolation,
                path,
                error.to_string(),
            ));
        }
    }

    Ok(report)
}

/// Structurally validate and deserialize a schema document.
///
/// Column-level rules (types, params, duplicates) are checked at compile time.
pub fn parse_schema_document(document: Value) -> Result<SchemaDefinition> {
    let structural = validate_schema_document(&document)?;
    if !structural.is_ok() {
        return Err(Error::InvalidSchema(structural));
    }

    let definition: SchemaDefinition = serde_json::from_value(document)?;
    let formatting = definition.validate_formatting();
    if !formatting.is_ok() {
        return Err(Error::InvalidSchema(formatting));
    }
    Ok(definition)
}

fn normalized_json_pointer(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}
