//! Core contracts for datagen.
//!
//! This crate defines the column catalog, the user-authored schema document,
//! and the structured validation report shared by the generator and the CLI.

pub mod column;
pub mod contract;
pub mod error;
pub mod registry;
pub mod schema;
pub mod validation;

pub use column::{ColumnDescriptor, ColumnKind, ColumnParams};
pub use contract::{parse_schema_document, schema_definition_json_schema, validate_schema_document};
pub use error::{Error, Result};
pub use registry::{ColumnRegistry, ColumnSpec, ParamSpec, RangePair};
pub use schema::SchemaDefinition;
pub use validation::{IssueCode, ValidationIssue, ValidationReport};

/// Current contract version for schema documents.
pub const SCHEMA_VERSION: &str = "0.1";
