use std::collections::HashMap;

use datagen_core::{
    ColumnDescriptor, ColumnKind, ColumnParams, ColumnRegistry, Error, IssueCode,
    ValidationIssue, ValidationReport,
};
use serde::Serialize;

use crate::errors::GenerationError;
use crate::provider::{GeneratedValue, Row, ValueProvider, ValueSource};

/// A validated column with its kind resolved and defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledField {
    pub name: String,
    pub kind: ColumnKind,
    pub order: i64,
    pub params: ColumnParams,
}

impl CompiledField {
    /// Produce this field's next value from `source`.
    pub fn produce<S: ValueSource>(&self, source: &mut S) -> Result<GeneratedValue, GenerationError> {
        source
            .generate(self.kind, &self.params)
            .map_err(|source| GenerationError::Provider {
                column: self.name.clone(),
                source,
            })
    }
}

/// Validated, order-resolved column set. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledSchema {
    fields: Vec<CompiledField>,
}

impl CompiledSchema {
    pub fn fields(&self) -> &[CompiledField] {
        &self.fields
    }

    pub fn header(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Bind every field to `source`, yielding a factory producing one row per call.
    pub fn bind<S: ValueSource>(self, source: S) -> RowFactory<S> {
        RowFactory {
            fields: self.fields,
            source,
        }
    }
}

/// Produces rows from a compiled field list and a value source.
///
/// The header and every row are built from the same field list.
#[derive(Debug)]
pub struct RowFactory<S = ValueProvider> {
    fields: Vec<CompiledField>,
    source: S,
}

impl<S: ValueSource> RowFactory<S> {
    pub fn header(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.name.clone()).collect()
    }

    pub fn width(&self) -> usize {
        self.fields.len()
    }

    pub fn next_row(&mut self) -> Result<Row, GenerationError> {
        let mut row = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            row.push(field.produce(&mut self.source)?);
        }
        Ok(row)
    }
}

/// Compile descriptors against the built-in column registry.
pub fn compile<I>(columns: I) -> Result<CompiledSchema, GenerationError>
where
    I: IntoIterator<Item = ColumnDescriptor>,
{
    Ok(compile_with(columns, ColumnRegistry::builtin())?)
}

/// Validate and order descriptors.
///
/// Every invalid column is reported in one `InvalidSchema` error; nothing is
/// produced on failure. Fields are stably sorted by `order`.
pub fn compile_with<I>(columns: I, registry: &ColumnRegistry) -> Result<CompiledSchema, Error>
where
    I: IntoIterator<Item = ColumnDescriptor>,
{
    let columns: Vec<ColumnDescriptor> = columns.into_iter().collect();
    if columns.is_empty() {
        return Err(Error::EmptySchema);
    }

    let mut report = ValidationReport::default();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut fields = Vec::with_capacity(columns.len());

    for (index, column) in columns.iter().enumerate() {
        if column.name.trim().is_empty() {
            report.push(
                ValidationIssue::new(
                    IssueCode::EmptyColumnName,
                    "/name",
                    "column name must not be empty",
                )
                .for_column(index, &column.name),
            );
        } else if let Some(first) = seen.get(column.name.as_str()) {
            report.push(
                ValidationIssue::new(
                    IssueCode::DuplicateColumnName,
                    "/name",
                    format!(
                        "column name '{}' is already used by column {first}",
                        column.name
                    ),
                )
                .for_column(index, &column.name),
            );
        } else {
            seen.insert(column.name.as_str(), index);
        }

        if column.order < 0 {
            report.push(
                ValidationIssue::new(
                    IssueCode::NegativeOrder,
                    "/order",
                    format!("order must be >= 0, got {}", column.order),
                )
                .for_column(index, &column.name),
            );
        }

        let spec = match registry.resolve(&column.kind) {
            Ok(spec) => spec,
            Err(err) => {
                report.push(
                    ValidationIssue::new(IssueCode::UnknownColumnType, "/type", err.to_string())
                        .for_column(index, &column.name),
                );
                continue;
            }
        };

        match spec.validate(&column.params) {
            Ok(params) => fields.push(CompiledField {
                name: column.name.clone(),
                kind: spec.kind,
                order: column.order,
                params,
            }),
            Err(param_report) => {
                for issue in param_report.errors {
                    report.push(issue.for_column(index, &column.name));
                }
            }
        }
    }

    if !report.is_ok() {
        return Err(Error::InvalidSchema(report));
    }

    fields.sort_by_key(|field| field.order);
    Ok(CompiledSchema { fields })
}
