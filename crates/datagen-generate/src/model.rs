use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use datagen_core::SchemaDefinition;

use crate::errors::GenerationError;
use crate::output::csv::{CsvDialect, StoredArtifact};
use crate::provider::default_reference_date;

/// Everything needed to generate one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub schema_id: String,
    pub num_rows: u64,
    pub column_separator: char,
    pub quote_character: char,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Upper bound for generated dates.
    #[serde(default = "default_reference_date")]
    pub reference_date: NaiveDate,
}

impl GenerationRequest {
    pub fn for_dataset(record: &DatasetRecord, schema: &SchemaDefinition) -> Self {
        Self {
            schema_id: schema.id.clone(),
            num_rows: record.num_rows,
            column_separator: schema.column_separator,
            quote_character: schema.quote_character,
            seed: record.seed,
            reference_date: record.reference_date,
        }
    }

    /// Check the row count and build the output dialect.
    pub fn validate(&self) -> Result<CsvDialect, GenerationError> {
        if self.num_rows == 0 {
            return Err(GenerationError::InvalidRequest(
                "num_rows must be at least 1".to_string(),
            ));
        }
        CsvDialect::new(self.column_separator, self.quote_character)
    }
}

/// Lifecycle state of a dataset record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Persisted result record for one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: String,
    pub schema_id: String,
    pub num_rows: u64,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Pinned at creation so re-runs draw dates from the same range.
    #[serde(default = "default_reference_date")]
    pub reference_date: NaiveDate,
    pub status: DatasetStatus,
    /// Durable location of the CSV; set only when completed.
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub rows_written: Option<u64>,
    #[serde(default)]
    pub bytes_written: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DatasetRecord {
    pub fn new(schema_id: impl Into<String>, num_rows: u64) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            schema_id: schema_id.into(),
            num_rows,
            seed: None,
            reference_date: now.date_naive(),
            status: DatasetStatus::Pending,
            file: None,
            rows_written: None,
            bytes_written: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.status == DatasetStatus::Completed && self.file.is_some()
    }

    pub(crate) fn mark_running(&mut self) {
        self.status = DatasetStatus::Running;
        self.file = None;
        self.rows_written = None;
        self.bytes_written = None;
        self.error = None;
        self.updated_at = Utc::now();
    }

    pub(crate) fn mark_completed(&mut self, artifact: &StoredArtifact) {
        self.status = DatasetStatus::Completed;
        self.file = Some(artifact.location.clone());
        self.rows_written = Some(artifact.rows);
        self.bytes_written = Some(artifact.bytes);
        self.error = None;
        self.updated_at = Utc::now();
    }

    pub(crate) fn mark_failed(&mut self, err: &GenerationError) {
        self.status = DatasetStatus::Failed;
        self.file = None;
        self.rows_written = None;
        self.bytes_written = None;
        self.error = Some(err.to_string());
        self.updated_at = Utc::now();
    }
}

/// Options for the generation job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobOptions {
    /// Directory for temporary CSV files; the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
}
