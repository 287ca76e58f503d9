use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use datagen_core::SchemaDefinition;

use crate::compiler::compile;
use crate::errors::{GenerationError, StoreError};
use crate::model::{DatasetRecord, GenerationRequest, JobOptions};
use crate::output::csv::{StoredArtifact, write_csv_artifact};
use crate::provider::ValueProvider;
use crate::storage::ArtifactStorage;
use crate::stream::stream;

/// Persistence collaborator supplying schemas and dataset records.
pub trait DatasetRepository: Send + Sync {
    fn load_schema(&self, schema_id: &str) -> Result<SchemaDefinition, StoreError>;
    fn load_dataset(&self, dataset_id: &str) -> Result<DatasetRecord, StoreError>;
    /// Insert or overwrite the record with the same id.
    fn save_dataset(&self, record: &DatasetRecord) -> Result<(), StoreError>;
}

/// Repository held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    schemas: Mutex<HashMap<String, SchemaDefinition>>,
    datasets: Mutex<HashMap<String, DatasetRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_schema(&self, schema: SchemaDefinition) -> Result<(), StoreError> {
        lock(&self.schemas)?.insert(schema.id.clone(), schema);
        Ok(())
    }

    pub fn dataset_count(&self) -> Result<usize, StoreError> {
        Ok(lock(&self.datasets)?.len())
    }
}

impl DatasetRepository for InMemoryRepository {
    fn load_schema(&self, schema_id: &str) -> Result<SchemaDefinition, StoreError> {
        lock(&self.schemas)?
            .get(schema_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "schema",
                id: schema_id.to_string(),
            })
    }

    fn load_dataset(&self, dataset_id: &str) -> Result<DatasetRecord, StoreError> {
        lock(&self.datasets)?
            .get(dataset_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "dataset",
                id: dataset_id.to_string(),
            })
    }

    fn save_dataset(&self, record: &DatasetRecord) -> Result<(), StoreError> {
        lock(&self.datasets)?.insert(record.id.clone(), record.clone());
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Backend("repository lock poisoned".to_string()))
}

/// End-to-end generation for one persisted dataset record.
///
/// Each run recompiles the schema from the repository; nothing is cached
/// between runs. Re-running a dataset id updates the same record.
#[derive(Clone)]
pub struct GenerationJob {
    repository: Arc<dyn DatasetRepository>,
    storage: Arc<dyn ArtifactStorage>,
    options: JobOptions,
}

impl GenerationJob {
    pub fn new(
        repository: Arc<dyn DatasetRepository>,
        storage: Arc<dyn ArtifactStorage>,
        options: JobOptions,
    ) -> Self {
        Self {
            repository,
            storage,
            options,
        }
    }

    pub fn run(&self, dataset_id: &str) -> Result<DatasetRecord, GenerationError> {
        let start = Instant::now();
        let mut record = self.repository.load_dataset(dataset_id)?;
        record.mark_running();
        self.repository.save_dataset(&record)?;

        info!(
            dataset_id = %record.id,
            schema_id = %record.schema_id,
            rows = record.num_rows,
            "generation started"
        );

        let artifact = match self.execute(&record) {
            Ok(artifact) => artifact,
            Err(err) => return Err(self.fail(&mut record, err)),
        };

        record.mark_completed(&artifact);
        if let Err(err) = self.repository.save_dataset(&record) {
            warn!(
                dataset_id = %record.id,
                location = %artifact.location,
                "stored artifact could not be recorded"
            );
            return Err(self.fail(&mut record, err.into()));
        }

        info!(
            dataset_id = %record.id,
            location = %artifact.location,
            rows_written = artifact.rows,
            bytes_written = artifact.bytes,
            duration_ms = start.elapsed().as_millis() as u64,
            "generation completed"
        );
        Ok(record)
    }

    /// Best-effort save of the failed state; `err` is handed back unchanged.
    fn fail(&self, record: &mut DatasetRecord, err: GenerationError) -> GenerationError {
        record.mark_failed(&err);
        if let Err(save_err) = self.repository.save_dataset(record) {
            warn!(dataset_id = %record.id, error = %save_err, "failed to record job failure");
        }
        warn!(dataset_id = %record.id, error = %err, "generation failed");
        err
    }

    fn execute(&self, record: &DatasetRecord) -> Result<StoredArtifact, GenerationError> {
        let schema = self.repository.load_schema(&record.schema_id)?;
        let request = GenerationRequest::for_dataset(record, &schema);
        let dialect = request.validate()?;

        let compiled = compile(schema.columns.iter().cloned())?;
        let provider = match request.seed {
            Some(seed) => ValueProvider::seeded(seed),
            None => ValueProvider::from_entropy(),
        }
        .with_reference_date(request.reference_date);
        let factory = compiled.bind(provider);
        let header = factory.header();
        let key = artifact_key(&schema, request.num_rows, Utc::now());

        write_csv_artifact(
            &header,
            stream(factory, request.num_rows),
            dialect,
            self.storage.as_ref(),
            &key,
            self.options.temp_dir.as_deref(),
        )
    }
}

/// Unique storage key: `<owner>/<schema-name>_<rows>_<timestamp>_<token>.csv`.
pub fn artifact_key(schema: &SchemaDefinition, num_rows: u64, at: DateTime<Utc>) -> String {
    let owner = sanitize_segment(&schema.owner_id);
    let name = sanitize_segment(&schema.name.replace(' ', "-"));
    let timestamp = at.format("%Y-%m-%dT%H-%M-%S%.3fZ");
    format!("{owner}/{name}_{num_rows}_{timestamp}_{}.csv", short_id())
}

fn sanitize_segment(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}

fn short_id() -> String {
    let id = uuid::Uuid::new_v4().to_string();
    match id.split('-').next() {
        Some(part) if !part.is_empty() => part.to_string(),
        _ => id,
    }
}
