use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use datagen_core::{ColumnDescriptor, ColumnKind, SchemaDefinition};
use datagen_generate::{
    ArtifactStorage, DatasetRecord, DatasetRepository, DatasetStatus, GenerationError,
    GenerationJob, InMemoryRepository, JobOptions, LocalStorage, StoreError,
};

struct Harness {
    root: PathBuf,
    repository: Arc<InMemoryRepository>,
}

impl Harness {
    fn new() -> Self {
        let root = std::env::temp_dir().join(format!("datagen-job-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(root.join("tmp")).expect("create temp dir");
        Self {
            root,
            repository: Arc::new(InMemoryRepository::new()),
        }
    }

    fn temp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    fn storage(&self) -> Arc<LocalStorage> {
        Arc::new(LocalStorage::new(self.root.join("artifacts")))
    }

    fn job(&self, storage: Arc<dyn ArtifactStorage>) -> GenerationJob {
        GenerationJob::new(
            self.repository.clone(),
            storage,
            JobOptions {
                temp_dir: Some(self.temp_dir()),
            },
        )
    }

    fn add_schema(&self, schema: SchemaDefinition) {
        self.repository.insert_schema(schema).expect("insert schema");
    }

    fn add_dataset(&self, record: &DatasetRecord) {
        self.repository.save_dataset(record).expect("save dataset");
    }

    fn temp_entries(&self) -> usize {
        std::fs::read_dir(self.temp_dir()).expect("read temp").count()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

/// Storage that can be switched between failing and delegating.
struct FlakyStorage {
    inner: LocalStorage,
    fail: AtomicBool,
}

impl ArtifactStorage for FlakyStorage {
    fn store(&self, key: &str, source: &mut dyn Read) -> Result<String, StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("upload refused".to_string()));
        }
        self.inner.store(key, source)
    }
}

fn people_schema(id: &str) -> SchemaDefinition {
    SchemaDefinition::new(
        id,
        "People Export",
        "owner-7",
        vec![
            ColumnDescriptor::new("Email", "safe_email", 2),
            ColumnDescriptor::new("Full name", "name", 0),
            ColumnDescriptor::new("Age", "random_int", 1)
                .with_param("min", 18)
                .with_param("max", 90),
        ],
    )
}

fn read_records(path: &Path, delimiter: u8) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .from_path(path)
        .expect("open csv");
    reader
        .records()
        .map(|record| record.expect("record").iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn completed_run_records_file_with_header_and_rows() {
    let harness = Harness::new();
    harness.add_schema(people_schema("people"));
    let record = DatasetRecord::new("people", 40);
    harness.add_dataset(&record);

    let done = harness.job(harness.storage()).run(&record.id).expect("run");

    assert_eq!(done.id, record.id);
    assert_eq!(done.status, DatasetStatus::Completed);
    assert!(done.is_complete());
    assert_eq!(done.rows_written, Some(40));

    let file = PathBuf::from(done.file.clone().expect("file"));
    let key = file
        .strip_prefix(harness.root.join("artifacts"))
        .expect("under storage root");
    assert!(key.starts_with("owner-7"));
    assert!(
        key.to_string_lossy().contains("People-Export_40_"),
        "{}",
        key.display()
    );

    let records = read_records(&file, b',');
    assert_eq!(records.len(), 41);
    assert_eq!(records[0], vec!["Full name", "Age", "Email"]);
    assert_eq!(harness.temp_entries(), 0);

    let stored = harness.repository.load_dataset(&record.id).expect("load");
    assert_eq!(stored, done);
}

#[test]
fn schema_dialect_is_applied_to_output() {
    let harness = Harness::new();
    let mut schema = people_schema("semi");
    schema.column_separator = ';';
    schema.quote_character = '\'';
    harness.add_schema(schema);
    let record = DatasetRecord::new("semi", 5);
    harness.add_dataset(&record);

    let done = harness.job(harness.storage()).run(&record.id).expect("run");
    let file = PathBuf::from(done.file.expect("file"));
    let content = std::fs::read_to_string(&file).expect("read");
    assert!(content.starts_with("Full name;Age;Email\r\n"));
    assert_eq!(read_records(&file, b';').len(), 6);
}

#[test]
fn storage_failure_marks_record_failed_without_file() {
    let harness = Harness::new();
    harness.add_schema(people_schema("people"));
    let record = DatasetRecord::new("people", 10);
    harness.add_dataset(&record);

    let storage = Arc::new(FlakyStorage {
        inner: LocalStorage::new(harness.root.join("artifacts")),
        fail: AtomicBool::new(true),
    });
    let job = harness.job(storage.clone());

    let err = job.run(&record.id).expect_err("storage refuses");
    assert!(matches!(err, GenerationError::Store(StoreError::Backend(_))));

    let failed = harness.repository.load_dataset(&record.id).expect("load");
    assert_eq!(failed.status, DatasetStatus::Failed);
    assert_eq!(failed.file, None);
    assert!(failed.error.as_deref().unwrap_or_default().contains("upload refused"));
    assert_eq!(harness.temp_entries(), 0);

    storage.fail.store(false, Ordering::SeqCst);
    let retried = job.run(&record.id).expect("retry");

    assert_eq!(retried.id, record.id);
    assert_eq!(retried.status, DatasetStatus::Completed);
    assert_eq!(retried.error, None);
    assert_eq!(harness.repository.dataset_count().expect("count"), 1);
}

#[test]
fn rerun_updates_the_same_record() {
    let harness = Harness::new();
    harness.add_schema(people_schema("people"));
    let record = DatasetRecord::new("people", 3);
    harness.add_dataset(&record);
    let job = harness.job(harness.storage());

    let first = job.run(&record.id).expect("first");
    let second = job.run(&record.id).expect("second");

    assert_eq!(first.id, second.id);
    assert_eq!(second.created_at, record.created_at);
    assert_ne!(first.file, second.file);
    assert_eq!(harness.repository.dataset_count().expect("count"), 1);
}

#[test]
fn invalid_schema_fails_the_record() {
    let harness = Harness::new();
    harness.add_schema(SchemaDefinition::new(
        "broken",
        "Broken",
        "owner-7",
        vec![
            ColumnDescriptor::new("A", "name", 0),
            ColumnDescriptor::new("A", "uuid4", 1),
        ],
    ));
    let record = DatasetRecord::new("broken", 10);
    harness.add_dataset(&record);

    let err = harness
        .job(harness.storage())
        .run(&record.id)
        .expect_err("invalid schema");
    let report = match &err {
        GenerationError::Schema(inner) => inner.report().expect("report").clone(),
        other => panic!("unexpected error: {other}"),
    };
    assert_eq!(report.len(), 2);

    let failed = harness.repository.load_dataset(&record.id).expect("load");
    assert_eq!(failed.status, DatasetStatus::Failed);
    assert_eq!(failed.file, None);
}

#[test]
fn zero_rows_is_rejected() {
    let harness = Harness::new();
    harness.add_schema(people_schema("people"));
    let record = DatasetRecord::new("people", 0);
    harness.add_dataset(&record);

    let err = harness
        .job(harness.storage())
        .run(&record.id)
        .expect_err("zero rows");
    assert!(matches!(err, GenerationError::InvalidRequest(_)));
}

#[test]
fn missing_dataset_is_not_found() {
    let harness = Harness::new();
    let err = harness
        .job(harness.storage())
        .run("does-not-exist")
        .expect_err("missing");
    assert!(matches!(
        err,
        GenerationError::Store(StoreError::NotFound { kind: "dataset", .. })
    ));
}

#[test]
fn seeded_runs_produce_identical_content() {
    let harness = Harness::new();
    harness.add_schema(people_schema("people"));
    let job = harness.job(harness.storage());

    let mut contents = Vec::new();
    for _ in 0..2 {
        let record = DatasetRecord::new("people", 25).with_seed(Some(2024));
        harness.add_dataset(&record);
        let done = job.run(&record.id).expect("run");
        let file = done.file.expect("file");
        contents.push(std::fs::read_to_string(file).expect("read"));
    }
    assert_eq!(contents[0], contents[1]);
}

/// Repository that refuses to persist completed records.
struct CompletionRejectingRepository {
    inner: Arc<InMemoryRepository>,
}

impl DatasetRepository for CompletionRejectingRepository {
    fn load_schema(&self, schema_id: &str) -> Result<SchemaDefinition, StoreError> {
        self.inner.load_schema(schema_id)
    }

    fn load_dataset(&self, dataset_id: &str) -> Result<DatasetRecord, StoreError> {
        self.inner.load_dataset(dataset_id)
    }

    fn save_dataset(&self, record: &DatasetRecord) -> Result<(), StoreError> {
        if record.status == DatasetStatus::Completed {
            return Err(StoreError::Backend("write conflict".to_string()));
        }
        self.inner.save_dataset(record)
    }
}

#[test]
fn failed_completion_save_leaves_record_failed() {
    let harness = Harness::new();
    harness.add_schema(people_schema("people"));
    let record = DatasetRecord::new("people", 4);
    harness.add_dataset(&record);

    let job = GenerationJob::new(
        Arc::new(CompletionRejectingRepository {
            inner: harness.repository.clone(),
        }),
        harness.storage(),
        JobOptions {
            temp_dir: Some(harness.temp_dir()),
        },
    );

    let err = job.run(&record.id).expect_err("save rejected");
    assert!(matches!(err, GenerationError::Store(StoreError::Backend(_))));

    let stored = harness.repository.load_dataset(&record.id).expect("load");
    assert_eq!(stored.status, DatasetStatus::Failed);
    assert_eq!(stored.file, None);
    assert!(stored.error.as_deref().unwrap_or_default().contains("write conflict"));
}

fn every_kind_schema(id: &str) -> SchemaDefinition {
    let columns = ColumnKind::ALL
        .iter()
        .enumerate()
        .map(|(order, kind)| ColumnDescriptor::new(kind.as_tag(), kind.as_tag(), order as i64))
        .collect();
    SchemaDefinition::new(id, "Every Kind", "owner-7", columns)
}

#[test]
fn seeded_output_with_every_kind_is_pinned_by_reference_date() {
    let harness = Harness::new();
    harness.add_schema(every_kind_schema("all"));
    let job = harness.job(harness.storage());

    let references = [
        NaiveDate::from_ymd_opt(1999, 12, 31).expect("date"),
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
        NaiveDate::from_ymd_opt(2031, 6, 15).expect("date"),
    ];
    for reference in references {
        let record = DatasetRecord::new("all", 30)
            .with_seed(Some(99))
            .with_reference_date(reference);
        harness.add_dataset(&record);

        let first = job.run(&record.id).expect("first run");
        let first_content =
            std::fs::read_to_string(first.file.expect("file")).expect("read first");
        let second = job.run(&record.id).expect("rerun");
        let second_file = PathBuf::from(second.file.expect("file"));
        let second_content = std::fs::read_to_string(&second_file).expect("read rerun");
        assert_eq!(first_content, second_content, "reference {reference}");

        let records = read_records(&second_file, b',');
        assert_eq!(records.len(), 31);
        let date_column = records[0]
            .iter()
            .position(|name| name == "date")
            .expect("date column");
        for row in &records[1..] {
            let date = NaiveDate::parse_from_str(&row[date_column], "%Y-%m-%d").expect("iso date");
            assert!(date <= reference, "{date} after {reference}");
        }
    }
}

#[test]
fn reference_date_survives_the_repository() {
    let harness = Harness::new();
    let reference = NaiveDate::from_ymd_opt(2010, 3, 4).expect("date");
    let record = DatasetRecord::new("all", 1).with_reference_date(reference);
    harness.add_dataset(&record);

    let loaded = harness.repository.load_dataset(&record.id).expect("load");
    assert_eq!(loaded.reference_date, reference);

    let json = serde_json::to_value(&loaded).expect("json");
    let mut legacy = json.as_object().cloned().expect("object");
    legacy.remove("reference_date");
    let restored: DatasetRecord =
        serde_json::from_value(serde_json::Value::Object(legacy)).expect("legacy record");
    assert_eq!(restored.reference_date, datagen_generate::default_reference_date());
}
