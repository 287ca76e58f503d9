use std::io::Read;
use std::path::PathBuf;

use datagen_core::ColumnDescriptor;
use datagen_generate::{
    ArtifactStorage, CsvDialect, GeneratedValue, GenerationError, LocalStorage, Row, StoreError,
    ValueProvider, compile, stream, write_csv_artifact,
};

fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("datagen-{label}-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn header(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn text_rows(rows: &[&[&str]]) -> Vec<Result<Row, GenerationError>> {
    rows.iter()
        .map(|row| Ok(row.iter().map(|value| GeneratedValue::from(*value)).collect()))
        .collect()
}

fn render(header: &[String], rows: Vec<Result<Row, GenerationError>>, dialect: CsvDialect) -> String {
    let mut out = Vec::new();
    datagen_generate::output::csv::write_rows_csv(&mut out, header, rows, dialect)
        .expect("write rows");
    String::from_utf8(out).expect("utf8")
}

fn parse(content: &str, dialect: CsvDialect) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(dialect.delimiter())
        .quote(dialect.quote())
        .from_reader(content.as_bytes());
    reader
        .records()
        .map(|record| {
            record
                .expect("record")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}

struct RejectingStorage;

impl ArtifactStorage for RejectingStorage {
    fn store(&self, _key: &str, _source: &mut dyn Read) -> Result<String, StoreError> {
        Err(StoreError::Backend("bucket unavailable".to_string()))
    }
}

#[test]
fn custom_dialect_reads_back_the_same_table() {
    let dialect = CsvDialect::new('!', '~').expect("dialect");
    let header = header(&["name", "age"]);
    let content = render(
        &header,
        text_rows(&[&["Vasya", "25"], &["Zucc", "38"]]),
        dialect,
    );

    assert_eq!(content, "name!age\r\nVasya!25\r\nZucc!38\r\n");
    assert_eq!(
        parse(&content, dialect),
        vec![
            vec!["name".to_string(), "age".to_string()],
            vec!["Vasya".to_string(), "25".to_string()],
            vec!["Zucc".to_string(), "38".to_string()],
        ]
    );
}

#[test]
fn values_with_special_characters_are_quoted() {
    let dialect = CsvDialect::new(';', '\'').expect("dialect");
    let header = header(&["text"]);
    let content = render(
        &header,
        text_rows(&[&["a;b"], &["it's"], &["line one\nline two"], &["plain"]]),
        dialect,
    );

    assert!(content.contains("'a;b'"));
    assert!(content.contains("'it''s'"));
    assert!(content.contains("'line one\nline two'"));
    assert!(content.ends_with("plain\r\n"));

    let parsed = parse(&content, dialect);
    assert_eq!(parsed.len(), 5);
    assert_eq!(parsed[1], vec!["a;b".to_string()]);
    assert_eq!(parsed[2], vec!["it's".to_string()]);
    assert_eq!(parsed[3], vec!["line one\nline two".to_string()]);
}

#[test]
fn dialect_requires_single_ascii_characters() {
    assert!(CsvDialect::new('§', '"').is_err());
    assert!(CsvDialect::new(',', '»').is_err());
    assert!(CsvDialect::new('\n', '"').is_err());
    assert_eq!(CsvDialect::default(), CsvDialect::new(',', '"').expect("default"));
}

#[test]
fn stored_artifact_matches_generated_rows_and_leaves_no_temp_file() {
    let temp_dir = scratch_dir("tmp");
    let store_dir = scratch_dir("store");
    let storage = LocalStorage::new(&store_dir);

    let columns = vec![
        ColumnDescriptor::new("Name", "name", 1),
        ColumnDescriptor::new("Score", "random_int", 0)
            .with_param("min", 1)
            .with_param("max", 3),
        ColumnDescriptor::new("Notes", "sentences_variable_str", 2)
            .with_param("nb_min", 1)
            .with_param("nb_max", 2),
    ];
    let factory = compile(columns).expect("compile").bind(ValueProvider::seeded(11));
    let header = factory.header();

    let artifact = write_csv_artifact(
        &header,
        stream(factory, 250),
        CsvDialect::default(),
        &storage,
        "owner/scores.csv",
        Some(&temp_dir),
    )
    .expect("artifact");

    assert_eq!(artifact.rows, 250);
    assert_eq!(artifact.key, "owner/scores.csv");

    let content = std::fs::read_to_string(store_dir.join("owner/scores.csv")).expect("stored");
    assert_eq!(content.len() as u64, artifact.bytes);

    let records = parse(&content, CsvDialect::default());
    assert_eq!(records.len(), 251);
    assert_eq!(records[0], vec!["Score", "Name", "Notes"]);
    for record in &records[1..] {
        let score: i64 = record[0].parse().expect("score");
        assert!((1..=3).contains(&score));
    }

    let leftovers: Vec<_> = std::fs::read_dir(&temp_dir).expect("read temp").collect();
    assert!(leftovers.is_empty());

    let _ = std::fs::remove_dir_all(&temp_dir);
    let _ = std::fs::remove_dir_all(&store_dir);
}

#[test]
fn storage_failure_removes_temp_file() {
    let temp_dir = scratch_dir("tmp-fail");
    let header = header(&["name"]);

    let err = write_csv_artifact(
        &header,
        text_rows(&[&["Ada"], &["Grace"]]),
        CsvDialect::default(),
        &RejectingStorage,
        "owner/names.csv",
        Some(&temp_dir),
    )
    .expect_err("storage rejects");

    assert!(matches!(err, GenerationError::Store(StoreError::Backend(_))));
    assert_eq!(std::fs::read_dir(&temp_dir).expect("read temp").count(), 0);

    let _ = std::fs::remove_dir_all(&temp_dir);
}

#[test]
fn row_error_aborts_write_and_removes_temp_file() {
    let temp_dir = scratch_dir("tmp-row");
    let store_dir = scratch_dir("store-row");
    let storage = LocalStorage::new(&store_dir);
    let header = header(&["name"]);

    let mut rows = text_rows(&[&["Ada"]]);
    rows.push(Err(GenerationError::InvalidRequest("boom".to_string())));
    rows.extend(text_rows(&[&["Grace"]]));

    let err = write_csv_artifact(
        &header,
        rows,
        CsvDialect::default(),
        &storage,
        "owner/names.csv",
        Some(&temp_dir),
    )
    .expect_err("row error");

    assert!(matches!(err, GenerationError::InvalidRequest(_)));
    assert_eq!(std::fs::read_dir(&temp_dir).expect("read temp").count(), 0);
    assert!(!store_dir.join("owner/names.csv").exists());

    let _ = std::fs::remove_dir_all(&temp_dir);
    let _ = std::fs::remove_dir_all(&store_dir);
}

#[test]
fn million_rows_stream_into_a_sink() {
    let columns = vec![
        ColumnDescriptor::new("N", "random_int", 0)
            .with_param("min", 0)
            .with_param("max", 9),
    ];
    let factory = compile(columns).expect("compile").bind(ValueProvider::seeded(5));
    let header = factory.header();

    let summary = datagen_generate::output::csv::write_rows_csv(
        std::io::sink(),
        &header,
        stream(factory, 1_000_000),
        CsvDialect::default(),
    )
    .expect("write");

    assert_eq!(summary.rows, 1_000_000);
    // "N\r\n" plus one digit and CRLF per row.
    assert_eq!(summary.bytes, 3 + 3 * 1_000_000);
}

/// Stores into `inner` after removing everything under `sweep`.
struct SweepingStorage {
    inner: LocalStorage,
    sweep: PathBuf,
}

impl ArtifactStorage for SweepingStorage {
    fn store(&self, key: &str, source: &mut dyn Read) -> Result<String, StoreError> {
        for entry in std::fs::read_dir(&self.sweep)? {
            std::fs::remove_file(entry?.path())?;
        }
        self.inner.store(key, source)
    }
}

#[test]
fn temp_cleanup_failure_after_store_keeps_the_artifact() {
    let temp_dir = scratch_dir("tmp-sweep");
    let store_dir = scratch_dir("store-sweep");
    let storage = SweepingStorage {
        inner: LocalStorage::new(&store_dir),
        sweep: temp_dir.clone(),
    };
    let header = header(&["name"]);

    let artifact = write_csv_artifact(
        &header,
        text_rows(&[&["Ada"], &["Grace"]]),
        CsvDialect::default(),
        &storage,
        "owner/names.csv",
        Some(&temp_dir),
    )
    .expect("stored despite cleanup error");

    assert_eq!(artifact.rows, 2);
    let content = std::fs::read_to_string(store_dir.join("owner/names.csv")).expect("stored");
    assert_eq!(content, "name\r\nAda\r\nGrace\r\n");

    let _ = std::fs::remove_dir_all(&temp_dir);
    let _ = std::fs::remove_dir_all(&store_dir);
}
