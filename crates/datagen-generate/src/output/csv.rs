use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::errors::GenerationError;
use crate::provider::Row;
use crate::storage::ArtifactStorage;

/// Single-byte delimiter and quote character for delimited output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvDialect {
    delimiter: u8,
    quote: u8,
}

impl CsvDialect {
    pub fn new(delimiter: char, quote: char) -> Result<Self, GenerationError> {
        Ok(Self {
            delimiter: ascii_byte("column separator", delimiter)?,
            quote: ascii_byte("quote character", quote)?,
        })
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn quote(&self) -> u8 {
        self.quote
    }

    fn writer_builder(&self) -> WriterBuilder {
        let mut builder = WriterBuilder::new();
        builder
            .has_headers(false)
            .delimiter(self.delimiter)
            .quote(self.quote)
            .double_quote(true)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::CRLF);
        builder
    }
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

fn ascii_byte(what: &str, value: char) -> Result<u8, GenerationError> {
    if value.is_ascii() && !matches!(value, '\n' | '\r') {
        Ok(value as u8)
    } else {
        Err(GenerationError::InvalidRequest(format!(
            "{what} must be a single ASCII character, got {value:?}"
        )))
    }
}

/// Counts of what a CSV write produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvSummary {
    pub rows: u64,
    pub bytes: u64,
}

/// Location and size of an artifact handed to durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArtifact {
    pub key: String,
    pub location: String,
    pub rows: u64,
    pub bytes: u64,
}

/// Write the header then every streamed row as one record each.
///
/// Rows are consumed one at a time; the first row error aborts the write.
pub fn write_rows_csv<W, I>(
    writer: W,
    header: &[String],
    rows: I,
    dialect: CsvDialect,
) -> Result<CsvSummary, GenerationError>
where
    W: Write,
    I: IntoIterator<Item = Result<Row, GenerationError>>,
{
    let counting = CountingWriter::new(writer);
    let mut writer = dialect.writer_builder().from_writer(counting);

    writer.write_record(header)?;

    let mut written = 0_u64;
    for row in rows {
        let row = row?;
        for value in &row {
            writer.write_field(value.to_csv().as_bytes())?;
        }
        writer.write_record(None::<&[u8]>)?;
        written += 1;
    }

    writer.flush()?;
    let counting = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(CsvSummary {
        rows: written,
        bytes: counting.bytes_written(),
    })
}

/// CSV written to a uniquely named temporary file.
///
/// The file is removed when this value is dropped, whether or not it was
/// persisted.
#[derive(Debug)]
pub struct TempArtifact {
    file: NamedTempFile,
    summary: CsvSummary,
}

impl TempArtifact {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn summary(&self) -> CsvSummary {
        self.summary
    }

    /// Hand the file to `storage` under `key`, then delete the temporary copy.
    pub fn persist(
        self,
        storage: &dyn ArtifactStorage,
        key: &str,
    ) -> Result<StoredArtifact, GenerationError> {
        let mut reader = self.file.reopen()?;
        let location = storage.store(key, &mut reader)?;
        drop(reader);

        // The artifact is durable from here; cleanup problems are only logged.
        let summary = self.summary;
        let temp_path: PathBuf = self.file.path().to_path_buf();
        match self.file.close() {
            Ok(()) => debug!(temp = %temp_path.display(), key, "temporary artifact removed"),
            Err(err) => warn!(
                temp = %temp_path.display(),
                key,
                error = %err,
                "temporary artifact could not be removed"
            ),
        }

        Ok(StoredArtifact {
            key: key.to_string(),
            location,
            rows: summary.rows,
            bytes: summary.bytes,
        })
    }
}

/// Stream rows into a fresh temporary CSV file.
pub fn write_temp_csv<I>(
    header: &[String],
    rows: I,
    dialect: CsvDialect,
    temp_dir: Option<&Path>,
) -> Result<TempArtifact, GenerationError>
where
    I: IntoIterator<Item = Result<Row, GenerationError>>,
{
    let mut builder = tempfile::Builder::new();
    builder.prefix("datagen-").suffix(".csv");
    let file = match temp_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };

    let summary = write_rows_csv(BufWriter::new(file.as_file()), header, rows, dialect)?;
    file.as_file().sync_all()?;

    Ok(TempArtifact { file, summary })
}

/// Materialize a row stream and store it under `key`.
///
/// The temporary file is released on every exit path.
pub fn write_csv_artifact<I>(
    header: &[String],
    rows: I,
    dialect: CsvDialect,
    storage: &dyn ArtifactStorage,
    key: &str,
    temp_dir: Option<&Path>,
) -> Result<StoredArtifact, GenerationError>
where
    I: IntoIterator<Item = Result<Row, GenerationError>>,
{
    let artifact = write_temp_csv(header, rows, dialect, temp_dir)?;
    artifact.persist(storage, key)
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
