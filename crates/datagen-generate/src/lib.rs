//! Synthetic dataset generation for datagen.
//!
//! Column descriptors are compiled into an ordered, provider-bound schema,
//! rows are streamed lazily from it, and the stream is materialized as a
//! delimited text artifact handed to durable storage.

pub mod compiler;
pub mod errors;
pub mod job;
pub mod model;
pub mod output;
pub mod provider;
pub mod storage;
pub mod stream;

pub use compiler::{CompiledField, CompiledSchema, RowFactory, compile, compile_with};
pub use errors::{GenerationError, ProviderError, StoreError};
pub use job::{DatasetRepository, GenerationJob, InMemoryRepository, artifact_key};
pub use model::{DatasetRecord, DatasetStatus, GenerationRequest, JobOptions};
pub use output::csv::{CsvDialect, CsvSummary, StoredArtifact, write_csv_artifact};
pub use provider::{GeneratedValue, Row, ValueProvider, ValueSource, default_reference_date};
pub use storage::{ArtifactStorage, LocalStorage};
pub use stream::{RowStream, stream};
