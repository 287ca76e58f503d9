use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;

use datagen_generate::{DatasetRecord, GenerationError, GenerationJob};

/// How a submitted generation job is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Run in the calling task before `submit` returns.
    Eager,
    /// Run on the blocking worker pool.
    Background,
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("generation worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Hands dataset ids to a [`GenerationJob`].
#[derive(Clone)]
pub struct JobQueue {
    job: GenerationJob,
    mode: DispatchMode,
}

impl JobQueue {
    pub fn new(job: GenerationJob, mode: DispatchMode) -> Self {
        Self { job, mode }
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Background submission must happen inside a tokio runtime.
    pub fn submit(&self, dataset_id: &str) -> JobHandle {
        match self.mode {
            DispatchMode::Eager => JobHandle::Ready(self.job.run(dataset_id)),
            DispatchMode::Background => {
                let job = self.job.clone();
                let dataset_id = dataset_id.to_string();
                tracing::debug!(dataset_id = %dataset_id, "job handed to background worker");
                JobHandle::Pending(tokio::task::spawn_blocking(move || job.run(&dataset_id)))
            }
        }
    }
}

/// Outcome of a submitted job, possibly still running.
pub enum JobHandle {
    Ready(Result<DatasetRecord, GenerationError>),
    Pending(JoinHandle<Result<DatasetRecord, GenerationError>>),
}

impl JobHandle {
    pub async fn wait(self) -> Result<DatasetRecord, QueueError> {
        let outcome = match self {
            JobHandle::Ready(outcome) => outcome,
            JobHandle::Pending(handle) => handle.await?,
        };
        Ok(outcome?)
    }
}
