mod logging;
mod queue;
mod quota;
mod validate;
mod workspace;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use datagen_core::{ColumnRegistry, Error as CoreError, SCHEMA_VERSION};
use datagen_generate::{
    DatasetRecord, DatasetRepository, GenerationError, GenerationJob, JobOptions, LocalStorage,
    StoreError,
};
use logging::{LoggingError, init_logging};
use queue::{DispatchMode, JobQueue, QueueError};
use quota::{QuotaExceeded, RowQuota};
use validate::check_document;
use workspace::{
    FileRepository, WorkspaceError, WorkspacePaths, WorkspaceSettings, load_or_create_settings,
};

#[derive(Debug, Error)]
enum CliError {
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("{0}")]
    Queue(#[from] QueueError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("quota exceeded: {0}")]
    Quota(#[from] QuotaExceeded),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema document has {0} issue(s)")]
    InvalidSchema(usize),
}

#[derive(Parser, Debug)]
#[command(name = "datagen", version, about = "Synthetic CSV dataset generator")]
struct Cli {
    /// Workspace directory for settings, schemas, datasets and artifacts.
    #[arg(long, global = true, default_value = ".datagen")]
    workspace: PathBuf,
    /// Override the dispatch mode from settings.
    #[arg(long, global = true, value_enum)]
    dispatch: Option<DispatchMode>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available column types and their parameters.
    Kinds,
    /// Check a schema document and print the validation report.
    Validate(FileArgs),
    /// Manage stored schemas.
    #[command(subcommand)]
    Schema(SchemaCommand),
    /// Create a dataset for a stored schema and generate it.
    Generate(GenerateArgs),
    /// Generate an existing dataset again.
    Run(RunArgs),
    /// List dataset records.
    Datasets(DatasetsArgs),
}

#[derive(Subcommand, Debug)]
enum SchemaCommand {
    /// Validate a schema document and store it in the workspace.
    Import(FileArgs),
    /// List stored schemas.
    List,
}

#[derive(Args, Debug)]
struct FileArgs {
    /// Path to a JSON schema document.
    file: PathBuf,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long)]
    schema_id: String,
    /// Number of data rows, excluding the header.
    #[arg(long)]
    rows: u64,
    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct RunArgs {
    dataset_id: String,
}

#[derive(Args, Debug)]
struct DatasetsArgs {
    #[arg(long)]
    schema_id: Option<String>,
}

struct Workspace {
    paths: WorkspacePaths,
    settings: WorkspaceSettings,
    repository: Arc<FileRepository>,
}

impl Workspace {
    fn open(root: PathBuf) -> Result<Self, CliError> {
        let paths = WorkspacePaths::new(root);
        paths.ensure_dirs()?;
        let settings = load_or_create_settings(&paths)?;
        init_logging(&paths.cli_log_path(), &settings.log_filter)?;
        let repository = Arc::new(FileRepository::new(paths.clone()));
        Ok(Self {
            paths,
            settings,
            repository,
        })
    }

    fn queue(&self, dispatch: Option<DispatchMode>) -> JobQueue {
        let options = JobOptions {
            temp_dir: Some(
                self.settings
                    .temp_dir
                    .clone()
                    .unwrap_or_else(|| self.paths.tmp_dir.clone()),
            ),
        };
        let job = GenerationJob::new(
            self.repository.clone(),
            Arc::new(LocalStorage::new(self.paths.artifacts_dir.clone())),
            options,
        );
        JobQueue::new(job, dispatch.unwrap_or(self.settings.dispatch))
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Kinds => run_kinds(),
        Command::Validate(args) => run_validate(&args.file),
        Command::Schema(SchemaCommand::Import(args)) => {
            let workspace = Workspace::open(cli.workspace)?;
            run_schema_import(&workspace, &args.file)
        }
        Command::Schema(SchemaCommand::List) => {
            let workspace = Workspace::open(cli.workspace)?;
            print_json(&workspace.repository.list_schemas()?)
        }
        Command::Generate(args) => {
            let workspace = Workspace::open(cli.workspace)?;
            run_generate(&workspace, cli.dispatch, args).await
        }
        Command::Run(args) => {
            let workspace = Workspace::open(cli.workspace)?;
            run_dataset(&workspace, cli.dispatch, &args.dataset_id).await
        }
        Command::Datasets(args) => {
            let workspace = Workspace::open(cli.workspace)?;
            print_json(
                &workspace
                    .repository
                    .list_datasets(args.schema_id.as_deref())?,
            )
        }
    }
}

fn run_kinds() -> Result<(), CliError> {
    print_json(&ColumnRegistry::builtin().specs())
}

fn run_validate(file: &Path) -> Result<(), CliError> {
    match check_document(read_document(file)?)? {
        Ok(schema) => {
            print_json(&serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "id": schema.id,
                "columns": schema.columns.len(),
                "errors": [],
            }))
        }
        Err(report) => {
            print_json(&report)?;
            Err(CliError::InvalidSchema(report.len()))
        }
    }
}

fn run_schema_import(workspace: &Workspace, file: &Path) -> Result<(), CliError> {
    let schema = match check_document(read_document(file)?)? {
        Ok(schema) => schema,
        Err(report) => {
            tracing::warn!(
                event = "schema_rejected",
                file = %file.display(),
                issues = report.len()
            );
            print_json(&report)?;
            return Err(CliError::InvalidSchema(report.len()));
        }
    };

    workspace.repository.save_schema(&schema)?;
    tracing::info!(
        event = "schema_imported",
        schema_id = %schema.id,
        columns = schema.columns.len()
    );
    print_json(&schema)
}

async fn run_generate(
    workspace: &Workspace,
    dispatch: Option<DispatchMode>,
    args: GenerateArgs,
) -> Result<(), CliError> {
    RowQuota::from_settings(&workspace.settings).check(args.rows)?;
    // Fail before creating a record that could never run.
    workspace.repository.load_schema(&args.schema_id)?;

    let record = DatasetRecord::new(args.schema_id, args.rows).with_seed(args.seed);
    workspace.repository.save_dataset(&record)?;
    tracing::info!(
        event = "dataset_created",
        dataset_id = %record.id,
        schema_id = %record.schema_id,
        rows = record.num_rows
    );

    run_dataset(workspace, dispatch, &record.id).await
}

async fn run_dataset(
    workspace: &Workspace,
    dispatch: Option<DispatchMode>,
    dataset_id: &str,
) -> Result<(), CliError> {
    let queue = workspace.queue(dispatch);
    tracing::info!(event = "job_submitted", dataset_id, mode = ?queue.mode());

    let outcome = queue.submit(dataset_id).wait().await;
    let record = match outcome {
        Ok(record) => record,
        Err(err) => {
            if let Ok(record) = workspace.repository.load_dataset(dataset_id) {
                print_json(&record)?;
            }
            return Err(err.into());
        }
    };
    print_json(&record)
}

fn read_document(path: &Path) -> Result<Value, CliError> {
    let content = std::fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
