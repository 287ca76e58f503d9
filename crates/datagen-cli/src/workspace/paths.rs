use std::path::{Path, PathBuf};

use super::{WorkspaceError, WorkspaceResult};

/// Directory layout of a datagen workspace.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub config_dir: PathBuf,
    pub schemas_dir: PathBuf,
    pub datasets_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub tmp_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: PathBuf) -> Self {
        let config_dir = root.join("config");
        let schemas_dir = root.join("schemas");
        let datasets_dir = root.join("datasets");
        let artifacts_dir = root.join("artifacts");
        let tmp_dir = root.join("tmp");
        let logs_dir = root.join("logs");
        Self {
            root,
            config_dir,
            schemas_dir,
            datasets_dir,
            artifacts_dir,
            tmp_dir,
            logs_dir,
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join("settings.toml")
    }

    pub fn cli_log_path(&self) -> PathBuf {
        self.logs_dir.join("cli.log")
    }

    pub fn schema_path(&self, schema_id: &str) -> PathBuf {
        self.schemas_dir.join(format!("{schema_id}.json"))
    }

    pub fn dataset_path(&self, dataset_id: &str) -> PathBuf {
        self.datasets_dir.join(format!("{dataset_id}.json"))
    }

    pub fn ensure_dirs(&self) -> WorkspaceResult<()> {
        create_if_missing(&self.root)?;
        create_if_missing(&self.config_dir)?;
        create_if_missing(&self.schemas_dir)?;
        create_if_missing(&self.datasets_dir)?;
        create_if_missing(&self.artifacts_dir)?;
        create_if_missing(&self.tmp_dir)?;
        create_if_missing(&self.logs_dir)?;
        Ok(())
    }
}

fn create_if_missing(path: &Path) -> WorkspaceResult<()> {
    if path.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(WorkspaceError::from)
}
