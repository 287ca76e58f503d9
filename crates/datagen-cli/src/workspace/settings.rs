use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::atomic::write_bytes_atomic;
use super::{WorkspacePaths, WorkspaceResult};
use crate::queue::DispatchMode;

/// Contents of `config/settings.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    pub dispatch: DispatchMode,
    /// Largest row count a single request may ask for; unlimited when unset.
    pub max_rows_per_request: Option<u64>,
    pub unlimited_generation: bool,
    pub log_filter: String,
    pub temp_dir: Option<PathBuf>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            dispatch: DispatchMode::Background,
            max_rows_per_request: None,
            unlimited_generation: false,
            log_filter: "info".to_string(),
            temp_dir: None,
        }
    }
}

pub fn load_or_create_settings(paths: &WorkspacePaths) -> WorkspaceResult<WorkspaceSettings> {
    let path = paths.settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        let settings: WorkspaceSettings = toml::from_str(&content)?;
        return Ok(settings);
    }

    let settings = WorkspaceSettings::default();
    save_settings(paths, &settings)?;
    Ok(settings)
}

pub fn save_settings(paths: &WorkspacePaths, settings: &WorkspaceSettings) -> WorkspaceResult<()> {
    let path = paths.settings_path();
    let encoded = toml::to_string_pretty(settings)?;
    write_bytes_atomic(&path, encoded.as_bytes())
}
