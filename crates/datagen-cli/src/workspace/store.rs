use std::path::Path;

use serde::de::DeserializeOwned;

use datagen_core::SchemaDefinition;
use datagen_generate::{DatasetRecord, DatasetRepository, StoreError};

use super::atomic::write_json_atomic;
use super::{WorkspaceError, WorkspacePaths, WorkspaceResult};

/// Schemas and dataset records kept as JSON files inside the workspace.
#[derive(Debug, Clone)]
pub struct FileRepository {
    paths: WorkspacePaths,
}

impl FileRepository {
    pub fn new(paths: WorkspacePaths) -> Self {
        Self { paths }
    }

    pub fn save_schema(&self, schema: &SchemaDefinition) -> WorkspaceResult<()> {
        check_id(&schema.id)?;
        write_json_atomic(&self.paths.schema_path(&schema.id), schema)
    }

    pub fn list_schemas(&self) -> WorkspaceResult<Vec<SchemaDefinition>> {
        let mut schemas: Vec<SchemaDefinition> = read_all(&self.paths.schemas_dir)?;
        schemas.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(schemas)
    }

    /// Records newest first, optionally limited to one schema.
    pub fn list_datasets(&self, schema_id: Option<&str>) -> WorkspaceResult<Vec<DatasetRecord>> {
        let mut records: Vec<DatasetRecord> = read_all(&self.paths.datasets_dir)?;
        if let Some(schema_id) = schema_id {
            records.retain(|record| record.schema_id == schema_id);
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

impl DatasetRepository for FileRepository {
    fn load_schema(&self, schema_id: &str) -> Result<SchemaDefinition, StoreError> {
        load_json(&self.paths.schema_path(schema_id), "schema", schema_id)
    }

    fn load_dataset(&self, dataset_id: &str) -> Result<DatasetRecord, StoreError> {
        load_json(&self.paths.dataset_path(dataset_id), "dataset", dataset_id)
    }

    fn save_dataset(&self, record: &DatasetRecord) -> Result<(), StoreError> {
        check_id(&record.id).map_err(|err| StoreError::Backend(err.to_string()))?;
        write_json_atomic(&self.paths.dataset_path(&record.id), record).map_err(|err| match err {
            WorkspaceError::Io(err) => StoreError::Io(err),
            WorkspaceError::Json(err) => StoreError::Json(err),
            other => StoreError::Backend(other.to_string()),
        })
    }
}

fn check_id(id: &str) -> WorkspaceResult<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(WorkspaceError::Invalid(format!(
            "identifier '{id}' may only contain ASCII letters, digits, '-' and '_'"
        )))
    }
}

fn load_json<T: DeserializeOwned>(
    path: &Path,
    kind: &'static str,
    id: &str,
) -> Result<T, StoreError> {
    if check_id(id).is_err() || !path.exists() {
        return Err(StoreError::NotFound {
            kind,
            id: id.to_string(),
        });
    }
    let content = std::fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}

fn read_all<T: DeserializeOwned>(dir: &Path) -> WorkspaceResult<Vec<T>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut values = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let is_hidden = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'));
        if !is_json || is_hidden {
            continue;
        }
        let content = std::fs::read(&path)?;
        values.push(serde_json::from_slice(&content)?);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use datagen_core::ColumnDescriptor;
    use datagen_generate::DatasetStatus;

    use super::*;

    fn repository() -> FileRepository {
        let paths = WorkspacePaths::new(
            std::env::temp_dir().join(format!("datagen-store-{}", uuid::Uuid::new_v4())),
        );
        paths.ensure_dirs().expect("dirs");
        FileRepository::new(paths)
    }

    fn schema(id: &str) -> SchemaDefinition {
        SchemaDefinition::new(
            id,
            "Staff",
            "owner-1",
            vec![ColumnDescriptor::new("Name", "name", 0)],
        )
    }

    #[test]
    fn schemas_round_trip_through_files() {
        let repo = repository();
        repo.save_schema(&schema("b")).expect("save b");
        repo.save_schema(&schema("a")).expect("save a");

        assert_eq!(repo.load_schema("a").expect("load"), schema("a"));
        let ids: Vec<_> = repo
            .list_schemas()
            .expect("list")
            .into_iter()
            .map(|schema| schema.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        let _ = std::fs::remove_dir_all(&repo.paths.root);
    }

    #[test]
    fn saving_a_dataset_twice_keeps_one_record() {
        let repo = repository();
        let mut record = DatasetRecord::new("a", 10);
        repo.save_dataset(&record).expect("save");
        record.status = DatasetStatus::Failed;
        repo.save_dataset(&record).expect("save again");

        let listed = repo.list_datasets(None).expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, DatasetStatus::Failed);
        assert!(repo.list_datasets(Some("other")).expect("filter").is_empty());
        let _ = std::fs::remove_dir_all(&repo.paths.root);
    }

    #[test]
    fn unknown_or_unsafe_ids_are_not_found() {
        let repo = repository();
        assert!(matches!(
            repo.load_dataset("missing"),
            Err(StoreError::NotFound { kind: "dataset", .. })
        ));
        assert!(matches!(
            repo.load_schema("../config/settings"),
            Err(StoreError::NotFound { kind: "schema", .. })
        ));
        assert!(repo.save_schema(&schema("../escape")).is_err());
        let _ = std::fs::remove_dir_all(&repo.paths.root);
    }
}
