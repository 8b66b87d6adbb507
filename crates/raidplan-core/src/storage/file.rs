//! File-based plan store.

use super::{BoxFuture, PlanStore, StorageError, StorageResult};
use crate::plan::Plan;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each plan as a JSON file named after its key.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a file store rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// File store in the platform data directory (`<data_local_dir>/raidplan/plans`).
    pub fn default_location() -> StorageResult<Self> {
        Self::new(Self::default_path()?)
    }

    pub fn default_path() -> StorageResult<PathBuf> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Ok(base.join("raidplan").join("plans"))
    }

    fn plan_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_key))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl PlanStore for FileStorage {
    fn save(&self, key: &str, plan: &Plan) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.plan_path(key);
        let json = plan.to_json_pretty();
        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            // Write to a sibling file first so readers never see a partial plan.
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, json).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", tmp.display(), e))
            })?;
            fs::rename(&tmp, &path).map_err(|e| {
                StorageError::Io(format!("Failed to replace {}: {}", path.display(), e))
            })
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Plan>> {
        let path = self.plan_path(key);
        let key = key.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(key));
            }
            let json = fs::read_to_string(&path).map_err(|e| {
                StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;
            Plan::from_json(&json).map_err(|e| {
                StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
            })
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.plan_path(key);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }
            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut keys = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|e| e == "json") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        keys.push(stem.to_string());
                    }
                }
            }
            Ok(keys)
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.plan_path(key);
        Box::pin(async move { Ok(path.exists()) })
    }
}
