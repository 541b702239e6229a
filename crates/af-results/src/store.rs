//! Result storage API.
//!
//! Layout: `<root>/<result_id>/manifest.json` and `<root>/<result_id>/result.json`.

use crate::hash::is_valid_result_id;
use crate::types::{AeroResult, ResultManifest};
use crate::{ResultsError, ResultsResult};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct ResultStore {
    root_dir: PathBuf,
}

impl ResultStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    fn result_dir(&self, result_id: &str) -> ResultsResult<PathBuf> {
        if !is_valid_result_id(result_id) {
            return Err(ResultsError::InvalidId(result_id.to_string()));
        }
        Ok(self.root_dir.join(result_id))
    }

    pub fn has_result(&self, result_id: &str) -> bool {
        self.result_dir(result_id)
            .map(|dir| dir.join("manifest.json").exists() && dir.join("result.json").exists())
            .unwrap_or(false)
    }

    /// Write both files. An existing record with the same id is replaced.
    pub fn save_result(&self, manifest: &ResultManifest, result: &AeroResult) -> ResultsResult<()> {
        let dir = self.result_dir(&manifest.result_id)?;
        fs::create_dir_all(&dir)?;

        // Record first, manifest last: `has_result` never sees a manifest without data.
        fs::write(dir.join("result.json"), serde_json::to_string(result)?)?;
        fs::write(
            dir.join("manifest.json"),
            serde_json::to_string_pretty(manifest)?,
        )?;
        Ok(())
    }

    pub fn load_manifest(&self, result_id: &str) -> ResultsResult<ResultManifest> {
        let path = self.result_dir(result_id)?.join("manifest.json");
        if !path.exists() {
            return Err(ResultsError::ResultNotFound {
                result_id: result_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_result(&self, result_id: &str) -> ResultsResult<AeroResult> {
        let path = self.result_dir(result_id)?.join("result.json");
        if !path.exists() {
            return Err(ResultsError::ResultNotFound {
                result_id: result_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// All readable manifests, newest first.
    pub fn list_results(&self) -> ResultsResult<Vec<ResultManifest>> {
        let mut manifests = Vec::new();
        if !self.root_dir.exists() {
            return Ok(manifests);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let result_id = entry.file_name().to_string_lossy().to_string();
            if let Ok(manifest) = self.load_manifest(&result_id) {
                manifests.push(manifest);
            }
        }

        manifests.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.result_id.cmp(&b.result_id))
        });
        Ok(manifests)
    }

    pub fn delete_result(&self, result_id: &str) -> ResultsResult<()> {
        let dir = self.result_dir(result_id)?;
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_like_ids() {
        let store = ResultStore::new(std::env::temp_dir().join("af_results_ids")).unwrap();
        assert!(!store.has_result("../../etc"));
        assert!(matches!(
            store.load_manifest("../x"),
            Err(ResultsError::InvalidId(_))
        ));
        assert!(store.delete_result("nope").is_err());
    }

    #[test]
    fn missing_result_is_not_found() {
        let store = ResultStore::new(std::env::temp_dir().join("af_results_missing")).unwrap();
        let id = "0".repeat(64);
        assert!(!store.has_result(&id));
        assert!(matches!(
            store.load_result(&id),
            Err(ResultsError::ResultNotFound { .. })
        ));
    }
}
