//! `local-packages.json` and `overrides.json`: the per-tier JSON side
//! tables that the in-memory index is refreshed from.

use std::path::{Path, PathBuf};

use dub_utils::{FileSystemError, IoContext, IoOperation, IoResultExt};

use crate::error::{ManagerError, ManagerResult};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct LocalPackageEntry {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OverrideTarget {
    Version { version: String },
    Path { path: PathBuf },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct OverrideEntry {
    pub package: String,
    pub version_range: String,
    pub target: OverrideTarget,
}

fn read_json_array<T: serde::de::DeserializeOwned>(path: &Path) -> ManagerResult<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(path)
        .with_path(path, IoOperation::ReadFile)
        .map_err(ManagerError::from)?;
    serde_json::from_str(&contents)
        .map_err(|err| ManagerError::MalformedMetadata { path: path.to_path_buf(), reason: err.to_string() })
}

fn write_json_array<T: serde::Serialize>(path: &Path, entries: &[T]) -> ManagerResult<()> {
    if let Some(parent) = path.parent() {
        dub_utils::fs::ensure_dir_exists(parent).map_err(ManagerError::from)?;
    }
    let body = serde_json::to_string_pretty(entries)
        .map_err(|err| ManagerError::MalformedMetadata { path: path.to_path_buf(), reason: err.to_string() })?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, body).with_path(&tmp, IoOperation::WriteFile).map_err(ManagerError::from)?;
    std::fs::rename(&tmp, path)
        .map_err(|source| FileSystemError::from((IoContext::new(path.to_path_buf(), IoOperation::WriteFile), source)))
        .map_err(ManagerError::from)
}

pub fn load_local_packages(root: &Path) -> ManagerResult<Vec<LocalPackageEntry>> {
    read_json_array(&crate::tier::local_packages_file(root))
}

pub fn save_local_packages(root: &Path, entries: &[LocalPackageEntry]) -> ManagerResult<()> {
    write_json_array(&crate::tier::local_packages_file(root), entries)
}

pub fn load_overrides(root: &Path) -> ManagerResult<Vec<OverrideEntry>> {
    read_json_array(&crate::tier::overrides_file(root))
}

pub fn save_overrides(root: &Path, entries: &[OverrideEntry]) -> ManagerResult<()> {
    write_json_array(&crate::tier::overrides_file(root), entries)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn round_trips_local_packages() {
        let dir = tempdir().unwrap();
        let entries = vec![LocalPackageEntry {
            name: "vibe-d".into(),
            version: "1.0.0".into(),
            path: PathBuf::from("/srv/vibe-d"),
        }];
        save_local_packages(dir.path(), &entries).unwrap();
        let loaded = load_local_packages(dir.path()).unwrap();
        assert_eq!(loaded, entries);
    }

    #[test]
    fn missing_files_load_as_empty() {
        let dir = tempdir().unwrap();
        assert!(load_local_packages(dir.path()).unwrap().is_empty());
        assert!(load_overrides(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn round_trips_version_and_path_overrides() {
        let dir = tempdir().unwrap();
        let entries = vec![
            OverrideEntry {
                package: "vibe-d".into(),
                version_range: ">=1.0.0 <=2.0.0".into(),
                target: OverrideTarget::Version { version: "1.5.0".into() },
            },
            OverrideEntry {
                package: "dlangui".into(),
                version_range: "*".into(),
                target: OverrideTarget::Path { path: PathBuf::from("/work/dlangui") },
            },
        ];
        save_overrides(dir.path(), &entries).unwrap();
        let loaded = load_overrides(dir.path()).unwrap();
        assert_eq!(loaded, entries);
    }
}
