//! The `dub.selections.json` pin document: load, save, query, mutate.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use dub_utils::{IoOperation, IoResultExt};
use serde::{Deserialize, Serialize};

use crate::{
    error::{SelectionsError, SelectionsResult},
    pin::Pin,
};

pub const SELECTIONS_FILENAME: &str = "dub.selections.json";
const SUPPORTED_FILE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SelectionsDocument {
    #[serde(rename = "fileVersion")]
    file_version: u32,
    #[serde(default)]
    inheritable: bool,
    #[serde(default)]
    versions: BTreeMap<String, Pin>,
}

/// In-memory pin file, tracking whether it has unsaved mutations.
#[derive(Debug, Clone)]
pub struct Selections {
    path: PathBuf,
    inheritable: bool,
    versions: BTreeMap<String, Pin>,
    dirty: bool,
}

impl Selections {
    /// A fresh, empty selections document at `path` (not yet written).
    pub fn empty(path: PathBuf) -> Self {
        Selections { path, inheritable: false, versions: BTreeMap::new(), dirty: false }
    }

    /// Walks upward from `project_root` looking for a selections file. A
    /// file found directly in `project_root` is always used; one found in
    /// an ancestor directory is used only if its `inheritable` flag is set.
    /// Returns `Ok(None)` if no usable file is found anywhere up the tree.
    pub fn find(project_root: &Path) -> SelectionsResult<Option<Self>> {
        let mut dir = Some(project_root);
        let mut first = true;

        while let Some(current) = dir {
            let candidate = current.join(SELECTIONS_FILENAME);
            if candidate.is_file() {
                let loaded = Self::load(&candidate)?;
                if first || loaded.inheritable {
                    return Ok(Some(loaded));
                }
                tracing::warn!(
                    path = %candidate.display(),
                    "ignoring parent selections file without inheritable: true"
                );
                return Ok(None);
            }
            first = false;
            dir = current.parent();
        }

        Ok(None)
    }

    pub fn load(path: &Path) -> SelectionsResult<Self> {
        let contents = std::fs::read_to_string(path).with_path(path, IoOperation::ReadFile)?;
        let doc: SelectionsDocument = serde_json::from_str(&contents)
            .map_err(|err| SelectionsError::Malformed { path: path.to_path_buf(), reason: err.to_string() })?;

        if doc.file_version != SUPPORTED_FILE_VERSION {
            tracing::warn!(
                path = %path.display(),
                file_version = doc.file_version,
                "unsupported selections file version, loading with no pins"
            );
            return Ok(Selections {
                path: path.to_path_buf(),
                inheritable: doc.inheritable,
                versions: BTreeMap::new(),
                dirty: false,
            });
        }

        Ok(Selections { path: path.to_path_buf(), inheritable: doc.inheritable, versions: doc.versions, dirty: false })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn inheritable(&self) -> bool {
        self.inheritable
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn get(&self, name: &str) -> SelectionsResult<&Pin> {
        self.versions.get(name).ok_or_else(|| SelectionsError::NotSelected(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.versions.contains_key(name)
    }

    /// Pins `name` to `pin`, dirtying the document unless this is a no-op
    /// (the pin is identical to the one already recorded).
    pub fn select(&mut self, name: &str, pin: Pin) {
        if self.versions.get(name) == Some(&pin) {
            return;
        }
        self.versions.insert(name.to_string(), pin);
        self.dirty = true;
    }

    /// Removes `name`'s pin, dirtying the document if it was present.
    pub fn deselect(&mut self, name: &str) {
        if self.versions.remove(name).is_some() {
            self.dirty = true;
        }
    }

    /// Serializes in a stable (sorted) key order and writes atomically via
    /// write-temp-then-rename, clearing the dirty flag.
    pub fn save(&mut self) -> SelectionsResult<()> {
        let doc = SelectionsDocument {
            file_version: SUPPORTED_FILE_VERSION,
            inheritable: self.inheritable,
            versions: self.versions.clone(),
        };
        let body = serde_json::to_string_pretty(&doc)
            .map_err(|err| SelectionsError::Malformed { path: self.path.clone(), reason: err.to_string() })?;

        if let Some(parent) = self.path.parent() {
            dub_utils::fs::ensure_dir_exists(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).with_path(&tmp, IoOperation::WriteFile)?;
        std::fs::rename(&tmp, &self.path)
            .with_path(self.path.clone(), IoOperation::WriteFile)?;

        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn select_dirties_unless_pin_unchanged() {
        let mut selections = Selections::empty(PathBuf::from("dub.selections.json"));
        selections.select("vibe-d", Pin::version("1.0.0"));
        assert!(selections.is_dirty());

        selections.dirty = false;
        selections.select("vibe-d", Pin::version("1.0.0"));
        assert!(!selections.is_dirty());

        selections.select("vibe-d", Pin::version("1.1.0"));
        assert!(selections.is_dirty());
    }

    #[test]
    fn deselect_dirties_only_when_present() {
        let mut selections = Selections::empty(PathBuf::from("dub.selections.json"));
        selections.deselect("missing");
        assert!(!selections.is_dirty());

        selections.select("vibe-d", Pin::version("1.0.0"));
        selections.dirty = false;
        selections.deselect("vibe-d");
        assert!(selections.is_dirty());
        assert!(!selections.contains("vibe-d"));
    }

    #[test]
    fn get_raises_not_selected() {
        let selections = Selections::empty(PathBuf::from("dub.selections.json"));
        assert!(matches!(selections.get("vibe-d"), Err(SelectionsError::NotSelected(_))));
    }

    #[test]
    fn save_then_reload_round_trips_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SELECTIONS_FILENAME);
        let mut selections = Selections::empty(path.clone());
        selections.select("vibe-d", Pin::version("1.0.0"));
        selections.select("dlangui", Pin::path("../dlangui"));
        selections.save().unwrap();
        assert!(!selections.is_dirty());

        let reloaded = Selections::load(&path).unwrap();
        assert_eq!(reloaded.get("vibe-d").unwrap(), &Pin::version("1.0.0"));
        assert_eq!(reloaded.get("dlangui").unwrap(), &Pin::path("../dlangui"));
    }

    #[test]
    fn unsupported_file_version_loads_with_no_pins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SELECTIONS_FILENAME);
        std::fs::write(&path, r#"{"fileVersion":0,"versions":{"vibe-d":"1.0.0"}}"#).unwrap();
        let loaded = Selections::load(&path).unwrap();
        assert!(!loaded.contains("vibe-d"));
    }

    #[test]
    fn find_uses_project_root_file_even_if_not_inheritable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SELECTIONS_FILENAME);
        std::fs::write(&path, r#"{"fileVersion":1,"inheritable":false,"versions":{"vibe-d":"1.0.0"}}"#).unwrap();
        let found = Selections::find(dir.path()).unwrap().unwrap();
        assert!(found.contains("vibe-d"));
    }

    #[test]
    fn find_ignores_non_inheritable_parent_file() {
        let dir = tempdir().unwrap();
        let parent_path = dir.path().join(SELECTIONS_FILENAME);
        std::fs::write(&parent_path, r#"{"fileVersion":1,"inheritable":false,"versions":{"vibe-d":"1.0.0"}}"#).unwrap();

        let nested = dir.path().join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        assert!(Selections::find(&nested).unwrap().is_none());
    }

    #[test]
    fn find_uses_inheritable_parent_file() {
        let dir = tempdir().unwrap();
        let parent_path = dir.path().join(SELECTIONS_FILENAME);
        std::fs::write(&parent_path, r#"{"fileVersion":1,"inheritable":true,"versions":{"vibe-d":"1.0.0"}}"#).unwrap();

        let nested = dir.path().join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        let found = Selections::find(&nested).unwrap().unwrap();
        assert!(found.contains("vibe-d"));
    }
}
