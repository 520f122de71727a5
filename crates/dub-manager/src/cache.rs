//! The store and remove protocols for a single cache tier.
//!
//! Store: lock, extract the longest common prefix of the zip, write a
//! journal of created entries, overwrite the recipe's version, done.
//! Remove: consult the journal so only files installed by dub are deleted.

use std::{
    collections::BTreeSet,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    time::Duration,
};

use dub_utils::{lock::TierLock, FileSystemError, IoOperation, IoResultExt};
use dub_version::Version;

use crate::{
    error::{ManagerError, ManagerResult},
    tier::{content_dir, package_dir, packages_root, sanitize_version},
};

const JOURNAL_FILE: &str = ".dub/journal.json";
const LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// The set of paths (relative to the package root) created during
/// extraction, persisted so `remove()` only deletes what it installed.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct Journal {
    files: BTreeSet<PathBuf>,
    directories: BTreeSet<PathBuf>,
}

fn journal_path(package_root: &Path) -> PathBuf {
    package_root.join(JOURNAL_FILE)
}

fn write_journal(package_root: &Path, journal: &Journal) -> ManagerResult<()> {
    let path = journal_path(package_root);
    dub_utils::fs::ensure_dir_exists(path.parent().unwrap()).map_err(ManagerError::from)?;
    let body = serde_json::to_string_pretty(journal)
        .map_err(|err| ManagerError::MalformedMetadata { path: path.clone(), reason: err.to_string() })?;
    std::fs::write(&path, body).with_path(&path, IoOperation::WriteFile).map_err(ManagerError::from)
}

fn read_journal(package_root: &Path) -> ManagerResult<Journal> {
    let path = journal_path(package_root);
    let contents = std::fs::read_to_string(&path).with_path(&path, IoOperation::ReadFile).map_err(ManagerError::from)?;
    serde_json::from_str(&contents)
        .map_err(|err| ManagerError::MalformedMetadata { path, reason: err.to_string() })
}

/// Finds the longest common path prefix shared by every entry in the
/// archive. Falls back to the prefix containing a recipe file when entries
/// don't share one (e.g. a top-level `dub.json` alongside an unrelated
/// sibling directory).
fn common_prefix(entries: &[String]) -> PathBuf {
    let mut components: Option<Vec<&str>> = None;
    for entry in entries {
        let parts: Vec<&str> = entry.split('/').filter(|p| !p.is_empty()).collect();
        let parts = if parts.last().is_some() { &parts[..parts.len().saturating_sub(1)] } else { &parts[..] };
        components = Some(match components {
            None => parts.to_vec(),
            Some(prev) => prev.into_iter().zip(parts.iter()).take_while(|(a, b)| a == *b).map(|(a, _)| a).collect(),
        });
        if components.as_ref().is_some_and(Vec::is_empty) {
            break;
        }
    }

    let prefix = components.unwrap_or_default();
    if !prefix.is_empty() {
        return PathBuf::from(prefix.join("/"));
    }

    for filename in dub_recipe::RECIPE_FILENAMES {
        if let Some(entry) = entries.iter().find(|e| e.ends_with(filename)) {
            let parts: Vec<&str> = entry.split('/').filter(|p| !p.is_empty()).collect();
            if parts.len() > 1 {
                return PathBuf::from(parts[..parts.len() - 1].join("/"));
            }
        }
    }

    PathBuf::new()
}

/// Result of a successful store: the package's isolated content root
/// (`<container>/<name>`), and whether it was freshly extracted or
/// already present from a concurrent fetch.
pub struct StoreOutcome {
    pub package_root: PathBuf,
    pub already_present: bool,
}

/// Extracts `zip_path` into `<tier_root>/packages/<name>-<ver>/<name>`,
/// following the store protocol: lock, check for a concurrent winner,
/// stage, extract, journal, rewrite the recipe version. The inner
/// `<name>` directory isolates the package's own import root, so a
/// `../` entry in a git-style archive layout can't escape past it.
pub fn store_fetched_package(
    tier_root: &Path,
    name: &str,
    version: &Version,
    zip_path: &Path,
) -> ManagerResult<StoreOutcome> {
    let packages_root = packages_root(tier_root);
    let key = format!("{name}-{}", sanitize_version(version));
    let _lock = TierLock::acquire_with_timeout(&packages_root, &key, LOCK_TIMEOUT)
        .map_err(|source| ManagerError::LockTimeout { name: name.to_string(), source })?;

    let container_root = package_dir(tier_root, name, version);
    let package_root = content_dir(tier_root, name, version);
    if container_root.exists() {
        return Ok(StoreOutcome { package_root, already_present: true });
    }

    let staging_root = packages_root.join(format!("{key}.staging"));
    dub_utils::fs::safe_remove(&staging_root).map_err(ManagerError::from)?;
    let staging_content = staging_root.join(name);
    dub_utils::fs::ensure_dir_exists(&staging_content).map_err(ManagerError::from)?;

    let file = File::open(zip_path)
        .with_path(zip_path, IoOperation::ReadFile)
        .map_err(ManagerError::from)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|err| ManagerError::MalformedArchive(err.to_string()))?;

    let names: Vec<String> = (0..archive.len())
        .filter_map(|i| archive.by_index(i).ok().map(|entry| entry.name().to_string()))
        .collect();
    let prefix = common_prefix(&names);

    let mut journal = Journal::default();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|err| ManagerError::MalformedArchive(err.to_string()))?;
        let raw_name = entry.name().to_string();
        let is_dir = raw_name.ends_with('/');
        let relative = match Path::new(&raw_name).strip_prefix(&prefix) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
            _ => continue,
        };

        let dest = staging_content.join(&relative);
        if !dest.starts_with(&staging_content) {
            return Err(ManagerError::PathOutsideRoot(dest));
        }

        if is_dir {
            dub_utils::fs::ensure_dir_exists(&dest).map_err(ManagerError::from)?;
            journal.directories.insert(relative);
            continue;
        }

        if let Some(parent) = dest.parent() {
            dub_utils::fs::ensure_dir_exists(parent).map_err(ManagerError::from)?;
        }
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf).map_err(|err| ManagerError::ExtractFailed { name: name.to_string(), reason: err.to_string() })?;
        std::fs::write(&dest, &buf).with_path(&dest, IoOperation::WriteFile).map_err(ManagerError::from)?;
        journal.files.insert(relative);
    }

    write_journal(&staging_content, &journal)?;
    rewrite_recipe_version(&staging_content, version)?;

    std::fs::rename(&staging_root, &container_root)
        .map_err(|source| FileSystemError::from((dub_utils::IoContext::new(container_root.clone(), IoOperation::WriteFile), source)))
        .map_err(ManagerError::from)?;

    Ok(StoreOutcome { package_root, already_present: false })
}

fn rewrite_recipe_version(package_root: &Path, version: &Version) -> ManagerResult<()> {
    let (filename, contents) = match dub_package::load_recipe_text(package_root) {
        Ok(found) => found,
        Err(_) => return Ok(()),
    };
    let path = package_root.join(&filename);

    if filename.ends_with(".json") {
        let mut value: serde_json::Value = serde_json::from_str(&contents)
            .map_err(|err| ManagerError::MalformedMetadata { path: path.clone(), reason: err.to_string() })?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("version".to_string(), serde_json::Value::String(version.to_string()));
        }
        let rewritten = serde_json::to_string_pretty(&value)
            .map_err(|err| ManagerError::MalformedMetadata { path: path.clone(), reason: err.to_string() })?;
        std::fs::write(&path, rewritten).with_path(&path, IoOperation::WriteFile).map_err(ManagerError::from)?;
    }
    // SDL recipes keep their declared version; dub packages distributed via
    // a registry are expected to use the JSON dialect for the root recipe.
    Ok(())
}

/// Deletes a cached package. Fails outright for the local tier: project
/// vendored packages are managed by deleting files directly, not through
/// the manager (see `ManagerError::LocalTierRemovalRefused`).
pub fn remove_cached_package(package_root: &Path, name: &str) -> ManagerResult<()> {
    let journal = read_journal(package_root).map_err(|_| ManagerError::CacheCorrupt {
        name: name.to_string(),
        path: package_root.to_path_buf(),
    })?;

    for file in &journal.files {
        dub_utils::fs::safe_remove(package_root.join(file)).map_err(ManagerError::from)?;
    }

    let mut dirs: Vec<&PathBuf> = journal.directories.iter().collect();
    dirs.sort_by_key(|p| std::cmp::Reverse(p.components().count()));
    for dir in dirs {
        let full = package_root.join(dir);
        if full.is_dir() && std::fs::read_dir(&full).map(|mut it| it.next().is_none()).unwrap_or(false) {
            dub_utils::fs::safe_remove(&full).map_err(ManagerError::from)?;
        }
    }

    dub_utils::fs::safe_remove(package_root.join(".dub")).map_err(ManagerError::from)?;

    if std::fs::read_dir(package_root).map(|mut it| it.next().is_none()).unwrap_or(false) {
        dub_utils::fs::safe_remove(package_root).map_err(ManagerError::from)?;

        // `package_root` is the isolated content dir nested inside its
        // `<name>-<ver>` container; once it's gone the container holds
        // nothing else and should go with it.
        if let Some(container) = package_root.parent() {
            if std::fs::read_dir(container).map(|mut it| it.next().is_none()).unwrap_or(false) {
                dub_utils::fs::safe_remove(container).map_err(ManagerError::from)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    use super::*;

    fn make_zip(entries: &[(&str, &str)]) -> PathBuf {
        let dir = tempdir().unwrap();
        let zip_path = dir.keep().join("pkg.zip");
        let file = File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, contents) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        zip_path
    }

    #[test]
    fn finds_longest_common_prefix() {
        let entries = vec![
            "vibe-d-1.0.0/dub.json".to_string(),
            "vibe-d-1.0.0/source/app.d".to_string(),
        ];
        assert_eq!(common_prefix(&entries), PathBuf::from("vibe-d-1.0.0"));
    }

    #[test]
    fn falls_back_to_recipe_containing_prefix_when_no_shared_root() {
        let entries = vec!["a/dub.json".to_string(), "b/unrelated".to_string()];
        assert_eq!(common_prefix(&entries), PathBuf::from("a"));
    }

    #[test]
    fn stores_and_extracts_a_fresh_package() {
        let zip_path = make_zip(&[
            ("vibe-d-1.0.0/dub.json", r#"{"name":"vibe-d","version":"0.0.0"}"#),
            ("vibe-d-1.0.0/source/app.d", "void main() {}"),
        ]);
        let tier_root = tempdir().unwrap();
        let version = Version::parse("1.0.0").unwrap();

        let outcome = store_fetched_package(tier_root.path(), "vibe-d", &version, &zip_path).unwrap();
        assert!(!outcome.already_present);
        assert!(outcome.package_root.join("dub.json").exists());
        assert!(outcome.package_root.join("source/app.d").exists());

        let recipe_text = std::fs::read_to_string(outcome.package_root.join("dub.json")).unwrap();
        assert!(recipe_text.contains("1.0.0"));
    }

    #[test]
    fn concurrent_store_returns_existing_without_re_extracting() {
        let zip_path = make_zip(&[("vibe-d-1.0.0/dub.json", r#"{"name":"vibe-d","version":"0.0.0"}"#)]);
        let tier_root = tempdir().unwrap();
        let version = Version::parse("1.0.0").unwrap();

        let first = store_fetched_package(tier_root.path(), "vibe-d", &version, &zip_path).unwrap();
        assert!(!first.already_present);

        let second = store_fetched_package(tier_root.path(), "vibe-d", &version, &zip_path).unwrap();
        assert!(second.already_present);
        assert_eq!(first.package_root, second.package_root);
    }

    #[test]
    fn remove_deletes_only_journaled_files() {
        let zip_path = make_zip(&[
            ("vibe-d-1.0.0/dub.json", r#"{"name":"vibe-d","version":"0.0.0"}"#),
            ("vibe-d-1.0.0/source/app.d", "void main() {}"),
        ]);
        let tier_root = tempdir().unwrap();
        let version = Version::parse("1.0.0").unwrap();
        let outcome = store_fetched_package(tier_root.path(), "vibe-d", &version, &zip_path).unwrap();

        remove_cached_package(&outcome.package_root, "vibe-d").unwrap();
        assert!(!outcome.package_root.exists());
    }

    #[test]
    fn remove_without_journal_is_cache_corrupt() {
        let dir = tempdir().unwrap();
        let package_root = dir.path().join("vibe-d-1.0.0");
        std::fs::create_dir_all(&package_root).unwrap();
        let err = remove_cached_package(&package_root, "vibe-d").unwrap_err();
        assert!(matches!(err, ManagerError::CacheCorrupt { .. }));
    }
}
