//! The package manager facade: an in-memory index over the four cache
//! tiers, rebuilt wholesale by `refresh()`, plus override resolution and
//! the fetch/store/remove entry points.

use std::{cmp::Ordering, collections::BTreeMap, path::PathBuf};

use dub_package::Package;
use dub_recipe::parse_recipe;
use dub_version::{Constraint, Version};

use crate::{
    cache,
    error::{ManagerError, ManagerResult},
    registration::{self, OverrideEntry, OverrideTarget},
    tier::{self, Tier, TierRoots},
};

/// A package known to the manager: either extracted into a cache tier, or
/// locally registered from an arbitrary filesystem path.
#[derive(Debug, Clone)]
pub struct IndexedPackage {
    pub name: String,
    pub version: Version,
    pub path: PathBuf,
    pub tier: Tier,
}

#[derive(Default)]
struct Index {
    by_tier: BTreeMap<Tier, Vec<IndexedPackage>>,
}

pub struct PackageManager {
    roots: TierRoots,
    index: Index,
    overrides: BTreeMap<Tier, Vec<OverrideEntry>>,
}

impl PackageManager {
    pub fn new(project_root: &std::path::Path) -> ManagerResult<Self> {
        let mut manager = PackageManager {
            roots: TierRoots::standard(project_root),
            index: Index::default(),
            overrides: BTreeMap::new(),
        };
        manager.refresh()?;
        Ok(manager)
    }

    pub fn with_roots(roots: TierRoots) -> ManagerResult<Self> {
        let mut manager = PackageManager { roots, index: Index::default(), overrides: BTreeMap::new() };
        manager.refresh()?;
        Ok(manager)
    }

    pub fn roots(&self) -> &TierRoots {
        &self.roots
    }

    /// Rebuilds the in-memory index wholesale from disk. Half-written
    /// package directories (no recipe file yet) are skipped with a warning
    /// rather than failing the whole refresh.
    pub fn refresh(&mut self) -> ManagerResult<()> {
        let mut by_tier = BTreeMap::new();
        let mut overrides = BTreeMap::new();

        for tier in Tier::all() {
            let root = self.roots.root_for(tier);
            let mut packages = Vec::new();

            let packages_root = tier::packages_root(root);
            if packages_root.is_dir() {
                if let Ok(entries) = std::fs::read_dir(&packages_root) {
                    for entry in entries.filter_map(Result::ok) {
                        let container = entry.path();
                        if !container.is_dir() || container.extension().is_some() {
                            continue;
                        }
                        let Some(content_dir) = tier::find_content_dir(&container) else {
                            tracing::warn!(path = %container.display(), "skipping half-written package directory");
                            continue;
                        };
                        match dub_package::load_recipe_text(&content_dir) {
                            Ok((filename, contents)) => {
                                match parse_recipe(&filename, &contents, dub_utils::StrictnessPolicy::Ignore) {
                                    Ok(recipe) => {
                                        let version = recipe
                                            .version
                                            .as_deref()
                                            .and_then(|v| Version::parse(v).ok())
                                            .unwrap_or_else(Version::master);
                                        packages.push(IndexedPackage { name: recipe.name, version, path: content_dir, tier });
                                    }
                                    Err(err) => {
                                        tracing::warn!(path = %content_dir.display(), error = %err, "skipping package with unparsable recipe");
                                    }
                                }
                            }
                            Err(_) => {
                                tracing::warn!(path = %content_dir.display(), "skipping half-written package directory");
                            }
                        }
                    }
                }
            }

            for entry in registration::load_local_packages(root)? {
                if let Ok(version) = Version::parse(&entry.version) {
                    packages.push(IndexedPackage { name: entry.name, version, path: entry.path, tier });
                }
            }

            by_tier.insert(tier, packages);
            overrides.insert(tier, registration::load_overrides(root)?);
        }

        self.index = Index { by_tier };
        self.overrides = overrides;
        Ok(())
    }

    pub fn get_package(&self, name: &str, version: &Version, tier: Option<Tier>) -> Option<&IndexedPackage> {
        let tiers: Vec<Tier> = tier.map(|t| vec![t]).unwrap_or_else(|| Tier::search_order().to_vec());
        for t in tiers {
            if let Some(found) = self.index.by_tier.get(&t).and_then(|pkgs| {
                pkgs.iter().find(|p| p.name == name && p.version.compare(version).is_ok_and(|o| o == Ordering::Equal))
            }) {
                return Some(found);
            }
        }
        None
    }

    /// Every version of `name` known across all tiers, in no particular order.
    pub fn versions(&self, name: &str) -> Vec<Version> {
        self.index
            .by_tier
            .values()
            .flatten()
            .filter(|p| p.name == name)
            .map(|p| p.version.clone())
            .collect()
    }

    fn override_for(&self, name: &str, constraint: &Constraint) -> Option<(&OverrideEntry, Tier)> {
        for tier in Tier::search_order() {
            let Some(entries) = self.overrides.get(&tier) else { continue };
            for entry in entries {
                if entry.package != name {
                    continue;
                }
                let Ok(range) = Constraint::parse(&entry.version_range) else { continue };
                if range.merge(constraint).valid() {
                    return Some((entry, tier));
                }
            }
        }
        None
    }

    /// Highest matching numeric version, else a matching branch, else
    /// `None`. Overrides are consulted first: a matching `versionRange`
    /// replaces the usual answer with either a redirected version or a
    /// path-loaded package.
    pub fn get_best_package(&self, name: &str, constraint: &Constraint) -> ManagerResult<Option<IndexedPackage>> {
        if let Some((entry, tier)) = self.override_for(name, constraint) {
            return match &entry.target {
                OverrideTarget::Version { version } => {
                    let version = Version::parse(version)?;
                    Ok(self.get_package(name, &version, None).cloned())
                }
                OverrideTarget::Path { path } => Ok(Some(IndexedPackage {
                    name: name.to_string(),
                    version: Version::master(),
                    path: path.clone(),
                    tier,
                })),
            };
        }

        let mut candidates: Vec<&IndexedPackage> = Tier::search_order()
            .iter()
            .filter_map(|t| self.index.by_tier.get(t))
            .flatten()
            .filter(|p| p.name == name && constraint.matches(&p.version))
            .collect();

        candidates.sort_by(|a, b| match (a.version.as_semantic(), b.version.as_semantic()) {
            (Some(a), Some(b)) => a.compare(b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        });

        Ok(candidates.into_iter().next_back().cloned())
    }

    /// Extracts a fetched archive into `tier`, journals it, rewrites the
    /// recipe's version, and refreshes the index for that tier.
    pub fn store_fetched_package(
        &mut self,
        tier: Tier,
        name: &str,
        version: &Version,
        zip_path: &std::path::Path,
    ) -> ManagerResult<Package> {
        let root = self.roots.root_for(tier).to_path_buf();
        let outcome = cache::store_fetched_package(&root, name, version, zip_path)?;
        let (filename, contents) = dub_package::load_recipe_text(&outcome.package_root)?;
        let recipe = parse_recipe(&filename, &contents, dub_utils::StrictnessPolicy::Warn)?;
        let package = Package::load(&outcome.package_root, recipe, version.clone())?;
        self.refresh()?;
        Ok(package)
    }

    /// Removes a cached package. Refuses outright for `Tier::Local`.
    pub fn remove(&mut self, name: &str, version: &Version, tier: Tier) -> ManagerResult<()> {
        if tier == Tier::Local {
            return Err(ManagerError::LocalTierRemovalRefused {
                name: name.to_string(),
                tier: self.roots.local.clone(),
            });
        }

        let package = self
            .get_package(name, version, Some(tier))
            .ok_or_else(|| ManagerError::PackageNotFound(name.to_string()))?;
        cache::remove_cached_package(&package.path, name)?;
        self.refresh()
    }

    pub fn register_local(&mut self, tier: Tier, name: &str, version: &Version, path: PathBuf) -> ManagerResult<()> {
        let root = self.roots.root_for(tier).to_path_buf();
        let mut entries = registration::load_local_packages(&root)?;
        entries.retain(|e| e.name != name || e.version != version.to_string());
        entries.push(registration::LocalPackageEntry { name: name.to_string(), version: version.to_string(), path });
        registration::save_local_packages(&root, &entries)?;
        self.refresh()
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::File, io::Write};

    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    use super::*;

    fn roots(dir: &std::path::Path) -> TierRoots {
        TierRoots {
            system: dir.join("system"),
            user: dir.join("user"),
            local: dir.join("local"),
            temporary: dir.join("temporary"),
        }
    }

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
    fn refresh_is_idempotent_on_empty_tiers() {
        let dir = tempdir().unwrap();
        let mut manager = PackageManager::with_roots(roots(dir.path())).unwrap();
        manager.refresh().unwrap();
        assert!(manager.get_best_package("vibe-d", &Constraint::unbounded()).unwrap().is_none());
    }

    #[test]
    fn stores_and_finds_best_package() {
        let dir = tempdir().unwrap();
        let mut manager = PackageManager::with_roots(roots(dir.path())).unwrap();

        let zip_path = make_zip(&[
            ("vibe-d-1.0.0/dub.json", r#"{"name":"vibe-d","version":"0.0.0"}"#),
        ]);
        let version = Version::parse("1.0.0").unwrap();
        manager.store_fetched_package(Tier::User, "vibe-d", &version, &zip_path).unwrap();

        let constraint = Constraint::parse(">=1.0.0").unwrap();
        let best = manager.get_best_package("vibe-d", &constraint).unwrap().unwrap();
        assert_eq!(best.version, version);
    }

    #[test]
    fn remove_refuses_local_tier() {
        let dir = tempdir().unwrap();
        let mut manager = PackageManager::with_roots(roots(dir.path())).unwrap();
        let version = Version::parse("1.0.0").unwrap();
        let err = manager.remove("vibe-d", &version, Tier::Local).unwrap_err();
        assert!(matches!(err, ManagerError::LocalTierRemovalRefused { .. }));
    }

    #[test]
    fn version_override_redirects_best_package() {
        let dir = tempdir().unwrap();
        let tier_roots = roots(dir.path());
        registration::save_overrides(
            &tier_roots.user,
            &[OverrideEntry {
                package: "vibe-d".into(),
                version_range: "*".into(),
                target: OverrideTarget::Version { version: "2.0.0".into() },
            }],
        )
        .unwrap();
        let mut manager = PackageManager::with_roots(tier_roots).unwrap();

        let zip_path = make_zip(&[
            ("vibe-d-2.0.0/dub.json", r#"{"name":"vibe-d","version":"0.0.0"}"#),
        ]);
        manager.store_fetched_package(Tier::User, "vibe-d", &Version::parse("2.0.0").unwrap(), &zip_path).unwrap();

        let constraint = Constraint::parse(">=1.0.0").unwrap();
        let best = manager.get_best_package("vibe-d", &constraint).unwrap().unwrap();
        assert_eq!(best.version, Version::parse("2.0.0").unwrap());
    }
}
