//! The concrete [`DependencyProvider`] wiring the package manager's cache
//! index and the registry fallback chain into the abstract resolver.

use std::path::Path;

use dub_manager::PackageManager;
use dub_recipe::{parse_recipe, Dependency};
use dub_registry::supplier::RegistrySupplier;
use dub_resolver::{candidates, DependencyProvider};
use dub_selections::{Pin, Selections};
use dub_utils::StrictnessPolicy;
use dub_version::{Constraint, Version};

pub struct ManagerRegistryProvider<'a> {
    pub manager: &'a PackageManager,
    pub registry: &'a dyn RegistrySupplier,
    pub selections: &'a Selections,
    pub upgrade: bool,
    pub allow_prerelease: bool,
}

impl<'a> ManagerRegistryProvider<'a> {
    fn pinned_version(&self, name: &str) -> Option<Version> {
        match self.selections.get(name).ok()? {
            Pin::Version(v) => Version::parse(v).ok(),
            Pin::Path { .. } | Pin::Repository { .. } => None,
        }
    }

    fn exact_constraint(version: &Version) -> Constraint {
        match version.as_branch() {
            Some(branch) => Constraint::branch(branch),
            None => Constraint::exact(version.clone()),
        }
    }

    /// Loads the dependency list declared by `name@version`'s recipe,
    /// preferring an already-cached copy over a fresh registry fetch.
    fn load_dependencies(&self, name: &str, version: &Version) -> Option<Vec<Dependency>> {
        if let Some(indexed) = self.manager.get_package(name, version, None) {
            let (filename, contents) = dub_package::load_recipe_text(&indexed.path).ok()?;
            let recipe = parse_recipe(&filename, &contents, StrictnessPolicy::Warn).ok()?;
            let package = dub_package::Package::load(&indexed.path, recipe, version.clone()).ok()?;
            return Some(package.all_dependencies());
        }

        let constraint = Self::exact_constraint(version);
        let recipe = self.registry.fetch_recipe(name, &constraint, self.allow_prerelease).ok()?;
        let package = dub_package::Package::load(Path::new(""), recipe, version.clone()).ok()?;
        Some(package.all_dependencies())
    }
}

impl<'a> DependencyProvider for ManagerRegistryProvider<'a> {
    fn candidate_versions(&self, name: &str) -> Vec<Version> {
        let pinned = self.pinned_version(name);
        let local_versions = self.manager.versions(name);
        let registry_versions = self.registry.list_versions(name).unwrap_or_default();
        candidates::enumerate(pinned.as_ref(), self.upgrade, &local_versions, &registry_versions, self.allow_prerelease)
    }

    fn dependencies(&self, name: &str, version: &Version) -> Option<Vec<Dependency>> {
        self.load_dependencies(name, version)
    }

    fn dependencies_at_path(&self, path: &Path) -> Option<Vec<Dependency>> {
        let (filename, contents) = dub_package::load_recipe_text(path).ok()?;
        let recipe = parse_recipe(&filename, &contents, StrictnessPolicy::Warn).ok()?;
        let package = dub_package::Package::load(path, recipe, Version::master()).ok()?;
        Some(package.all_dependencies())
    }
}
