//! The orchestrator: loads the root package, drives resolution through the
//! selections pin file, builds the configuration graph across the
//! resolved set, and composes the final build plan.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dub_build::BuildContext;
use dub_manager::{PackageManager, Tier};
use dub_package::Package;
use dub_registry::RegistrySupplier;
use dub_recipe::{parse_recipe, BuildSettings};
use dub_registry::FallbackSupplier;
use dub_resolver::{Resolved, ResolveOptions, ResolvedSet};
use dub_selections::{Pin, Selections, SELECTIONS_FILENAME};
use dub_version::{Constraint, Version};

use crate::build_source::PackageBuildSource;
use crate::config::Config;
use crate::confgraph_source::PackageConfigGraphSource;
use crate::error::{CliError, CliResult};
use crate::platform::build_platform;
use crate::provider::ManagerRegistryProvider;
use crate::sink::{DiagnosticEvent, Sink};

pub struct Project {
    pub root: Package,
    pub root_dir: PathBuf,
    pub manager: PackageManager,
    pub registry: FallbackSupplier,
    pub selections: Selections,
    pub config: Config,
}

impl Project {
    pub fn load(root_dir: &Path, config: Config) -> CliResult<Self> {
        let (filename, contents) =
            dub_package::load_recipe_text(root_dir).map_err(|_| CliError::NoRecipe(root_dir.to_path_buf()))?;
        let recipe = parse_recipe(&filename, &contents, config.strictness_policy())?;
        let root = Package::load(root_dir, recipe, Version::master())?;

        let manager = PackageManager::new(root_dir)?;
        let registry = config.build_registry()?;

        let selections = Selections::find(root_dir)?.unwrap_or_else(|| Selections::empty(root_dir.join(SELECTIONS_FILENAME)));

        Ok(Project { root, root_dir: root_dir.to_path_buf(), manager, registry, selections, config })
    }

    /// Resolves every transitive dependency of the root package, writing
    /// the accepted versions back into the selections pin file.
    pub fn resolve(&mut self, upgrade: bool, allow_prerelease: bool, sink: &dyn Sink) -> CliResult<ResolvedSet> {
        let options = ResolveOptions { upgrade, allow_prerelease };
        let provider = ManagerRegistryProvider {
            manager: &self.manager,
            registry: &self.registry,
            selections: &self.selections,
            upgrade,
            allow_prerelease,
        };

        for dep in self.root.all_dependencies() {
            sink.emit(DiagnosticEvent::ResolvingPackage { name: dep.name.clone() });
        }

        let resolved = dub_resolver::resolve(&provider, &self.root.recipe.name, &self.root.all_dependencies(), &self.selections, &options)?;
        self.persist_selections(&resolved)?;
        Ok(resolved)
    }

    /// Resolves without writing anything back to the selections file,
    /// for callers (`upgrade --print-upgrades-only`) that only want to
    /// report what would change.
    pub fn resolve_without_persisting(&self, upgrade: bool, allow_prerelease: bool, sink: &dyn Sink) -> CliResult<ResolvedSet> {
        let options = ResolveOptions { upgrade, allow_prerelease };
        let provider = ManagerRegistryProvider {
            manager: &self.manager,
            registry: &self.registry,
            selections: &self.selections,
            upgrade,
            allow_prerelease,
        };

        for dep in self.root.all_dependencies() {
            sink.emit(DiagnosticEvent::ResolvingPackage { name: dep.name.clone() });
        }

        Ok(dub_resolver::resolve(&provider, &self.root.recipe.name, &self.root.all_dependencies(), &self.selections, &options)?)
    }

    /// Writes the resolved set's pins into the selections document, saving
    /// it to disk if anything actually changed.
    pub fn persist_selections(&mut self, resolved: &ResolvedSet) -> CliResult<()> {
        for (name, pin) in &resolved.packages {
            let selection = match pin {
                Resolved::Version(version) => Pin::version(version.to_string()),
                Resolved::Path(path) => Pin::path(path.to_string_lossy().into_owned()),
            };
            self.selections.select(name, selection);
        }
        if self.selections.is_dirty() {
            self.selections.save()?;
        }
        Ok(())
    }

    /// Ensures every resolved package is present in the cache (fetching it
    /// if necessary) and loads it, keyed by its base name plus the root
    /// package itself.
    pub fn load_all_packages(&mut self, resolved: &ResolvedSet, allow_prerelease: bool, sink: &dyn Sink) -> CliResult<BTreeMap<String, Package>> {
        let mut packages = BTreeMap::new();
        packages.insert(self.root.recipe.name.clone(), self.root.clone());

        for (name, pin) in &resolved.packages {
            let base = name.split(':').next().unwrap_or(name).to_string();
            if packages.contains_key(&base) {
                continue;
            }
            let package = match pin {
                Resolved::Version(version) => self.fetch_or_load(&base, version, allow_prerelease, sink)?,
                Resolved::Path(path) => {
                    let (filename, contents) = dub_package::load_recipe_text(path)?;
                    let recipe = parse_recipe(&filename, &contents, self.config.strictness_policy())?;
                    Package::load(path, recipe, Version::master())?
                }
            };
            packages.insert(base, package);
        }

        Ok(packages)
    }

    fn fetch_or_load(&mut self, name: &str, version: &Version, allow_prerelease: bool, sink: &dyn Sink) -> CliResult<Package> {
        if let Some(indexed) = self.manager.get_package(name, version, None) {
            let (filename, contents) = dub_package::load_recipe_text(&indexed.path)?;
            let recipe = parse_recipe(&filename, &contents, self.config.strictness_policy())?;
            return Ok(Package::load(&indexed.path, recipe, version.clone())?);
        }

        sink.emit(DiagnosticEvent::FetchStarted { name: name.to_string(), version: version.clone() });
        let constraint = match version.as_branch() {
            Some(branch) => Constraint::branch(branch),
            None => Constraint::exact(version.clone()),
        };
        let zip_path = self.registry.fetch_archive(name, &constraint, allow_prerelease)?;
        let package = self.manager.store_fetched_package(Tier::User, name, version, &zip_path)?;
        sink.emit(DiagnosticEvent::FetchCompleted { name: name.to_string(), version: version.clone() });
        Ok(package)
    }

    pub fn build_config_graph(&self, packages: &BTreeMap<String, Package>, sink: &dyn Sink) -> CliResult<BTreeMap<String, String>> {
        let platform = build_platform(&self.config);
        let source = PackageConfigGraphSource { packages, platform: &platform };
        let configs = dub_confgraph::build(&source, &self.root.recipe.name)?;
        sink.emit(DiagnosticEvent::ConfigGraphPruned { package_count: configs.len() });
        Ok(configs)
    }

    pub fn compose_build(
        &self,
        packages: &BTreeMap<String, Package>,
        configurations: &BTreeMap<String, String>,
        build_type: &str,
        sink: &dyn Sink,
    ) -> CliResult<BuildSettings> {
        let platform = build_platform(&self.config);
        let source = PackageBuildSource::new(self.root.recipe.name.clone(), packages, configurations, &platform);
        let ctx = BuildContext {
            arch: self.config.default_architectures.first().map(String::as_str).unwrap_or("x86_64"),
            platform: self.config.default_platforms.first().map(String::as_str).unwrap_or("linux"),
            platform_posix: if self.config.default_platforms.iter().any(|p| p == "posix") { "posix" } else { "" },
            build_type,
        };
        let settings = dub_build::compose(&source, &ctx)?;
        sink.emit(DiagnosticEvent::BuildComposed { source_file_count: settings.source_files.len() });
        Ok(settings)
    }
}
