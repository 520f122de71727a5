//! A loaded recipe at a location, plus derived default configurations.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use dub_recipe::{
    BuildPlatform, Configuration, Dependency, Recipe, RecipeResult, TargetType,
};
use dub_version::Version;
use regex::Regex;

use crate::error::{PackageError, PackageResult};

const SOURCE_DIR_CANDIDATES: &[&str] = &["source", "src", "views"];
const MAIN_FILE_CANDIDATES: &[&str] = &["app.d", "main.d"];

fn conventional_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9_-]+$").unwrap())
}

/// A recipe loaded from disk (or synthesized inline for a sub-package),
/// together with its resolved version and ancestry.
#[derive(Debug, Clone)]
pub struct Package {
    pub recipe: Recipe,
    pub root: PathBuf,
    pub parent_name: Option<String>,
    pub resolved_version: Version,
}

impl Package {
    /// Loads a package from its root directory, auto-discovering source
    /// folders and configurations the recipe itself omits.
    pub fn load(root: &Path, mut recipe: Recipe, resolved_version: Version) -> PackageResult<Self> {
        if conventional_name_pattern().find(&recipe.name).map(|m| m.as_str()) != Some(recipe.name.as_str()) {
            tracing::warn!(name = %recipe.name, "package name does not match [a-z0-9_-]+");
        }

        autodiscover_sources(root, &mut recipe);
        autogenerate_configurations(&mut recipe);

        Ok(Package {
            recipe,
            root: root.to_path_buf(),
            parent_name: None,
            resolved_version,
        })
    }

    /// Wraps `self` as a sub-package of `parent_name`; a sub-package's
    /// version always equals its parent's.
    pub fn as_sub_package(mut self, parent_name: &str, parent_version: &Version) -> Self {
        self.parent_name = Some(parent_name.to_string());
        self.resolved_version = parent_version.clone();
        self
    }

    /// `parent:sub`-style qualified name, or the bare name for a base package.
    pub fn qualified_name(&self) -> String {
        match &self.parent_name {
            Some(parent) => format!("{parent}:{}", self.recipe.name),
            None => self.recipe.name.clone(),
        }
    }

    /// The union of dependencies declared in the root block and every
    /// configuration's block. Within one set (the root block, or a single
    /// configuration's block), a later-declared constraint for the same
    /// name replaces the earlier one; across sets the same name may recur
    /// with differing constraints, and each occurrence is kept.
    pub fn all_dependencies(&self) -> Vec<Dependency> {
        let mut result = dedup_last_writer_wins(&self.recipe.dependencies);
        for configuration in &self.recipe.configurations {
            result.extend(dedup_last_writer_wins(&configuration.dependencies));
        }
        result
    }

    /// The merged, platform-filtered build settings of the root block and
    /// the named configuration.
    pub fn build_settings(
        &self,
        platform: &BuildPlatform,
        config: &str,
    ) -> PackageResult<dub_recipe::BuildSettings> {
        let mut settings = self.recipe.root_block.flatten(platform);

        if let Some(configuration) = self.recipe.configuration(config) {
            let config_settings = configuration.block.flatten(platform);
            settings.merge_additive(&config_settings);
        } else {
            return Err(PackageError::UnknownConfiguration(config.to_string()));
        }

        settings.apply_exclusions();
        Ok(settings)
    }

    /// An override for how `dep` should be configured when `self` is built
    /// with `config`, or `None` if no override applies.
    pub fn sub_configuration(&self, config: &str, dep: &str, _platform: &BuildPlatform) -> Option<String> {
        let configuration = self.recipe.configuration(config)?;
        configuration
            .block
            .fields
            .iter()
            .find_map(|(name, _, value)| {
                if name == &format!("subConfiguration:{dep}") {
                    if let dub_recipe::RawFieldValue::Scalar(s) = value {
                        return Some(s.clone());
                    }
                }
                None
            })
    }

    /// A structured, read-only description of this package at a given
    /// platform/configuration, suitable for IDE tooling.
    pub fn describe(&self, platform: &BuildPlatform, config: &str) -> PackageResult<PackageDescription> {
        let settings = self.build_settings(platform, config)?;
        Ok(PackageDescription {
            name: self.qualified_name(),
            version: self.resolved_version.to_string(),
            root: self.root.clone(),
            configuration: config.to_string(),
            target_type: settings.target_type,
            dependencies: self.all_dependencies().iter().map(|d| d.name.clone()).collect(),
            source_files: settings.source_files.clone(),
        })
    }
}

/// Collapses a single declaration set (the root block, or one
/// configuration's block) so a later entry for the same name replaces an
/// earlier one, per "last writer wins within one set".
fn dedup_last_writer_wins(deps: &[Dependency]) -> Vec<Dependency> {
    let mut by_name: Vec<Dependency> = Vec::new();
    for dep in deps {
        if let Some(existing) = by_name.iter_mut().find(|d: &&mut Dependency| d.name == dep.name) {
            *existing = dep.clone();
        } else {
            by_name.push(dep.clone());
        }
    }
    by_name
}

/// A structured, IDE-facing description of a package at a resolved
/// configuration.
#[derive(Debug, Clone)]
pub struct PackageDescription {
    pub name: String,
    pub version: String,
    pub root: PathBuf,
    pub configuration: String,
    pub target_type: TargetType,
    pub dependencies: Vec<String>,
    pub source_files: Vec<String>,
}

fn autodiscover_sources(root: &Path, recipe: &mut Recipe) {
    let has_import_paths = recipe
        .root_block
        .fields
        .iter()
        .any(|(name, _, _)| name == "importPaths");
    if has_import_paths {
        return;
    }

    for candidate in SOURCE_DIR_CANDIDATES {
        if root.join(candidate).is_dir() {
            recipe.root_block.fields.push((
                "importPaths".to_string(),
                dub_recipe::PlatformSuffix::default(),
                dub_recipe::RawFieldValue::List(vec![candidate.to_string()]),
            ));
            return;
        }
    }
}

fn autogenerate_configurations(recipe: &mut Recipe) {
    let declared_target_type = recipe.root_block.fields.iter().find_map(|(name, _, value)| {
        if name == "target_type_unused" {
            None
        } else if name == "targetType" {
            if let dub_recipe::RawFieldValue::Scalar(s) = value {
                Some(s.clone())
            } else {
                None
            }
        } else {
            None
        }
    });

    if !recipe.configurations.is_empty() {
        return;
    }

    let main_file = MAIN_FILE_CANDIDATES.iter().find(|candidate| {
        recipe
            .root_block
            .fields
            .iter()
            .any(|(name, _, value)| {
                name == "sourceFiles"
                    && matches!(value, dub_recipe::RawFieldValue::List(list) if list.iter().any(|f| f.ends_with(**candidate)))
            })
    });

    let is_autodetect = declared_target_type.as_deref().unwrap_or("autodetect") == "autodetect";
    if !is_autodetect {
        return;
    }

    match main_file {
        None => {
            recipe.configurations.push(Configuration {
                name: "library".to_string(),
                platforms: Vec::new(),
                block: dub_recipe::RawBuildBlock::default(),
                dependencies: Vec::new(),
            });
        }
        Some(main_file) => {
            recipe.configurations.push(Configuration {
                name: "application".to_string(),
                platforms: Vec::new(),
                block: dub_recipe::RawBuildBlock {
                    fields: vec![(
                        "targetType".to_string(),
                        dub_recipe::PlatformSuffix::default(),
                        dub_recipe::RawFieldValue::Scalar("executable".to_string()),
                    )],
                },
                dependencies: Vec::new(),
            });
            recipe.configurations.push(Configuration {
                name: "library".to_string(),
                platforms: Vec::new(),
                block: dub_recipe::RawBuildBlock {
                    fields: vec![(
                        "excludedSourceFiles".to_string(),
                        dub_recipe::PlatformSuffix::default(),
                        dub_recipe::RawFieldValue::List(vec![main_file.to_string()]),
                    )],
                },
                dependencies: Vec::new(),
            });
        }
    }
}

/// Attempts to parse a recipe's text from the first recognized filename
/// found under `root`.
pub fn load_recipe_text(root: &Path) -> RecipeResult<(String, String)> {
    for filename in dub_recipe::RECIPE_FILENAMES {
        let path = root.join(filename);
        if let Ok(contents) = std::fs::read_to_string(&path) {
            return Ok((filename.to_string(), contents));
        }
    }
    Err(dub_recipe::RecipeError::MalformedRecipe(format!(
        "no recipe file found in {}",
        root.display()
    )))
}

#[cfg(test)]
mod tests {
    use dub_utils::StrictnessPolicy;
    use tempfile::tempdir;

    use super::*;

    fn platform() -> BuildPlatform {
        BuildPlatform::new(vec!["linux".into()], vec!["x86_64".into()], "dmd")
    }

    #[test]
    fn autodiscovers_conventional_source_dir() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("source")).unwrap();

        let recipe = dub_recipe::parse_json(
            r#"{"name": "mylib", "version": "1.0.0"}"#,
            StrictnessPolicy::Warn,
        )
        .unwrap();

        let package = Package::load(dir.path(), recipe, Version::parse("1.0.0").unwrap()).unwrap();
        assert!(package
            .recipe
            .root_block
            .fields
            .iter()
            .any(|(name, _, _)| name == "importPaths"));
    }

    #[test]
    fn autogenerates_library_config_with_no_main_source() {
        let dir = tempdir().unwrap();
        let recipe = dub_recipe::parse_json(
            r#"{"name": "mylib", "version": "1.0.0"}"#,
            StrictnessPolicy::Warn,
        )
        .unwrap();
        let package = Package::load(dir.path(), recipe, Version::parse("1.0.0").unwrap()).unwrap();
        assert_eq!(package.recipe.configurations.len(), 1);
        assert_eq!(package.recipe.configurations[0].name, "library");
    }

    #[test]
    fn autogenerates_application_and_library_configs_with_main_source() {
        let dir = tempdir().unwrap();
        let recipe = dub_recipe::parse_json(
            r#"{"name": "myapp", "version": "1.0.0", "sourceFiles": ["source/app.d"]}"#,
            StrictnessPolicy::Warn,
        )
        .unwrap();
        let package = Package::load(dir.path(), recipe, Version::parse("1.0.0").unwrap()).unwrap();
        let names: Vec<_> = package.recipe.configurations.iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["application", "library"]);
    }

    #[test]
    fn sub_package_shares_parent_version() {
        let dir = tempdir().unwrap();
        let recipe = dub_recipe::parse_json(r#"{"name": "sub"}"#, StrictnessPolicy::Warn).unwrap();
        let package = Package::load(dir.path(), recipe, Version::parse("0.0.0").unwrap())
            .unwrap()
            .as_sub_package("parent", &Version::parse("2.3.4").unwrap());

        assert_eq!(package.qualified_name(), "parent:sub");
        assert_eq!(package.resolved_version, Version::parse("2.3.4").unwrap());
    }

    #[test]
    fn build_settings_merges_root_and_configuration() {
        let dir = tempdir().unwrap();
        let recipe = dub_recipe::parse_json(
            r#"{
                "name": "myapp",
                "sourceFiles": ["source/app.d", "source/lib.d"],
                "configurations": [
                    { "name": "application", "targetType": "executable" },
                    { "name": "library", "excludedSourceFiles": ["source/app.d"] }
                ]
            }"#,
            StrictnessPolicy::Warn,
        )
        .unwrap();
        let package = Package::load(dir.path(), recipe, Version::parse("1.0.0").unwrap()).unwrap();

        let lib_settings = package.build_settings(&platform(), "library").unwrap();
        assert_eq!(lib_settings.source_files, vec!["source/lib.d".to_string()]);

        assert!(package.build_settings(&platform(), "nonexistent").is_err());
    }

    #[test]
    fn dependency_union_last_writer_wins_within_set() {
        let dir = tempdir().unwrap();
        let recipe = dub_recipe::parse_json(
            r#"{"name": "app", "dependencies": {"foo": ">=1.0.0"}}"#,
            StrictnessPolicy::Warn,
        )
        .unwrap();
        let package = Package::load(dir.path(), recipe, Version::parse("1.0.0").unwrap()).unwrap();
        assert_eq!(package.all_dependencies().len(), 1);
    }

    #[test]
    fn dependency_union_includes_configuration_dependencies() {
        let dir = tempdir().unwrap();
        let recipe = dub_recipe::parse_json(
            r#"{
                "name": "app",
                "dependencies": {"foo": ">=1.0.0"},
                "configurations": [
                    {
                        "name": "application",
                        "targetType": "executable",
                        "dependencies": {"bar": ">=1.0.0"}
                    },
                    {
                        "name": "library",
                        "dependencies": {"foo": ">=2.0.0", "baz": ">=1.0.0"}
                    }
                ]
            }"#,
            StrictnessPolicy::Warn,
        )
        .unwrap();
        let package = Package::load(dir.path(), recipe, Version::parse("1.0.0").unwrap()).unwrap();

        let deps = package.all_dependencies();
        let names: Vec<&str> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["foo", "bar", "foo", "baz"]);

        let foo_constraints: Vec<&Dependency> = deps.iter().filter(|d| d.name == "foo").collect();
        assert!(foo_constraints[0].constraint.matches(&Version::parse("1.0.0").unwrap()));
        assert!(!foo_constraints[1].constraint.matches(&Version::parse("1.0.0").unwrap()));
        assert!(foo_constraints[1].constraint.matches(&Version::parse("2.0.0").unwrap()));
    }
}
