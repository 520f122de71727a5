//! The surface-agnostic in-memory recipe model.

use std::collections::BTreeMap;

use dub_version::Constraint;
use serde::{Deserialize, Serialize};

use crate::platform::{BuildPlatform, PlatformSuffix};

/// How a package's target is classified for build purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetType {
    #[default]
    Autodetect,
    Executable,
    Library,
    SourceLibrary,
    DynamicLibrary,
    StaticLibrary,
    None,
}

/// A single flattened list of build-setting values, already merged across
/// every platform suffix that matched the requested [`BuildPlatform`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSettings {
    pub dflags: Vec<String>,
    pub lflags: Vec<String>,
    pub libs: Vec<String>,
    pub import_paths: Vec<String>,
    pub string_import_paths: Vec<String>,
    pub versions: Vec<String>,
    pub source_files: Vec<String>,
    pub excluded_source_files: Vec<String>,
    pub copy_files: Vec<String>,
    pub pre_build_commands: Vec<String>,
    pub post_build_commands: Vec<String>,
    pub environments: BTreeMap<String, String>,
    pub main_source_file: Option<String>,
    pub target_type: TargetType,
    pub no_default_flags: bool,
}

impl BuildSettings {
    /// Additively merges `other`'s list fields onto `self`; scalar fields
    /// (target type, main source, no-default-flags) are overwritten by any
    /// non-default value in `other`, matching "last writer wins" composition
    /// across root block then named configuration.
    pub fn merge_additive(&mut self, other: &BuildSettings) {
        self.dflags.extend(other.dflags.iter().cloned());
        self.lflags.extend(other.lflags.iter().cloned());
        self.libs.extend(other.libs.iter().cloned());
        self.import_paths.extend(other.import_paths.iter().cloned());
        self.string_import_paths
            .extend(other.string_import_paths.iter().cloned());
        self.versions.extend(other.versions.iter().cloned());
        self.source_files.extend(other.source_files.iter().cloned());
        self.excluded_source_files
            .extend(other.excluded_source_files.iter().cloned());
        self.copy_files.extend(other.copy_files.iter().cloned());
        self.pre_build_commands
            .extend(other.pre_build_commands.iter().cloned());
        self.post_build_commands
            .extend(other.post_build_commands.iter().cloned());
        self.environments
            .extend(other.environments.iter().map(|(k, v)| (k.clone(), v.clone())));

        if other.main_source_file.is_some() {
            self.main_source_file = other.main_source_file.clone();
        }
        if other.target_type != TargetType::Autodetect {
            self.target_type = other.target_type;
        }
        self.no_default_flags = self.no_default_flags || other.no_default_flags;
    }

    /// Drops every path in `excluded_source_files` from `source_files`.
    pub fn apply_exclusions(&mut self) {
        let excluded = self.excluded_source_files.clone();
        self.source_files.retain(|f| !excluded.contains(f));
    }
}

/// Raw, unmerged build-setting fields keyed by their platform suffix, as
/// they appear literally in a recipe block (root or configuration).
#[derive(Debug, Clone, Default)]
pub struct RawBuildBlock {
    pub fields: Vec<(String, PlatformSuffix, RawFieldValue)>,
}

#[derive(Debug, Clone)]
pub enum RawFieldValue {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
    Scalar(String),
    Bool(bool),
}

impl RawBuildBlock {
    /// Flattens this block into [`BuildSettings`] for the given platform,
    /// merging every matching suffix additively in declaration order.
    pub fn flatten(&self, platform: &BuildPlatform) -> BuildSettings {
        let mut settings = BuildSettings::default();

        for (name, suffix, value) in &self.fields {
            if !suffix.matches(platform) {
                continue;
            }
            apply_field(&mut settings, name, value);
        }

        settings
    }
}

fn apply_field(settings: &mut BuildSettings, name: &str, value: &RawFieldValue) {
    macro_rules! extend_list {
        ($field:ident) => {
            if let RawFieldValue::List(items) = value {
                settings.$field.extend(items.iter().cloned());
            }
        };
    }

    match name {
        "dflags" => extend_list!(dflags),
        "lflags" => extend_list!(lflags),
        "libs" => extend_list!(libs),
        "importPaths" => extend_list!(import_paths),
        "stringImportPaths" => extend_list!(string_import_paths),
        "versions" => extend_list!(versions),
        "sourceFiles" => extend_list!(source_files),
        "excludedSourceFiles" => extend_list!(excluded_source_files),
        "copyFiles" => extend_list!(copy_files),
        "preBuildCommands" => extend_list!(pre_build_commands),
        "postBuildCommands" => extend_list!(post_build_commands),
        "environments" => {
            if let RawFieldValue::Map(map) = value {
                settings
                    .environments
                    .extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        "mainSourceFile" => {
            if let RawFieldValue::Scalar(s) = value {
                settings.main_source_file = Some(s.clone());
            }
        }
        "targetType" => {
            if let RawFieldValue::Scalar(s) = value {
                settings.target_type = parse_target_type(s);
            }
        }
        "noDefaultFlags" => {
            if let RawFieldValue::Bool(b) = value {
                settings.no_default_flags = *b;
            }
        }
        _ => {}
    }
}

fn parse_target_type(s: &str) -> TargetType {
    match s {
        "executable" => TargetType::Executable,
        "library" => TargetType::Library,
        "sourceLibrary" => TargetType::SourceLibrary,
        "dynamicLibrary" => TargetType::DynamicLibrary,
        "staticLibrary" => TargetType::StaticLibrary,
        "none" => TargetType::None,
        _ => TargetType::Autodetect,
    }
}

/// One named, platform-filtered build-setting profile.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub name: String,
    pub platforms: Vec<String>,
    pub block: RawBuildBlock,
    pub dependencies: Vec<Dependency>,
}

/// A dependency entry: a name plus its constraint (which itself carries
/// the optional path/repository/sub-configuration attributes).
#[derive(Debug, Clone)]
pub struct Dependency {
    pub name: String,
    pub constraint: Constraint,
}

/// A sub-package, declared either inline (its own recipe, same file) or by
/// a relative path to a nested recipe.
#[derive(Debug, Clone)]
pub enum SubPackageDescriptor {
    Inline(Box<Recipe>),
    Path(String),
}

/// The surface-agnostic in-memory form of a package recipe.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub authors: Vec<String>,
    pub license: Option<String>,
    pub dependencies: Vec<Dependency>,
    pub root_block: RawBuildBlock,
    pub configurations: Vec<Configuration>,
    pub sub_packages: Vec<SubPackageDescriptor>,
    pub tool_chain_requirements: BTreeMap<String, String>,
}

impl Recipe {
    pub fn empty(name: impl Into<String>) -> Self {
        Recipe {
            name: name.into(),
            version: None,
            description: None,
            authors: Vec::new(),
            license: None,
            dependencies: Vec::new(),
            root_block: RawBuildBlock::default(),
            configurations: Vec::new(),
            sub_packages: Vec::new(),
            tool_chain_requirements: BTreeMap::new(),
        }
    }

    pub fn configuration(&self, name: &str) -> Option<&Configuration> {
        self.configurations.iter().find(|c| c.name == name)
    }
}
