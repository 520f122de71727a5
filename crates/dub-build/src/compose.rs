//! Traverses the resolved package set in topological (dependencies-first)
//! order, composing one [`BuildSettings`] by additive concatenation, then
//! applies exclusions and the build-type overlay.

use std::collections::BTreeMap;
use std::path::PathBuf;

use dub_recipe::BuildSettings;

use crate::error::BuildResult;
use crate::overlay;
use crate::substitution::{substitute_all, VariableContext};
use crate::validate::validate_target_types;

/// What the composer needs from the resolved, configuration-selected
/// package set. Built by the caller from a `PackageManager` + `Package` +
/// `dub-confgraph` result; kept abstract here so composition has no direct
/// dependency on how packages were loaded or resolved.
pub trait BuildSource {
    fn root_package_name(&self) -> &str;

    /// Dependencies-first order: every package appears after everything
    /// it depends on, so the root (which depends, transitively, on
    /// everything else) is always last.
    fn topological_order(&self) -> Vec<String>;

    fn package_dir(&self, name: &str) -> PathBuf;

    /// The already within-package-merged (root block + chosen
    /// configuration) build settings for `name`, before substitution.
    fn build_settings_for(&self, name: &str) -> BuildResult<BuildSettings>;
}

/// Platform facts fed into variable substitution and the overlay.
pub struct BuildContext<'a> {
    pub arch: &'a str,
    pub platform: &'a str,
    pub platform_posix: &'a str,
    pub build_type: &'a str,
}

/// Composes the full build across every resolved package.
pub fn compose(source: &dyn BuildSource, ctx: &BuildContext) -> BuildResult<BuildSettings> {
    let order = source.topological_order();
    let package_dirs: BTreeMap<String, PathBuf> =
        order.iter().map(|name| (name.clone(), source.package_dir(name))).collect();
    let root_dir = package_dirs.get(source.root_package_name()).cloned().unwrap_or_default();

    let mut composed = BuildSettings::default();
    let mut per_package_targets = Vec::new();
    let mut dflags_so_far = String::new();
    let mut lflags_so_far = String::new();

    for name in &order {
        let mut settings = source.build_settings_for(name)?;
        let package_dir = package_dirs.get(name).cloned().unwrap_or_default();

        let vars = VariableContext {
            package_dir: &package_dir,
            root_package_dir: &root_dir,
            package_dirs_by_name: &package_dirs,
            arch: ctx.arch,
            platform: ctx.platform,
            platform_posix: ctx.platform_posix,
            build_type: ctx.build_type,
            dflags: &dflags_so_far,
            lflags: &lflags_so_far,
        };

        settings.dflags = substitute_all(&settings.dflags, &vars, false);
        settings.lflags = substitute_all(&settings.lflags, &vars, false);
        settings.libs = substitute_all(&settings.libs, &vars, false);
        settings.import_paths = substitute_all(&settings.import_paths, &vars, true);
        settings.string_import_paths = substitute_all(&settings.string_import_paths, &vars, true);
        settings.versions = substitute_all(&settings.versions, &vars, false);
        settings.source_files = substitute_all(&settings.source_files, &vars, true);
        settings.excluded_source_files = substitute_all(&settings.excluded_source_files, &vars, true);
        settings.copy_files = substitute_all(&settings.copy_files, &vars, true);
        settings.pre_build_commands = substitute_all(&settings.pre_build_commands, &vars, false);
        settings.post_build_commands = substitute_all(&settings.post_build_commands, &vars, false);

        dflags_so_far = settings.dflags.join(" ");
        lflags_so_far = settings.lflags.join(" ");

        per_package_targets.push((name.clone(), settings.target_type));
        composed.merge_additive(&settings);
    }

    composed.apply_exclusions();
    overlay::apply_overlay(&mut composed, ctx.build_type)?;
    validate_target_types(composed.target_type, &per_package_targets)?;

    Ok(composed)
}
