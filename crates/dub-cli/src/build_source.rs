//! The concrete [`BuildSource`] wiring loaded [`Package`]s and their chosen
//! configurations into build composition, plus the dependencies-first
//! topological order composition requires.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use dub_build::{BuildResult, BuildSource};
use dub_package::Package;
use dub_recipe::{BuildPlatform, BuildSettings};

pub struct PackageBuildSource<'a> {
    pub root_name: String,
    pub packages: &'a BTreeMap<String, Package>,
    pub configurations: &'a BTreeMap<String, String>,
    pub platform: &'a BuildPlatform,
    pub order: Vec<String>,
}

impl<'a> PackageBuildSource<'a> {
    pub fn new(
        root_name: String,
        packages: &'a BTreeMap<String, Package>,
        configurations: &'a BTreeMap<String, String>,
        platform: &'a BuildPlatform,
    ) -> Self {
        let order = topological_order(&root_name, packages);
        PackageBuildSource { root_name, packages, configurations, platform, order }
    }
}

impl<'a> BuildSource for PackageBuildSource<'a> {
    fn root_package_name(&self) -> &str {
        &self.root_name
    }

    fn topological_order(&self) -> Vec<String> {
        self.order.clone()
    }

    fn package_dir(&self, name: &str) -> PathBuf {
        self.packages.get(name).map(|p| p.root.clone()).unwrap_or_default()
    }

    fn build_settings_for(&self, name: &str) -> BuildResult<BuildSettings> {
        let package = self.packages.get(name).expect("build source asked for an unloaded package");
        let config = self.configurations.get(name).map(String::as_str).unwrap_or("library");
        Ok(package.build_settings(self.platform, config)?)
    }
}

/// Dependencies-first post-order traversal from `root`, so every package
/// appears after everything it (transitively) depends on. Back-edges (a
/// dependency already on the current path, e.g. a cycle through the root)
/// are skipped rather than followed.
fn topological_order(root: &str, packages: &BTreeMap<String, Package>) -> Vec<String> {
    let mut order = Vec::new();
    let mut visited = BTreeSet::new();
    let mut on_path = BTreeSet::new();
    visit(root, packages, &mut visited, &mut on_path, &mut order);
    order
}

fn visit(
    name: &str,
    packages: &BTreeMap<String, Package>,
    visited: &mut BTreeSet<String>,
    on_path: &mut BTreeSet<String>,
    order: &mut Vec<String>,
) {
    if visited.contains(name) || on_path.contains(name) {
        return;
    }
    let Some(package) = packages.get(name) else { return };

    on_path.insert(name.to_string());
    for dep in package.all_dependencies() {
        let dep_name = dep.name.split(':').next().unwrap_or(&dep.name);
        visit(dep_name, packages, visited, on_path, order);
    }
    on_path.remove(name);

    visited.insert(name.to_string());
    order.push(name.to_string());
}
