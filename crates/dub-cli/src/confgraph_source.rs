//! The concrete [`ConfigGraphSource`] wiring loaded [`Package`]s into the
//! abstract configuration-graph discovery/pruning algorithm.

use std::collections::BTreeMap;

use dub_confgraph::ConfigGraphSource;
use dub_package::Package;
use dub_recipe::BuildPlatform;

use crate::platform::configuration_matches;

pub struct PackageConfigGraphSource<'a> {
    pub packages: &'a BTreeMap<String, Package>,
    pub platform: &'a BuildPlatform,
}

impl<'a> ConfigGraphSource for PackageConfigGraphSource<'a> {
    fn default_configuration(&self, package: &str) -> Option<String> {
        self.platform_configurations(package).into_iter().next()
    }

    fn platform_configurations(&self, package: &str) -> Vec<String> {
        let Some(pkg) = self.packages.get(package) else { return Vec::new() };
        pkg.recipe
            .configurations
            .iter()
            .filter(|c| configuration_matches(&c.platforms, self.platform))
            .map(|c| c.name.clone())
            .collect()
    }

    fn dependencies(&self, package: &str, _config: &str) -> Vec<String> {
        let Some(pkg) = self.packages.get(package) else { return Vec::new() };
        pkg.all_dependencies().into_iter().map(|d| base_name(&d.name).to_string()).collect()
    }

    fn sub_configuration(&self, package: &str, config: &str, dep: &str) -> Option<String> {
        let pkg = self.packages.get(package)?;
        pkg.sub_configuration(config, dep, self.platform)
    }
}

fn base_name(qualified: &str) -> &str {
    qualified.split(':').next().unwrap_or(qualified)
}
