//! The data source a resolution session draws candidates and dependency
//! edges from. Kept abstract so the search itself has no I/O or registry
//! dependency; `dub-cli` wires a concrete provider backed by the package
//! manager and registry suppliers.

use std::path::Path;

use dub_recipe::Dependency;
use dub_version::Version;

pub trait DependencyProvider {
    /// Ordered, deduplicated, pre-filtered candidate versions for `name`
    /// (selections pin already applied, pre-releases already ordered per
    /// `candidates::enumerate`, unloadable recipes already excluded).
    fn candidate_versions(&self, name: &str) -> Vec<Version>;

    /// The dependencies declared by `name@version`, or `None` if its
    /// recipe cannot be loaded (the candidate is then skipped).
    fn dependencies(&self, name: &str, version: &Version) -> Option<Vec<Dependency>>;

    /// The dependencies declared by the package rooted at `path`, for a
    /// path-based dependency.
    fn dependencies_at_path(&self, path: &Path) -> Option<Vec<Dependency>>;
}
