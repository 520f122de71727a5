//! Backtracking dependency resolution over the package name/version graph.
//!
//! The search (`resolver`) is decoupled from I/O through `DependencyProvider`
//! so it can be driven by a test double here and by a manager/registry-backed
//! implementation in the CLI layer.

pub mod candidates;
pub mod error;
pub mod provider;
pub mod resolver;

pub use error::{FailedEdge, ResolverError, ResolverResult};
pub use provider::DependencyProvider;
pub use resolver::{resolve, Resolved, ResolveOptions, ResolvedSet};

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::Path;

    use dub_recipe::Dependency;
    use dub_selections::Selections;
    use dub_version::{Constraint, Version};

    use super::*;

    /// A fully in-memory provider: `packages` maps name -> (available
    /// versions, dependency lists per version-string).
    struct StubProvider {
        versions: BTreeMap<String, Vec<Version>>,
        deps: BTreeMap<(String, String), Vec<Dependency>>,
        unloadable: Vec<(String, String)>,
    }

    impl StubProvider {
        fn new() -> Self {
            StubProvider { versions: BTreeMap::new(), deps: BTreeMap::new(), unloadable: Vec::new() }
        }

        fn with_versions(mut self, name: &str, versions: &[&str]) -> Self {
            self.versions.insert(name.to_string(), versions.iter().map(|v| Version::parse(v).unwrap()).collect());
            self
        }

        fn with_deps(mut self, name: &str, version: &str, deps: Vec<Dependency>) -> Self {
            self.deps.insert((name.to_string(), version.to_string()), deps);
            self
        }

        fn with_unloadable(mut self, name: &str, version: &str) -> Self {
            self.unloadable.push((name.to_string(), version.to_string()));
            self
        }
    }

    impl DependencyProvider for StubProvider {
        fn candidate_versions(&self, name: &str) -> Vec<Version> {
            let mut versions = self.versions.get(name).cloned().unwrap_or_default();
            versions.sort_by(|a, b| b.compare(a).unwrap());
            versions
        }

        fn dependencies(&self, name: &str, version: &Version) -> Option<Vec<Dependency>> {
            let key = (name.to_string(), version.to_string());
            if self.unloadable.contains(&key) {
                return None;
            }
            Some(self.deps.get(&key).cloned().unwrap_or_default())
        }

        fn dependencies_at_path(&self, _path: &Path) -> Option<Vec<Dependency>> {
            Some(Vec::new())
        }
    }

    fn dep(name: &str, range: &str) -> Dependency {
        Dependency { name: name.to_string(), constraint: Constraint::parse(range).unwrap() }
    }

    fn empty_selections() -> Selections {
        Selections::empty(std::path::PathBuf::from("/tmp/dub.selections.json"))
    }

    #[test]
    fn resolves_a_simple_linear_chain() {
        let provider = StubProvider::new()
            .with_versions("a", &["1.0.0", "1.1.0"])
            .with_versions("b", &["2.0.0"])
            .with_deps("a", "1.1.0", vec![dep("b", ">=2.0.0")]);

        let root_deps = vec![dep("a", ">=1.0.0")];
        let result =
            resolve(&provider, "root", &root_deps, &empty_selections(), &ResolveOptions::default()).unwrap();

        assert_eq!(result.packages.len(), 2);
        match &result.packages["a"] {
            Resolved::Version(v) => assert_eq!(v.to_string(), "1.1.0"),
            _ => panic!("expected version"),
        }
        match &result.packages["b"] {
            Resolved::Version(v) => assert_eq!(v.to_string(), "2.0.0"),
            _ => panic!("expected version"),
        }
    }

    #[test]
    fn backtracks_when_the_newest_candidate_cannot_satisfy_a_transitive_constraint() {
        // a@2.0.0 depends on b>=3.0.0 (unsatisfiable); a@1.0.0 depends on
        // nothing. The search must back off from 2.0.0 to 1.0.0.
        let provider = StubProvider::new()
            .with_versions("a", &["1.0.0", "2.0.0"])
            .with_versions("b", &["1.0.0"])
            .with_deps("a", "2.0.0", vec![dep("b", ">=3.0.0")])
            .with_deps("a", "1.0.0", vec![]);

        let root_deps = vec![dep("a", ">=1.0.0")];
        let result =
            resolve(&provider, "root", &root_deps, &empty_selections(), &ResolveOptions::default()).unwrap();

        match &result.packages["a"] {
            Resolved::Version(v) => assert_eq!(v.to_string(), "1.0.0"),
            _ => panic!("expected version"),
        }
        assert!(!result.packages.contains_key("b"));
    }

    #[test]
    fn reports_resolution_failed_when_no_candidate_satisfies_the_constraint() {
        let provider = StubProvider::new().with_versions("a", &["1.0.0"]);
        let root_deps = vec![dep("a", ">=2.0.0")];

        let err = resolve(&provider, "root", &root_deps, &empty_selections(), &ResolveOptions::default())
            .unwrap_err();
        match err {
            ResolverError::ResolutionFailed(edges) => {
                assert_eq!(edges.len(), 1);
                assert_eq!(edges[0].package, "a");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn optional_dependency_failure_does_not_abort_resolution() {
        let provider = StubProvider::new().with_versions("a", &["1.0.0"]);
        let mut optional_dep = dep("missing", ">=1.0.0");
        optional_dep.constraint.optional = true;
        optional_dep.constraint.default = false;

        let root_deps = vec![dep("a", ">=1.0.0"), optional_dep];
        let result =
            resolve(&provider, "root", &root_deps, &empty_selections(), &ResolveOptions::default()).unwrap();
        assert!(result.packages.contains_key("a"));
        assert!(!result.packages.contains_key("missing"));
    }

    #[test]
    fn skips_candidates_whose_recipe_cannot_be_loaded() {
        let provider = StubProvider::new()
            .with_versions("a", &["1.0.0", "1.1.0"])
            .with_unloadable("a", "1.1.0")
            .with_deps("a", "1.0.0", vec![]);

        let root_deps = vec![dep("a", ">=1.0.0")];
        let result =
            resolve(&provider, "root", &root_deps, &empty_selections(), &ResolveOptions::default()).unwrap();
        match &result.packages["a"] {
            Resolved::Version(v) => assert_eq!(v.to_string(), "1.0.0"),
            _ => panic!("expected version"),
        }
    }

    #[test]
    fn cycle_through_the_root_is_recorded_but_not_recursed() {
        let provider = StubProvider::new()
            .with_versions("a", &["1.0.0"])
            .with_deps("a", "1.0.0", vec![dep("root", ">=1.0.0")]);

        let root_deps = vec![dep("a", ">=1.0.0")];
        let result =
            resolve(&provider, "root", &root_deps, &empty_selections(), &ResolveOptions::default()).unwrap();
        assert!(result.packages.contains_key("a"));
        assert!(!result.packages.contains_key("root"));
    }
}
