//! The registry supplier interface and its fallback composition.

use dub_recipe::Recipe;
use dub_version::{Constraint, Version};

use crate::error::RegistryResult;

/// A short, search-result-facing summary of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSummary {
    pub name: String,
    pub version: String,
    pub description: String,
}

/// The abstract operations any package registry must provide.
pub trait RegistrySupplier: Send + Sync {
    /// Human-readable identifier, used in diagnostics (e.g. an endpoint URL).
    fn endpoint(&self) -> &str;

    /// Lists known versions of `name`. May return an empty list; never
    /// treated as fatal on its own — callers fall through to the next
    /// supplier.
    fn list_versions(&self, name: &str) -> RegistryResult<Vec<Version>>;

    /// Fetches the recipe for `name` satisfying `constraint`, raising
    /// [`crate::error::RegistryError::NotFound`] if none matches.
    fn fetch_recipe(&self, name: &str, constraint: &Constraint, allow_prerelease: bool) -> RegistryResult<Recipe>;

    /// Fetches the package archive for `name` satisfying `constraint`,
    /// returning the path to the downloaded zip file.
    fn fetch_archive(
        &self,
        name: &str,
        constraint: &Constraint,
        allow_prerelease: bool,
    ) -> RegistryResult<std::path::PathBuf>;

    /// Full-text search over package names/descriptions.
    fn search(&self, query: &str) -> RegistryResult<Vec<PackageSummary>>;
}

/// Composes N suppliers, trying each in order until one succeeds (i.e.
/// returns a non-empty/non-error result). A failing or empty-list supplier
/// is treated as "contributed nothing" rather than fatal.
pub struct FallbackSupplier {
    suppliers: Vec<Box<dyn RegistrySupplier>>,
}

impl FallbackSupplier {
    pub fn new(suppliers: Vec<Box<dyn RegistrySupplier>>) -> Self {
        FallbackSupplier { suppliers }
    }
}

impl RegistrySupplier for FallbackSupplier {
    fn endpoint(&self) -> &str {
        "fallback"
    }

    fn list_versions(&self, name: &str) -> RegistryResult<Vec<Version>> {
        for supplier in &self.suppliers {
            match supplier.list_versions(name) {
                Ok(versions) if !versions.is_empty() => return Ok(versions),
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(endpoint = supplier.endpoint(), error = %err, "supplier failed, trying next");
                    continue;
                }
            }
        }
        Ok(Vec::new())
    }

    fn fetch_recipe(&self, name: &str, constraint: &Constraint, allow_prerelease: bool) -> RegistryResult<Recipe> {
        let mut last_err = None;
        for supplier in &self.suppliers {
            match supplier.fetch_recipe(name, constraint, allow_prerelease) {
                Ok(recipe) => return Ok(recipe),
                Err(err) => {
                    tracing::warn!(endpoint = supplier.endpoint(), error = %err, "supplier failed, trying next");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| crate::error::RegistryError::NotFound(name.to_string())))
    }

    fn fetch_archive(
        &self,
        name: &str,
        constraint: &Constraint,
        allow_prerelease: bool,
    ) -> RegistryResult<std::path::PathBuf> {
        let mut last_err = None;
        for supplier in &self.suppliers {
            match supplier.fetch_archive(name, constraint, allow_prerelease) {
                Ok(path) => return Ok(path),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| crate::error::RegistryError::NotFound(name.to_string())))
    }

    fn search(&self, query: &str) -> RegistryResult<Vec<PackageSummary>> {
        let mut results = Vec::new();
        for supplier in &self.suppliers {
            if let Ok(mut found) = supplier.search(query) {
                results.append(&mut found);
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, sync::atomic::{AtomicU32, Ordering}};

    use super::*;
    use crate::error::RegistryError;

    struct StubSupplier {
        endpoint: String,
        versions: Vec<Version>,
        fail: bool,
        calls: AtomicU32,
    }

    impl RegistrySupplier for StubSupplier {
        fn endpoint(&self) -> &str {
            &self.endpoint
        }

        fn list_versions(&self, _name: &str) -> RegistryResult<Vec<Version>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(RegistryError::SupplierUnavailable {
                    endpoint: self.endpoint.clone(),
                    reason: "stub failure".into(),
                })
            } else {
                Ok(self.versions.clone())
            }
        }

        fn fetch_recipe(&self, name: &str, _constraint: &Constraint, _allow_prerelease: bool) -> RegistryResult<Recipe> {
            if self.fail {
                Err(RegistryError::NotFound(name.to_string()))
            } else {
                Ok(Recipe::empty(name))
            }
        }

        fn fetch_archive(&self, name: &str, _constraint: &Constraint, _allow_prerelease: bool) -> RegistryResult<PathBuf> {
            if self.fail {
                Err(RegistryError::NotFound(name.to_string()))
            } else {
                Ok(PathBuf::from(format!("/tmp/{name}.zip")))
            }
        }

        fn search(&self, _query: &str) -> RegistryResult<Vec<PackageSummary>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn falls_through_empty_suppliers_to_next() {
        let empty = StubSupplier {
            endpoint: "empty".into(),
            versions: Vec::new(),
            fail: false,
            calls: AtomicU32::new(0),
        };
        let populated = StubSupplier {
            endpoint: "populated".into(),
            versions: vec![Version::parse("1.0.0").unwrap()],
            fail: false,
            calls: AtomicU32::new(0),
        };
        let fallback = FallbackSupplier::new(vec![Box::new(empty), Box::new(populated)]);
        let versions = fallback.list_versions("foo").unwrap();
        assert_eq!(versions.len(), 1);
    }

    #[test]
    fn falls_through_failing_supplier() {
        let failing = StubSupplier {
            endpoint: "failing".into(),
            versions: Vec::new(),
            fail: true,
            calls: AtomicU32::new(0),
        };
        let populated = StubSupplier {
            endpoint: "populated".into(),
            versions: vec![Version::parse("2.0.0").unwrap()],
            fail: false,
            calls: AtomicU32::new(0),
        };
        let fallback = FallbackSupplier::new(vec![Box::new(failing), Box::new(populated)]);
        assert_eq!(fallback.list_versions("foo").unwrap().len(), 1);
    }

    #[test]
    fn stops_at_first_successful_supplier() {
        let first = StubSupplier {
            endpoint: "first".into(),
            versions: vec![Version::parse("1.0.0").unwrap()],
            fail: false,
            calls: AtomicU32::new(0),
        };
        let second = StubSupplier {
            endpoint: "second".into(),
            versions: vec![Version::parse("2.0.0").unwrap()],
            fail: false,
            calls: AtomicU32::new(0),
        };
        let fallback = FallbackSupplier::new(vec![Box::new(first), Box::new(second)]);
        let versions = fallback.list_versions("foo").unwrap();
        assert_eq!(versions, vec![Version::parse("1.0.0").unwrap()]);
    }

    #[test]
    fn fetch_recipe_propagates_last_error_when_all_fail() {
        let a = StubSupplier { endpoint: "a".into(), versions: Vec::new(), fail: true, calls: AtomicU32::new(0) };
        let b = StubSupplier { endpoint: "b".into(), versions: Vec::new(), fail: true, calls: AtomicU32::new(0) };
        let fallback = FallbackSupplier::new(vec![Box::new(a), Box::new(b)]);
        let constraint = Constraint::unbounded();
        assert!(fallback.fetch_recipe("foo", &constraint, false).is_err());
    }
}
