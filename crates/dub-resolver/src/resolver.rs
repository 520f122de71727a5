//! The backtracking search itself: depth-first, root-to-leaf, with
//! chronological backtracking on conflict.
//!
//! Each package name passes through `Unseen -> Candidates-fetched ->
//! Trying(candidate) -> Accepted(candidate) | Exhausted`. The "session-level
//! conflict-encountered flag" from the design is realized directly as a
//! `bool` return value bubbling out of `resolve_one`: a `false` return means
//! the caller should discard its tentative assignment and advance to its
//! next candidate, which is exactly chronological backtracking to the most
//! recent choice point with candidates remaining.

use std::collections::BTreeMap;
use std::path::PathBuf;

use dub_recipe::Dependency;
use dub_selections::Selections;
use dub_version::{Constraint, Version};

use crate::error::{FailedEdge, ResolverError, ResolverResult};
use crate::provider::DependencyProvider;

#[derive(Debug, Clone)]
pub enum Resolved {
    Version(Version),
    Path(PathBuf),
}

/// Tuning knobs for one resolution session.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Ignore selections pins and re-search every candidate.
    pub upgrade: bool,
    /// Allow pre-release candidates to be tried ahead of the stable tail.
    pub allow_prerelease: bool,
}

/// The outcome of a successful resolution: one chosen version or path per
/// package name reached from the root (root itself excluded).
#[derive(Debug, Clone, Default)]
pub struct ResolvedSet {
    pub packages: BTreeMap<String, Resolved>,
}

struct Session<'a> {
    provider: &'a dyn DependencyProvider,
    selections: &'a Selections,
    options: &'a ResolveOptions,
    root_name: &'a str,
    resolved: BTreeMap<String, Resolved>,
    failures: Vec<FailedEdge>,
}

/// Resolves the dependency closure of a root package whose own direct
/// dependencies are already known (the caller has already loaded the root
/// recipe; only its transitive dependencies are searched here).
pub fn resolve(
    provider: &dyn DependencyProvider,
    root_name: &str,
    root_dependencies: &[Dependency],
    selections: &Selections,
    options: &ResolveOptions,
) -> ResolverResult<ResolvedSet> {
    let mut session = Session {
        provider,
        selections,
        options,
        root_name,
        resolved: BTreeMap::new(),
        failures: Vec::new(),
    };

    for dep in root_dependencies {
        let mut path = vec![root_name.to_string()];
        let ok = session.resolve_dependency(dep, &mut path);
        if !ok && is_effectively_required(dep, selections) {
            session.failures.push(FailedEdge {
                package: base_name(&dep.name).to_string(),
                reason: format!("no candidate of {} satisfies {}", base_name(&dep.name), dep.constraint),
                path_in_graph: path,
            });
        }
    }

    if session.failures.is_empty() {
        Ok(ResolvedSet { packages: session.resolved })
    } else {
        Err(ResolverError::ResolutionFailed(session.failures))
    }
}

fn is_effectively_required(dep: &Dependency, selections: &Selections) -> bool {
    if !dep.constraint.optional {
        return true;
    }
    // optional ^ default behaves as required only absent a prior selection.
    dep.constraint.default && !selections.contains(base_name(&dep.name))
}

fn base_name(qualified: &str) -> &str {
    qualified.split(':').next().unwrap_or(qualified)
}

impl<'a> Session<'a> {
    /// Attempts to satisfy `dep`, recording failed leaves (for optional
    /// dependencies that don't abort the session) directly into
    /// `self.failures` only when the caller decides the edge was required;
    /// the return value tells the caller whether the edge was satisfied.
    fn resolve_dependency(&mut self, dep: &Dependency, path: &mut Vec<String>) -> bool {
        let name = base_name(&dep.name).to_string();

        if let Some(parent) = dep.name.split_once(':') {
            let (parent_name, sub_name) = parent;
            let parent_dep =
                Dependency { name: parent_name.to_string(), constraint: dep.constraint.clone() };
            if !self.resolve_dependency(&parent_dep, path) {
                return false;
            }
            if let Some(resolved) = self.resolved.get(parent_name).cloned() {
                let qualified = format!("{parent_name}:{sub_name}");
                self.resolved.insert(qualified, resolved);
            }
            return true;
        }

        if let Some(repo_path) = &dep.constraint.path {
            return self.resolve_path_dependency(&name, repo_path, path);
        }

        if name == self.root_name {
            // Cycle back to the root: recorded implicitly by the caller's
            // edge, never recursed into.
            return true;
        }

        if let Some(existing) = self.resolved.get(&name) {
            return match existing {
                Resolved::Version(v) => dep.constraint.matches(v),
                Resolved::Path(_) => true,
            };
        }

        self.resolve_versioned(&name, &dep.constraint, path)
    }

    fn resolve_path_dependency(&mut self, name: &str, repo_path: &PathBuf, path: &mut Vec<String>) -> bool {
        let Some(deps) = self.provider.dependencies_at_path(repo_path) else {
            return false;
        };
        self.resolved.insert(name.to_string(), Resolved::Path(repo_path.clone()));
        path.push(name.to_string());
        let mut ok = true;
        for dep in &deps {
            if !self.resolve_dependency(dep, path) && is_effectively_required(dep, self.selections) {
                self.failures.push(FailedEdge {
                    package: base_name(&dep.name).to_string(),
                    reason: format!(
                        "no candidate of {} satisfies {}",
                        base_name(&dep.name),
                        dep.constraint
                    ),
                    path_in_graph: path.clone(),
                });
                ok = false;
            }
        }
        path.pop();
        ok
    }

    /// Tries each candidate version of `name` in order, accepting the first
    /// one whose subtree resolves cleanly, and undoing the tentative
    /// assignment on failure before advancing to the next candidate. This
    /// is the `Trying(cand_k) -> Accepted | Exhausted` step.
    fn resolve_versioned(&mut self, name: &str, required: &Constraint, path: &mut Vec<String>) -> bool {
        for candidate in self.provider.candidate_versions(name) {
            if !required.matches(&candidate) {
                continue;
            }
            let Some(deps) = self.provider.dependencies(name, &candidate) else {
                continue;
            };

            self.resolved.insert(name.to_string(), Resolved::Version(candidate.clone()));
            path.push(name.to_string());

            let mut ok = true;
            for dep in &deps {
                if !self.resolve_dependency(dep, path) && is_effectively_required(dep, self.selections) {
                    ok = false;
                    break;
                }
            }

            path.pop();

            if ok {
                return true;
            }
            self.resolved.remove(name);
        }
        false
    }
}
