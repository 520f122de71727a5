//! Error types for dub-resolver.

use miette::Diagnostic;
use thiserror::Error;

/// One failed-to-satisfy dependency edge, recorded with its position in
/// the search so the final report can show the whole chain.
#[derive(Debug, Clone)]
pub struct FailedEdge {
    pub package: String,
    pub reason: String,
    pub path_in_graph: Vec<String>,
}

#[derive(Error, Diagnostic, Debug)]
pub enum ResolverError {
    #[error("dependency resolution failed for {} package(s)", .0.len())]
    #[diagnostic(code(dub::resolver::resolution_failed))]
    ResolutionFailed(Vec<FailedEdge>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Recipe(#[from] dub_recipe::RecipeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Version(#[from] dub_version::VersionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Selections(#[from] dub_selections::SelectionsError),
}

pub type ResolverResult<T> = std::result::Result<T, ResolverError>;
