//! Error types for dub-registry.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum RegistryError {
    #[error("package '{0}' not found")]
    #[diagnostic(
        code(dub::registry::package_not_found),
        help("check the package name, or that a registry supplier serving it is configured")
    )]
    NotFound(String),

    #[error("registry supplier for '{endpoint}' is unavailable: {reason}")]
    #[diagnostic(
        code(dub::registry::supplier_unavailable),
        severity(warning),
        help("this supplier is skipped; other configured suppliers are tried next")
    )]
    SupplierUnavailable { endpoint: String, reason: String },

    #[error("invalid registry URL '{0}'")]
    #[diagnostic(code(dub::registry::invalid_url))]
    InvalidUrl(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Recipe(#[from] dub_recipe::RecipeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Version(#[from] dub_version::VersionError),

    #[error("malformed registry response: {0}")]
    #[diagnostic(code(dub::registry::malformed_response))]
    MalformedResponse(String),
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
