//! The root error enum: every lower-level crate's diagnostic is wrapped
//! transparently so a `miette::Report` at the top keeps the originating
//! code and help text intact.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error("{0}")]
    #[diagnostic(code(dub::cli::usage))]
    Usage(String),

    #[error("no recipe found at {0}")]
    #[diagnostic(code(dub::cli::no_recipe), help("expected one of dub.json, dub.sdl, or package.json"))]
    NoRecipe(std::path::PathBuf),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Recipe(#[from] dub_recipe::RecipeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Package(#[from] dub_package::PackageError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Manager(#[from] dub_manager::ManagerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] dub_registry::RegistryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolver(#[from] dub_resolver::ResolverError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Selections(#[from] dub_selections::SelectionsError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    ConfigGraph(#[from] dub_confgraph::ConfigGraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] dub_build::BuildError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Version(#[from] dub_version::VersionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] dub_utils::FileSystemError),

    #[error("failed to read config file {path}")]
    #[diagnostic(code(dub::cli::config_unreadable))]
    ConfigUnreadable { path: std::path::PathBuf, source: std::io::Error },

    #[error("malformed config file {path}")]
    #[diagnostic(code(dub::cli::config_malformed))]
    ConfigMalformed { path: std::path::PathBuf, source: toml::de::Error },
}

impl CliError {
    /// Exit code per the orchestrator's documented exit-code contract:
    /// 0 success, 1 usage/argument/fetch error, 2 runtime error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) | CliError::NoRecipe(_) | CliError::ConfigUnreadable { .. } | CliError::ConfigMalformed { .. } => 1,
            CliError::Registry(dub_registry::RegistryError::NotFound(_)) => 1,
            _ => 2,
        }
    }
}

pub type CliResult<T> = std::result::Result<T, CliError>;
