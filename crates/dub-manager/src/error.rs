//! Error types for dub-manager.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ManagerError {
    #[error("could not acquire cache lock for '{name}': {source}")]
    #[diagnostic(code(dub::manager::lock_timeout), help("another process may be holding the lock; retry later"))]
    LockTimeout { name: String, #[source] source: dub_utils::LockError },

    #[error("failed to extract package archive for '{name}': {reason}")]
    #[diagnostic(code(dub::manager::extract_failed))]
    ExtractFailed { name: String, reason: String },

    #[error("cache entry for '{name}' at {path} is corrupt: missing install journal")]
    #[diagnostic(
        code(dub::manager::cache_corrupt),
        help("remove the directory manually and refetch the package")
    )]
    CacheCorrupt { name: String, path: PathBuf },

    #[error("path '{0}' escapes its expected root")]
    #[diagnostic(code(dub::manager::path_outside_root))]
    PathOutsideRoot(PathBuf),

    #[error("package '{name}' is installed in the local tier ({tier}) and cannot be removed by the package manager")]
    #[diagnostic(
        code(dub::manager::local_tier_removal_refused),
        help("local-tier packages are part of the project tree; delete the files directly instead")
    )]
    LocalTierRemovalRefused { name: String, tier: PathBuf },

    #[error("package '{0}' not found in any cache tier")]
    #[diagnostic(code(dub::manager::package_not_found))]
    PackageNotFound(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] dub_utils::FileSystemError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Lock(#[from] dub_utils::LockError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] dub_registry::RegistryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Recipe(#[from] dub_recipe::RecipeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Package(#[from] dub_package::PackageError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Version(#[from] dub_version::VersionError),

    #[error("malformed zip archive: {0}")]
    #[diagnostic(code(dub::manager::malformed_archive))]
    MalformedArchive(String),

    #[error("malformed cache metadata at {path}: {reason}")]
    #[diagnostic(code(dub::manager::malformed_metadata))]
    MalformedMetadata { path: PathBuf, reason: String },
}

pub type ManagerResult<T> = std::result::Result<T, ManagerError>;
