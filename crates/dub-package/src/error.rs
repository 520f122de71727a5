//! Error types for dub-package.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum PackageError {
    #[error("package name '{0}' does not match the conventional pattern [a-z0-9_-]+")]
    #[diagnostic(
        code(dub::package::name_warning),
        severity(warning),
        help("package names conventionally use only lowercase letters, digits, '_' and '-'")
    )]
    NameWarning(String),

    #[error("configuration '{0}' not found")]
    #[diagnostic(code(dub::package::unknown_configuration))]
    UnknownConfiguration(String),

    #[error("sub-package '{0}' not found")]
    #[diagnostic(code(dub::package::sub_package_not_found))]
    SubPackageNotFound(String),

    #[error("no recipe file found at '{0}'")]
    #[diagnostic(
        code(dub::package::recipe_not_found),
        help("expected one of dub.json, dub.sdl, or package.json")
    )]
    RecipeNotFound(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Recipe(#[from] dub_recipe::RecipeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] dub_utils::FileSystemError),
}

pub type PackageResult<T> = std::result::Result<T, PackageError>;
