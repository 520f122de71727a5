//! Error types for dub-build.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum BuildError {
    #[error("unknown build type: {0}")]
    #[diagnostic(code(dub::build::unknown_build_type))]
    UnknownBuildType(String),

    #[error("the root package's target type must not be `none` or `source-library`")]
    #[diagnostic(code(dub::build::invalid_root_target), help("set targetType to executable, library, or one of its variants"))]
    InvalidRootTargetType,

    #[error("more than one package produces an executable target: {}", .0.join(", "))]
    #[diagnostic(code(dub::build::multiple_executables))]
    MultipleExecutables(Vec<String>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Package(#[from] dub_package::PackageError),
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;
