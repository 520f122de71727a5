//! Error types for dub-version.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while parsing or comparing versions and constraints.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("malformed version '{0}'")]
    #[diagnostic(
        code(dub::version::malformed),
        help("use a SemVer string like '1.2.3-rc.1' or a branch reference like '~master'")
    )]
    MalformedVersion(String),

    #[error("malformed constraint '{0}'")]
    #[diagnostic(
        code(dub::version::malformed_constraint),
        help("use forms like '>=1.0.0 <2.0.0', '==1.0.0', '~>1.2.3', '~branch', or '*'")
    )]
    MalformedConstraint(String),

    #[error("cannot compare {lhs} and {rhs}")]
    #[diagnostic(
        code(dub::version::incomparable),
        help("branch versions only compare equal to themselves; mixing a branch with a numeric version is never orderable")
    )]
    IncomparableVersion { lhs: String, rhs: String },

    #[error("constraints {lhs} and {rhs} have no compatible intersection")]
    #[diagnostic(
        code(dub::version::incompatible_constraints),
        help("the two dependency constraints do not overlap")
    )]
    IncompatibleConstraints { lhs: String, rhs: String },
}

pub type VersionResult<T> = std::result::Result<T, VersionError>;
