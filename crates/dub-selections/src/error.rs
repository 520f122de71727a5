//! Error types for dub-selections.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum SelectionsError {
    #[error("'{0}' is not selected")]
    #[diagnostic(code(dub::selections::not_selected), help("run the resolver to produce a pin for it first"))]
    NotSelected(String),

    #[error("malformed selections file at {path}: {reason}")]
    #[diagnostic(code(dub::selections::malformed))]
    Malformed { path: PathBuf, reason: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] dub_utils::FileSystemError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Version(#[from] dub_version::VersionError),
}

pub type SelectionsResult<T> = std::result::Result<T, SelectionsError>;
