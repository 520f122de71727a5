//! Error types for dub-utils.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error type for hash operations.
#[derive(Error, Diagnostic, Debug)]
pub enum HashError {
    #[error("failed to read file '{path}'")]
    #[diagnostic(
        code(dub::utils::hash::read),
        help("check that the file exists and you have read permissions")
    )]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error type for path operations.
#[derive(Error, Diagnostic, Debug)]
pub enum PathError {
    #[error("failed to get current directory")]
    #[diagnostic(
        code(dub::utils::path::cwd),
        help("check that the current directory still exists")
    )]
    FailedToGetCurrentDir {
        #[source]
        source: std::io::Error,
    },

    #[error("path is empty")]
    #[diagnostic(code(dub::utils::path::empty), help("provide a non-empty path"))]
    Empty,

    #[error("environment variable '{var}' not set in '{input}'")]
    #[diagnostic(
        code(dub::utils::path::env_var),
        help("set the environment variable or use a different path")
    )]
    MissingEnvVar { var: String, input: String },

    #[error("unclosed variable expression starting at '{input}'")]
    #[diagnostic(
        code(dub::utils::path::unclosed_var),
        help("close the variable expression with '}}'")
    )]
    UnclosedVariable { input: String },
}

/// Error type for filesystem operations.
#[derive(Error, Diagnostic, Debug)]
pub enum FileSystemError {
    #[error("failed to read file '{path}'")]
    #[diagnostic(code(dub::utils::fs::read_file))]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file '{path}'")]
    #[diagnostic(code(dub::utils::fs::write_file))]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create file '{path}'")]
    #[diagnostic(code(dub::utils::fs::create_file))]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove path '{path}'")]
    #[diagnostic(code(dub::utils::fs::remove))]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read directory '{path}'")]
    #[diagnostic(code(dub::utils::fs::read_dir))]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory '{path}'")]
    #[diagnostic(code(dub::utils::fs::create_dir))]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{path}' is not a directory")]
    #[diagnostic(code(dub::utils::fs::not_a_dir))]
    NotADirectory { path: PathBuf },
}

/// Context for a filesystem operation that failed, used to build a
/// [`FileSystemError`] variant from a bare [`std::io::Error`].
pub struct IoContext {
    path: PathBuf,
    operation: IoOperation,
}

#[derive(Debug, Clone)]
pub enum IoOperation {
    ReadFile,
    WriteFile,
    CreateFile,
    Remove,
    CreateDirectory,
    ReadDirectory,
}

impl IoContext {
    pub fn new(path: PathBuf, operation: IoOperation) -> Self {
        Self { path, operation }
    }
}

impl From<(IoContext, std::io::Error)> for FileSystemError {
    fn from((ctx, source): (IoContext, std::io::Error)) -> Self {
        match ctx.operation {
            IoOperation::ReadFile => FileSystemError::ReadFile { path: ctx.path, source },
            IoOperation::WriteFile => FileSystemError::WriteFile { path: ctx.path, source },
            IoOperation::CreateFile => FileSystemError::CreateFile { path: ctx.path, source },
            IoOperation::Remove => FileSystemError::Remove { path: ctx.path, source },
            IoOperation::CreateDirectory => {
                FileSystemError::CreateDirectory { path: ctx.path, source }
            }
            IoOperation::ReadDirectory => {
                FileSystemError::ReadDirectory { path: ctx.path, source }
            }
        }
    }
}

/// Extension trait for attaching path context to a raw IO result.
pub trait IoResultExt<T> {
    fn with_path<P: Into<PathBuf>>(self, path: P, operation: IoOperation) -> FileSystemResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path<P: Into<PathBuf>>(self, path: P, operation: IoOperation) -> FileSystemResult<T> {
        self.map_err(|e| (IoContext::new(path.into(), operation), e).into())
    }
}

/// Error type for cache-tier file locking.
#[derive(Error, Diagnostic, Debug)]
pub enum LockError {
    #[error("failed to acquire lock: {0}")]
    #[diagnostic(
        code(dub::utils::lock::acquire_failed),
        help("another dub process may be holding this lock")
    )]
    AcquireFailed(String),

    #[error("timed out waiting for lock on '{path}' after {timeout_secs}s")]
    #[diagnostic(
        code(dub::utils::lock::timeout),
        help("another dub process is likely holding the cache tier lock; retry later")
    )]
    Timeout { path: PathBuf, timeout_secs: u64 },

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] FileSystemError),
}

/// Combined error type for all dub-utils errors.
#[derive(Error, Diagnostic, Debug)]
pub enum UtilsError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] FileSystemError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Lock(#[from] LockError),
}

pub type FileSystemResult<T> = std::result::Result<T, FileSystemError>;
pub type HashResult<T> = std::result::Result<T, HashError>;
pub type PathResult<T> = std::result::Result<T, PathError>;
pub type LockResult<T> = std::result::Result<T, LockError>;
pub type UtilsResult<T> = std::result::Result<T, UtilsError>;
