//! Filesystem, hashing, locking, and path helpers shared across dub's crates.

pub mod error;
pub mod fs;
pub mod hash;
pub mod lock;
pub mod path;
pub mod policy;

pub use error::{
    FileSystemError, HashError, IoContext, IoOperation, IoResultExt, LockError, PathError, UtilsError,
    UtilsResult,
};
pub use policy::StrictnessPolicy;
