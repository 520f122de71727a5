//! Version and dependency constraint algebra for the dub package manager.

pub mod constraint;
pub mod error;
pub mod version;

pub use constraint::{Comparator, Constraint, RepositoryRef};
pub use error::{VersionError, VersionResult};
pub use version::{SemanticVersion, Version, BRANCH_MARKER, MASTER_BRANCH};
