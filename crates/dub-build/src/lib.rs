//! Topological build-settings composition: per-package merge has already
//! happened by the time a [`BuildSource`] hands us a package's settings;
//! this crate concatenates across the whole resolved set, substitutes
//! variables, applies the build-type overlay, and enforces target-type
//! invariants.

pub mod compose;
pub mod error;
pub mod overlay;
pub mod substitution;
pub mod validate;

pub use compose::{compose, BuildContext, BuildSource};
pub use error::{BuildError, BuildResult};
pub use substitution::VariableContext;
