//! Discovers the `(package, config)` graph implied by a resolved
//! dependency set and prunes it to exactly one configuration per package.

pub mod error;
pub mod graph;
pub mod source;

pub use error::{ConfigGraphError, ConfigGraphResult};
pub use graph::build;
pub use source::ConfigGraphSource;
