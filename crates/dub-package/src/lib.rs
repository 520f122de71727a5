//! A loaded recipe at a location, plus derived default configurations,
//! default source discovery, and per-platform build-setting extraction.

pub mod error;
pub mod package;

pub use error::{PackageError, PackageResult};
pub use package::{load_recipe_text, Package, PackageDescription};
