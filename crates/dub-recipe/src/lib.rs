//! In-memory representation and parsing of dub package recipes.

pub mod error;
pub mod parse;
pub mod platform;
pub mod types;

pub use error::{RecipeError, RecipeResult};
pub use parse::{parse_json, parse_sdl, RECIPE_FILENAMES};
pub use platform::{BuildPlatform, PlatformSuffix};
pub use types::{
    BuildSettings, Configuration, Dependency, RawBuildBlock, RawFieldValue, Recipe,
    SubPackageDescriptor, TargetType,
};

/// Parses a recipe's raw text given the filename it was loaded from,
/// choosing the JSON or SDL dialect by extension.
pub fn parse_recipe(
    filename: &str,
    contents: &str,
    policy: dub_utils::StrictnessPolicy,
) -> RecipeResult<types::Recipe> {
    if filename.ends_with(".sdl") {
        parse::parse_sdl(contents, policy)
    } else if filename.ends_with(".json") {
        parse::parse_json(contents, policy)
    } else {
        Err(error::RecipeError::UnsupportedDialect(filename.to_string()))
    }
}
