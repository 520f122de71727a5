//! Error types for dub-recipe.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum RecipeError {
    #[error("malformed recipe: {0}")]
    #[diagnostic(
        code(dub::recipe::malformed),
        help("check the recipe's JSON or SDL syntax against the package format documentation")
    )]
    MalformedRecipe(String),

    #[error("unrecognized recipe dialect for file '{0}'")]
    #[diagnostic(
        code(dub::recipe::unsupported_dialect),
        help("recognized filenames are dub.json, dub.sdl, and package.json")
    )]
    UnsupportedDialect(String),

    #[error("unknown recipe field '{field}'")]
    #[diagnostic(
        code(dub::recipe::unknown_field),
        help("this field is not recognized; check for a typo or consult the strictness policy")
    )]
    UnknownRecipeField { field: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Version(#[from] dub_version::VersionError),
}

pub type RecipeResult<T> = std::result::Result<T, RecipeError>;
