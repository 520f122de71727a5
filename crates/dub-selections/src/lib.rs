//! The `dub.selections.json` pin file: load, save, query, inheritable
//! parent-directory lookup.

pub mod error;
pub mod pin;
pub mod selections;

pub use error::{SelectionsError, SelectionsResult};
pub use pin::Pin;
pub use selections::{Selections, SELECTIONS_FILENAME};
