//! Core names, type system and syntax trees for the parasol shading language
//!
//! The resolver (out of this workspace) hands over a [`resolved::Compilation`];
//! the checker turns it into a [`typed::TypedCompilation`]. Both trees share
//! the [`types::Type`] catalogue and the naming scheme in [`names`].

pub mod names;
pub mod position;
pub mod resolved;
pub mod typed;
pub mod types;

pub use names::{FlatName, ModuleName, ModulePath, NameError, TypeName};
pub use position::{Ident, Position};
pub use types::{Constructor, Type};
