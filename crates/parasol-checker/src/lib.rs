//! Type checking for the parasol shading language
//!
//! Takes the resolver's [`Compilation`](parasol_core::resolved::Compilation)
//! and produces a [`TypedCompilation`](parasol_core::typed::TypedCompilation)
//! in which every expression and declaration carries its type, together
//! with the [`DependencyGraphs`](parasol_graph::DependencyGraphs) built
//! along the way.
//!
//! Type equality is nominal and there is no inference beyond checking each
//! expression bottom-up against what its context requires. The first error
//! in a declaration aborts checking; modules checked before it are kept.

mod checker;
mod context;
mod environment;
mod error;
mod expr;
mod records;
mod shaders;
mod terms;

pub use checker::{check_compilation, Checked, TypeChecker};
pub use error::{LinkProblem, TypeCheckerError, TypeCheckerErrorKind};
