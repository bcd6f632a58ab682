//! Dependency graphs over checked parasol programs
//!
//! After type checking, every module is fed to a [`DependencyGraphBuilder`]
//! which records who refers to whom. The resulting [`DependencyGraphs`]
//! answer three questions for code generation:
//!
//! - which terms and types a shader needs ([`referenced`]),
//! - in what order to emit them ([`topology`]),
//! - whether every external a shader reaches exists in its stage
//!   ([`check_externals`]).
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut builder = DependencyGraphBuilder::new();
//! builder.add_module(&typed_module);
//! let graphs = builder.finish();
//!
//! let needed = referenced(&graphs, &shader);
//! let order = topology(&graphs, &shader, &needed);
//! ```

pub mod builder;
pub mod dag;
pub mod externals;
pub mod graphs;
pub mod referenced;
pub mod topology;

pub use builder::DependencyGraphBuilder;
pub use dag::{Dag, Reference};
pub use externals::{check_externals, ExternalTrace, ExternalsError, ExternalsErrorKind, TraceLink};
pub use graphs::{DependencyGraphs, Vertex};
pub use referenced::{referenced, Referenced};
pub use topology::{topology, Topology};
