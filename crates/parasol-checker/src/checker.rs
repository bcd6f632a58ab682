//! Checking whole modules and compilations
//!
//! Modules are checked dependencies first. Within a module, record types
//! are checked first, then terms, then shaders, each in the resolver's
//! order reversed, so every declaration only sees declarations that are
//! already checked. A checked module is never revisited.

use std::collections::BTreeMap;

use tracing::{debug, info};

use parasol_core::resolved::{Compilation, Module};
use parasol_core::typed::{TypedCompilation, TypedModule};
use parasol_core::types::base_types;
use parasol_core::Type;
use parasol_graph::{DependencyGraphBuilder, DependencyGraphs};

use crate::context::Context;
use crate::error::TypeCheckerError;
use crate::records::check_record;
use crate::shaders::check_shader;
use crate::terms::check_term;

/// A fully checked program and its dependency graphs
#[derive(Debug)]
pub struct Checked {
    pub compilation: TypedCompilation,
    pub graphs: DependencyGraphs,
}

pub struct TypeChecker {
    builtins: BTreeMap<&'static str, Type>,
    compilation: TypedCompilation,
    graphs: DependencyGraphBuilder,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            builtins: base_types(),
            compilation: TypedCompilation::default(),
            graphs: DependencyGraphBuilder::new(),
        }
    }

    /// Check one module, after every module it imports
    ///
    /// On success the typed module is added to the compilation and to the
    /// dependency graphs. On failure nothing is added.
    ///
    /// # Panics
    ///
    /// Panics if the module was already checked, or if it refers to a
    /// module that has not been checked yet.
    pub fn check_module(&mut self, module: &Module) -> Result<&TypedModule, TypeCheckerError> {
        let name = module.name();
        if self.compilation.modules.contains_key(&name) {
            panic!("internal error: module {} checked twice", name);
        }

        info!("Checking module {}", name);

        let mut typed = TypedModule {
            path: module.path.clone(),
            imports: module.imports.clone(),
            types: BTreeMap::new(),
            type_order: module.type_order.clone(),
            terms: BTreeMap::new(),
            term_order: module.term_order.clone(),
            shaders: BTreeMap::new(),
            shader_order: module.shader_order.clone(),
        };

        for type_name in module.type_order.iter().rev() {
            let Some(record) = module.types.get(type_name) else {
                panic!("internal error: ordered type {} is not declared", type_name);
            };
            let checked = {
                let cx = Context::new(&self.builtins, &self.compilation.modules, &name, &typed);
                check_record(&cx, record)?
            };
            typed.types.insert(type_name.clone(), checked);
        }

        for term_name in module.term_order.iter().rev() {
            let Some(term) = module.terms.get(term_name) else {
                panic!("internal error: ordered term {} is not declared", term_name);
            };
            let checked = {
                let cx = Context::new(&self.builtins, &self.compilation.modules, &name, &typed);
                check_term(&cx, term)?
            };
            typed.terms.insert(term_name.clone(), checked);
        }

        for shader_name in module.shader_order.iter().rev() {
            let Some(shader) = module.shaders.get(shader_name) else {
                panic!("internal error: ordered shader {} is not declared", shader_name);
            };
            let checked = {
                let cx = Context::new(&self.builtins, &self.compilation.modules, &name, &typed);
                check_shader(&cx, shader)?
            };
            typed.shaders.insert(shader_name.clone(), checked);
        }

        debug!(
            "Checked module {}: {} types, {} terms, {} shaders",
            name,
            typed.types.len(),
            typed.terms.len(),
            typed.shaders.len()
        );

        self.graphs.add_module(&typed);
        self.compilation.checked_order.push(name.clone());
        Ok(self.compilation.modules.entry(name).or_insert(typed))
    }

    /// Modules checked so far
    pub fn compilation(&self) -> &TypedCompilation {
        &self.compilation
    }

    pub fn graphs(&self) -> &DependencyGraphs {
        self.graphs.graphs()
    }

    pub fn finish(self) -> Checked {
        Checked {
            compilation: self.compilation,
            graphs: self.graphs.finish(),
        }
    }
}

/// Check every module of a compilation, imported modules first
///
/// # Panics
///
/// Panics if the module order names a module that is not in the compilation.
pub fn check_compilation(compilation: &Compilation) -> Result<Checked, TypeCheckerError> {
    let mut checker = TypeChecker::new();

    for name in compilation.order.iter().rev() {
        let Some(module) = compilation.modules.get(name) else {
            panic!("internal error: ordered module {} is not in the compilation", name);
        };
        checker.check_module(module)?;
    }

    let checked = checker.finish();
    info!(
        "Checked {} modules ({} terms, {} types in dependency graphs)",
        checked.compilation.modules.len(),
        checked.graphs.term_graph().vertex_count(),
        checked.graphs.type_graph().vertex_count()
    );
    Ok(checked)
}
