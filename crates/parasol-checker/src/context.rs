//! Lookups of global declarations during checking
//!
//! The resolver guarantees that every built-in name, global type, global
//! term and shader referenced by a module exists and has been declared
//! before its users. A failed lookup therefore means the checker was driven
//! out of order, and panics.

use std::collections::BTreeMap;

use parasol_core::resolved::{ShaderRef, TypeRef};
use parasol_core::typed::{TypedModule, TypedShader};
use parasol_core::{ModuleName, Type};

/// What a declaration being checked can see
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    builtins: &'a BTreeMap<&'static str, Type>,
    checked: &'a BTreeMap<ModuleName, TypedModule>,
    module: &'a ModuleName,
    current: &'a TypedModule,
}

impl<'a> Context<'a> {
    /// `current` holds the declarations of `module` checked so far
    pub fn new(
        builtins: &'a BTreeMap<&'static str, Type>,
        checked: &'a BTreeMap<ModuleName, TypedModule>,
        module: &'a ModuleName,
        current: &'a TypedModule,
    ) -> Self {
        Self {
            builtins,
            checked,
            module,
            current,
        }
    }

    pub fn module_name(&self) -> &ModuleName {
        self.module
    }

    fn module(&self, name: &ModuleName) -> &'a TypedModule {
        if name == self.module {
            return self.current;
        }
        match self.checked.get(name) {
            Some(module) => module,
            None => panic!("internal error: module {} has not been checked", name),
        }
    }

    pub fn resolve_type(&self, type_ref: &TypeRef) -> Type {
        match type_ref {
            TypeRef::BuiltIn(name) => match self.builtins.get(name.as_str()) {
                Some(ty) => ty.clone(),
                None => panic!(
                    "internal error: unknown built-in type {} at {}",
                    name, name.position
                ),
            },
            TypeRef::Global { module, name } => match self.module(module).types.get(name.as_str()) {
                Some(record) => record.ty.clone(),
                None => panic!(
                    "internal error: unknown type {}.{} at {}",
                    module, name, name.position
                ),
            },
        }
    }

    pub fn term_type(&self, module: &ModuleName, name: &str) -> Type {
        match self.module(module).terms.get(name) {
            Some(term) => term.ty().clone(),
            None => panic!("internal error: unknown term {}.{}", module, name),
        }
    }

    pub fn shader(&self, shader: &ShaderRef) -> &'a TypedShader {
        match self.module(&shader.module).shaders.get(shader.name.as_str()) {
            Some(typed) => typed,
            None => panic!(
                "internal error: unknown shader {} at {}",
                shader.flat(),
                shader.name.position
            ),
        }
    }
}
