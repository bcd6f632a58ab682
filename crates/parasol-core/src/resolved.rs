//! Name-resolved syntax trees, the input of type checking
//!
//! The resolver has already renamed every local binder to a globally
//! distinct name, qualified every global reference with its flattened
//! module, and rejected reference cycles. Each module carries, per
//! declaration kind, an ordering that lists dependents before their
//! dependencies; consumers walk these lists in reverse.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::names::{FlatName, ModuleName, ModulePath};
use crate::position::{Ident, Position};

/// A reference to a term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermName {
    /// A let binding, function argument, shader input, parameter or local
    Local(Ident),
    /// A function or value declared in some module
    Global { module: ModuleName, name: Ident },
}

impl TermName {
    pub fn ident(&self) -> &Ident {
        match self {
            TermName::Local(name) => name,
            TermName::Global { name, .. } => name,
        }
    }

    pub fn flat(&self) -> Option<FlatName> {
        match self {
            TermName::Local(_) => None,
            TermName::Global { module, name } => Some(module.qualify(name.as_str())),
        }
    }
}

/// A reference to a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    BuiltIn(Ident),
    Global { module: ModuleName, name: Ident },
}

impl TypeRef {
    pub fn ident(&self) -> &Ident {
        match self {
            TypeRef::BuiltIn(name) => name,
            TypeRef::Global { name, .. } => name,
        }
    }
}

/// A reference to a shader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderRef {
    pub module: ModuleName,
    pub name: Ident,
}

impl ShaderRef {
    pub fn flat(&self) -> FlatName {
        self.module.qualify(self.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Application {
        name: TermName,
        arguments: Vec<Expr>,
    },
    Boolean {
        value: bool,
        position: Position,
    },
    Integer {
        value: i64,
        position: Position,
    },
    Real {
        value: f64,
        position: Position,
    },
    Conditional {
        position: Position,
        condition: Box<Expr>,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Let {
        position: Position,
        bindings: Vec<LocalValue>,
        body: Box<Expr>,
    },
    New {
        type_ref: TypeRef,
        arguments: Vec<Expr>,
    },
    Record {
        type_ref: TypeRef,
        assignments: Vec<FieldAssignment>,
    },
    RecordProjection {
        body: Box<Expr>,
        field: Ident,
    },
    Swizzle {
        body: Box<Expr>,
        fields: Vec<Ident>,
    },
    MatrixColumn {
        body: Box<Expr>,
        column: i64,
        position: Position,
    },
    Variable(TermName),
}

impl Expr {
    /// The position diagnostics about this expression point at
    pub fn position(&self) -> &Position {
        match self {
            Expr::Application { name, .. } => &name.ident().position,
            Expr::Boolean { position, .. }
            | Expr::Integer { position, .. }
            | Expr::Real { position, .. }
            | Expr::Conditional { position, .. }
            | Expr::Let { position, .. }
            | Expr::MatrixColumn { position, .. } => position,
            Expr::New { type_ref, .. } | Expr::Record { type_ref, .. } => {
                &type_ref.ident().position
            }
            Expr::RecordProjection { field, .. } => &field.position,
            Expr::Swizzle { body, fields } => match fields.first() {
                Some(field) => &field.position,
                None => body.position(),
            },
            Expr::Variable(name) => &name.ident().position,
        }
    }
}

/// `value name [: type] = expr` inside a `let`, or a shader-local value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalValue {
    pub name: Ident,
    pub ascription: Option<TypeRef>,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAssignment {
    pub name: Ident,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDecl {
    pub name: Ident,
    pub fields: Vec<RecordFieldDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFieldDecl {
    pub name: Ident,
    pub type_ref: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: Ident,
    pub type_ref: TypeRef,
}

/// A primitive implemented by the target, gated per shader stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct External {
    pub name: Ident,
    pub vertex: bool,
    pub fragment: bool,
    /// Expression evaluating the primitive on the CPU
    pub emulation: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TermDecl {
    Function {
        name: Ident,
        arguments: Vec<Argument>,
        result: TypeRef,
        body: Expr,
    },
    FunctionExternal {
        name: Ident,
        arguments: Vec<Argument>,
        result: TypeRef,
        external: External,
    },
    Value {
        name: Ident,
        ascription: Option<TypeRef>,
        expr: Expr,
    },
    ValueExternal {
        name: Ident,
        ascription: TypeRef,
        external: External,
    },
}

impl TermDecl {
    pub fn name(&self) -> &Ident {
        match self {
            TermDecl::Function { name, .. }
            | TermDecl::FunctionExternal { name, .. }
            | TermDecl::Value { name, .. }
            | TermDecl::ValueExternal { name, .. } => name,
        }
    }
}

/// An input or parameter of a vertex or fragment shader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderAttribute {
    pub name: Ident,
    pub type_ref: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexOutput {
    pub name: Ident,
    pub type_ref: TypeRef,
    /// The output carrying the clip-space position
    pub main: bool,
}

/// `out name = variable`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputAssignment {
    pub name: Ident,
    pub variable: TermName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexShader {
    pub name: Ident,
    pub inputs: Vec<ShaderAttribute>,
    pub outputs: Vec<VertexOutput>,
    pub parameters: Vec<ShaderAttribute>,
    pub values: Vec<LocalValue>,
    pub writes: Vec<OutputAssignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FragmentOutput {
    Data {
        name: Ident,
        type_ref: TypeRef,
        index: u32,
    },
    Depth {
        name: Ident,
        type_ref: TypeRef,
    },
}

impl FragmentOutput {
    pub fn name(&self) -> &Ident {
        match self {
            FragmentOutput::Data { name, .. } | FragmentOutput::Depth { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FragmentLocal {
    Value(LocalValue),
    Discard { position: Position, expr: Expr },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentShader {
    pub name: Ident,
    pub inputs: Vec<ShaderAttribute>,
    pub outputs: Vec<FragmentOutput>,
    pub parameters: Vec<ShaderAttribute>,
    pub locals: Vec<FragmentLocal>,
    pub writes: Vec<OutputAssignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramShader {
    pub name: Ident,
    pub vertex: ShaderRef,
    pub fragment: ShaderRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShaderDecl {
    Vertex(VertexShader),
    Fragment(FragmentShader),
    Program(ProgramShader),
}

impl ShaderDecl {
    pub fn name(&self) -> &Ident {
        match self {
            ShaderDecl::Vertex(s) => &s.name,
            ShaderDecl::Fragment(s) => &s.name,
            ShaderDecl::Program(s) => &s.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub path: ModulePath,
    pub rename: Option<Ident>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub path: ModulePath,
    pub imports: Vec<Import>,
    pub types: BTreeMap<String, RecordDecl>,
    /// Dependents before dependencies
    pub type_order: Vec<String>,
    pub terms: BTreeMap<String, TermDecl>,
    pub term_order: Vec<String>,
    pub shaders: BTreeMap<String, ShaderDecl>,
    pub shader_order: Vec<String>,
}

impl Module {
    pub fn name(&self) -> ModuleName {
        self.path.flatten()
    }
}

/// A whole program as handed over by the resolver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compilation {
    pub modules: BTreeMap<ModuleName, Module>,
    /// Importing modules before the modules they import
    pub order: Vec<ModuleName>,
}
