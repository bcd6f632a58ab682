//! Type-annotated syntax trees, the output of type checking
//!
//! Mirrors [`crate::resolved`] with every expression and declaration
//! carrying its resolved [`Type`]. Type references keep their resolved
//! spelling so that later passes still have source positions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::names::{FlatName, ModuleName, ModulePath};
use crate::position::{Ident, Position};
use crate::resolved::{Import, ShaderRef, TermName, TypeRef};
use crate::types::Type;

/// An expression together with its type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedExpr {
    pub ty: Type,
    pub kind: TypedExprKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypedExprKind {
    Application {
        name: TermName,
        arguments: Vec<TypedExpr>,
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
        condition: Box<TypedExpr>,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },
    Let {
        position: Position,
        bindings: Vec<TypedLocalValue>,
        body: Box<TypedExpr>,
    },
    New {
        type_ref: TypeRef,
        arguments: Vec<TypedExpr>,
    },
    Record {
        type_ref: TypeRef,
        assignments: Vec<TypedFieldAssignment>,
    },
    RecordProjection {
        body: Box<TypedExpr>,
        field: Ident,
    },
    Swizzle {
        body: Box<TypedExpr>,
        fields: Vec<Ident>,
    },
    MatrixColumn {
        body: Box<TypedExpr>,
        column: i64,
        position: Position,
    },
    Variable(TermName),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedLocalValue {
    pub name: Ident,
    pub ascription: Option<TypeRef>,
    pub ty: Type,
    pub expr: TypedExpr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedFieldAssignment {
    pub name: Ident,
    pub expr: TypedExpr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedRecord {
    pub name: Ident,
    /// Always a [`Type::Record`]
    pub ty: Type,
    pub fields: Vec<TypedRecordField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedRecordField {
    pub name: Ident,
    pub type_ref: TypeRef,
    pub ty: Type,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedArgument {
    pub name: Ident,
    pub type_ref: TypeRef,
    pub ty: Type,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedExternal {
    pub name: Ident,
    pub vertex: bool,
    pub fragment: bool,
    pub emulation: Option<TypedExpr>,
}

impl TypedExternal {
    pub fn allows(&self, stage: ShaderKind) -> bool {
        match stage {
            ShaderKind::Vertex => self.vertex,
            ShaderKind::Fragment => self.fragment,
            ShaderKind::Program => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedFunction {
    pub name: Ident,
    pub arguments: Vec<TypedArgument>,
    pub result: TypeRef,
    /// Always a [`Type::Function`]
    pub ty: Type,
    pub body: TypedExpr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedFunctionExternal {
    pub name: Ident,
    pub arguments: Vec<TypedArgument>,
    pub result: TypeRef,
    pub ty: Type,
    pub external: TypedExternal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedValue {
    pub name: Ident,
    pub ascription: Option<TypeRef>,
    pub ty: Type,
    pub expr: TypedExpr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedValueExternal {
    pub name: Ident,
    pub ascription: TypeRef,
    pub ty: Type,
    pub external: TypedExternal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypedTerm {
    Function(TypedFunction),
    FunctionExternal(TypedFunctionExternal),
    Value(TypedValue),
    ValueExternal(TypedValueExternal),
}

impl TypedTerm {
    pub fn name(&self) -> &Ident {
        match self {
            TypedTerm::Function(t) => &t.name,
            TypedTerm::FunctionExternal(t) => &t.name,
            TypedTerm::Value(t) => &t.name,
            TypedTerm::ValueExternal(t) => &t.name,
        }
    }

    pub fn ty(&self) -> &Type {
        match self {
            TypedTerm::Function(t) => &t.ty,
            TypedTerm::FunctionExternal(t) => &t.ty,
            TypedTerm::Value(t) => &t.ty,
            TypedTerm::ValueExternal(t) => &t.ty,
        }
    }

    pub fn external(&self) -> Option<&TypedExternal> {
        match self {
            TypedTerm::FunctionExternal(t) => Some(&t.external),
            TypedTerm::ValueExternal(t) => Some(&t.external),
            TypedTerm::Function(_) | TypedTerm::Value(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderKind {
    Vertex,
    Fragment,
    Program,
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderKind::Vertex => write!(f, "vertex"),
            ShaderKind::Fragment => write!(f, "fragment"),
            ShaderKind::Program => write!(f, "program"),
        }
    }
}

/// A shader input, parameter or output with its resolved type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedAttribute {
    pub name: Ident,
    pub type_ref: TypeRef,
    pub ty: Type,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedVertexOutput {
    pub name: Ident,
    pub type_ref: TypeRef,
    pub ty: Type,
    pub main: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedOutputAssignment {
    pub name: Ident,
    pub variable: TermName,
    pub ty: Type,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedVertexShader {
    pub name: Ident,
    pub inputs: Vec<TypedAttribute>,
    pub outputs: Vec<TypedVertexOutput>,
    pub parameters: Vec<TypedAttribute>,
    pub values: Vec<TypedLocalValue>,
    pub writes: Vec<TypedOutputAssignment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypedFragmentOutput {
    Data {
        name: Ident,
        type_ref: TypeRef,
        ty: Type,
        index: u32,
    },
    Depth {
        name: Ident,
        type_ref: TypeRef,
        ty: Type,
    },
}

impl TypedFragmentOutput {
    pub fn name(&self) -> &Ident {
        match self {
            TypedFragmentOutput::Data { name, .. } | TypedFragmentOutput::Depth { name, .. } => {
                name
            }
        }
    }

    pub fn ty(&self) -> &Type {
        match self {
            TypedFragmentOutput::Data { ty, .. } | TypedFragmentOutput::Depth { ty, .. } => ty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypedFragmentLocal {
    Value(TypedLocalValue),
    Discard { position: Position, expr: TypedExpr },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedFragmentShader {
    pub name: Ident,
    pub inputs: Vec<TypedAttribute>,
    pub outputs: Vec<TypedFragmentOutput>,
    pub parameters: Vec<TypedAttribute>,
    pub locals: Vec<TypedFragmentLocal>,
    pub writes: Vec<TypedOutputAssignment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedProgramShader {
    pub name: Ident,
    pub vertex: ShaderRef,
    pub fragment: ShaderRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypedShader {
    Vertex(TypedVertexShader),
    Fragment(TypedFragmentShader),
    Program(TypedProgramShader),
}

impl TypedShader {
    pub fn name(&self) -> &Ident {
        match self {
            TypedShader::Vertex(s) => &s.name,
            TypedShader::Fragment(s) => &s.name,
            TypedShader::Program(s) => &s.name,
        }
    }

    pub fn kind(&self) -> ShaderKind {
        match self {
            TypedShader::Vertex(_) => ShaderKind::Vertex,
            TypedShader::Fragment(_) => ShaderKind::Fragment,
            TypedShader::Program(_) => ShaderKind::Program,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedModule {
    pub path: ModulePath,
    pub imports: Vec<Import>,
    pub types: BTreeMap<String, TypedRecord>,
    pub type_order: Vec<String>,
    pub terms: BTreeMap<String, TypedTerm>,
    pub term_order: Vec<String>,
    pub shaders: BTreeMap<String, TypedShader>,
    pub shader_order: Vec<String>,
}

impl TypedModule {
    pub fn name(&self) -> ModuleName {
        self.path.flatten()
    }
}

/// Every checked module, keyed by flattened module name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypedCompilation {
    pub modules: BTreeMap<ModuleName, TypedModule>,
    /// Modules in the order they were checked
    pub checked_order: Vec<ModuleName>,
}

impl TypedCompilation {
    pub fn term(&self, name: &FlatName) -> Option<&TypedTerm> {
        self.modules.get(name.module())?.terms.get(name.name())
    }

    pub fn shader(&self, name: &FlatName) -> Option<&TypedShader> {
        self.modules.get(name.module())?.shaders.get(name.name())
    }

    pub fn record(&self, name: &FlatName) -> Option<&TypedRecord> {
        self.modules.get(name.module())?.types.get(name.name())
    }

    /// Every shader with its qualified name, modules in checking order
    pub fn shaders(&self) -> impl Iterator<Item = (FlatName, &TypedShader)> {
        self.checked_order
            .iter()
            .filter_map(move |module_name| {
                self.modules.get(module_name).map(|module| (module_name, module))
            })
            .flat_map(move |(module_name, module)| {
                module.shader_order.iter().rev().filter_map(move |name| {
                    module
                        .shaders
                        .get(name)
                        .map(|shader| (module_name.qualify(name.as_str()), shader))
                })
            })
    }
}
