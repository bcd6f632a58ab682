//! Test fixtures for parasol compiler testing
//!
//! Builders for resolved modules, so tests can describe programs the way
//! the resolver would hand them over without going through a parser.
//! Declarations are added dependencies first; the builders record the
//! resolver's "dependents first" orderings automatically.

use std::fs;
use std::path::PathBuf;

use parasol_core::resolved::{
    Argument, Compilation, Expr, External, FieldAssignment, FragmentLocal, FragmentOutput,
    FragmentShader, Import, LocalValue, Module, OutputAssignment, ProgramShader, RecordDecl,
    RecordFieldDecl, ShaderAttribute, ShaderDecl, ShaderRef, TermDecl, TermName, TypeRef,
    VertexOutput, VertexShader,
};
use parasol_core::{Ident, ModuleName, ModulePath, Position};

pub const TEST_FILE: &str = "test.p";

pub fn pos() -> Position {
    Position::new(TEST_FILE, 1, 1)
}

pub fn pos_at(line: u32, column: u32) -> Position {
    Position::new(TEST_FILE, line, column)
}

pub fn ident(name: &str) -> Ident {
    Ident::new(name, pos())
}

pub fn ident_at(name: &str, line: u32, column: u32) -> Ident {
    Ident::new(name, pos_at(line, column))
}

pub fn module_name(name: &str) -> ModuleName {
    ModuleName::new(name)
}

pub fn module_path(name: &str) -> ModulePath {
    let mut parts: Vec<Ident> = name.split('.').map(ident).collect();
    let last = parts.pop().unwrap_or_else(|| ident(name));
    ModulePath {
        package: parts,
        name: last,
    }
}

/// A reference to a built-in type such as `float` or `vector_4f`
pub fn builtin(name: &str) -> TypeRef {
    TypeRef::BuiltIn(ident(name))
}

pub fn global_type(module: &str, name: &str) -> TypeRef {
    TypeRef::Global {
        module: module_name(module),
        name: ident(name),
    }
}

pub fn local(name: &str) -> TermName {
    TermName::Local(ident(name))
}

pub fn global(module: &str, name: &str) -> TermName {
    TermName::Global {
        module: module_name(module),
        name: ident(name),
    }
}

pub fn shader_ref(module: &str, name: &str) -> ShaderRef {
    ShaderRef {
        module: module_name(module),
        name: ident(name),
    }
}

/// Expression constructors
pub mod expr {
    use super::*;

    pub fn int(value: i64) -> Expr {
        Expr::Integer {
            value,
            position: pos(),
        }
    }

    pub fn real(value: f64) -> Expr {
        Expr::Real {
            value,
            position: pos(),
        }
    }

    pub fn boolean(value: bool) -> Expr {
        Expr::Boolean {
            value,
            position: pos(),
        }
    }

    pub fn var(name: TermName) -> Expr {
        Expr::Variable(name)
    }

    pub fn var_local(name: &str) -> Expr {
        Expr::Variable(local(name))
    }

    pub fn var_global(module: &str, name: &str) -> Expr {
        Expr::Variable(global(module, name))
    }

    pub fn apply(name: TermName, arguments: Vec<Expr>) -> Expr {
        Expr::Application { name, arguments }
    }

    pub fn new_(type_ref: TypeRef, arguments: Vec<Expr>) -> Expr {
        Expr::New {
            type_ref,
            arguments,
        }
    }

    pub fn record(type_ref: TypeRef, assignments: Vec<(&str, Expr)>) -> Expr {
        Expr::Record {
            type_ref,
            assignments: assignments
                .into_iter()
                .map(|(name, expr)| FieldAssignment {
                    name: ident(name),
                    expr,
                })
                .collect(),
        }
    }

    pub fn project(body: Expr, field: &str) -> Expr {
        Expr::RecordProjection {
            body: Box::new(body),
            field: ident(field),
        }
    }

    pub fn swizzle(body: Expr, fields: &[&str]) -> Expr {
        Expr::Swizzle {
            body: Box::new(body),
            fields: fields.iter().map(|f| ident(f)).collect(),
        }
    }

    pub fn column(body: Expr, column: i64) -> Expr {
        Expr::MatrixColumn {
            body: Box::new(body),
            column,
            position: pos(),
        }
    }

    pub fn cond(condition: Expr, left: Expr, right: Expr) -> Expr {
        Expr::Conditional {
            position: pos(),
            condition: Box::new(condition),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn let_(bindings: Vec<LocalValue>, body: Expr) -> Expr {
        Expr::Let {
            position: pos(),
            bindings,
            body: Box::new(body),
        }
    }

    pub fn binding(name: &str, ascription: Option<TypeRef>, expr: Expr) -> LocalValue {
        LocalValue {
            name: ident(name),
            ascription,
            expr,
        }
    }
}

pub fn external(name: &str, vertex: bool, fragment: bool) -> External {
    External {
        name: ident(name),
        vertex,
        fragment,
        emulation: None,
    }
}

pub fn external_emulated(name: &str, vertex: bool, fragment: bool, emulation: Expr) -> External {
    External {
        emulation: Some(emulation),
        ..external(name, vertex, fragment)
    }
}

fn arguments(args: &[(&str, TypeRef)]) -> Vec<Argument> {
    args.iter()
        .map(|(name, type_ref)| Argument {
            name: ident(name),
            type_ref: type_ref.clone(),
        })
        .collect()
}

fn attributes(attrs: &[(&str, TypeRef)]) -> Vec<ShaderAttribute> {
    attrs
        .iter()
        .map(|(name, type_ref)| ShaderAttribute {
            name: ident(name),
            type_ref: type_ref.clone(),
        })
        .collect()
}

/// Builds one resolved module
pub struct ModuleBuilder {
    module: Module,
    line: u32,
}

impl ModuleBuilder {
    pub fn new(path: &str) -> Self {
        Self {
            module: Module {
                path: module_path(path),
                imports: Vec::new(),
                types: Default::default(),
                type_order: Vec::new(),
                terms: Default::default(),
                term_order: Vec::new(),
                shaders: Default::default(),
                shader_order: Vec::new(),
            },
            line: 1,
        }
    }

    pub fn name(&self) -> ModuleName {
        self.module.name()
    }

    /// Declarations get consecutive line numbers so traces are distinguishable
    fn declared(&mut self, name: &str) -> Ident {
        let declared = ident_at(name, self.line, 1);
        self.line += 1;
        declared
    }

    pub fn import(mut self, path: &str) -> Self {
        self.module.imports.push(Import {
            path: module_path(path),
            rename: None,
        });
        self
    }

    pub fn record(mut self, name: &str, fields: &[(&str, TypeRef)]) -> Self {
        let declared = self.declared(name);
        self.module.types.insert(
            name.to_string(),
            RecordDecl {
                name: declared,
                fields: fields
                    .iter()
                    .map(|(field, type_ref)| RecordFieldDecl {
                        name: ident(field),
                        type_ref: type_ref.clone(),
                    })
                    .collect(),
            },
        );
        self.module.type_order.insert(0, name.to_string());
        self
    }

    pub fn function(
        mut self,
        name: &str,
        args: &[(&str, TypeRef)],
        result: TypeRef,
        body: Expr,
    ) -> Self {
        let declared = self.declared(name);
        self.term(
            name,
            TermDecl::Function {
                name: declared,
                arguments: arguments(args),
                result,
                body,
            },
        )
    }

    pub fn function_external(
        mut self,
        name: &str,
        args: &[(&str, TypeRef)],
        result: TypeRef,
        external: External,
    ) -> Self {
        let declared = self.declared(name);
        self.term(
            name,
            TermDecl::FunctionExternal {
                name: declared,
                arguments: arguments(args),
                result,
                external,
            },
        )
    }

    pub fn value(mut self, name: &str, ascription: Option<TypeRef>, expr: Expr) -> Self {
        let declared = self.declared(name);
        self.term(
            name,
            TermDecl::Value {
                name: declared,
                ascription,
                expr,
            },
        )
    }

    pub fn value_external(mut self, name: &str, ascription: TypeRef, external: External) -> Self {
        let declared = self.declared(name);
        self.term(
            name,
            TermDecl::ValueExternal {
                name: declared,
                ascription,
                external,
            },
        )
    }

    fn term(mut self, name: &str, decl: TermDecl) -> Self {
        self.module.terms.insert(name.to_string(), decl);
        self.module.term_order.insert(0, name.to_string());
        self
    }

    pub fn shader(mut self, shader: ShaderDecl) -> Self {
        let name = shader.name().name.clone();
        self.module.shaders.insert(name.clone(), shader);
        self.module.shader_order.insert(0, name);
        self
    }

    pub fn build(self) -> Module {
        self.module
    }
}

/// Builds a vertex shader declaration
pub struct VertexShaderBuilder {
    shader: VertexShader,
}

impl VertexShaderBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            shader: VertexShader {
                name: ident(name),
                inputs: Vec::new(),
                outputs: Vec::new(),
                parameters: Vec::new(),
                values: Vec::new(),
                writes: Vec::new(),
            },
        }
    }

    pub fn inputs(mut self, inputs: &[(&str, TypeRef)]) -> Self {
        self.shader.inputs.extend(attributes(inputs));
        self
    }

    pub fn parameters(mut self, parameters: &[(&str, TypeRef)]) -> Self {
        self.shader.parameters.extend(attributes(parameters));
        self
    }

    pub fn main_output(self, name: &str, type_ref: TypeRef) -> Self {
        self.push_output(name, type_ref, true)
    }

    pub fn output(self, name: &str, type_ref: TypeRef) -> Self {
        self.push_output(name, type_ref, false)
    }

    fn push_output(mut self, name: &str, type_ref: TypeRef, main: bool) -> Self {
        self.shader.outputs.push(VertexOutput {
            name: ident(name),
            type_ref,
            main,
        });
        self
    }

    pub fn value(mut self, value: LocalValue) -> Self {
        self.shader.values.push(value);
        self
    }

    pub fn write(mut self, output: &str, variable: TermName) -> Self {
        self.shader.writes.push(OutputAssignment {
            name: ident(output),
            variable,
        });
        self
    }

    pub fn build(self) -> ShaderDecl {
        ShaderDecl::Vertex(self.shader)
    }
}

/// Builds a fragment shader declaration
pub struct FragmentShaderBuilder {
    shader: FragmentShader,
}

impl FragmentShaderBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            shader: FragmentShader {
                name: ident(name),
                inputs: Vec::new(),
                outputs: Vec::new(),
                parameters: Vec::new(),
                locals: Vec::new(),
                writes: Vec::new(),
            },
        }
    }

    pub fn inputs(mut self, inputs: &[(&str, TypeRef)]) -> Self {
        self.shader.inputs.extend(attributes(inputs));
        self
    }

    pub fn parameters(mut self, parameters: &[(&str, TypeRef)]) -> Self {
        self.shader.parameters.extend(attributes(parameters));
        self
    }

    pub fn output(mut self, name: &str, type_ref: TypeRef, index: u32) -> Self {
        self.shader.outputs.push(FragmentOutput::Data {
            name: ident(name),
            type_ref,
            index,
        });
        self
    }

    pub fn depth(mut self, name: &str, type_ref: TypeRef) -> Self {
        self.shader.outputs.push(FragmentOutput::Depth {
            name: ident(name),
            type_ref,
        });
        self
    }

    pub fn value(mut self, value: LocalValue) -> Self {
        self.shader.locals.push(FragmentLocal::Value(value));
        self
    }

    pub fn discard(mut self, expr: Expr) -> Self {
        self.shader.locals.push(FragmentLocal::Discard {
            position: pos(),
            expr,
        });
        self
    }

    pub fn write(mut self, output: &str, variable: TermName) -> Self {
        self.shader.writes.push(OutputAssignment {
            name: ident(output),
            variable,
        });
        self
    }

    pub fn build(self) -> ShaderDecl {
        ShaderDecl::Fragment(self.shader)
    }
}

pub fn program(name: &str, vertex: ShaderRef, fragment: ShaderRef) -> ShaderDecl {
    ShaderDecl::Program(ProgramShader {
        name: ident(name),
        vertex,
        fragment,
    })
}

/// Builds a compilation from modules added dependencies first
#[derive(Default)]
pub struct CompilationBuilder {
    compilation: Compilation,
}

impl CompilationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module(mut self, module: Module) -> Self {
        let name = module.name();
        self.compilation.modules.insert(name.clone(), module);
        self.compilation.order.insert(0, name);
        self
    }

    pub fn build(self) -> Compilation {
        self.compilation
    }
}

/// Writes a compilation as JSON into a fresh temporary directory
///
/// The directory lives as long as the returned guard.
pub fn write_compilation(compilation: &Compilation) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("compilation.json");
    let json = serde_json::to_string_pretty(compilation).unwrap();
    fs::write(&path, json).unwrap();
    (dir, path)
}

/// A small but complete program used across crates
///
/// `com.example.Shading` declares a `light` record, a `brighten` function
/// calling the vertex-and-fragment external `mix`, a pass-through vertex
/// shader, a fragment shader using `brighten`, and a program pairing them.
pub fn shading_program() -> Compilation {
    use expr::*;

    const M: &str = "com.example.Shading";

    let module = ModuleBuilder::new(M)
        .record(
            "light",
            &[("colour", builtin("vector_4f")), ("intensity", builtin("float"))],
        )
        .function_external(
            "mix",
            &[("a", builtin("vector_4f")), ("b", builtin("float"))],
            builtin("vector_4f"),
            external("mix", true, true),
        )
        .function(
            "brighten",
            &[("l", global_type(M, "light"))],
            builtin("vector_4f"),
            apply(
                global(M, "mix"),
                vec![
                    project(var_local("l"), "colour"),
                    project(var_local("l"), "intensity"),
                ],
            ),
        )
        .shader(
            VertexShaderBuilder::new("vert")
                .inputs(&[("position", builtin("vector_4f"))])
                .main_output("clip", builtin("vector_4f"))
                .output("colour", builtin("vector_4f"))
                .write("clip", local("position"))
                .write("colour", local("position"))
                .build(),
        )
        .shader(
            FragmentShaderBuilder::new("frag")
                .inputs(&[("colour", builtin("vector_4f"))])
                .output("out0", builtin("vector_4f"), 0)
                .value(binding(
                    "lit",
                    None,
                    apply(
                        global(M, "brighten"),
                        vec![record(
                            global_type(M, "light"),
                            vec![("colour", var_local("colour")), ("intensity", real(2.0))],
                        )],
                    ),
                ))
                .write("out0", local("lit"))
                .build(),
        )
        .shader(program(
            "main",
            shader_ref(M, "vert"),
            shader_ref(M, "frag"),
        ))
        .build();

    CompilationBuilder::new().module(module).build()
}
