//! Populating the dependency graphs from checked modules
//!
//! The walk threads an explicit `&mut DependencyGraphs` through a handful
//! of functions, one per declaration kind, and a single expression walker
//! parameterised by who is doing the referencing.

use tracing::{debug, trace};

use parasol_core::resolved::{TermName, TypeRef};
use parasol_core::typed::{
    TypedAttribute, TypedExpr, TypedExprKind, TypedFragmentLocal, TypedFragmentOutput,
    TypedLocalValue, TypedModule, TypedOutputAssignment, TypedRecord, TypedShader, TypedTerm,
};
use parasol_core::{FlatName, ModuleName, Position, Type};

use crate::graphs::DependencyGraphs;

/// Accumulates [`DependencyGraphs`] one checked module at a time
#[derive(Debug, Default)]
pub struct DependencyGraphBuilder {
    graphs: DependencyGraphs,
}

impl DependencyGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every declaration of a module and everything it refers to
    pub fn add_module(&mut self, module: &TypedModule) {
        let module_name = module.name();
        debug!(
            "Adding module {} to dependency graphs ({} types, {} terms, {} shaders)",
            module_name,
            module.types.len(),
            module.terms.len(),
            module.shaders.len()
        );

        for name in module.type_order.iter().rev() {
            if let Some(record) = module.types.get(name) {
                add_record(&mut self.graphs, &module_name, record);
            }
        }

        for name in module.term_order.iter().rev() {
            if let Some(term) = module.terms.get(name) {
                add_term(&mut self.graphs, &module_name, term);
            }
        }

        for name in module.shader_order.iter().rev() {
            if let Some(shader) = module.shaders.get(name) {
                add_shader(&mut self.graphs, &module_name, shader);
            }
        }
    }

    pub fn graphs(&self) -> &DependencyGraphs {
        &self.graphs
    }

    pub fn graphs_mut(&mut self) -> &mut DependencyGraphs {
        &mut self.graphs
    }

    pub fn finish(self) -> DependencyGraphs {
        self.graphs
    }
}

/// The declaration on the referencing side of an edge
#[derive(Debug, Clone, Copy)]
enum Source<'a> {
    Term(&'a FlatName),
    Shader(&'a FlatName),
}

impl Source<'_> {
    fn refer_term(self, graphs: &mut DependencyGraphs, name: &TermName) {
        let Some(target) = name.flat() else {
            return;
        };
        let position = name.ident().position.clone();
        trace!("{:?} -> term {} at {}", self, target, position);
        match self {
            Source::Term(source) => {
                graphs.add_term_term_reference(source.clone(), target, position)
            }
            Source::Shader(source) => {
                graphs.add_shader_term_reference(source.clone(), target, position)
            }
        }
    }

    fn refer_type(self, graphs: &mut DependencyGraphs, ty: &Type, position: &Position) {
        let Some(record) = ty.as_record() else {
            return;
        };
        let target = record.name.clone();
        trace!("{:?} -> type {} at {}", self, target, position);
        match self {
            Source::Term(source) => {
                graphs.add_term_type_reference(source.clone(), target, position.clone())
            }
            Source::Shader(source) => {
                graphs.add_shader_type_reference(source.clone(), target, position.clone())
            }
        }
    }
}

fn add_record(graphs: &mut DependencyGraphs, module: &ModuleName, record: &TypedRecord) {
    let name = module.qualify(record.name.as_str());
    graphs.add_type(name.clone());

    for field in &record.fields {
        if let Some(target) = field.ty.as_record() {
            trace!("type {} -> type {}", name, target.name);
            graphs.add_type_type_reference(
                name.clone(),
                target.name.clone(),
                type_ref_position(&field.type_ref),
            );
        }
    }
}

fn add_term(graphs: &mut DependencyGraphs, module: &ModuleName, term: &TypedTerm) {
    let name = module.qualify(term.name().as_str());
    graphs.add_term(name.clone());
    let source = Source::Term(&name);

    match term {
        TypedTerm::Function(function) => {
            for argument in &function.arguments {
                source.refer_type(graphs, &argument.ty, &type_ref_position(&argument.type_ref));
            }
            if let Some(function_type) = function.ty.as_function() {
                source.refer_type(
                    graphs,
                    &function_type.result,
                    &type_ref_position(&function.result),
                );
            }
            walk_expr(graphs, source, &function.body);
        }
        TypedTerm::FunctionExternal(external) => {
            for argument in &external.arguments {
                source.refer_type(graphs, &argument.ty, &type_ref_position(&argument.type_ref));
            }
            if let Some(function_type) = external.ty.as_function() {
                source.refer_type(
                    graphs,
                    &function_type.result,
                    &type_ref_position(&external.result),
                );
            }
        }
        TypedTerm::Value(value) => {
            let position = match &value.ascription {
                Some(type_ref) => type_ref_position(type_ref),
                None => value.name.position.clone(),
            };
            source.refer_type(graphs, &value.ty, &position);
            walk_expr(graphs, source, &value.expr);
        }
        TypedTerm::ValueExternal(external) => {
            source.refer_type(graphs, &external.ty, &type_ref_position(&external.ascription));
        }
    }
}

fn add_shader(graphs: &mut DependencyGraphs, module: &ModuleName, shader: &TypedShader) {
    let name = module.qualify(shader.name().as_str());
    graphs.add_shader(name.clone());
    let source = Source::Shader(&name);

    match shader {
        TypedShader::Vertex(vertex) => {
            walk_attributes(graphs, source, &vertex.inputs);
            walk_attributes(graphs, source, &vertex.parameters);
            for output in &vertex.outputs {
                source.refer_type(graphs, &output.ty, &type_ref_position(&output.type_ref));
            }
            for value in &vertex.values {
                walk_local_value(graphs, source, value);
            }
            walk_writes(graphs, source, &vertex.writes);
        }
        TypedShader::Fragment(fragment) => {
            walk_attributes(graphs, source, &fragment.inputs);
            walk_attributes(graphs, source, &fragment.parameters);
            for output in &fragment.outputs {
                let type_ref = match output {
                    TypedFragmentOutput::Data { type_ref, .. }
                    | TypedFragmentOutput::Depth { type_ref, .. } => type_ref,
                };
                source.refer_type(graphs, output.ty(), &type_ref_position(type_ref));
            }
            for local in &fragment.locals {
                match local {
                    TypedFragmentLocal::Value(value) => walk_local_value(graphs, source, value),
                    TypedFragmentLocal::Discard { expr, .. } => walk_expr(graphs, source, expr),
                }
            }
            walk_writes(graphs, source, &fragment.writes);
        }
        TypedShader::Program(program) => {
            for stage in [&program.vertex, &program.fragment] {
                let target = stage.flat();
                trace!("shader {} -> shader {}", name, target);
                graphs.add_shader_shader_reference(
                    name.clone(),
                    target,
                    stage.name.position.clone(),
                );
            }
        }
    }
}

fn walk_attributes(
    graphs: &mut DependencyGraphs,
    source: Source<'_>,
    attributes: &[TypedAttribute],
) {
    for attribute in attributes {
        source.refer_type(graphs, &attribute.ty, &type_ref_position(&attribute.type_ref));
    }
}

fn walk_writes(
    graphs: &mut DependencyGraphs,
    source: Source<'_>,
    writes: &[TypedOutputAssignment],
) {
    for write in writes {
        source.refer_term(graphs, &write.variable);
    }
}

fn walk_local_value(graphs: &mut DependencyGraphs, source: Source<'_>, value: &TypedLocalValue) {
    let position = match &value.ascription {
        Some(type_ref) => type_ref_position(type_ref),
        None => value.name.position.clone(),
    };
    source.refer_type(graphs, &value.ty, &position);
    walk_expr(graphs, source, &value.expr);
}

fn walk_expr(graphs: &mut DependencyGraphs, source: Source<'_>, expr: &TypedExpr) {
    match &expr.kind {
        TypedExprKind::Application { name, arguments } => {
            source.refer_term(graphs, name);
            for argument in arguments {
                walk_expr(graphs, source, argument);
            }
        }
        TypedExprKind::Boolean { .. }
        | TypedExprKind::Integer { .. }
        | TypedExprKind::Real { .. } => {}
        TypedExprKind::Conditional {
            condition,
            left,
            right,
            ..
        } => {
            walk_expr(graphs, source, condition);
            walk_expr(graphs, source, left);
            walk_expr(graphs, source, right);
        }
        TypedExprKind::Let { bindings, body, .. } => {
            for binding in bindings {
                walk_local_value(graphs, source, binding);
            }
            walk_expr(graphs, source, body);
        }
        TypedExprKind::New {
            type_ref,
            arguments,
        } => {
            source.refer_type(graphs, &expr.ty, &type_ref_position(type_ref));
            for argument in arguments {
                walk_expr(graphs, source, argument);
            }
        }
        TypedExprKind::Record {
            type_ref,
            assignments,
        } => {
            source.refer_type(graphs, &expr.ty, &type_ref_position(type_ref));
            for assignment in assignments {
                source.refer_type(graphs, &assignment.expr.ty, &assignment.name.position);
                walk_expr(graphs, source, &assignment.expr);
            }
        }
        TypedExprKind::RecordProjection { body, .. }
        | TypedExprKind::Swizzle { body, .. }
        | TypedExprKind::MatrixColumn { body, .. } => walk_expr(graphs, source, body),
        TypedExprKind::Variable(name) => source.refer_term(graphs, name),
    }
}

fn type_ref_position(type_ref: &TypeRef) -> Position {
    type_ref.ident().position.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parasol_core::resolved::ShaderRef;
    use parasol_core::typed::{
        TypedArgument, TypedExternal, TypedFieldAssignment, TypedFunction, TypedFunctionExternal,
        TypedProgramShader, TypedRecordField, TypedValue,
    };
    use parasol_core::types::{FunctionArgument, FunctionType, RecordType, RecordTypeField};
    use parasol_test_fixtures::{builtin, global, global_type, ident, module_path, pos};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    const M: &str = "com.example.M";

    fn n(name: &str) -> FlatName {
        ModuleName::new(M).qualify(name)
    }

    fn record_type(name: &str, fields: &[(&str, Type)]) -> Type {
        Type::Record(RecordType {
            name: n(name),
            fields: fields
                .iter()
                .map(|(field, ty)| RecordTypeField {
                    name: field.to_string(),
                    ty: ty.clone(),
                })
                .collect(),
        })
    }

    fn typed(ty: Type, kind: TypedExprKind) -> TypedExpr {
        TypedExpr { ty, kind }
    }

    fn real(value: f64) -> TypedExpr {
        typed(
            Type::Float,
            TypedExprKind::Real {
                value,
                position: pos(),
            },
        )
    }

    fn call(name: &str, ty: Type) -> TypedExpr {
        typed(
            ty,
            TypedExprKind::Application {
                name: global(M, name),
                arguments: vec![],
            },
        )
    }

    fn module(
        types: Vec<TypedRecord>,
        terms: Vec<TypedTerm>,
        shaders: Vec<TypedShader>,
    ) -> TypedModule {
        // Declarations are given dependencies first; the orders list them reversed.
        let type_order = types.iter().rev().map(|t| t.name.name.clone()).collect();
        let term_order = terms.iter().rev().map(|t| t.name().name.clone()).collect();
        let shader_order = shaders.iter().rev().map(|s| s.name().name.clone()).collect();
        TypedModule {
            path: module_path(M),
            imports: vec![],
            types: types
                .into_iter()
                .map(|t| (t.name.name.clone(), t))
                .collect::<BTreeMap<_, _>>(),
            type_order,
            terms: terms
                .into_iter()
                .map(|t| (t.name().name.clone(), t))
                .collect(),
            term_order,
            shaders: shaders
                .into_iter()
                .map(|s| (s.name().name.clone(), s))
                .collect(),
            shader_order,
        }
    }

    fn thunk(name: &str, result: Type, body: TypedExpr) -> TypedTerm {
        TypedTerm::Function(TypedFunction {
            name: ident(name),
            arguments: vec![],
            result: builtin("float"),
            ty: Type::Function(FunctionType {
                arguments: vec![],
                result: Box::new(result),
            }),
            body,
        })
    }

    #[test]
    fn test_record_fields_reference_records() {
        let inner = record_type("inner", &[("x", Type::Float)]);
        let records = vec![
            TypedRecord {
                name: ident("inner"),
                ty: inner.clone(),
                fields: vec![TypedRecordField {
                    name: ident("x"),
                    type_ref: builtin("float"),
                    ty: Type::Float,
                }],
            },
            TypedRecord {
                name: ident("outer"),
                ty: record_type("outer", &[("i", inner.clone())]),
                fields: vec![TypedRecordField {
                    name: ident("i"),
                    type_ref: global_type(M, "inner"),
                    ty: inner,
                }],
            },
        ];

        let mut builder = DependencyGraphBuilder::new();
        builder.add_module(&module(records, vec![], vec![]));
        let graphs = builder.finish();

        assert_eq!(graphs.type_types(&n("outer")), vec![&n("inner")]);
        assert!(graphs.type_types(&n("inner")).is_empty());
        assert!(graphs.contains_type(&n("inner")));
    }

    #[test]
    fn test_function_bodies_reference_terms_and_types() {
        let point = record_type("point", &[("x", Type::Float)]);
        let terms = vec![
            thunk("leaf", Type::Float, real(1.0)),
            TypedTerm::Value(TypedValue {
                name: ident("origin"),
                ascription: None,
                ty: point.clone(),
                expr: typed(
                    point.clone(),
                    TypedExprKind::Record {
                        type_ref: global_type(M, "point"),
                        assignments: vec![TypedFieldAssignment {
                            name: ident("x"),
                            expr: call("leaf", Type::Float),
                        }],
                    },
                ),
            }),
            TypedTerm::Function(TypedFunction {
                name: ident("norm"),
                arguments: vec![TypedArgument {
                    name: ident("p"),
                    type_ref: global_type(M, "point"),
                    ty: point.clone(),
                }],
                result: builtin("float"),
                ty: Type::Function(FunctionType {
                    arguments: vec![FunctionArgument {
                        name: "p".to_string(),
                        ty: point.clone(),
                    }],
                    result: Box::new(Type::Float),
                }),
                body: typed(
                    Type::Float,
                    TypedExprKind::RecordProjection {
                        body: Box::new(typed(
                            point,
                            TypedExprKind::Variable(global(M, "origin")),
                        )),
                        field: ident("x"),
                    },
                ),
            }),
        ];

        let mut builder = DependencyGraphBuilder::new();
        builder.add_module(&module(vec![], terms, vec![]));
        let graphs = builder.finish();

        assert_eq!(graphs.term_terms(&n("norm")), vec![&n("origin")]);
        assert_eq!(graphs.term_terms(&n("origin")), vec![&n("leaf")]);
        assert_eq!(graphs.term_types(&n("norm")), vec![&n("point")]);
        assert_eq!(graphs.term_types(&n("origin")), vec![&n("point")]);
        assert!(graphs.term_types(&n("leaf")).is_empty());
        assert!(graphs.contains_type(&n("point")));
    }

    #[test]
    fn test_external_emulation_is_not_walked() {
        let terms = vec![
            thunk("helper", Type::Float, real(0.0)),
            TypedTerm::FunctionExternal(TypedFunctionExternal {
                name: ident("ext"),
                arguments: vec![],
                result: builtin("float"),
                ty: Type::Function(FunctionType {
                    arguments: vec![],
                    result: Box::new(Type::Float),
                }),
                external: TypedExternal {
                    name: ident("ext"),
                    vertex: true,
                    fragment: true,
                    emulation: Some(call("helper", Type::Float)),
                },
            }),
        ];

        let mut builder = DependencyGraphBuilder::new();
        builder.add_module(&module(vec![], terms, vec![]));
        let graphs = builder.finish();

        assert!(graphs.contains_term(&n("ext")));
        assert!(graphs.term_terms(&n("ext")).is_empty());
    }

    #[test]
    fn test_program_links_its_stages() {
        let shaders = vec![TypedShader::Program(TypedProgramShader {
            name: ident("main"),
            vertex: ShaderRef {
                module: ModuleName::new(M),
                name: ident("vert"),
            },
            fragment: ShaderRef {
                module: ModuleName::new(M),
                name: ident("frag"),
            },
        })];

        let mut builder = DependencyGraphBuilder::new();
        builder.add_module(&module(vec![], vec![], shaders));
        let graphs = builder.graphs();

        assert!(graphs.contains_shader(&n("main")));
        assert_eq!(graphs.shader_shaders(&n("main")), vec![&n("vert"), &n("frag")]);
    }
}
