//! Vertex, fragment and program shaders

use tracing::{debug, trace};

use parasol_core::resolved::{
    FragmentLocal, FragmentOutput, FragmentShader, OutputAssignment, ProgramShader,
    ShaderAttribute, ShaderDecl, ShaderRef, TypeRef, VertexShader,
};
use parasol_core::typed::{
    ShaderKind, TypedAttribute, TypedFragmentLocal, TypedFragmentOutput, TypedFragmentShader,
    TypedOutputAssignment, TypedProgramShader, TypedShader, TypedVertexOutput, TypedVertexShader,
};
use parasol_core::types::types_equal;
use parasol_core::{Ident, Type};

use crate::context::Context;
use crate::environment::Environment;
use crate::error::{LinkProblem, TypeCheckerError, TypeCheckerErrorKind};
use crate::expr::{check_expr, check_local_value, variable_type};

type Result<T> = std::result::Result<T, TypeCheckerError>;

pub fn check_shader(cx: &Context<'_>, shader: &ShaderDecl) -> Result<TypedShader> {
    trace!("checking shader {}", shader.name());
    match shader {
        ShaderDecl::Vertex(vertex) => check_vertex(cx, vertex).map(TypedShader::Vertex),
        ShaderDecl::Fragment(fragment) => check_fragment(cx, fragment).map(TypedShader::Fragment),
        ShaderDecl::Program(program) => check_program(cx, program).map(TypedShader::Program),
    }
}

/// Resolve an input, parameter or output type; records are not allowed
fn attribute_type(
    cx: &Context<'_>,
    stage: ShaderKind,
    name: &Ident,
    type_ref: &TypeRef,
) -> Result<Type> {
    let ty = cx.resolve_type(type_ref);
    if ty.is_record() {
        return Err(TypeCheckerError::new(
            type_ref.ident().position.clone(),
            TypeCheckerErrorKind::ShaderBadAttributeType {
                stage,
                name: name.name.clone(),
                ty,
            },
        ));
    }
    Ok(ty)
}

/// Resolve and bind inputs or parameters
fn check_attributes(
    cx: &Context<'_>,
    env: &mut Environment,
    stage: ShaderKind,
    attributes: &[ShaderAttribute],
) -> Result<Vec<TypedAttribute>> {
    attributes
        .iter()
        .map(|attribute| {
            let ty = attribute_type(cx, stage, &attribute.name, &attribute.type_ref)?;
            env.bind(attribute.name.as_str(), ty.clone());
            Ok(TypedAttribute {
                name: attribute.name.clone(),
                type_ref: attribute.type_ref.clone(),
                ty,
            })
        })
        .collect()
}

/// Check `out name = variable` against the declared output types
fn check_writes<'o>(
    cx: &Context<'_>,
    env: &Environment,
    writes: &[OutputAssignment],
    outputs: impl Fn(&str) -> Option<&'o Type>,
) -> Result<Vec<TypedOutputAssignment>> {
    writes
        .iter()
        .map(|write| {
            let Some(expected) = outputs(write.name.as_str()) else {
                panic!(
                    "internal error: write to undeclared output {} at {}",
                    write.name, write.name.position
                );
            };
            let ty = variable_type(cx, env, &write.variable);
            if !types_equal(expected, &ty) {
                return Err(TypeCheckerError::new(
                    write.variable.ident().position.clone(),
                    TypeCheckerErrorKind::ShaderAssignmentBadType {
                        output: write.name.name.clone(),
                        expected: expected.clone(),
                        got: ty,
                    },
                ));
            }
            Ok(TypedOutputAssignment {
                name: write.name.clone(),
                variable: write.variable.clone(),
                ty,
            })
        })
        .collect()
}

fn check_vertex(cx: &Context<'_>, shader: &VertexShader) -> Result<TypedVertexShader> {
    let stage = ShaderKind::Vertex;
    let mut env = Environment::new();

    env.scoped(|env| {
        let inputs = check_attributes(cx, env, stage, &shader.inputs)?;
        let parameters = check_attributes(cx, env, stage, &shader.parameters)?;

        let mut outputs = Vec::with_capacity(shader.outputs.len());
        for output in &shader.outputs {
            let ty = attribute_type(cx, stage, &output.name, &output.type_ref)?;
            if output.main && !types_equal(&ty, &Type::Vector4F) {
                return Err(TypeCheckerError::new(
                    output.type_ref.ident().position.clone(),
                    TypeCheckerErrorKind::ShaderOutputMainBadType {
                        name: output.name.name.clone(),
                        got: ty,
                    },
                ));
            }
            outputs.push(TypedVertexOutput {
                name: output.name.clone(),
                type_ref: output.type_ref.clone(),
                ty,
                main: output.main,
            });
        }

        let values = shader
            .values
            .iter()
            .map(|value| check_local_value(cx, env, value))
            .collect::<Result<Vec<_>>>()?;

        let writes = check_writes(cx, env, &shader.writes, |name| {
            outputs
                .iter()
                .find(|output| output.name.as_str() == name)
                .map(|output| &output.ty)
        })?;

        Ok(TypedVertexShader {
            name: shader.name.clone(),
            inputs,
            outputs,
            parameters,
            values,
            writes,
        })
    })
}

fn check_fragment(cx: &Context<'_>, shader: &FragmentShader) -> Result<TypedFragmentShader> {
    let stage = ShaderKind::Fragment;
    let mut env = Environment::new();

    env.scoped(|env| {
        let inputs = check_attributes(cx, env, stage, &shader.inputs)?;
        let parameters = check_attributes(cx, env, stage, &shader.parameters)?;

        let mut outputs = Vec::with_capacity(shader.outputs.len());
        for output in &shader.outputs {
            let typed = match output {
                FragmentOutput::Data {
                    name,
                    type_ref,
                    index,
                } => TypedFragmentOutput::Data {
                    name: name.clone(),
                    type_ref: type_ref.clone(),
                    ty: attribute_type(cx, stage, name, type_ref)?,
                    index: *index,
                },
                FragmentOutput::Depth { name, type_ref } => {
                    let ty = attribute_type(cx, stage, name, type_ref)?;
                    if !types_equal(&ty, &Type::Float) {
                        return Err(TypeCheckerError::new(
                            type_ref.ident().position.clone(),
                            TypeCheckerErrorKind::ShaderDepthNotFloat {
                                name: name.name.clone(),
                                got: ty,
                            },
                        ));
                    }
                    TypedFragmentOutput::Depth {
                        name: name.clone(),
                        type_ref: type_ref.clone(),
                        ty,
                    }
                }
            };
            outputs.push(typed);
        }

        let mut locals = Vec::with_capacity(shader.locals.len());
        for local in &shader.locals {
            let typed = match local {
                FragmentLocal::Value(value) => {
                    TypedFragmentLocal::Value(check_local_value(cx, env, value)?)
                }
                FragmentLocal::Discard { position, expr } => {
                    let typed = check_expr(cx, env, expr)?;
                    if !types_equal(&typed.ty, &Type::Boolean) {
                        return Err(TypeCheckerError::new(
                            position.clone(),
                            TypeCheckerErrorKind::ShaderDiscardNotBoolean { got: typed.ty },
                        ));
                    }
                    TypedFragmentLocal::Discard {
                        position: position.clone(),
                        expr: typed,
                    }
                }
            };
            locals.push(typed);
        }

        let writes = check_writes(cx, env, &shader.writes, |name| {
            outputs
                .iter()
                .find(|output| output.name().as_str() == name)
                .map(TypedFragmentOutput::ty)
        })?;

        Ok(TypedFragmentShader {
            name: shader.name.clone(),
            inputs,
            outputs,
            parameters,
            locals,
            writes,
        })
    })
}

fn wrong_stage(reference: &ShaderRef, expected: ShaderKind, got: ShaderKind) -> TypeCheckerError {
    TypeCheckerError::new(
        reference.name.position.clone(),
        TypeCheckerErrorKind::ShaderWrongShaderType {
            name: reference.flat().to_string(),
            expected,
            got,
        },
    )
}

/// Pair a vertex and a fragment shader
///
/// Every fragment input must be written by a vertex output of the same
/// name and type. All mismatches are collected before failing.
fn check_program(cx: &Context<'_>, program: &ProgramShader) -> Result<TypedProgramShader> {
    let vertex = match cx.shader(&program.vertex) {
        TypedShader::Vertex(vertex) => vertex,
        other => {
            return Err(wrong_stage(
                &program.vertex,
                ShaderKind::Vertex,
                other.kind(),
            ))
        }
    };
    let fragment = match cx.shader(&program.fragment) {
        TypedShader::Fragment(fragment) => fragment,
        other => {
            return Err(wrong_stage(
                &program.fragment,
                ShaderKind::Fragment,
                other.kind(),
            ))
        }
    };

    let mut problems = Vec::new();
    for input in &fragment.inputs {
        match vertex
            .outputs
            .iter()
            .find(|output| output.name.as_str() == input.name.as_str())
        {
            None => problems.push(LinkProblem::Unassigned {
                input: input.name.name.clone(),
                ty: input.ty.clone(),
            }),
            Some(output) if !types_equal(&output.ty, &input.ty) => {
                problems.push(LinkProblem::WrongType {
                    input: input.name.name.clone(),
                    vertex: output.ty.clone(),
                    fragment: input.ty.clone(),
                })
            }
            Some(_) => {}
        }
    }

    if !problems.is_empty() {
        debug!(
            "Program {} has {} linking problems",
            program.name,
            problems.len()
        );
        return Err(TypeCheckerError::new(
            program.name.position.clone(),
            TypeCheckerErrorKind::ShadersIncompatible {
                program: program.name.name.clone(),
                problems,
            },
        ));
    }

    Ok(TypedProgramShader {
        name: program.name.clone(),
        vertex: program.vertex.clone(),
        fragment: program.fragment.clone(),
    })
}
