//! Function and value declarations, including externals

use tracing::trace;

use parasol_core::resolved::{Argument, External, TermDecl};
use parasol_core::typed::{
    TypedArgument, TypedExternal, TypedFunction, TypedFunctionExternal, TypedTerm, TypedValue,
    TypedValueExternal,
};
use parasol_core::types::{types_equal, FunctionArgument, FunctionType};
use parasol_core::Type;

use crate::context::Context;
use crate::environment::Environment;
use crate::error::{TypeCheckerError, TypeCheckerErrorKind};
use crate::expr::{check_expr, check_value_type};

type Result<T> = std::result::Result<T, TypeCheckerError>;

pub fn check_term(cx: &Context<'_>, term: &TermDecl) -> Result<TypedTerm> {
    let mut env = Environment::new();
    trace!("checking term {}", term.name());

    match term {
        TermDecl::Function {
            name,
            arguments,
            result,
            body,
        } => {
            let arguments = resolve_arguments(cx, arguments);
            let result_type = cx.resolve_type(result);
            let typed_body = env.scoped(|env| {
                bind_arguments(env, &arguments);
                check_expr(cx, env, body)
            })?;
            if !types_equal(&typed_body.ty, &result_type) {
                return Err(TypeCheckerError::new(
                    body.position().clone(),
                    TypeCheckerErrorKind::FunctionBodyReturnMismatch {
                        expected: result_type,
                        got: typed_body.ty,
                    },
                ));
            }

            Ok(TypedTerm::Function(TypedFunction {
                name: name.clone(),
                ty: function_type(&arguments, result_type),
                arguments,
                result: result.clone(),
                body: typed_body,
            }))
        }

        TermDecl::FunctionExternal {
            name,
            arguments,
            result,
            external,
        } => {
            let arguments = resolve_arguments(cx, arguments);
            let result_type = cx.resolve_type(result);
            let external = env.scoped(|env| {
                bind_arguments(env, &arguments);
                check_emulation(cx, env, external, &result_type, |expected, got| {
                    TypeCheckerErrorKind::FunctionBodyReturnMismatch { expected, got }
                })
            })?;

            Ok(TypedTerm::FunctionExternal(TypedFunctionExternal {
                name: name.clone(),
                ty: function_type(&arguments, result_type),
                arguments,
                result: result.clone(),
                external,
            }))
        }

        TermDecl::Value {
            name,
            ascription,
            expr,
        } => {
            let expr = env.scoped(|env| check_expr(cx, env, expr))?;
            let ty = check_value_type(cx, name, ascription.as_ref(), &expr.ty)?;

            Ok(TypedTerm::Value(TypedValue {
                name: name.clone(),
                ascription: ascription.clone(),
                ty,
                expr,
            }))
        }

        TermDecl::ValueExternal {
            name,
            ascription,
            external,
        } => {
            let ty = cx.resolve_type(ascription);
            let external = env.scoped(|env| {
                check_emulation(cx, env, external, &ty, |expected, got| {
                    TypeCheckerErrorKind::ValueAscriptionMismatch { expected, got }
                })
            })?;

            Ok(TypedTerm::ValueExternal(TypedValueExternal {
                name: name.clone(),
                ascription: ascription.clone(),
                ty,
                external,
            }))
        }
    }
}

fn resolve_arguments(cx: &Context<'_>, arguments: &[Argument]) -> Vec<TypedArgument> {
    arguments
        .iter()
        .map(|argument| TypedArgument {
            name: argument.name.clone(),
            type_ref: argument.type_ref.clone(),
            ty: cx.resolve_type(&argument.type_ref),
        })
        .collect()
}

fn bind_arguments(env: &mut Environment, arguments: &[TypedArgument]) {
    for argument in arguments {
        env.bind(argument.name.as_str(), argument.ty.clone());
    }
}

fn function_type(arguments: &[TypedArgument], result: Type) -> Type {
    Type::Function(FunctionType {
        arguments: arguments
            .iter()
            .map(|argument| FunctionArgument {
                name: argument.name.name.clone(),
                ty: argument.ty.clone(),
            })
            .collect(),
        result: Box::new(result),
    })
}

/// Check an external's emulation, if it has one, against the declared type
fn check_emulation(
    cx: &Context<'_>,
    env: &mut Environment,
    external: &External,
    expected: &Type,
    mismatch: fn(Type, Type) -> TypeCheckerErrorKind,
) -> Result<TypedExternal> {
    let emulation = match &external.emulation {
        Some(expr) => {
            let typed = check_expr(cx, env, expr)?;
            if !types_equal(&typed.ty, expected) {
                return Err(TypeCheckerError::new(
                    expr.position().clone(),
                    mismatch(expected.clone(), typed.ty),
                ));
            }
            Some(typed)
        }
        None => None,
    };

    Ok(TypedExternal {
        name: external.name.clone(),
        vertex: external.vertex,
        fragment: external.fragment,
        emulation,
    })
}
