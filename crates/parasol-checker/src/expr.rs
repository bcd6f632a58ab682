//! Typing rules for expressions

use std::collections::BTreeSet;

use tracing::trace;

use parasol_core::resolved::{Expr, FieldAssignment, LocalValue, TermName, TypeRef};
use parasol_core::typed::{TypedExpr, TypedExprKind, TypedFieldAssignment, TypedLocalValue};
use parasol_core::types::{swizzle_type, types_equal};
use parasol_core::{Ident, Position, Type};

use crate::context::Context;
use crate::environment::Environment;
use crate::error::{TypeCheckerError, TypeCheckerErrorKind};

type Result<T> = std::result::Result<T, TypeCheckerError>;

fn fail<T>(position: &Position, kind: TypeCheckerErrorKind) -> Result<T> {
    Err(TypeCheckerError::new(position.clone(), kind))
}

/// The type of a variable, local or global
pub(crate) fn variable_type(cx: &Context<'_>, env: &Environment, name: &TermName) -> Type {
    match name {
        TermName::Local(ident) => match env.lookup(ident.as_str()) {
            Some(ty) => ty.clone(),
            None => panic!(
                "internal error: unbound local {} at {}",
                ident, ident.position
            ),
        },
        TermName::Global { module, name } => cx.term_type(module, name.as_str()),
    }
}

pub fn check_expr(cx: &Context<'_>, env: &mut Environment, expr: &Expr) -> Result<TypedExpr> {
    match expr {
        Expr::Application { name, arguments } => check_application(cx, env, name, arguments),

        Expr::Boolean { value, position } => Ok(TypedExpr {
            ty: Type::Boolean,
            kind: TypedExprKind::Boolean {
                value: *value,
                position: position.clone(),
            },
        }),

        Expr::Integer { value, position } => Ok(TypedExpr {
            ty: Type::Integer,
            kind: TypedExprKind::Integer {
                value: *value,
                position: position.clone(),
            },
        }),

        Expr::Real { value, position } => Ok(TypedExpr {
            ty: Type::Float,
            kind: TypedExprKind::Real {
                value: *value,
                position: position.clone(),
            },
        }),

        Expr::Conditional {
            position,
            condition,
            left,
            right,
        } => {
            let condition = check_expr(cx, env, condition)?;
            if !types_equal(&condition.ty, &Type::Boolean) {
                return fail(
                    position,
                    TypeCheckerErrorKind::ConditionNotBoolean {
                        got: condition.ty,
                    },
                );
            }
            let left = check_expr(cx, env, left)?;
            let right = check_expr(cx, env, right)?;

            // The branches are not compared; the then-branch decides.
            Ok(TypedExpr {
                ty: left.ty.clone(),
                kind: TypedExprKind::Conditional {
                    position: position.clone(),
                    condition: Box::new(condition),
                    left: Box::new(left),
                    right: Box::new(right),
                },
            })
        }

        Expr::Let {
            position,
            bindings,
            body,
        } => env.scoped(|env| {
            let bindings = bindings
                .iter()
                .map(|binding| check_local_value(cx, env, binding))
                .collect::<Result<Vec<_>>>()?;
            let body = check_expr(cx, env, body)?;
            Ok(TypedExpr {
                ty: body.ty.clone(),
                kind: TypedExprKind::Let {
                    position: position.clone(),
                    bindings,
                    body: Box::new(body),
                },
            })
        }),

        Expr::New {
            type_ref,
            arguments,
        } => check_new(cx, env, type_ref, arguments),

        Expr::Record {
            type_ref,
            assignments,
        } => check_record_literal(cx, env, type_ref, assignments),

        Expr::RecordProjection { body, field } => {
            let body = check_expr(cx, env, body)?;
            let Some(record) = body.ty.as_record() else {
                return fail(
                    &field.position,
                    TypeCheckerErrorKind::RecordProjectionNotRecord {
                        got: body.ty.clone(),
                    },
                );
            };
            let Some(selected) = record.field(field.as_str()) else {
                return fail(
                    &field.position,
                    TypeCheckerErrorKind::RecordProjectionNoSuchField {
                        record: body.ty.clone(),
                        field: field.name.clone(),
                        available: record.field_names(),
                    },
                );
            };
            Ok(TypedExpr {
                ty: selected.ty.clone(),
                kind: TypedExprKind::RecordProjection {
                    body: Box::new(body),
                    field: field.clone(),
                },
            })
        }

        Expr::Swizzle { body, fields } => check_swizzle(cx, env, expr.position(), body, fields),

        Expr::MatrixColumn {
            body,
            column,
            position,
        } => {
            let body = check_expr(cx, env, body)?;
            let Some((columns, column_type)) = body.ty.matrix_columns() else {
                return fail(
                    position,
                    TypeCheckerErrorKind::MatrixColumnNotMatrix { got: body.ty },
                );
            };
            if *column < 0 || *column as usize >= columns {
                return fail(
                    position,
                    TypeCheckerErrorKind::MatrixColumnOutOfBounds {
                        ty: body.ty,
                        column: *column,
                        columns,
                    },
                );
            }
            Ok(TypedExpr {
                ty: column_type,
                kind: TypedExprKind::MatrixColumn {
                    body: Box::new(body),
                    column: *column,
                    position: position.clone(),
                },
            })
        }

        Expr::Variable(name) => Ok(TypedExpr {
            ty: variable_type(cx, env, name),
            kind: TypedExprKind::Variable(name.clone()),
        }),
    }
}

/// Check a local value and bind it in the innermost scope
pub fn check_local_value(
    cx: &Context<'_>,
    env: &mut Environment,
    value: &LocalValue,
) -> Result<TypedLocalValue> {
    let expr = check_expr(cx, env, &value.expr)?;
    let ty = check_value_type(cx, &value.name, value.ascription.as_ref(), &expr.ty)?;
    trace!("local {} : {}", value.name, ty);
    env.bind(value.name.as_str(), ty.clone());

    Ok(TypedLocalValue {
        name: value.name.clone(),
        ascription: value.ascription.clone(),
        ty,
        expr,
    })
}

/// The type of a value with an optional ascription, given its inferred type
pub(crate) fn check_value_type(
    cx: &Context<'_>,
    name: &Ident,
    ascription: Option<&TypeRef>,
    inferred: &Type,
) -> Result<Type> {
    if !inferred.is_value() {
        return fail(
            &name.position,
            TypeCheckerErrorKind::ValueNonValueType {
                ty: inferred.clone(),
            },
        );
    }

    if let Some(type_ref) = ascription {
        let expected = cx.resolve_type(type_ref);
        if !types_equal(&expected, inferred) {
            return fail(
                &type_ref.ident().position,
                TypeCheckerErrorKind::ValueAscriptionMismatch {
                    expected,
                    got: inferred.clone(),
                },
            );
        }
    }

    Ok(inferred.clone())
}

fn check_application(
    cx: &Context<'_>,
    env: &mut Environment,
    name: &TermName,
    arguments: &[Expr],
) -> Result<TypedExpr> {
    let position = &name.ident().position;
    let callee = variable_type(cx, env, name);
    let Some(function) = callee.as_function() else {
        return fail(
            position,
            TypeCheckerErrorKind::ApplicationNotFunction {
                name: name.ident().name.clone(),
                ty: callee.clone(),
            },
        );
    };

    let arguments = arguments
        .iter()
        .map(|argument| check_expr(cx, env, argument))
        .collect::<Result<Vec<_>>>()?;

    let expected = function.argument_types();
    let got: Vec<Type> = arguments.iter().map(|a| a.ty.clone()).collect();
    let matches = expected.len() == got.len()
        && expected.iter().zip(&got).all(|(e, g)| types_equal(e, g));
    if !matches {
        return fail(
            position,
            TypeCheckerErrorKind::ApplicationBadTypes {
                function: name.ident().name.clone(),
                expected,
                got,
            },
        );
    }

    Ok(TypedExpr {
        ty: (*function.result).clone(),
        kind: TypedExprKind::Application {
            name: name.clone(),
            arguments,
        },
    })
}

fn check_new(
    cx: &Context<'_>,
    env: &mut Environment,
    type_ref: &TypeRef,
    arguments: &[Expr],
) -> Result<TypedExpr> {
    let position = &type_ref.ident().position;
    let ty = cx.resolve_type(type_ref);
    let available = ty.constructors();
    if available.is_empty() {
        return fail(position, TypeCheckerErrorKind::TypeNotConstructable { ty });
    }

    let arguments = arguments
        .iter()
        .map(|argument| check_expr(cx, env, argument))
        .collect::<Result<Vec<_>>>()?;
    let got: Vec<Type> = arguments.iter().map(|a| a.ty.clone()).collect();

    // First match in declaration order.
    match available.iter().find(|constructor| constructor.accepts(&got)) {
        Some(constructor) => {
            trace!("new {} selected constructor {}", ty, constructor);
            Ok(TypedExpr {
                ty,
                kind: TypedExprKind::New {
                    type_ref: type_ref.clone(),
                    arguments,
                },
            })
        }
        None => fail(
            position,
            TypeCheckerErrorKind::NoAppropriateConstructor {
                ty,
                got,
                available,
            },
        ),
    }
}

fn check_record_literal(
    cx: &Context<'_>,
    env: &mut Environment,
    type_ref: &TypeRef,
    assignments: &[FieldAssignment],
) -> Result<TypedExpr> {
    let position = &type_ref.ident().position;
    let ty = cx.resolve_type(type_ref);
    let Some(record) = ty.as_record() else {
        return fail(
            position,
            TypeCheckerErrorKind::RecordNotRecordType { ty: ty.clone() },
        );
    };

    let mut assigned = BTreeSet::new();
    let mut typed = Vec::with_capacity(assignments.len());

    for assignment in assignments {
        let field_name = assignment.name.as_str();
        let Some(field) = record.field(field_name) else {
            return fail(
                &assignment.name.position,
                TypeCheckerErrorKind::RecordFieldUnknown {
                    record: ty.clone(),
                    field: field_name.to_string(),
                },
            );
        };
        if !assigned.insert(field_name) {
            return fail(
                &assignment.name.position,
                TypeCheckerErrorKind::RecordFieldDuplicate {
                    record: ty.clone(),
                    field: field_name.to_string(),
                },
            );
        }

        let expr = check_expr(cx, env, &assignment.expr)?;
        if !types_equal(&field.ty, &expr.ty) {
            return fail(
                assignment.expr.position(),
                TypeCheckerErrorKind::RecordFieldBadType {
                    record: ty.clone(),
                    field: field_name.to_string(),
                    expected: field.ty.clone(),
                    got: expr.ty,
                },
            );
        }

        typed.push(TypedFieldAssignment {
            name: assignment.name.clone(),
            expr,
        });
    }

    let unassigned: Vec<String> = record
        .fields
        .iter()
        .filter(|field| !assigned.contains(field.name.as_str()))
        .map(|field| field.name.clone())
        .collect();
    if !unassigned.is_empty() {
        return fail(
            position,
            TypeCheckerErrorKind::RecordFieldsUnassigned {
                record: ty.clone(),
                fields: unassigned,
            },
        );
    }

    Ok(TypedExpr {
        ty: ty.clone(),
        kind: TypedExprKind::Record {
            type_ref: type_ref.clone(),
            assignments: typed,
        },
    })
}

fn check_swizzle(
    cx: &Context<'_>,
    env: &mut Environment,
    position: &Position,
    body: &Expr,
    fields: &[Ident],
) -> Result<TypedExpr> {
    let body = check_expr(cx, env, body)?;
    let Some(names) = body.ty.component_names() else {
        return fail(
            position,
            TypeCheckerErrorKind::SwizzleNotVector { got: body.ty },
        );
    };

    if fields.len() > 4 {
        return fail(
            position,
            TypeCheckerErrorKind::SwizzleTooManyComponents {
                count: fields.len(),
            },
        );
    }
    if fields.is_empty() {
        panic!("internal error: swizzle without components at {}", position);
    }

    for field in fields {
        if !names.iter().any(|name| *name == field.as_str()) {
            return fail(
                &field.position,
                TypeCheckerErrorKind::SwizzleUnknownComponent {
                    ty: body.ty.clone(),
                    component: field.name.clone(),
                    available: names.iter().map(|name| name.to_string()).collect(),
                },
            );
        }
    }

    Ok(TypedExpr {
        ty: swizzle_type(&body.ty, fields.len()),
        kind: TypedExprKind::Swizzle {
            body: Box::new(body),
            fields: fields.to_vec(),
        },
    })
}
