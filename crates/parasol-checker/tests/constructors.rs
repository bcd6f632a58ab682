//! `new` against every built-in constructor signature

use parasol_checker::{check_compilation, TypeCheckerErrorKind};
use parasol_core::resolved::Expr;
use parasol_core::types::base_types;
use parasol_core::{ModuleName, Type};
use parasol_test_fixtures::expr::*;
use parasol_test_fixtures::{builtin, CompilationBuilder, ModuleBuilder};
use proptest::prelude::*;

const M: &str = "com.example.Main";

/// Some expression of a constructable type, built from scalar literals
fn sample(ty: &Type) -> Expr {
    match ty {
        Type::Boolean => boolean(true),
        Type::Integer => int(1),
        Type::Float => real(1.0),
        other => {
            let name = other.builtin_name().unwrap();
            let first = &other.constructors()[0];
            new_(builtin(name), first.parameters.iter().map(sample).collect())
        }
    }
}

fn check_value(expr: Expr) -> Result<Type, TypeCheckerErrorKind> {
    let module = ModuleBuilder::new(M).value("v", None, expr).build();
    let checked = check_compilation(&CompilationBuilder::new().module(module).build())
        .map_err(|error| error.kind)?;
    let term = checked
        .compilation
        .term(&ModuleName::new(M).qualify("v"))
        .unwrap();
    Ok(term.ty().clone())
}

fn constructable() -> Vec<(&'static str, Type)> {
    base_types()
        .into_iter()
        .filter(|(_, ty)| !ty.constructors().is_empty())
        .collect()
}

proptest! {
    #[test]
    fn prop_every_constructor_is_accepted(
        (type_index, constructor_index) in (0usize..64, 0usize..64)
    ) {
        let types = constructable();
        let (name, ty) = &types[type_index % types.len()];
        let constructors = ty.constructors();
        let constructor = &constructors[constructor_index % constructors.len()];

        let arguments = constructor.parameters.iter().map(sample).collect();
        prop_assert_eq!(check_value(new_(builtin(name), arguments)), Ok(ty.clone()));
    }

    #[test]
    fn prop_rejected_arguments_list_every_constructor(
        type_index in 0usize..64,
        extra in 1usize..3
    ) {
        let types = constructable();
        let (name, ty) = &types[type_index % types.len()];

        // No constructor takes more than four arguments.
        let arguments = (0..4 + extra).map(|_| real(1.0)).collect();
        let result = check_value(new_(builtin(name), arguments));
        prop_assert_eq!(
            result,
            Err(TypeCheckerErrorKind::NoAppropriateConstructor {
                ty: ty.clone(),
                got: vec![Type::Float; 4 + extra],
                available: ty.constructors(),
            })
        );
    }
}

#[test]
fn test_samplers_have_no_constructors() {
    let names: Vec<_> = constructable().into_iter().map(|(name, _)| name).collect();
    assert!(!names.contains(&"sampler_2d"));
    assert!(!names.contains(&"sampler_cube"));
    assert_eq!(names.len(), 11);
}
