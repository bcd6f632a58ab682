//! Lexical scopes for local names

use std::collections::BTreeMap;

use parasol_core::Type;

/// A stack of scopes mapping local names to their types
///
/// Lookups search the innermost scope first, so inner bindings shadow
/// outer ones.
#[derive(Debug, Default)]
pub struct Environment {
    scopes: Vec<BTreeMap<String, Type>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.scopes.push(BTreeMap::new());
    }

    /// # Panics
    ///
    /// Panics if no scope is open.
    pub fn pop(&mut self) {
        if self.scopes.pop().is_none() {
            panic!("internal error: popped an empty environment");
        }
    }

    /// Run `f` in a fresh scope that is popped again afterwards, whatever
    /// `f` returns
    pub fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.push();
        let result = f(self);
        self.pop();
        result
    }

    /// Bind a name in the innermost scope
    ///
    /// # Panics
    ///
    /// Panics if no scope is open.
    pub fn bind(&mut self, name: impl Into<String>, ty: Type) {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.insert(name.into(), ty);
            }
            None => panic!("internal error: binding outside of any scope"),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_scope_shadows_outer() {
        let mut env = Environment::new();
        env.push();
        env.bind("x", Type::Float);
        env.scoped(|env| {
            env.bind("x", Type::Integer);
            assert_eq!(env.lookup("x"), Some(&Type::Integer));
        });
        assert_eq!(env.lookup("x"), Some(&Type::Float));
    }

    #[test]
    fn test_scoped_pops_on_error() {
        let mut env = Environment::new();
        let result: Result<(), &str> = env.scoped(|env| {
            env.bind("y", Type::Boolean);
            Err("failed")
        });
        assert!(result.is_err());
        assert_eq!(env.depth(), 0);
        assert_eq!(env.lookup("y"), None);
    }

    #[test]
    fn test_lookup_falls_through_to_outer_scopes() {
        let mut env = Environment::new();
        env.push();
        env.bind("a", Type::Vector2F);
        env.push();
        env.bind("b", Type::Vector3F);
        assert_eq!(env.lookup("a"), Some(&Type::Vector2F));
        assert_eq!(env.lookup("missing"), None);
        env.pop();
        assert_eq!(env.lookup("b"), None);
    }

    #[test]
    #[should_panic(expected = "internal error")]
    fn test_binding_without_scope_is_a_defect() {
        Environment::new().bind("z", Type::Float);
    }
}
