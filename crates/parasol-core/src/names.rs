//! Module-qualified names used as declaration and graph-vertex identities
//!
//! Every global declaration is identified by its flattened module path plus
//! its local name, regardless of how an importing module aliased it.
//!
//! ## Formats
//!
//! - Module: `com.example.Lighting`
//! - Flat name: `com.example.Lighting.diffuse`
//!
//! ## Usage
//!
//! ```ignore
//! let name = FlatName::parse("com.example.Lighting.diffuse")?;
//! assert_eq!(name.module().as_str(), "com.example.Lighting");
//! assert_eq!(name.name(), "diffuse");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::position::Ident;

/// A flattened, dot-separated module path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Qualify a local name with this module
    pub fn qualify(&self, name: impl Into<String>) -> FlatName {
        FlatName::new(self.clone(), name)
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A module path as written in its declaration: `package a.b; module M`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePath {
    pub package: Vec<Ident>,
    pub name: Ident,
}

impl ModulePath {
    pub fn flatten(&self) -> ModuleName {
        let mut flat = String::new();
        for part in &self.package {
            flat.push_str(part.as_str());
            flat.push('.');
        }
        flat.push_str(self.name.as_str());
        ModuleName(flat)
    }
}

/// A global declaration name: `(flattened module, local name)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlatName {
    module: ModuleName,
    name: String,
}

/// Errors that can occur while parsing a flat name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("Empty name")]
    Empty,

    #[error("Missing module in name: {0}")]
    MissingModule(String),

    #[error("Missing local name in: {0}")]
    MissingLocalName(String),
}

impl FlatName {
    pub fn new(module: ModuleName, name: impl Into<String>) -> Self {
        Self {
            module,
            name: name.into(),
        }
    }

    /// Parse a `module.path.local` string, splitting at the last dot
    pub fn parse(text: &str) -> Result<Self, NameError> {
        if text.is_empty() {
            return Err(NameError::Empty);
        }

        match text.rsplit_once('.') {
            None => Err(NameError::MissingModule(text.to_string())),
            Some(("", _)) => Err(NameError::MissingModule(text.to_string())),
            Some((_, "")) => Err(NameError::MissingLocalName(text.to_string())),
            Some((module, name)) => Ok(Self::new(ModuleName::new(module), name)),
        }
    }

    pub fn module(&self) -> &ModuleName {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for FlatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// The nominal identity of a type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeName {
    /// A type built into the language, or a rendered function signature
    BuiltIn(String),
    /// A record type declared in some module
    Global(FlatName),
}

impl TypeName {
    pub fn global(&self) -> Option<&FlatName> {
        match self {
            TypeName::BuiltIn(_) => None,
            TypeName::Global(name) => Some(name),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::BuiltIn(name) => f.write_str(name),
            TypeName::Global(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    fn ident(name: &str) -> Ident {
        Ident::new(name, Position::new("m.p", 1, 1))
    }

    #[test]
    fn test_module_path_flatten() {
        let path = ModulePath {
            package: vec![ident("com"), ident("example")],
            name: ident("Lighting"),
        };
        assert_eq!(path.flatten(), ModuleName::new("com.example.Lighting"));

        let bare = ModulePath {
            package: vec![],
            name: ident("Main"),
        };
        assert_eq!(bare.flatten().as_str(), "Main");
    }

    #[test]
    fn test_parse_flat_name() {
        let name = FlatName::parse("com.example.Lighting.diffuse").unwrap();
        assert_eq!(name.module().as_str(), "com.example.Lighting");
        assert_eq!(name.name(), "diffuse");
        assert_eq!(name.to_string(), "com.example.Lighting.diffuse");
    }

    #[test]
    fn test_parse_flat_name_errors() {
        assert_eq!(FlatName::parse(""), Err(NameError::Empty));
        assert_eq!(
            FlatName::parse("diffuse"),
            Err(NameError::MissingModule("diffuse".to_string()))
        );
        assert_eq!(
            FlatName::parse(".diffuse"),
            Err(NameError::MissingModule(".diffuse".to_string()))
        );
        assert_eq!(
            FlatName::parse("com.example."),
            Err(NameError::MissingLocalName("com.example.".to_string()))
        );
    }

    #[test]
    fn test_flat_names_order_by_module_then_name() {
        let mut names = vec![
            FlatName::parse("b.M.x").unwrap(),
            FlatName::parse("a.M.y").unwrap(),
            FlatName::parse("a.M.x").unwrap(),
        ];
        names.sort();
        let rendered: Vec<String> = names.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["a.M.x", "a.M.y", "b.M.x"]);
    }

    #[test]
    fn test_type_name_global() {
        let record = TypeName::Global(FlatName::parse("a.M.light").unwrap());
        assert_eq!(record.global().map(FlatName::name), Some("light"));
        assert_eq!(TypeName::BuiltIn("float".into()).global(), None);
    }
}
