//! Source positions carried by every token

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A location in a source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// An identifier token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub position: Position,
}

impl Ident {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display() {
        let position = Position::new("shaders/main.p", 12, 4);
        assert_eq!(position.to_string(), "shaders/main.p:12:4");
    }

    #[test]
    fn test_ident_display_is_name_only() {
        let ident = Ident::new("albedo", Position::new("a.p", 1, 1));
        assert_eq!(ident.to_string(), "albedo");
        assert_eq!(ident.as_str(), "albedo");
    }
}
