//! The six dependency graphs built over a checked program

use std::fmt;

use serde::Serialize;

use parasol_core::{FlatName, Position};

use crate::dag::{Dag, Reference, SerializableDag};

/// A vertex of the graphs that mix declaration kinds
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Vertex {
    Term(FlatName),
    Type(FlatName),
    Shader(FlatName),
}

impl Vertex {
    pub fn name(&self) -> &FlatName {
        match self {
            Vertex::Term(name) | Vertex::Type(name) | Vertex::Shader(name) => name,
        }
    }

    fn term(&self) -> Option<&FlatName> {
        match self {
            Vertex::Term(name) => Some(name),
            _ => None,
        }
    }

    fn ty(&self) -> Option<&FlatName> {
        match self {
            Vertex::Type(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vertex::Term(name) => write!(f, "term {}", name),
            Vertex::Type(name) => write!(f, "type {}", name),
            Vertex::Shader(name) => write!(f, "shader {}", name),
        }
    }
}

/// Who refers to whom across a whole program
///
/// Edges point from the referencing declaration to the referenced one.
/// Every graph is acyclic; attempting to add an edge that closes a cycle
/// panics, since the resolver has already rejected recursive programs.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraphs {
    term_term: Dag<FlatName>,
    type_type: Dag<FlatName>,
    shader_shader: Dag<FlatName>,
    term_type: Dag<Vertex>,
    shader_term: Dag<Vertex>,
    shader_type: Dag<Vertex>,
}

impl DependencyGraphs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_term(&mut self, term: FlatName) {
        self.term_term.add_vertex(term);
    }

    pub fn add_type(&mut self, ty: FlatName) {
        self.type_type.add_vertex(ty);
    }

    pub fn add_shader(&mut self, shader: FlatName) {
        self.shader_shader.add_vertex(shader);
    }

    pub fn add_term_term_reference(
        &mut self,
        source: FlatName,
        target: FlatName,
        position: Position,
    ) {
        self.term_term.add_edge(source, target, Reference { position });
    }

    pub fn add_type_type_reference(
        &mut self,
        source: FlatName,
        target: FlatName,
        position: Position,
    ) {
        self.type_type.add_edge(source, target, Reference { position });
    }

    pub fn add_term_type_reference(
        &mut self,
        source: FlatName,
        target: FlatName,
        position: Position,
    ) {
        self.add_term(source.clone());
        self.add_type(target.clone());
        self.term_type.add_edge(
            Vertex::Term(source),
            Vertex::Type(target),
            Reference { position },
        );
    }

    pub fn add_shader_term_reference(
        &mut self,
        source: FlatName,
        target: FlatName,
        position: Position,
    ) {
        self.add_shader(source.clone());
        self.add_term(target.clone());
        self.shader_term.add_edge(
            Vertex::Shader(source),
            Vertex::Term(target),
            Reference { position },
        );
    }

    pub fn add_shader_type_reference(
        &mut self,
        source: FlatName,
        target: FlatName,
        position: Position,
    ) {
        self.add_shader(source.clone());
        self.add_type(target.clone());
        self.shader_type.add_edge(
            Vertex::Shader(source),
            Vertex::Type(target),
            Reference { position },
        );
    }

    /// A program shader referring to the vertex or fragment shader it links
    pub fn add_shader_shader_reference(
        &mut self,
        source: FlatName,
        target: FlatName,
        position: Position,
    ) {
        self.shader_shader.add_edge(source, target, Reference { position });
    }

    pub fn contains_term(&self, term: &FlatName) -> bool {
        self.term_term.contains_vertex(term)
    }

    pub fn contains_type(&self, ty: &FlatName) -> bool {
        self.type_type.contains_vertex(ty)
    }

    pub fn contains_shader(&self, shader: &FlatName) -> bool {
        self.shader_shader.contains_vertex(shader)
    }

    /// Terms directly referenced by a term
    pub fn term_terms(&self, term: &FlatName) -> Vec<&FlatName> {
        self.term_term.successors(term)
    }

    /// Types directly referenced by a term
    pub fn term_types(&self, term: &FlatName) -> Vec<&FlatName> {
        self.term_type
            .successors(&Vertex::Term(term.clone()))
            .into_iter()
            .filter_map(Vertex::ty)
            .collect()
    }

    /// Types directly referenced by a type
    pub fn type_types(&self, ty: &FlatName) -> Vec<&FlatName> {
        self.type_type.successors(ty)
    }

    /// Terms directly referenced by a shader
    pub fn shader_terms(&self, shader: &FlatName) -> Vec<&FlatName> {
        self.shader_term
            .successors(&Vertex::Shader(shader.clone()))
            .into_iter()
            .filter_map(Vertex::term)
            .collect()
    }

    /// Types directly referenced by a shader
    pub fn shader_types(&self, shader: &FlatName) -> Vec<&FlatName> {
        self.shader_type
            .successors(&Vertex::Shader(shader.clone()))
            .into_iter()
            .filter_map(Vertex::ty)
            .collect()
    }

    /// Shaders directly linked by a program shader
    pub fn shader_shaders(&self, shader: &FlatName) -> Vec<&FlatName> {
        self.shader_shader.successors(shader)
    }

    pub fn term_graph(&self) -> &Dag<FlatName> {
        &self.term_term
    }

    pub fn type_graph(&self) -> &Dag<FlatName> {
        &self.type_type
    }

    pub fn shader_graph(&self) -> &Dag<FlatName> {
        &self.shader_shader
    }

    /// Export all six graphs for diagnostics
    pub fn to_serializable(&self) -> SerializableDependencyGraphs {
        SerializableDependencyGraphs {
            term_term: self.term_term.to_serializable(),
            type_type: self.type_type.to_serializable(),
            shader_shader: self.shader_shader.to_serializable(),
            term_type: self.term_type.to_serializable(),
            shader_term: self.shader_term.to_serializable(),
            shader_type: self.shader_type.to_serializable(),
        }
    }
}

impl Serialize for DependencyGraphs {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_serializable().serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerializableDependencyGraphs {
    pub term_term: SerializableDag,
    pub type_type: SerializableDag,
    pub shader_shader: SerializableDag,
    pub term_type: SerializableDag,
    pub shader_term: SerializableDag,
    pub shader_type: SerializableDag,
}

#[cfg(test)]
mod tests {
    use super::*;
    use parasol_test_fixtures::pos;
    use pretty_assertions::assert_eq;

    fn n(name: &str) -> FlatName {
        FlatName::parse(&format!("com.example.M.{}", name)).unwrap()
    }

    #[test]
    fn test_cross_references_register_endpoints() {
        let mut graphs = DependencyGraphs::new();
        graphs.add_shader_term_reference(n("S"), n("f"), pos());
        graphs.add_term_type_reference(n("f"), n("R"), pos());
        graphs.add_shader_type_reference(n("S"), n("Q"), pos());

        assert!(graphs.contains_shader(&n("S")));
        assert!(graphs.contains_term(&n("f")));
        assert!(graphs.contains_type(&n("R")));
        assert!(graphs.contains_type(&n("Q")));
        assert!(!graphs.contains_term(&n("S")));

        assert_eq!(graphs.shader_terms(&n("S")), vec![&n("f")]);
        assert_eq!(graphs.term_types(&n("f")), vec![&n("R")]);
        assert_eq!(graphs.shader_types(&n("S")), vec![&n("Q")]);
        assert!(graphs.shader_terms(&n("f")).is_empty());
    }

    #[test]
    fn test_same_name_in_different_kinds_is_distinct() {
        let mut graphs = DependencyGraphs::new();
        graphs.add_term_type_reference(n("x"), n("x"), pos());
        assert_eq!(graphs.term_types(&n("x")), vec![&n("x")]);
    }

    #[test]
    #[should_panic(expected = "internal error")]
    fn test_cyclic_terms_are_a_defect() {
        let mut graphs = DependencyGraphs::new();
        graphs.add_term_term_reference(n("a"), n("b"), pos());
        graphs.add_term_term_reference(n("b"), n("a"), pos());
    }

    #[test]
    fn test_export_lists_every_graph() {
        let mut graphs = DependencyGraphs::new();
        graphs.add_shader_shader_reference(n("main"), n("vert"), pos());
        graphs.add_type_type_reference(n("A"), n("B"), pos());

        let exported = graphs.to_serializable();
        assert_eq!(
            exported.shader_shader.vertices,
            vec!["com.example.M.main", "com.example.M.vert"]
        );
        assert_eq!(exported.type_type.edges.len(), 1);
        assert!(exported.term_term.vertices.is_empty());

        let json = serde_json::to_value(&graphs).unwrap();
        assert!(json.get("shader_term").is_some());
    }
}
