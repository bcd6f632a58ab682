//! Everything a shader transitively needs

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use parasol_core::FlatName;

use crate::graphs::DependencyGraphs;

/// The reachable terms and types of one shader
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Referenced {
    pub terms: BTreeSet<FlatName>,
    pub types: BTreeSet<FlatName>,
}

/// Collect the terms and types reachable from `shader`
///
/// A program shader reaches everything its vertex and fragment shaders
/// reach. The caller is expected to have checked
/// [`DependencyGraphs::contains_shader`]; an unknown shader reaches nothing.
pub fn referenced(graphs: &DependencyGraphs, shader: &FlatName) -> Referenced {
    let shaders = graphs.shader_graph().breadth_first([shader]);

    let direct_terms = shaders
        .iter()
        .flat_map(|shader| graphs.shader_terms(shader));
    let terms: BTreeSet<FlatName> = graphs
        .term_graph()
        .breadth_first(direct_terms)
        .into_iter()
        .cloned()
        .collect();

    let mut direct_types: BTreeSet<&FlatName> = BTreeSet::new();
    for term in &terms {
        direct_types.extend(graphs.term_types(term));
    }
    for shader in &shaders {
        direct_types.extend(graphs.shader_types(shader));
    }

    let types: BTreeSet<FlatName> = graphs
        .type_graph()
        .breadth_first(direct_types)
        .into_iter()
        .cloned()
        .collect();

    debug!(
        "Shader {} references {} terms and {} types",
        shader,
        terms.len(),
        types.len()
    );

    Referenced { terms, types }
}
