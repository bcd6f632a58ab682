//! Dependencies-first emission order for a shader's reachable declarations

use serde::Serialize;
use tracing::trace;

use parasol_core::FlatName;

use crate::dag::Dag;
use crate::graphs::DependencyGraphs;
use crate::referenced::Referenced;

/// Reachable terms and types, each listed after everything it references
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Topology {
    pub terms: Vec<FlatName>,
    pub types: Vec<FlatName>,
}

/// Order the declarations in `referenced` so that dependencies come first
///
/// # Panics
///
/// Panics if a reachable declaration is missing from its graph.
pub fn topology(graphs: &DependencyGraphs, shader: &FlatName, referenced: &Referenced) -> Topology {
    let types = dependencies_first(graphs.type_graph(), |ty| referenced.types.contains(ty));
    let terms = dependencies_first(graphs.term_graph(), |term| referenced.terms.contains(term));

    if types.len() != referenced.types.len() || terms.len() != referenced.terms.len() {
        panic!(
            "internal error: ordering for shader {} lost declarations \
             ({} of {} types, {} of {} terms)",
            shader,
            types.len(),
            referenced.types.len(),
            terms.len(),
            referenced.terms.len()
        );
    }

    trace!("Topology of {}: terms {:?}, types {:?}", shader, terms, types);
    Topology { terms, types }
}

fn dependencies_first(dag: &Dag<FlatName>, keep: impl Fn(&FlatName) -> bool) -> Vec<FlatName> {
    let mut order: Vec<FlatName> = dag
        .topological_order()
        .into_iter()
        .filter(|name| keep(name))
        .cloned()
        .collect();
    order.reverse();
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::referenced::referenced;
    use parasol_test_fixtures::pos;
    use pretty_assertions::assert_eq;

    fn n(name: &str) -> FlatName {
        FlatName::parse(&format!("com.example.M.{}", name)).unwrap()
    }

    fn position_of(order: &[FlatName], name: &str) -> usize {
        order
            .iter()
            .position(|entry| *entry == n(name))
            .unwrap_or_else(|| panic!("{} missing from {:?}", name, order))
    }

    #[test]
    fn test_chain_is_reversed() {
        let mut graphs = DependencyGraphs::new();
        graphs.add_shader_term_reference(n("S"), n("x"), pos());
        graphs.add_term_term_reference(n("x"), n("y"), pos());
        graphs.add_term_term_reference(n("y"), n("z"), pos());

        let referenced = referenced(&graphs, &n("S"));
        let topology = topology(&graphs, &n("S"), &referenced);
        assert_eq!(topology.terms, vec![n("z"), n("y"), n("x")]);
        assert!(topology.types.is_empty());
    }

    #[test]
    fn test_unreachable_declarations_are_filtered() {
        let mut graphs = DependencyGraphs::new();
        graphs.add_shader_term_reference(n("S"), n("a"), pos());
        graphs.add_term_term_reference(n("other"), n("a"), pos());
        graphs.add_term_type_reference(n("a"), n("R"), pos());
        graphs.add_type_type_reference(n("R"), n("Q"), pos());
        graphs.add_type_type_reference(n("Unused"), n("Q"), pos());

        let referenced = referenced(&graphs, &n("S"));
        let topology = topology(&graphs, &n("S"), &referenced);
        assert_eq!(topology.terms, vec![n("a")]);
        assert_eq!(topology.types, vec![n("Q"), n("R")]);
    }

    #[test]
    fn test_diamond_respects_every_edge() {
        let mut graphs = DependencyGraphs::new();
        graphs.add_shader_term_reference(n("S"), n("top"), pos());
        graphs.add_term_term_reference(n("top"), n("left"), pos());
        graphs.add_term_term_reference(n("top"), n("right"), pos());
        graphs.add_term_term_reference(n("left"), n("bottom"), pos());
        graphs.add_term_term_reference(n("right"), n("bottom"), pos());

        let referenced = referenced(&graphs, &n("S"));
        let order = topology(&graphs, &n("S"), &referenced).terms;
        assert_eq!(order.len(), 4);
        assert!(position_of(&order, "bottom") < position_of(&order, "left"));
        assert!(position_of(&order, "bottom") < position_of(&order, "right"));
        assert!(position_of(&order, "left") < position_of(&order, "top"));
        assert!(position_of(&order, "right") < position_of(&order, "top"));
    }

    #[test]
    #[should_panic(expected = "internal error")]
    fn test_unknown_reachable_declaration_is_a_defect() {
        let graphs = DependencyGraphs::new();
        let mut referenced = Referenced::default();
        referenced.terms.insert(n("ghost"));
        topology(&graphs, &n("S"), &referenced);
    }
}
