//! Stage restrictions on external terms
//!
//! An external term declares whether the target can provide it in vertex
//! shaders, fragment shaders, or both. A vertex or fragment shader may only
//! reach, directly or through any chain of terms, externals that allow its
//! stage. Program shaders only pair stages and are not checked themselves.

use std::fmt;

use thiserror::Error;
use tracing::{debug, trace};

use parasol_core::typed::{ShaderKind, TypedCompilation};
use parasol_core::{FlatName, Position};

use crate::graphs::DependencyGraphs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalsErrorKind {
    DisallowedInVertexShader,
    DisallowedInFragmentShader,
}

impl ExternalsErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ExternalsErrorKind::DisallowedInVertexShader => "EXTERNALS_DISALLOWED_IN_VERTEX_SHADER",
            ExternalsErrorKind::DisallowedInFragmentShader => {
                "EXTERNALS_DISALLOWED_IN_FRAGMENT_SHADER"
            }
        }
    }

    pub fn stage(&self) -> ShaderKind {
        match self {
            ExternalsErrorKind::DisallowedInVertexShader => ShaderKind::Vertex,
            ExternalsErrorKind::DisallowedInFragmentShader => ShaderKind::Fragment,
        }
    }
}

/// One intermediate term on the way from a shader to an external
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLink {
    pub term: FlatName,
    /// Where the term is declared
    pub position: Position,
}

/// The shortest chain of references from a shader to a forbidden external
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTrace {
    pub shader: FlatName,
    /// The term the shader refers to directly, then each term in between
    pub links: Vec<TraceLink>,
    pub external: FlatName,
}

impl fmt::Display for ExternalTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reference trace:")?;
        writeln!(f, "  {}", self.shader)?;
        for link in &self.links {
            writeln!(f, "  -> {} ({})", link.term, link.position)?;
        }
        write!(f, "  -> {}", self.external)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{position}: The {stage} shader {shader} references the external {external}, \
     which is not available in {stage} shaders\n{trace}",
    stage = .kind.stage(),
    shader = .trace.shader,
    external = .trace.external
)]
pub struct ExternalsError {
    pub position: Position,
    pub kind: ExternalsErrorKind,
    pub trace: ExternalTrace,
}

impl ExternalsError {
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/// Check every vertex and fragment shader against the externals it reaches
///
/// Shaders are visited in checking order and each shader's terms depth
/// first, so the reported violation is the same on every run.
///
/// # Panics
///
/// Panics if a term in the graphs has no checked declaration.
pub fn check_externals(
    compilation: &TypedCompilation,
    graphs: &DependencyGraphs,
) -> Result<(), ExternalsError> {
    for (shader_name, shader) in compilation.shaders() {
        let stage = shader.kind();
        let kind = match stage {
            ShaderKind::Vertex => ExternalsErrorKind::DisallowedInVertexShader,
            ShaderKind::Fragment => ExternalsErrorKind::DisallowedInFragmentShader,
            ShaderKind::Program => continue,
        };

        trace!("Checking externals reachable from {} shader {}", stage, shader_name);

        for direct in graphs.shader_terms(&shader_name) {
            for term_name in graphs.term_graph().depth_first(direct) {
                let Some(term) = compilation.term(term_name) else {
                    panic!("internal error: term {} has no checked declaration", term_name);
                };
                let Some(external) = term.external() else {
                    continue;
                };
                if external.allows(stage) {
                    continue;
                }

                debug!(
                    "External {} is not available in {} shader {}",
                    term_name, stage, shader_name
                );
                return Err(ExternalsError {
                    position: shader.name().position.clone(),
                    kind,
                    trace: trace_to(compilation, graphs, &shader_name, direct, term_name),
                });
            }
        }
    }

    Ok(())
}

fn trace_to(
    compilation: &TypedCompilation,
    graphs: &DependencyGraphs,
    shader: &FlatName,
    direct: &FlatName,
    external: &FlatName,
) -> ExternalTrace {
    let Some(mut path) = graphs.term_graph().shortest_path(direct, external) else {
        panic!(
            "internal error: external {} was visited from {} but is unreachable",
            external, direct
        );
    };
    path.pop();

    let links = path
        .into_iter()
        .map(|term| {
            let position = match compilation.term(term) {
                Some(declaration) => declaration.name().position.clone(),
                None => panic!("internal error: term {} has no checked declaration", term),
            };
            TraceLink {
                term: term.clone(),
                position,
            }
        })
        .collect();

    ExternalTrace {
        shader: shader.clone(),
        links,
        external: external.clone(),
    }
}
