//! Per-shader reports: what each shader uses, in emission order

use std::fmt;

use serde::{Deserialize, Serialize};

use parasol_core::typed::{ShaderKind, TypedAttribute, TypedCompilation, TypedShader};
use parasol_core::{FlatName, Ident, Type};
use parasol_graph::Topology;

/// A named shader input, output or parameter with its resolved type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl Attribute {
    fn new(name: &Ident, ty: &Type) -> Self {
        Self {
            name: name.name.clone(),
            ty: ty.to_string(),
        }
    }
}

fn attributes(attributes: &[TypedAttribute]) -> Vec<Attribute> {
    attributes
        .iter()
        .map(|attribute| Attribute::new(&attribute.name, &attribute.ty))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderReport {
    pub shader: String,
    pub kind: ShaderKind,
    /// Reachable terms, each after everything it references
    pub terms: Vec<String>,
    /// Reachable record types, each after the records its fields use
    pub types: Vec<String>,
    pub inputs: Vec<Attribute>,
    pub outputs: Vec<Attribute>,
    pub parameters: Vec<Attribute>,
}

impl ShaderReport {
    /// Describe one checked shader
    ///
    /// A program reports its vertex shader's inputs, its fragment shader's
    /// outputs, and the parameters of both stages.
    ///
    /// # Panics
    ///
    /// Panics if a program names a stage that is missing from `compilation`.
    pub fn new(
        compilation: &TypedCompilation,
        name: &FlatName,
        shader: &TypedShader,
        topology: &Topology,
    ) -> Self {
        let (inputs, outputs, parameters) = match shader {
            TypedShader::Vertex(vertex) => (
                attributes(&vertex.inputs),
                vertex
                    .outputs
                    .iter()
                    .map(|output| Attribute::new(&output.name, &output.ty))
                    .collect(),
                attributes(&vertex.parameters),
            ),
            TypedShader::Fragment(fragment) => (
                attributes(&fragment.inputs),
                fragment
                    .outputs
                    .iter()
                    .map(|output| Attribute::new(output.name(), output.ty()))
                    .collect(),
                attributes(&fragment.parameters),
            ),
            TypedShader::Program(program) => {
                let vertex = Self::new(
                    compilation,
                    &program.vertex.flat(),
                    stage(compilation, &program.vertex.flat()),
                    &Topology::default(),
                );
                let fragment = Self::new(
                    compilation,
                    &program.fragment.flat(),
                    stage(compilation, &program.fragment.flat()),
                    &Topology::default(),
                );
                let mut parameters = vertex.parameters;
                parameters.extend(fragment.parameters);
                (vertex.inputs, fragment.outputs, parameters)
            }
        };

        Self {
            shader: name.to_string(),
            kind: shader.kind(),
            terms: topology.terms.iter().map(FlatName::to_string).collect(),
            types: topology.types.iter().map(FlatName::to_string).collect(),
            inputs,
            outputs,
            parameters,
        }
    }
}

fn stage<'a>(compilation: &'a TypedCompilation, name: &FlatName) -> &'a TypedShader {
    match compilation.shader(name) {
        Some(shader) => shader,
        None => panic!("internal error: program stage {} was not checked", name),
    }
}

/// Everything `parasol check` reports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Modules in the order they were checked
    pub modules: Vec<String>,
    pub shaders: Vec<ShaderReport>,
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "modules: {}", self.modules.join(", "))?;
        for shader in &self.shaders {
            writeln!(f)?;
            writeln!(f, "{} shader {}", shader.kind, shader.shader)?;
            write_list(f, "terms", &shader.terms)?;
            write_list(f, "types", &shader.types)?;
            write_attributes(f, "input", &shader.inputs)?;
            write_attributes(f, "output", &shader.outputs)?;
            write_attributes(f, "parameter", &shader.parameters)?;
        }
        Ok(())
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, label: &str, names: &[String]) -> fmt::Result {
    if names.is_empty() {
        writeln!(f, "  {}: (none)", label)
    } else {
        writeln!(f, "  {}: {}", label, names.join(", "))
    }
}

fn write_attributes(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    attributes: &[Attribute],
) -> fmt::Result {
    for attribute in attributes {
        writeln!(f, "  {} {} : {}", label, attribute.name, attribute.ty)?;
    }
    Ok(())
}
