//! Checked programs through the dependency graphs, reachability, ordering
//! and external stage checks

use parasol_checker::check_compilation;
use parasol_core::{FlatName, ModuleName};
use parasol_graph::{check_externals, referenced, topology, ExternalsErrorKind};
use parasol_test_fixtures::expr::*;
use parasol_test_fixtures::{
    builtin, external, external_emulated, global, global_type, local, program, shader_ref,
    shading_program, CompilationBuilder, FragmentShaderBuilder, ModuleBuilder,
    VertexShaderBuilder,
};
use pretty_assertions::assert_eq;

const SHADING: &str = "com.example.Shading";
const M: &str = "com.example.Main";

fn flat(module: &str, name: &str) -> FlatName {
    ModuleName::new(module).qualify(name)
}

fn names(module: &str, names: &[&str]) -> Vec<FlatName> {
    names.iter().map(|name| flat(module, name)).collect()
}

#[test]
fn test_shading_program_graphs() {
    let checked = check_compilation(&shading_program()).unwrap();
    let graphs = &checked.graphs;

    assert_eq!(
        graphs.term_terms(&flat(SHADING, "brighten")),
        vec![&flat(SHADING, "mix")]
    );
    assert_eq!(
        graphs.term_types(&flat(SHADING, "brighten")),
        vec![&flat(SHADING, "light")]
    );
    assert_eq!(
        graphs.shader_terms(&flat(SHADING, "frag")),
        vec![&flat(SHADING, "brighten")]
    );
    assert_eq!(
        graphs.shader_types(&flat(SHADING, "frag")),
        vec![&flat(SHADING, "light")]
    );
    assert!(graphs.shader_terms(&flat(SHADING, "vert")).is_empty());
    assert_eq!(
        graphs.shader_shaders(&flat(SHADING, "main")),
        vec![&flat(SHADING, "vert"), &flat(SHADING, "frag")]
    );
}

#[test]
fn test_program_reaches_both_stages() {
    let checked = check_compilation(&shading_program()).unwrap();
    let main = flat(SHADING, "main");

    let reached = referenced(&checked.graphs, &main);
    assert_eq!(
        reached.terms.iter().cloned().collect::<Vec<_>>(),
        names(SHADING, &["brighten", "mix"])
    );
    assert_eq!(
        reached.types.iter().cloned().collect::<Vec<_>>(),
        names(SHADING, &["light"])
    );

    let order = topology(&checked.graphs, &main, &reached);
    assert_eq!(order.terms, names(SHADING, &["mix", "brighten"]));
    assert_eq!(order.types, names(SHADING, &["light"]));

    let vertex_only = referenced(&checked.graphs, &flat(SHADING, "vert"));
    assert!(vertex_only.terms.is_empty());
    assert!(vertex_only.types.is_empty());
}

#[test]
fn test_shading_program_externals_allowed() {
    let checked = check_compilation(&shading_program()).unwrap();
    assert_eq!(check_externals(&checked.compilation, &checked.graphs), Ok(()));
}

/// `frag` calls `a`, which calls `b`, which calls the vertex-only `tex`
fn two_hop_module(fragment: bool) -> parasol_core::resolved::Module {
    ModuleBuilder::new(M)
        .function_external(
            "tex",
            &[("uv", builtin("vector_2f"))],
            builtin("vector_4f"),
            external("tex", true, fragment),
        )
        .function(
            "b",
            &[("uv", builtin("vector_2f"))],
            builtin("vector_4f"),
            apply(global(M, "tex"), vec![var_local("uv")]),
        )
        .function(
            "a",
            &[("uv", builtin("vector_2f"))],
            builtin("vector_4f"),
            apply(global(M, "b"), vec![var_local("uv")]),
        )
        .shader(
            FragmentShaderBuilder::new("frag")
                .inputs(&[("uv", builtin("vector_2f"))])
                .output("out0", builtin("vector_4f"), 0)
                .value(binding(
                    "colour",
                    None,
                    apply(global(M, "a"), vec![var_local("uv")]),
                ))
                .write("out0", local("colour"))
                .build(),
        )
        .build()
}

#[test]
fn test_external_reached_through_two_functions() {
    let compilation = CompilationBuilder::new().module(two_hop_module(false)).build();
    let checked = check_compilation(&compilation).unwrap();

    let error = check_externals(&checked.compilation, &checked.graphs).unwrap_err();
    assert_eq!(error.kind, ExternalsErrorKind::DisallowedInFragmentShader);
    assert_eq!(error.code(), "EXTERNALS_DISALLOWED_IN_FRAGMENT_SHADER");
    assert_eq!(
        error
            .trace
            .links
            .iter()
            .map(|link| link.term.clone())
            .collect::<Vec<_>>(),
        names(M, &["a", "b"])
    );
    assert_eq!(error.trace.external, flat(M, "tex"));

    insta::assert_snapshot!(error.to_string(), @r"
    test.p:1:1: The fragment shader com.example.Main.frag references the external com.example.Main.tex, which is not available in fragment shaders
    Reference trace:
      com.example.Main.frag
      -> com.example.Main.a (test.p:3:1)
      -> com.example.Main.b (test.p:2:1)
      -> com.example.Main.tex
    ");
}

#[test]
fn test_external_allowed_in_stage() {
    let compilation = CompilationBuilder::new().module(two_hop_module(true)).build();
    let checked = check_compilation(&compilation).unwrap();
    assert!(check_externals(&checked.compilation, &checked.graphs).is_ok());
}

#[test]
fn test_vertex_shader_calling_fragment_only_external() {
    let module = ModuleBuilder::new(M)
        .value_external(
            "depth",
            builtin("float"),
            external_emulated("depth", false, true, real(0.5)),
        )
        .shader(
            VertexShaderBuilder::new("vert")
                .inputs(&[("position", builtin("vector_3f"))])
                .main_output("clip", builtin("vector_4f"))
                .value(binding(
                    "clip_value",
                    None,
                    new_(
                        builtin("vector_4f"),
                        vec![var_local("position"), var_global(M, "depth")],
                    ),
                ))
                .write("clip", local("clip_value"))
                .build(),
        )
        .build();
    let checked = check_compilation(&CompilationBuilder::new().module(module).build()).unwrap();

    let error = check_externals(&checked.compilation, &checked.graphs).unwrap_err();
    assert_eq!(error.code(), "EXTERNALS_DISALLOWED_IN_VERTEX_SHADER");
    assert!(error.trace.links.is_empty());
    assert_eq!(error.trace.shader, flat(M, "vert"));
}

#[test]
fn test_programs_are_not_checked_for_externals() {
    let module = ModuleBuilder::new(M)
        .value_external("time", builtin("float"), external("time", false, false))
        .record("unused", &[("t", builtin("float"))])
        .shader(
            VertexShaderBuilder::new("vert")
                .inputs(&[("position", builtin("vector_4f"))])
                .main_output("clip", builtin("vector_4f"))
                .write("clip", local("position"))
                .build(),
        )
        .shader(FragmentShaderBuilder::new("frag").build())
        .shader(program("main", shader_ref(M, "vert"), shader_ref(M, "frag")))
        .build();
    let checked = check_compilation(&CompilationBuilder::new().module(module).build()).unwrap();

    // `time` is declared but unreachable from any shader.
    assert!(check_externals(&checked.compilation, &checked.graphs).is_ok());

    let reached = referenced(&checked.graphs, &flat(M, "main"));
    assert!(reached.terms.is_empty());
    assert!(!reached.types.contains(&flat(M, "unused")));
}

#[test]
fn test_types_reached_through_record_fields() {
    let module = ModuleBuilder::new(M)
        .record("inner", &[("v", builtin("vector_4f"))])
        .record("outer", &[("inner", global_type(M, "inner"))])
        .function(
            "unwrap",
            &[("o", global_type(M, "outer"))],
            builtin("vector_4f"),
            project(project(var_local("o"), "inner"), "v"),
        )
        .shader(
            FragmentShaderBuilder::new("frag")
                .inputs(&[("colour", builtin("vector_4f"))])
                .output("out0", builtin("vector_4f"), 0)
                .value(binding(
                    "value",
                    None,
                    apply(
                        global(M, "unwrap"),
                        vec![record(
                            global_type(M, "outer"),
                            vec![(
                                "inner",
                                record(
                                    global_type(M, "inner"),
                                    vec![("v", var_local("colour"))],
                                ),
                            )],
                        )],
                    ),
                ))
                .write("out0", local("value"))
                .build(),
        )
        .build();
    let checked = check_compilation(&CompilationBuilder::new().module(module).build()).unwrap();
    let frag = flat(M, "frag");

    let reached = referenced(&checked.graphs, &frag);
    let order = topology(&checked.graphs, &frag, &reached);
    assert_eq!(order.terms, names(M, &["unwrap"]));
    assert_eq!(order.types, names(M, &["inner", "outer"]));
}

#[test]
fn test_checking_is_deterministic() {
    let first = check_compilation(&shading_program()).unwrap();
    let second = check_compilation(&shading_program()).unwrap();

    let first = serde_json::to_string(&first.graphs).unwrap();
    let second = serde_json::to_string(&second.graphs).unwrap();
    assert_eq!(first, second);
}
