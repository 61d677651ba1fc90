use del_glow_multishader::mock::{BackendCall, MockBackend, SYNTAX_ERROR_TOKEN};
use del_glow_multishader::rename::RenameRule;
use del_glow_multishader::stage::{StagePolicy, StagePolicyTable};
use del_glow_multishader::{
    Config, ProgramBuilder, Section, ShaderBackend, ShaderError, StageKind,
};

const VS_SRC: &str = "in vec3 position;
void main() {
    gl_Position = vec4(position, 1.0);
}
";

const FS_SRC: &str = "void main(){}
[light]
void main(){ out0 = vec4(1,0,0,1); }
[object]
void main(){ out0 = vec4(0,1,0,1); }";

const FS_ABC: &str = "uniform vec3 tint;
[a]
void main() { out0 = vec4(tint, 0.1); }
[b]
void main() { out0 = vec4(tint, 0.2); }
[c]
void main() { out0 = vec4(tint, 0.3); }
";

fn builder(fs: &str) -> ProgramBuilder {
    let mut builder = ProgramBuilder::new(Config::default());
    builder
        .load_stage(StageKind::Vertex, VS_SRC)
        .load_stage(StageKind::Fragment, fs);
    builder
}

#[test]
fn scenario_selects_green_branch() {
    let mock = MockBackend::new();
    let mut program = builder(FS_SRC).compile(&mock).unwrap();
    assert_eq!(
        program.sections(StageKind::Fragment).to_vec(),
        vec![Section::new("light", 0), Section::new("object", 1)]
    );
    program.set_active(&mock, StageKind::Fragment, "object");
    assert_eq!(program.active_section(StageKind::Fragment), Some("object"));
    assert_eq!(program.selector_value(StageKind::Fragment), Some(1));

    let id = program.program();
    let called = mock.dispatched_function(id, StageKind::Fragment).unwrap();
    assert_eq!(called, "lx_program1_main");
    let body = mock
        .function_body(id, StageKind::Fragment, &called)
        .unwrap();
    assert_eq!(body, " out0 = vec4(0,1,0,1); ");
    program.delete(&mock);
}

#[test]
fn plain_stages_are_untouched() {
    let mut builder = ProgramBuilder::new(Config::default().with_shader_version(None));
    builder.load_stage(StageKind::Vertex, VS_SRC);
    let split = builder.split_stage(StageKind::Vertex).unwrap();
    assert_eq!(split.source, VS_SRC);
    assert!(split.sections.is_empty());

    let mock = MockBackend::new();
    let program = builder.compile(&mock).unwrap();
    assert!(program.sections(StageKind::Vertex).is_empty());
    assert!(program
        .registry(StageKind::Vertex)
        .unwrap()
        .selector_location()
        .is_none());
    assert_eq!(
        mock.linked_source(program.program(), StageKind::Vertex)
            .as_deref(),
        Some(VS_SRC)
    );
}

#[test]
fn dispatch_runs_exactly_one_section() {
    let mock = MockBackend::new();
    let mut program = builder(FS_ABC).compile(&mock).unwrap();
    let id = program.program();
    for (name, index) in [("a", 0), ("b", 1), ("c", 2)] {
        program.set_active(&mock, StageKind::Fragment, name);
        assert_eq!(mock.uniform_value(id, "activeFragmentShaderId"), Some(index));
        let called = mock.dispatched_function(id, StageKind::Fragment).unwrap();
        assert_eq!(called, format!("lx_program{index}_main"));
        let body = mock.function_body(id, StageKind::Fragment, &called).unwrap();
        assert!(body.contains(&format!("0.{}", index + 1)));
    }
}

#[test]
fn preamble_never_dispatched() {
    let mock = MockBackend::new();
    let program = builder(FS_SRC).compile(&mock).unwrap();
    let source = mock
        .linked_source(program.program(), StageKind::Fragment)
        .unwrap();
    // preamble keeps its body under a name no branch calls
    assert!(source.contains("void lx_preamble_main(){}"));
    let dispatcher = &source[source.rfind("void main() {").unwrap()..];
    assert!(!dispatcher.contains("lx_preamble_main"));
    assert!(program
        .sections(StageKind::Fragment)
        .iter()
        .all(|s| s.order_index >= 0));
}

#[test]
fn unknown_section_runs_nothing() {
    let mock = MockBackend::new();
    let mut program = builder(FS_ABC).compile(&mock).unwrap();
    let id = program.program();
    program.set_active(&mock, StageKind::Fragment, "b");
    program.set_active(&mock, StageKind::Fragment, "nonexistent");
    assert_eq!(program.selector_value(StageKind::Fragment), Some(-1));
    assert_eq!(program.active_section(StageKind::Fragment), None);
    assert_eq!(mock.uniform_value(id, "activeFragmentShaderId"), Some(-1));
    assert_eq!(mock.dispatched_function(id, StageKind::Fragment), None);
}

#[test]
fn strict_selection_reports_unknown_names() {
    let mock = MockBackend::new();
    let mut program = builder(FS_ABC).compile(&mock).unwrap();
    program.set_active(&mock, StageKind::Fragment, "c");
    let err = program
        .try_set_active(&mock, StageKind::Fragment, "missing")
        .unwrap_err();
    assert!(matches!(
        err,
        ShaderError::UnknownSection { stage: StageKind::Fragment, ref name } if name == "missing"
    ));
    // the previous selection survives
    assert_eq!(program.active_section(StageKind::Fragment), Some("c"));
    assert_eq!(program.selector_value(StageKind::Fragment), Some(2));
    assert!(program
        .try_set_active(&mock, StageKind::Geometry, "c")
        .is_err());
    program
        .try_set_active(&mock, StageKind::Fragment, "a")
        .unwrap();
    assert_eq!(program.selector_value(StageKind::Fragment), Some(0));
}

#[test]
fn strict_selection_still_writes_no_section() {
    let mock = MockBackend::new();
    let mut builder = ProgramBuilder::new(Config::default().with_strict_selection(true));
    builder
        .load_stage(StageKind::Vertex, VS_SRC)
        .load_stage(StageKind::Fragment, FS_ABC);
    let mut program = builder.compile(&mock).unwrap();
    program.set_active(&mock, StageKind::Fragment, "typo");
    assert_eq!(program.selector_value(StageKind::Fragment), Some(-1));
    assert_eq!(
        mock.dispatched_function(program.program(), StageKind::Fragment),
        None
    );
}

#[test]
fn set_active_binds_the_program() {
    let mock = MockBackend::new();
    let mut program = builder(FS_ABC).compile(&mock).unwrap();
    mock.use_program(None);
    mock.clear_calls();
    program.set_active(&mock, StageKind::Fragment, "b");
    let calls = mock.calls();
    assert_eq!(calls[0], BackendCall::UseProgram(Some(program.program())));
    assert!(matches!(calls[1], BackendCall::Uniform1i { value: 1, .. }));
    assert_eq!(mock.current_program(), Some(program.program()));
}

#[test]
fn compiling_twice_gives_independent_programs() {
    let mock = MockBackend::new();
    let builder = builder(FS_ABC);
    let mut first = builder.compile(&mock).unwrap();
    let mut second = builder.compile(&mock).unwrap();
    assert_ne!(first.program(), second.program());
    assert_eq!(mock.live_programs(), 2);
    assert_eq!(mock.live_shaders(), 0);

    first.set_active(&mock, StageKind::Fragment, "a");
    second.set_active(&mock, StageKind::Fragment, "c");
    first.delete(&mock);
    assert_eq!(mock.live_programs(), 1);
    assert_eq!(second.sections(StageKind::Fragment).len(), 3);
    assert_eq!(second.active_section(StageKind::Fragment), Some("c"));
    second.set_active(&mock, StageKind::Fragment, "b");
    assert_eq!(
        mock.dispatched_function(second.program(), StageKind::Fragment)
            .as_deref(),
        Some("lx_program1_main")
    );
    second.delete(&mock);
    assert_eq!(mock.live_programs(), 0);
}

#[test]
fn syntax_error_is_fatal_and_leaks_nothing() {
    let mock = MockBackend::new();
    let broken = format!("[a]\nvoid main() {{ {SYNTAX_ERROR_TOKEN} }}\n");
    let err = match builder(&broken).compile(&mock) {
        Err(err) => err,
        Ok(_) => panic!("compiled a broken fragment stage"),
    };
    match err {
        ShaderError::StageCompile { stage, log } => {
            assert_eq!(stage, StageKind::Fragment);
            assert!(!log.is_empty());
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(mock.live_shaders(), 0);
    assert_eq!(mock.live_programs(), 0);
}

#[test]
fn unbalanced_vertex_stage_fails_first() {
    let mock = MockBackend::new();
    let mut builder = ProgramBuilder::new(Config::default());
    builder
        .load_stage(StageKind::Vertex, "void main() {")
        .load_stage(StageKind::Fragment, FS_ABC);
    let err = builder.compile(&mock).err().unwrap();
    assert!(matches!(
        err,
        ShaderError::StageCompile {
            stage: StageKind::Vertex,
            ..
        }
    ));
    assert!(!mock
        .calls()
        .iter()
        .any(|c| matches!(c, BackendCall::CreateShader { stage: StageKind::Fragment, .. })));
    assert_eq!(mock.live_shaders(), 0);
    assert_eq!(mock.live_programs(), 0);
}

#[test]
fn link_error_releases_everything() {
    let mock = MockBackend::new();
    mock.fail_next_link("error: varying v_color not written");
    let err = builder(FS_ABC).compile(&mock).err().unwrap();
    match err {
        ShaderError::Link { log } => assert!(log.contains("v_color")),
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(mock.live_shaders(), 0);
    assert_eq!(mock.live_programs(), 0);
}

#[test]
fn compile_warnings() {
    let mock = MockBackend::new();
    mock.set_compile_warning(Some("warning: implicit conversion"));
    let err = builder(FS_ABC).compile(&mock).err().unwrap();
    assert!(matches!(err, ShaderError::StageCompile { .. }));
    assert_eq!(mock.live_shaders(), 0);

    let mut lenient = ProgramBuilder::new(Config::default().with_fatal_diagnostics(false));
    lenient
        .load_stage(StageKind::Vertex, VS_SRC)
        .load_stage(StageKind::Fragment, FS_ABC);
    let program = lenient.compile(&mock).unwrap();
    assert_eq!(program.sections(StageKind::Fragment).len(), 3);
}

#[test]
fn nothing_loaded() {
    let mock = MockBackend::new();
    let err = ProgramBuilder::default().compile(&mock).err().unwrap();
    assert!(matches!(err, ShaderError::NoStages));
    assert!(mock.calls().is_empty());
}

#[test]
fn vertex_sections_need_a_declared_selector() {
    let vs = "in vec3 position;
[flat]
void main() { gl_Position = vec4(position.xy, 0.0, 1.0); }
[full]
void main() { gl_Position = vec4(position, 1.0); }
";
    let mock = MockBackend::new();
    let mut undeclared = builder(FS_ABC);
    undeclared.load_stage(StageKind::Vertex, vs);
    let mut program = undeclared.compile(&mock).unwrap();
    assert!(program
        .registry(StageKind::Vertex)
        .unwrap()
        .selector_location()
        .is_none());
    program.set_active(&mock, StageKind::Vertex, "full");
    assert_eq!(
        mock.uniform_value(program.program(), "activeVertexShaderId"),
        None
    );
    assert_eq!(program.selector_value(StageKind::Vertex), Some(-1));
    assert_eq!(program.active_section(StageKind::Vertex), None);

    // declared by hand, the stage can be switched
    let declared = format!("uniform int activeVertexShaderId;\n{vs}");
    let mut builder = builder(FS_ABC);
    builder.load_stage(StageKind::Vertex, &declared);
    let mut program = builder.compile(&mock).unwrap();
    program.set_active(&mock, StageKind::Vertex, "full");
    assert_eq!(
        mock.dispatched_function(program.program(), StageKind::Vertex)
            .as_deref(),
        Some("lx_program1_main")
    );
}

#[test]
fn injection_policy_can_cover_other_stages() {
    let vs = "[a]\nvoid main() { gl_Position = vec4(0.0); }\n[b]\nvoid main() { gl_Position = vec4(1.0); }\n";
    let config = Config::default().with_policy(
        StageKind::Vertex,
        StagePolicy {
            inject_selector: true,
            output_declaration: None,
        },
    );
    let mut builder = ProgramBuilder::new(config);
    builder
        .load_stage(StageKind::Vertex, vs)
        .load_stage(StageKind::Fragment, FS_ABC);
    let mock = MockBackend::new();
    let mut program = builder.compile(&mock).unwrap();
    program.set_active(&mock, StageKind::Vertex, "b");
    program.set_active(&mock, StageKind::Fragment, "a");
    let id = program.program();
    assert_eq!(mock.uniform_value(id, "activeVertexShaderId"), Some(1));
    assert_eq!(mock.uniform_value(id, "activeFragmentShaderId"), Some(0));

    let mut no_injection = Config::default();
    no_injection.policies = StagePolicyTable::none();
    let mut builder = ProgramBuilder::new(no_injection);
    builder.load_stage(StageKind::Fragment, FS_ABC);
    let split = builder.split_stage(StageKind::Fragment).unwrap();
    assert!(!split.source.contains("uniform int activeFragmentShaderId;"));
}

#[test]
fn legacy_rename_rule() {
    let fs = "[a]\nfloat mainValue = 0.5;\nvoid main() { out0 = vec4(mainValue); }\n";
    let mut builder =
        ProgramBuilder::new(Config::default().with_rename_rule(RenameRule::Substring));
    builder.load_stage(StageKind::Fragment, fs);
    let split = builder.split_stage(StageKind::Fragment).unwrap();
    assert!(split.source.contains("lx_program0_mainValue"));

    let mut builder = ProgramBuilder::new(Config::default());
    builder.load_stage(StageKind::Fragment, fs);
    let split = builder.split_stage(StageKind::Fragment).unwrap();
    assert!(split.source.contains("float mainValue = 0.5;"));
    assert!(split.source.contains("void lx_program0_main()"));
}

#[test]
fn load_stage_file() {
    let dir = std::env::temp_dir().join(format!("del-glow-multishader-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("sections.frag");
    std::fs::write(&path, FS_ABC).unwrap();

    let mut builder = ProgramBuilder::new(Config::default());
    builder
        .load_stage_file(StageKind::Fragment, &path)
        .unwrap()
        .load_stage(StageKind::Vertex, VS_SRC);
    assert_eq!(
        builder
            .split_stage(StageKind::Fragment)
            .unwrap()
            .sections
            .len(),
        3
    );
    let err = builder
        .load_stage_file(StageKind::Geometry, dir.join("missing.geom"))
        .err()
        .unwrap();
    assert!(matches!(err, ShaderError::Io { .. }));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn selector_past_last_section_runs_nothing() {
    let mock = MockBackend::new();
    let program = builder(FS_ABC).compile(&mock).unwrap();
    let location = program
        .registry(StageKind::Fragment)
        .unwrap()
        .selector_location()
        .cloned();
    assert!(location.is_some());
    mock.use_program(Some(program.program()));
    for value in [3, 42] {
        mock.uniform_1_i32(location.as_ref(), value);
        assert_eq!(
            mock.uniform_value(program.program(), "activeFragmentShaderId"),
            Some(value)
        );
        assert_eq!(
            mock.dispatched_function(program.program(), StageKind::Fragment),
            None
        );
    }
    mock.uniform_1_i32(location.as_ref(), 2);
    assert_eq!(
        mock.dispatched_function(program.program(), StageKind::Fragment)
            .as_deref(),
        Some("lx_program2_main")
    );
}

#[test]
fn source_with_its_own_version_keeps_it_first() {
    let fs = "\n#version 330 core\nin vec3 c;\n[light]\nvoid main(){ out0 = vec4(c, 1.0); }\n";
    let mock = MockBackend::new();
    let program = builder(fs).compile(&mock).unwrap();
    let linked = mock
        .linked_source(program.program(), StageKind::Fragment)
        .unwrap();
    assert_eq!(linked.matches("#version").count(), 1);
    let lines: Vec<&str> = linked.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines[0], "#version 330 core");
    assert_eq!(lines[1], "uniform int activeFragmentShaderId;");
    assert_eq!(lines[2], "out mediump vec4 out0;");

    // sources without a directive still get the configured one
    let linked = mock
        .linked_source(program.program(), StageKind::Vertex)
        .unwrap();
    assert!(linked.starts_with("#version"));
    assert_eq!(linked.matches("#version").count(), 1);
}
