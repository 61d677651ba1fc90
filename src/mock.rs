//! Mock backend for testing
//!
//! [`MockBackend`] implements [`ShaderBackend`] without a GL context. It
//! records every call, keeps track of live objects so leaks can be asserted,
//! stores `int` uniform writes per program and can evaluate a generated
//! dispatcher to tell which section would run.
//!
//! Compilation fails when braces are unbalanced or the source contains
//! [`SYNTAX_ERROR_TOKEN`]; linking fails when no shader is attached or a
//! failure was requested with [`MockBackend::fail_next_link`].

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::backend::ShaderBackend;
use crate::stage::StageKind;

/// a source containing this never compiles
pub const SYNTAX_ERROR_TOKEN: &str = "@syntax_error@";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    CreateShader { stage: StageKind, shader: u32 },
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader { program: u32, shader: u32 },
    DetachShader { program: u32, shader: u32 },
    LinkProgram(u32),
    DeleteProgram(u32),
    UseProgram(Option<u32>),
    Uniform1i { location: Option<MockUniformLocation>, value: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockUniformLocation {
    pub program: u32,
    pub name: String,
}

#[derive(Debug)]
struct MockShader {
    stage: StageKind,
    source: String,
    log: String,
}

#[derive(Debug, Default)]
struct MockProgram {
    attached: Vec<u32>,
    linked: Vec<(StageKind, String)>,
    log: String,
    uniforms: BTreeMap<String, i32>,
}

#[derive(Debug, Default)]
struct MockState {
    next_id: u32,
    shaders: BTreeMap<u32, MockShader>,
    programs: BTreeMap<u32, MockProgram>,
    current: Option<u32>,
    calls: Vec<BackendCall>,
    fail_next_link: Option<String>,
    compile_warning: Option<String>,
}

impl MockState {
    fn new_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MockBackend {
    state: RefCell<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// the next link fails with `log`
    pub fn fail_next_link(&self, log: &str) {
        self.state.borrow_mut().fail_next_link = Some(log.to_string());
    }

    /// successful compiles report `log` as their info log
    pub fn set_compile_warning(&self, log: Option<&str>) {
        self.state.borrow_mut().compile_warning = log.map(|l| l.to_string());
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn current_program(&self) -> Option<u32> {
        self.state.borrow().current
    }

    /// last value written to the `int` uniform `name` of `program`
    pub fn uniform_value(&self, program: u32, name: &str) -> Option<i32> {
        self.state
            .borrow()
            .programs
            .get(&program)?
            .uniforms
            .get(name)
            .copied()
    }

    /// source of `stage` as it was linked into `program`
    pub fn linked_source(&self, program: u32, stage: StageKind) -> Option<String> {
        self.state
            .borrow()
            .programs
            .get(&program)?
            .linked
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, src)| src.clone())
    }

    /// Function the generated `main` of `stage` calls for the current
    /// selector value, `None` if no branch matches.
    ///
    /// An unset selector reads as 0, as uniforms do after linking.
    pub fn dispatched_function(&self, program: u32, stage: StageKind) -> Option<String> {
        let source = self.linked_source(program, stage)?;
        let selector = stage.selector_name();
        let value = self.uniform_value(program, &selector).unwrap_or(0);
        let dispatcher = &source[source.rfind("void main() {")?..];
        dispatcher.lines().find_map(|line| {
            let rest = line.trim().strip_prefix("if (")?;
            let (cond, call) = rest.split_once(") { ")?;
            let (name, index) = cond.split_once(" == ")?;
            if name != selector || index.parse::<i32>().ok()? != value {
                return None;
            }
            Some(call.split_once("()")?.0.to_string())
        })
    }

    /// Body of `function` in the linked source of `stage`, between its braces.
    pub fn function_body(&self, program: u32, stage: StageKind, function: &str) -> Option<String> {
        let source = self.linked_source(program, stage)?;
        let start = source.find(&format!("void {function}("))?;
        let open = start + source[start..].find('{')?;
        let mut depth = 0;
        for (i, c) in source[open..].char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(source[open + 1..open + i].to_string());
                    }
                }
                _ => {}
            }
        }
        None
    }
}

fn syntax_errors(source: &str) -> Option<String> {
    if source.contains(SYNTAX_ERROR_TOKEN) {
        return Some(format!("0:1: syntax error, unexpected '{SYNTAX_ERROR_TOKEN}'"));
    }
    let mut depth = 0_i32;
    for c in source.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return Some("0:1: syntax error, unexpected '}'".to_string());
        }
    }
    if depth != 0 {
        return Some("0:1: syntax error, unexpected end of file".to_string());
    }
    None
}

impl ShaderBackend for MockBackend {
    type Shader = u32;
    type Program = u32;
    type UniformLocation = MockUniformLocation;

    fn create_shader(&self, stage: StageKind) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let shader = state.new_id();
        state.shaders.insert(
            shader,
            MockShader {
                stage,
                source: String::new(),
                log: String::new(),
            },
        );
        state.calls.push(BackendCall::CreateShader { stage, shader });
        Ok(shader)
    }

    fn compile_shader(&self, shader: u32, source: &str) -> bool {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::CompileShader(shader));
        let warning = state.compile_warning.clone();
        let Some(s) = state.shaders.get_mut(&shader) else {
            return false;
        };
        s.source = source.to_string();
        match syntax_errors(source) {
            Some(log) => {
                s.log = log;
                false
            }
            None => {
                s.log = warning.unwrap_or_default();
                true
            }
        }
    }

    fn shader_info_log(&self, shader: u32) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::DeleteShader(shader));
        state.shaders.remove(&shader);
    }

    fn create_program(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let program = state.new_id();
        state.programs.insert(program, MockProgram::default());
        state.calls.push(BackendCall::CreateProgram(program));
        Ok(program)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        state
            .calls
            .push(BackendCall::AttachShader { program, shader });
        if let Some(p) = state.programs.get_mut(&program) {
            p.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        state
            .calls
            .push(BackendCall::DetachShader { program, shader });
        if let Some(p) = state.programs.get_mut(&program) {
            p.attached.retain(|s| *s != shader);
        }
    }

    fn link_program(&self, program: u32) -> bool {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::LinkProgram(program));
        let forced_failure = state.fail_next_link.take();
        let Some(attached) = state.programs.get(&program).map(|p| p.attached.clone()) else {
            return false;
        };
        let linked: Vec<(StageKind, String)> = attached
            .iter()
            .filter_map(|id| state.shaders.get(id))
            .map(|s| (s.stage, s.source.clone()))
            .collect();
        let log = match forced_failure {
            Some(log) => log,
            None if linked.is_empty() => "error: no shaders attached".to_string(),
            None => String::new(),
        };
        let ok = log.is_empty();
        if let Some(p) = state.programs.get_mut(&program) {
            p.log = log;
            if ok {
                p.linked = linked;
                p.uniforms.clear();
            }
        }
        ok
    }

    fn program_info_log(&self, program: u32) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::DeleteProgram(program));
        state.programs.remove(&program);
        if state.current == Some(program) {
            state.current = None;
        }
    }

    fn use_program(&self, program: Option<u32>) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::UseProgram(program));
        state.current = program;
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<MockUniformLocation> {
        let state = self.state.borrow();
        let p = state.programs.get(&program)?;
        p.linked
            .iter()
            .any(|(_, src)| src.contains(&format!("uniform int {name};")))
            .then(|| MockUniformLocation {
                program,
                name: name.to_string(),
            })
    }

    fn uniform_1_i32(&self, location: Option<&MockUniformLocation>, value: i32) {
        let mut state = self.state.borrow_mut();
        state.calls.push(BackendCall::Uniform1i {
            location: location.cloned(),
            value,
        });
        let Some(location) = location else {
            return;
        };
        // GL writes to the program in use; anything else is an error there
        if state.current != Some(location.program) {
            return;
        }
        if let Some(p) = state.programs.get_mut(&location.program) {
            p.uniforms.insert(location.name.clone(), value);
        }
    }
}
