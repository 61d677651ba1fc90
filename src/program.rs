//! Building one GL program from multi-section stage sources and switching
//! sections at draw time.
//!
//! ```ignore
//! let mut builder = ProgramBuilder::new(Config::default());
//! builder
//!     .load_stage(StageKind::Vertex, VS_SRC)
//!     .load_stage(StageKind::Fragment, FS_SRC);
//! let mut program = builder.compile(gl)?;
//! program.set_active(gl, StageKind::Fragment, "object");
//! // draw
//! program.delete(gl);
//! ```

use std::collections::BTreeMap;

use crate::backend::ShaderBackend;
use crate::config::Config;
use crate::error::{Result, ShaderError};
use crate::section::{find_section, split, Section, SplitStage};
use crate::stage::StageKind;

/// Collects stage sources and assembles them into a [`CompiledProgram`].
///
/// Sources are split as soon as they are loaded; `compile` can be called any
/// number of times and every call produces an independent program.
#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    config: Config,
    stages: Vec<SplitStage>,
}

impl ProgramBuilder {
    pub fn new(config: Config) -> Self {
        ProgramBuilder {
            config,
            stages: vec![],
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Splits `source` and queues it for `stage`, replacing any source
    /// loaded earlier for the same stage.
    pub fn load_stage(&mut self, stage: StageKind, source: &str) -> &mut Self {
        let source = match &self.config.shader_version {
            Some(version) if crate::section::version_line(source).is_none() => {
                format!("{version}\n{source}")
            }
            _ => source.to_string(),
        };
        let split = split(
            &source,
            stage,
            self.config.policies.get(stage),
            self.config.rename_rule,
        );
        match self.stages.iter_mut().find(|s| s.stage == stage) {
            Some(loaded) => {
                log::warn!("{stage} loaded twice, the earlier source is replaced");
                *loaded = split;
            }
            None => self.stages.push(split),
        }
        self
    }

    pub fn load_stage_file(
        &mut self,
        stage: StageKind,
        path: impl AsRef<std::path::Path>,
    ) -> Result<&mut Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.load_stage(stage, &source))
    }

    /// the rewritten source queued for `stage`
    pub fn split_stage(&self, stage: StageKind) -> Option<&SplitStage> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Compiles every loaded stage and links them into one program.
    ///
    /// Nothing created on the way is left alive when an error is returned.
    pub fn compile<B: ShaderBackend>(&self, backend: &B) -> Result<CompiledProgram<B>> {
        if self.stages.is_empty() {
            return Err(ShaderError::NoStages);
        }
        let program = backend.create_program().map_err(ShaderError::Backend)?;
        let mut shaders = Vec::<B::Shader>::with_capacity(self.stages.len());
        let linked = self
            .compile_stages(backend, program, &mut shaders)
            .and_then(|()| self.link(backend, program));
        for shader in shaders {
            backend.detach_shader(program, shader);
            backend.delete_shader(shader);
        }
        if let Err(err) = linked {
            backend.delete_program(program);
            return Err(err);
        }

        let mut registries = BTreeMap::new();
        for split in &self.stages {
            let selector = if split.is_multi() {
                let location = backend.uniform_location(program, &split.stage.selector_name());
                if location.is_none() {
                    log::warn!(
                        "{}: {} is not an active uniform, sections cannot be switched",
                        split.stage,
                        split.stage.selector_name()
                    );
                }
                location
            } else {
                None
            };
            registries.insert(
                split.stage,
                StageRegistry {
                    stage: split.stage,
                    sections: split.sections.clone(),
                    selector,
                    selector_value: 0,
                    active: None,
                },
            );
        }
        log::debug!(
            "linked program with stages {:?}",
            registries.keys().collect::<Vec<_>>()
        );
        Ok(CompiledProgram {
            program,
            registries,
            strict_selection: self.config.strict_selection,
        })
    }

    fn compile_stages<B: ShaderBackend>(
        &self,
        backend: &B,
        program: B::Program,
        shaders: &mut Vec<B::Shader>,
    ) -> Result<()> {
        for split in &self.stages {
            let shader = backend
                .create_shader(split.stage)
                .map_err(ShaderError::Backend)?;
            let status = backend.compile_shader(shader, &split.source);
            let log = backend.shader_info_log(shader);
            if let Err(log) = check_diagnostics(status, log, self.config.diagnostics_are_fatal) {
                backend.delete_shader(shader);
                return Err(ShaderError::StageCompile {
                    stage: split.stage,
                    log,
                });
            }
            backend.attach_shader(program, shader);
            shaders.push(shader);
        }
        Ok(())
    }

    fn link<B: ShaderBackend>(&self, backend: &B, program: B::Program) -> Result<()> {
        let status = backend.link_program(program);
        let log = backend.program_info_log(program);
        check_diagnostics(status, log, self.config.diagnostics_are_fatal)
            .map_err(|log| ShaderError::Link { log })
    }
}

/// Turns a status and info log into the log to report, if any.
fn check_diagnostics(status: bool, log: String, fatal: bool) -> std::result::Result<(), String> {
    let empty = log.trim().is_empty();
    if !status {
        return Err(if empty {
            "failed without a diagnostic".to_string()
        } else {
            log
        });
    }
    if !empty {
        if fatal {
            return Err(log);
        }
        log::warn!("ignoring diagnostic: {}", log.trim());
    }
    Ok(())
}

/// The sections of one stage of a linked program and its selector.
#[derive(Debug, Clone)]
pub struct StageRegistry<L> {
    stage: StageKind,
    sections: Vec<Section>,
    selector: Option<L>,
    selector_value: i32,
    active: Option<String>,
}

impl<L> StageRegistry<L> {
    pub fn stage(&self) -> StageKind {
        self.stage
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn selector_location(&self) -> Option<&L> {
        self.selector.as_ref()
    }

    /// Last value written to the selector.
    ///
    /// 0 right after linking, so the first section runs until another is
    /// selected.
    pub fn selector_value(&self) -> i32 {
        self.selector_value
    }

    pub fn active_section(&self) -> Option<&str> {
        self.active.as_deref()
    }
}

/// A linked program whose stages may host several selectable sections.
pub struct CompiledProgram<B: ShaderBackend> {
    program: B::Program,
    registries: BTreeMap<StageKind, StageRegistry<B::UniformLocation>>,
    strict_selection: bool,
}

impl<B: ShaderBackend> CompiledProgram<B> {
    pub fn program(&self) -> B::Program {
        self.program
    }

    pub fn bind(&self, backend: &B) {
        backend.use_program(Some(self.program));
    }

    pub fn uniform_location(&self, backend: &B, name: &str) -> Option<B::UniformLocation> {
        backend.uniform_location(self.program, name)
    }

    pub fn stages(&self) -> impl Iterator<Item = StageKind> + '_ {
        self.registries.keys().copied()
    }

    pub fn registry(&self, stage: StageKind) -> Option<&StageRegistry<B::UniformLocation>> {
        self.registries.get(&stage)
    }

    /// sections of `stage` in dispatch order, empty for a plain stage
    pub fn sections(&self, stage: StageKind) -> &[Section] {
        self.registries
            .get(&stage)
            .map(|r| r.sections.as_slice())
            .unwrap_or(&[])
    }

    pub fn active_section(&self, stage: StageKind) -> Option<&str> {
        self.registries.get(&stage)?.active_section()
    }

    pub fn selector_value(&self, stage: StageKind) -> Option<i32> {
        Some(self.registries.get(&stage)?.selector_value)
    }

    /// Selects the section `name` of `stage` for the following draw calls.
    ///
    /// Binds the program. An unknown name writes -1, so the stage runs no
    /// section at all until another one is selected.
    pub fn set_active(&mut self, backend: &B, stage: StageKind, name: &str) {
        let program = self.program;
        let strict = self.strict_selection;
        let Some(registry) = self.registries.get_mut(&stage) else {
            if strict {
                log::warn!("{stage} is not part of this program, `{name}` ignored");
            }
            return;
        };
        let index = find_section(&registry.sections, name);
        if index.is_none() && strict {
            log::warn!("{stage} has no section named `{name}`, it will run nothing");
        }
        write_selector(backend, program, registry, index, name);
    }

    /// Like [`CompiledProgram::set_active`], but an unknown name is an error
    /// and leaves the current selection untouched.
    pub fn try_set_active(&mut self, backend: &B, stage: StageKind, name: &str) -> Result<()> {
        let program = self.program;
        let unknown = || ShaderError::UnknownSection {
            stage,
            name: name.to_string(),
        };
        let registry = self.registries.get_mut(&stage).ok_or_else(unknown)?;
        let index = find_section(&registry.sections, name).ok_or_else(unknown)?;
        write_selector(backend, program, registry, Some(index), name);
        Ok(())
    }

    /// releases the GL program
    pub fn delete(self, backend: &B) {
        backend.delete_program(self.program);
    }
}

fn write_selector<B: ShaderBackend>(
    backend: &B,
    program: B::Program,
    registry: &mut StageRegistry<B::UniformLocation>,
    index: Option<i32>,
    name: &str,
) {
    backend.use_program(Some(program));
    let Some(selector) = registry.selector.as_ref() else {
        // nothing to write to, so nothing is selected
        log::warn!(
            "{}: `{}` is not declared, cannot select `{name}`",
            registry.stage,
            registry.stage.selector_name()
        );
        registry.selector_value = -1;
        registry.active = None;
        return;
    };
    let value = index.unwrap_or(-1);
    backend.uniform_1_i32(Some(selector), value);
    log::trace!("{}: {} = {value}", registry.stage, registry.stage.selector_name());
    registry.selector_value = value;
    registry.active = index.map(|_| name.to_string());
}
