use crate::rename::RenameRule;
use crate::stage::{StageKind, StagePolicy, StagePolicyTable};

/// `#version` line matching the GL flavor of the build target
pub fn default_shader_version() -> &'static str {
    if cfg!(target_arch = "wasm32") {
        "#version 300 es"
    } else {
        "#version 330"
    }
}

/// How stage sources are rewritten, compiled and selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// prepended as the first line of every stage that does not start with its
    /// own `#version`, `None` to use sources as-is
    pub shader_version: Option<String>,
    pub rename_rule: RenameRule,
    pub policies: StagePolicyTable,
    /// log a warning whenever a section name is not found
    pub strict_selection: bool,
    /// fail on a non-empty compile or link log even if the driver reports success
    pub diagnostics_are_fatal: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            shader_version: Some(default_shader_version().to_string()),
            rename_rule: RenameRule::default(),
            policies: StagePolicyTable::default(),
            strict_selection: false,
            diagnostics_are_fatal: true,
        }
    }
}

impl Config {
    pub fn with_shader_version(mut self, version: Option<&str>) -> Self {
        self.shader_version = version.map(|v| v.to_string());
        self
    }

    pub fn with_rename_rule(mut self, rule: RenameRule) -> Self {
        self.rename_rule = rule;
        self
    }

    pub fn with_policy(mut self, stage: StageKind, policy: StagePolicy) -> Self {
        self.policies.set(stage, policy);
        self
    }

    pub fn with_strict_selection(mut self, strict: bool) -> Self {
        self.strict_selection = strict;
        self
    }

    pub fn with_fatal_diagnostics(mut self, fatal: bool) -> Self {
        self.diagnostics_are_fatal = fatal;
        self
    }
}
