//! pipeline stages and the per-stage code injection policy

/// One programmable stage of an OpenGL program object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageKind {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
    Compute,
}

impl StageKind {
    pub const ALL: [StageKind; 6] = [
        StageKind::Vertex,
        StageKind::TessControl,
        StageKind::TessEvaluation,
        StageKind::Geometry,
        StageKind::Fragment,
        StageKind::Compute,
    ];

    /// name used to build generated symbols, e.g. `FragmentShader`
    pub fn name(self) -> &'static str {
        match self {
            StageKind::Vertex => "VertexShader",
            StageKind::TessControl => "TessControlShader",
            StageKind::TessEvaluation => "TessEvaluationShader",
            StageKind::Geometry => "GeometryShader",
            StageKind::Fragment => "FragmentShader",
            StageKind::Compute => "ComputeShader",
        }
    }

    /// the `glCreateShader` enum
    pub fn gl_enum(self) -> u32 {
        match self {
            StageKind::Vertex => glow::VERTEX_SHADER,
            StageKind::TessControl => glow::TESS_CONTROL_SHADER,
            StageKind::TessEvaluation => glow::TESS_EVALUATION_SHADER,
            StageKind::Geometry => glow::GEOMETRY_SHADER,
            StageKind::Fragment => glow::FRAGMENT_SHADER,
            StageKind::Compute => glow::COMPUTE_SHADER,
        }
    }

    /// Name of the `int` uniform the generated dispatcher branches on.
    ///
    /// `active<StageName>Id`, e.g. `activeFragmentShaderId`. Host code that
    /// selects sections by name never needs it, but stages without selector
    /// injection must declare `uniform int <this name>;` themselves.
    pub fn selector_name(self) -> String {
        format!("active{}Id", self.name())
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed name of the color output injected into fragment stages.
pub const FRAGMENT_OUTPUT_NAME: &str = "out0";

/// What gets injected after the first line of a stage that declares sections.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StagePolicy {
    /// declare `uniform int active<StageName>Id;`
    pub inject_selector: bool,
    /// extra declaration line, e.g. the fragment color output
    pub output_declaration: Option<String>,
}

impl StagePolicy {
    /// the lines to insert for `stage`, empty when nothing is injected
    pub fn injected_lines(&self, stage: StageKind) -> Vec<String> {
        let mut lines = vec![];
        if self.inject_selector {
            lines.push(format!("uniform int {};", stage.selector_name()));
        }
        if let Some(decl) = &self.output_declaration {
            lines.push(decl.clone());
        }
        lines
    }
}

/// Per-stage injection policies.
///
/// By default only the fragment stage gets its selector and color output
/// declared; every other stage has to declare `active<StageName>Id` in its
/// own source before its sections can be dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePolicyTable {
    policies: std::collections::BTreeMap<StageKind, StagePolicy>,
}

impl Default for StagePolicyTable {
    fn default() -> Self {
        let mut policies = std::collections::BTreeMap::new();
        for stage in StageKind::ALL {
            policies.insert(stage, StagePolicy::default());
        }
        // GLSL ES 3.00 has no default float precision in fragment shaders and
        // the output is declared before any `precision` statement
        policies.insert(
            StageKind::Fragment,
            StagePolicy {
                inject_selector: true,
                output_declaration: Some(format!("out mediump vec4 {FRAGMENT_OUTPUT_NAME};")),
            },
        );
        StagePolicyTable { policies }
    }
}

impl StagePolicyTable {
    /// a table where no stage receives any injection
    pub fn none() -> Self {
        let mut policies = std::collections::BTreeMap::new();
        for stage in StageKind::ALL {
            policies.insert(stage, StagePolicy::default());
        }
        StagePolicyTable { policies }
    }

    pub fn get(&self, stage: StageKind) -> &StagePolicy {
        // every stage is inserted at construction
        &self.policies[&stage]
    }

    pub fn set(&mut self, stage: StageKind, policy: StagePolicy) {
        self.policies.insert(stage, policy);
    }

    pub fn requires_selector_injection(&self, stage: StageKind) -> bool {
        self.get(stage).inject_selector
    }
}
