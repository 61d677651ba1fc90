//! Several shader programs per stage packed into one GL program object.
//!
//! A stage source is split at lines of the form `[name]`; every section keeps
//! its own `main` and a generated `main` forwards to the one selected through
//! the `active<Stage>Id` uniform, so switching between sections at draw time
//! does not need another program.

pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod drawer_vtx2xyrgb;
pub mod error;
pub mod mock;
pub mod program;
pub mod rename;
pub mod section;
pub mod stage;
pub mod trim;

pub use backend::ShaderBackend;
pub use config::Config;
pub use error::{Result, ShaderError};
pub use program::{CompiledProgram, ProgramBuilder, StageRegistry};
pub use section::Section;
pub use stage::StageKind;

/// Compiles a vertex and a fragment source, either of which may declare
/// sections, into one program with the default configuration.
pub fn compile_shaders(
    gl: &glow::Context,
    shader_version: &str,
    vertex_shader_source: &str,
    fragment_shader_source: &str,
) -> Result<CompiledProgram<glow::Context>> {
    let config = Config::default().with_shader_version(Some(shader_version));
    ProgramBuilder::new(config)
        .load_stage(StageKind::Vertex, vertex_shader_source)
        .load_stage(StageKind::Fragment, fragment_shader_source)
        .compile(gl)
}
