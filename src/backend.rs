//! The GL calls the assembler and the multiplexer need.
//!
//! Everything goes through [`ShaderBackend`] so that programs can be built
//! and switched against [`crate::mock::MockBackend`] without a GL context.
//! The implementation for [`glow::Context`] is what a renderer uses.
//! All methods must be called on the thread that owns the GL context.

use crate::stage::StageKind;

pub trait ShaderBackend {
    type Shader: Copy;
    type Program: Copy;
    type UniformLocation: Clone;

    fn create_shader(&self, stage: StageKind) -> Result<Self::Shader, String>;
    /// uploads `source` and compiles it, returning the compile status
    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    /// links `program`, returning the link status
    fn link_program(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);

    fn use_program(&self, program: Option<Self::Program>);
    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    /// writes an `int` uniform of the program in use
    fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, value: i32);
}

impl ShaderBackend for glow::Context {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type UniformLocation = glow::UniformLocation;

    fn create_shader(&self, stage: StageKind) -> Result<Self::Shader, String> {
        unsafe { glow::HasContext::create_shader(self, stage.gl_enum()) }
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool {
        use glow::HasContext as _;
        unsafe {
            self.shader_source(shader, source);
            glow::HasContext::compile_shader(self, shader);
            self.get_shader_compile_status(shader)
        }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        use glow::HasContext as _;
        unsafe { self.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { glow::HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { glow::HasContext::create_program(self) }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { glow::HasContext::attach_shader(self, program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { glow::HasContext::detach_shader(self, program, shader) }
    }

    fn link_program(&self, program: Self::Program) -> bool {
        use glow::HasContext as _;
        unsafe {
            glow::HasContext::link_program(self, program);
            self.get_program_link_status(program)
        }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        use glow::HasContext as _;
        unsafe { self.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { glow::HasContext::delete_program(self, program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { glow::HasContext::use_program(self, program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        use glow::HasContext as _;
        unsafe { self.get_uniform_location(program, name) }
    }

    fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, value: i32) {
        unsafe { glow::HasContext::uniform_1_i32(self, location, value) }
    }
}
