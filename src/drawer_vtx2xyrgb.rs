//! draw colored 2D triangles, the fragment stage holds one section per shading

use crate::program::CompiledProgram;
use crate::stage::StageKind;

const VS_SRC: &str = r#"
in vec2 xyIn;
in vec3 rgbIn;
out vec3 v_color;
void main() {
    v_color = rgbIn;
    gl_Position = vec4(xyIn, 0.0, 1.0);
}
"#;

const FS_SRC: &str = r#"
precision mediump float;
in vec3 v_color;
[vertex_color]
void main() {
    out0 = vec4(v_color, 1.0);
}
[red]
void main() {
    out0 = vec4(1.0, 0.0, 0.0, 1.0);
}
[grayscale]
void main() {
    float g = dot(v_color, vec3(0.299, 0.587, 0.114));
    out0 = vec4(g, g, g, 1.0);
}
[inverted]
void main() {
    out0 = vec4(vec3(1.0) - v_color, 1.0);
}
"#;

pub struct Drawer {
    pub program: Option<CompiledProgram<glow::Context>>,
    pub mode: u32,
    pub vertex_array: Option<glow::VertexArray>,
    vbo: Option<glow::Buffer>,
    num_vtx: usize,
}

impl Default for Drawer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drawer {
    pub fn new() -> Self {
        Drawer {
            program: None,
            mode: glow::TRIANGLES,
            vertex_array: None,
            vbo: None,
            num_vtx: 0,
        }
    }

    pub fn compile_shader(&mut self, gl: &glow::Context) -> crate::Result<()> {
        let shader_version = crate::config::default_shader_version();
        self.program = Some(crate::compile_shaders(gl, shader_version, VS_SRC, FS_SRC)?);
        Ok(())
    }

    /// names of the fragment sections in dispatch order
    pub fn section_names(&self) -> Vec<String> {
        self.program
            .as_ref()
            .map(|p| {
                p.sections(StageKind::Fragment)
                    .iter()
                    .map(|s| s.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_section(&mut self, gl: &glow::Context, name: &str) {
        if let Some(program) = self.program.as_mut() {
            program.set_active(gl, StageKind::Fragment, name);
        }
    }

    /// `vtx2xyrgb` holds x, y, r, g, b per vertex
    pub fn set_vtx2xyrgb(&mut self, gl: &glow::Context, vtx2xyrgb: &[f32]) -> crate::Result<()> {
        use glow::HasContext as _;
        let Some(program) = self.program.as_ref().map(|p| p.program()) else {
            return Ok(());
        };
        self.num_vtx = vtx2xyrgb.len() / 5;
        self.release_buffers(gl);
        unsafe {
            let vertex_array = gl
                .create_vertex_array()
                .map_err(crate::ShaderError::Backend)?;
            let vbo = gl.create_buffer().map_err(crate::ShaderError::Backend)?;
            gl.bind_vertex_array(Some(vertex_array));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(vtx2xyrgb),
                glow::STATIC_DRAW,
            );
            let stride = 5 * std::mem::size_of::<f32>() as i32;
            if let Some(loc_xy) = gl.get_attrib_location(program, "xyIn") {
                gl.vertex_attrib_pointer_f32(loc_xy, 2, glow::FLOAT, false, stride, 0);
                gl.enable_vertex_attrib_array(loc_xy);
            }
            if let Some(loc_rgb) = gl.get_attrib_location(program, "rgbIn") {
                gl.vertex_attrib_pointer_f32(
                    loc_rgb,
                    3,
                    glow::FLOAT,
                    false,
                    stride,
                    2 * std::mem::size_of::<f32>() as i32,
                );
                gl.enable_vertex_attrib_array(loc_rgb);
            }
            gl.bind_vertex_array(None);
            self.vertex_array = Some(vertex_array);
            self.vbo = Some(vbo);
        }
        Ok(())
    }

    pub fn destroy(&mut self, gl: &glow::Context) {
        if let Some(program) = self.program.take() {
            program.delete(gl);
        }
        self.release_buffers(gl);
    }

    /// deletes the vertex array and buffer of the previous upload, if any
    fn release_buffers(&mut self, gl: &glow::Context) {
        use glow::HasContext as _;
        release(&mut self.vertex_array, |vao| unsafe { gl.delete_vertex_array(vao) });
        release(&mut self.vbo, |vbo| unsafe { gl.delete_buffer(vbo) });
    }

    pub fn paint(&self, gl: &glow::Context) {
        use glow::HasContext as _;
        let Some(program) = self.program.as_ref() else {
            return;
        };
        program.bind(gl);
        unsafe {
            gl.bind_vertex_array(self.vertex_array);
            gl.draw_arrays(self.mode, 0, self.num_vtx as i32);
            gl.bind_vertex_array(None);
        }
    }
}

/// Empties `slot`, handing the previous GL object to `delete`.
fn release<T>(slot: &mut Option<T>, delete: impl FnOnce(T)) {
    if let Some(object) = slot.take() {
        delete(object);
    }
}
