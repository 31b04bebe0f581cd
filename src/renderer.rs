//! Draws a mesh with a material.
//!
//! Besides the material's own uniforms, the renderer sets a fixed set of
//! reserved uniforms on every draw. Shaders may use any subset of them:
//!
//! | Name             | Type   |
//! |------------------|--------|
//! | `modelMatrix`    | `mat4` |
//! | `viewMatrix`     | `mat4` |
//! | `projMatrix`     | `mat4` |
//! | `MVP`            | `mat4` |
//! | `cameraWorldPos` | `vec3` |
//! | `time`           | `float`|
//! | `lightDir`       | `vec3` |
//! | `lightColor`     | `vec3` |

use glam::{Mat4, Vec3};
use log::trace;

use crate::{
    gl::Gl,
    material::Material,
    mesh::{LAYOUT, STRIDE, VertexBuffer},
    uniform::Uniform,
};

pub const MODEL_MATRIX: &str = "modelMatrix";
pub const VIEW_MATRIX: &str = "viewMatrix";
pub const PROJECTION_MATRIX: &str = "projMatrix";
pub const MVP_MATRIX: &str = "MVP";
pub const CAMERA_WORLD_POS: &str = "cameraWorldPos";
pub const TIME: &str = "time";
pub const LIGHT_DIR: &str = "lightDir";
pub const LIGHT_COLOR: &str = "lightColor";

/// Lighting shared by every draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    pub light_direction: Vec3,
    pub light_color: Vec3,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            light_direction: Vec3::new(0.5, 1.2, 1.5),
            light_color: Vec3::ONE,
        }
    }
}

/// Per-frame transform inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    /// Seconds since the viewer started.
    pub time: f32,
}

/// A vertex buffer bound to a material's program.
#[derive(Debug)]
pub struct Renderable {
    buffer: VertexBuffer,
    material: Material,
}

impl Renderable {
    /// Points the buffer's attributes at the locations `material`'s program
    /// assigned to them.
    pub fn bind(gl: &dyn Gl, buffer: VertexBuffer, material: Material) -> Self {
        let renderable = Self { buffer, material };
        renderable.rebind(gl);
        renderable
    }

    /// Re-queries attribute locations, e.g. after the material's program changed.
    pub fn rebind(&self, gl: &dyn Gl) {
        gl.bind_vertex_array(self.buffer.array);

        let program = self.material.program();
        for (name, components, offset) in LAYOUT {
            match program.attrib_location(gl, name) {
                Some(location) => gl.vertex_attrib(location, components, STRIDE, offset),
                None => trace!("attribute not used in shader: {name}"),
            }
        }
    }

    /// Swaps in another mesh and returns the previous one.
    pub fn set_buffer(&mut self, gl: &dyn Gl, buffer: VertexBuffer) -> VertexBuffer {
        let previous = std::mem::replace(&mut self.buffer, buffer);
        self.rebind(gl);
        previous
    }

    pub fn buffer(&self) -> VertexBuffer {
        self.buffer
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    pub fn into_parts(self) -> (VertexBuffer, Material) {
        (self.buffer, self.material)
    }

    /// Issues one triangle-list draw of the whole buffer.
    pub fn draw(&self, gl: &dyn Gl, frame: &FrameUniforms, environment: &Environment) {
        let program = self.material.program();
        gl.use_program(program.handle());

        let mvp = frame.projection * frame.view * frame.model;
        program.set_uniform(gl, MODEL_MATRIX, frame.model);
        program.set_uniform(gl, VIEW_MATRIX, frame.view);
        program.set_uniform(gl, PROJECTION_MATRIX, frame.projection);
        program.set_uniform(gl, MVP_MATRIX, mvp);
        program.set_uniform(gl, CAMERA_WORLD_POS, frame.camera_position);
        program.set_uniform(gl, TIME, Uniform::Float(frame.time));
        program.set_uniform(gl, LIGHT_DIR, environment.light_direction);
        program.set_uniform(gl, LIGHT_COLOR, environment.light_color);

        gl.bind_vertex_array(self.buffer.array);
        self.material.bind_textures(gl);
        gl.draw_triangles(self.buffer.vertex_count);
    }
}
