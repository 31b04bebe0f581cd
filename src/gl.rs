//! The OpenGL primitives the material system is built on.
//!
//! Everything above this module talks to the GPU through the [`Gl`] trait, so
//! the reflection, material and draw logic never touch raw function pointers.
//! [`EpoxyGl`] is the real implementation, backed by libepoxy.

use std::{
    ffi::{CString, c_char, c_void},
    fmt, ptr,
    sync::Once,
};

use image::RgbaImage;
use libloading::os::unix::Library;

use crate::uniform::Uniform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

/// A vertex array object together with the buffer it reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArray {
    pub vao: u32,
    pub vbo: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Opaque graphics primitives.
///
/// Every method assumes the right context is current. Errors carry the
/// driver's info log verbatim.
pub trait Gl {
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String>;
    fn delete_shader(&self, shader: ShaderHandle);
    /// Links both stages. On failure the program object is already deleted.
    fn link_program(
        &self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, String>;
    fn delete_program(&self, program: ProgramHandle);
    fn use_program(&self, program: ProgramHandle);

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;
    fn attrib_location(&self, program: ProgramHandle, name: &str) -> Option<u32>;
    fn set_uniform(&self, location: UniformLocation, value: &Uniform);

    fn create_texture(&self, image: &RgbaImage) -> TextureHandle;
    fn delete_texture(&self, texture: TextureHandle);
    /// Activates texture unit `unit` and binds `texture` to it.
    fn bind_texture(&self, unit: u32, texture: TextureHandle);

    fn create_vertex_array(&self, vertices: &[f32]) -> VertexArray;
    fn delete_vertex_array(&self, array: VertexArray);
    fn bind_vertex_array(&self, array: VertexArray);
    /// Points attribute `location` at `components` floats, `offset` bytes into
    /// each `stride`-byte vertex of the bound buffer.
    fn vertex_attrib(&self, location: u32, components: i32, stride: i32, offset: usize);
    fn draw_triangles(&self, vertex_count: i32);
    /// Clears color and depth with depth testing and back-face culling on.
    fn clear(&self, color: [f32; 4]);
}

static INIT_EPOXY: Once = Once::new();

/// [`Gl`] implemented with epoxy.
#[derive(Debug)]
pub struct EpoxyGl {
    _private: (),
}

impl EpoxyGl {
    /// Resolves epoxy's function pointers on first use.
    ///
    /// Must be called with a current GL context.
    pub fn new() -> Self {
        INIT_EPOXY.call_once(load_epoxy);
        Self { _private: () }
    }
}

impl Default for EpoxyGl {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads epoxy's OpenGL function pointers from the system libepoxy.
///
/// This needs to happen before any GL call, and specifically before GTK's
/// `GLArea` tries to render.
pub(crate) fn load_epoxy() {
    let library = unsafe { Library::new("libepoxy.so.0") }.expect("Can't find libepoxy.so.0");
    epoxy::load_with(|name| {
        unsafe { library.get::<_>(name.as_bytes()) }
            .map(|symbol| *symbol)
            .unwrap_or(ptr::null())
    });
    // epoxy keeps the resolved pointers; the library must stay mapped.
    std::mem::forget(library);
}

fn c_name(name: &str) -> Option<CString> {
    CString::new(name).ok()
}

impl Gl for EpoxyGl {
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String> {
        let kind = match stage {
            ShaderStage::Vertex => epoxy::VERTEX_SHADER,
            ShaderStage::Fragment => epoxy::FRAGMENT_SHADER,
        };

        unsafe {
            let shader = epoxy::CreateShader(kind);
            let ptr = source.as_ptr().cast::<c_char>();
            let len = source.len() as i32;
            epoxy::ShaderSource(shader, 1, &raw const ptr, &raw const len);
            epoxy::CompileShader(shader);

            let mut ok = 0i32;
            epoxy::GetShaderiv(shader, epoxy::COMPILE_STATUS, &raw mut ok);
            if ok != 0 {
                return Ok(ShaderHandle(shader));
            }

            let mut log_len = 0i32;
            epoxy::GetShaderiv(shader, epoxy::INFO_LOG_LENGTH, &raw mut log_len);
            let mut buf = vec![0u8; log_len.max(0) as usize];
            epoxy::GetShaderInfoLog(shader, log_len, ptr::null_mut(), buf.as_mut_ptr().cast());
            epoxy::DeleteShader(shader);
            Err(info_log(&buf))
        }
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        unsafe { epoxy::DeleteShader(shader.0) }
    }

    fn link_program(
        &self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, String> {
        unsafe {
            let program = epoxy::CreateProgram();
            epoxy::AttachShader(program, vertex.0);
            epoxy::AttachShader(program, fragment.0);
            epoxy::LinkProgram(program);

            let mut ok = 0i32;
            epoxy::GetProgramiv(program, epoxy::LINK_STATUS, &raw mut ok);
            if ok != 0 {
                epoxy::DetachShader(program, vertex.0);
                epoxy::DetachShader(program, fragment.0);
                return Ok(ProgramHandle(program));
            }

            let mut log_len = 0i32;
            epoxy::GetProgramiv(program, epoxy::INFO_LOG_LENGTH, &raw mut log_len);
            let mut buf = vec![0u8; log_len.max(0) as usize];
            epoxy::GetProgramInfoLog(program, log_len, ptr::null_mut(), buf.as_mut_ptr().cast());
            epoxy::DeleteProgram(program);
            Err(info_log(&buf))
        }
    }

    fn delete_program(&self, program: ProgramHandle) {
        unsafe { epoxy::DeleteProgram(program.0) }
    }

    fn use_program(&self, program: ProgramHandle) {
        unsafe { epoxy::UseProgram(program.0) }
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let name = c_name(name)?;
        let location = unsafe { epoxy::GetUniformLocation(program.0, name.as_ptr()) };
        (location >= 0).then_some(UniformLocation(location))
    }

    fn attrib_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let name = c_name(name)?;
        let location = unsafe { epoxy::GetAttribLocation(program.0, name.as_ptr()) };
        u32::try_from(location).ok()
    }

    fn set_uniform(&self, location: UniformLocation, value: &Uniform) {
        let location = location.0;
        unsafe {
            match value {
                Uniform::Float(v) => epoxy::Uniform1f(location, *v),
                Uniform::Vec2(v) => epoxy::Uniform2f(location, v[0], v[1]),
                Uniform::Vec3(v) => epoxy::Uniform3f(location, v[0], v[1], v[2]),
                Uniform::Vec4(v) => epoxy::Uniform4f(location, v[0], v[1], v[2], v[3]),
                Uniform::Int(v) => epoxy::Uniform1i(location, *v),
                Uniform::Mat4(m) => epoxy::UniformMatrix4fv(location, 1, epoxy::FALSE, m.as_ptr()),
            }
        }
    }

    fn create_texture(&self, image: &RgbaImage) -> TextureHandle {
        let (width, height) = image.dimensions();

        let mut id = 0u32;
        unsafe {
            epoxy::GenTextures(1, &raw mut id);
            epoxy::BindTexture(epoxy::TEXTURE_2D, id);
            epoxy::TexParameteri(
                epoxy::TEXTURE_2D,
                epoxy::TEXTURE_MIN_FILTER,
                epoxy::LINEAR as i32,
            );
            epoxy::TexParameteri(
                epoxy::TEXTURE_2D,
                epoxy::TEXTURE_MAG_FILTER,
                epoxy::LINEAR as i32,
            );
            epoxy::TexParameteri(epoxy::TEXTURE_2D, epoxy::TEXTURE_WRAP_S, epoxy::REPEAT as i32);
            epoxy::TexParameteri(epoxy::TEXTURE_2D, epoxy::TEXTURE_WRAP_T, epoxy::REPEAT as i32);
            epoxy::TexImage2D(
                epoxy::TEXTURE_2D,
                0,
                epoxy::RGBA as i32,
                width as i32,
                height as i32,
                0,
                epoxy::RGBA,
                epoxy::UNSIGNED_BYTE,
                image.as_raw().as_ptr().cast::<c_void>(),
            );
        }

        TextureHandle(id)
    }

    fn delete_texture(&self, texture: TextureHandle) {
        unsafe { epoxy::DeleteTextures(1, &raw const texture.0) }
    }

    fn bind_texture(&self, unit: u32, texture: TextureHandle) {
        unsafe {
            epoxy::ActiveTexture(epoxy::TEXTURE0 + unit);
            epoxy::BindTexture(epoxy::TEXTURE_2D, texture.0);
        }
    }

    fn create_vertex_array(&self, vertices: &[f32]) -> VertexArray {
        let mut vao = 0u32;
        let mut vbo = 0u32;
        unsafe {
            epoxy::GenVertexArrays(1, &raw mut vao);
            epoxy::BindVertexArray(vao);

            epoxy::GenBuffers(1, &raw mut vbo);
            epoxy::BindBuffer(epoxy::ARRAY_BUFFER, vbo);
            epoxy::BufferData(
                epoxy::ARRAY_BUFFER,
                std::mem::size_of_val(vertices) as isize,
                vertices.as_ptr().cast::<c_void>(),
                epoxy::STATIC_DRAW,
            );
        }
        VertexArray { vao, vbo }
    }

    fn delete_vertex_array(&self, array: VertexArray) {
        unsafe {
            epoxy::DeleteBuffers(1, &raw const array.vbo);
            epoxy::DeleteVertexArrays(1, &raw const array.vao);
        }
    }

    fn bind_vertex_array(&self, array: VertexArray) {
        unsafe {
            epoxy::BindVertexArray(array.vao);
            epoxy::BindBuffer(epoxy::ARRAY_BUFFER, array.vbo);
        }
    }

    fn vertex_attrib(&self, location: u32, components: i32, stride: i32, offset: usize) {
        unsafe {
            epoxy::EnableVertexAttribArray(location);
            epoxy::VertexAttribPointer(
                location,
                components,
                epoxy::FLOAT,
                epoxy::FALSE,
                stride,
                offset as *const c_void,
            );
        }
    }

    fn draw_triangles(&self, vertex_count: i32) {
        unsafe { epoxy::DrawArrays(epoxy::TRIANGLES, 0, vertex_count) }
    }

    fn clear(&self, color: [f32; 4]) {
        unsafe {
            epoxy::Enable(epoxy::DEPTH_TEST);
            epoxy::DepthFunc(epoxy::LESS);
            epoxy::Enable(epoxy::CULL_FACE);
            epoxy::ClearColor(color[0], color[1], color[2], color[3]);
            epoxy::Clear(epoxy::COLOR_BUFFER_BIT | epoxy::DEPTH_BUFFER_BIT);
        }
    }
}

fn info_log(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .trim_end()
        .to_owned()
}
