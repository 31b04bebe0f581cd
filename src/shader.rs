//! Compiled shader programs and their material schema.

use std::{fs, path::Path};

use log::{debug, trace, warn};

use crate::{
    error::ShaderError,
    gl::{Gl, ProgramHandle, ShaderStage, UniformLocation},
    reflect,
    uniform::{Uniform, UniformDeclaration},
};

/// Vertex stage of the shader pair loaded when no files are given, without
/// its `#version` line.
const DEFAULT_VERTEX_BODY: &str = include_str!("../assets/shaders/default.vert");
/// Blinn-Phong fragment stage exposing `color`, `shininess` and `diffuse`.
const DEFAULT_FRAGMENT_BODY: &str = include_str!("../assets/shaders/default.frag");

/// GTK can hand out either an OpenGL or an OpenGL ES context. The GLSL
/// version header differs between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlslDialect {
    #[default]
    Core,
    Es,
}

impl GlslDialect {
    pub fn header(self) -> &'static str {
        match self {
            Self::Core => "#version 330 core\n",
            Self::Es => "#version 300 es\nprecision highp float;\n",
        }
    }

    /// The embedded default pair, vertex then fragment, for this dialect.
    pub fn default_sources(self) -> (String, String) {
        (
            format!("{}{DEFAULT_VERTEX_BODY}", self.header()),
            format!("{}{DEFAULT_FRAGMENT_BODY}", self.header()),
        )
    }
}

/// A linked program together with the sources it was built from.
///
/// A `ShaderProgram` is never updated in place: reloading builds a new one,
/// so a failed compile leaves the previous program untouched.
#[derive(Debug)]
pub struct ShaderProgram {
    handle: ProgramHandle,
    vertex_source: String,
    fragment_source: String,
    uniforms: Vec<UniformDeclaration>,
}

impl ShaderProgram {
    /// Reads, compiles and links a vertex/fragment pair from disk.
    pub fn load_from_file(
        gl: &dyn Gl,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let vertex_source = read_source(vertex_path.as_ref())?;
        let fragment_source = read_source(fragment_path.as_ref())?;
        Self::load_from_source(gl, vertex_source, fragment_source)
    }

    /// Compiles and links a vertex/fragment pair.
    ///
    /// Intermediate GL objects are released on every failure path.
    pub fn load_from_source(
        gl: &dyn Gl,
        vertex_source: String,
        fragment_source: String,
    ) -> Result<Self, ShaderError> {
        let vertex = gl
            .compile_shader(ShaderStage::Vertex, &vertex_source)
            .map_err(|log| ShaderError::Compile {
                stage: ShaderStage::Vertex,
                log,
            })?;

        let fragment = match gl.compile_shader(ShaderStage::Fragment, &fragment_source) {
            Ok(fragment) => fragment,
            Err(log) => {
                gl.delete_shader(vertex);
                return Err(ShaderError::Compile {
                    stage: ShaderStage::Fragment,
                    log,
                });
            }
        };

        let linked = gl.link_program(vertex, fragment);
        gl.delete_shader(vertex);
        gl.delete_shader(fragment);
        let handle = linked.map_err(|log| ShaderError::Link { log })?;

        let uniforms = merge_schemas(
            reflect::extract(&vertex_source),
            reflect::extract(&fragment_source),
        );
        debug!(
            "Linked program {} with {} material uniform(s)",
            handle.0,
            uniforms.len()
        );

        Ok(Self {
            handle,
            vertex_source,
            fragment_source,
            uniforms,
        })
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    /// Material uniforms of the vertex stage followed by those of the fragment stage.
    pub fn uniforms(&self) -> &[UniformDeclaration] {
        &self.uniforms
    }

    pub fn uniform_location(&self, gl: &dyn Gl, name: &str) -> Option<UniformLocation> {
        gl.uniform_location(self.handle, name)
    }

    pub fn attrib_location(&self, gl: &dyn Gl, name: &str) -> Option<u32> {
        gl.attrib_location(self.handle, name)
    }

    /// Sets a uniform by name. Names the program doesn't use are ignored.
    pub fn set_uniform(&self, gl: &dyn Gl, name: &str, value: impl Into<Uniform>) {
        match self.uniform_location(gl, name) {
            Some(location) => gl.set_uniform(location, &value.into()),
            None => trace!("uniform not used in shader: {name}"),
        }
    }

    /// Deletes the GL program.
    pub fn release(self, gl: &dyn Gl) {
        gl.delete_program(self.handle);
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_owned(),
        source,
    })
}

/// Concatenates both stages' schemas. Both stages usually declare the same
/// struct, so a name only counts once and the first declaration wins.
fn merge_schemas(
    vertex: Vec<UniformDeclaration>,
    fragment: Vec<UniformDeclaration>,
) -> Vec<UniformDeclaration> {
    let mut merged: Vec<UniformDeclaration> = Vec::with_capacity(vertex.len() + fragment.len());
    for declaration in vertex.into_iter().chain(fragment) {
        match merged.iter().find(|known| known.name == declaration.name) {
            Some(known) if known.ty != declaration.ty => warn!(
                "material uniform `{}` declared as both {} and {}, keeping {}",
                declaration.name, known.ty, declaration.ty, known.ty
            ),
            Some(_) => {}
            None => merged.push(declaration),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gl::recording::{GlCall, RecordingGl},
        uniform::UniformType,
    };

    const VERTEX: &str = "#version 330 core
uniform mat4 MVP;
struct Material {
    float wobble;
};
uniform Material material;
in vec3 vert;
void main() { gl_Position = MVP * vec4(vert, 1.0); }
";

    const FRAGMENT: &str = "#version 330 core
struct Material {
    float wobble;
    vec3 color;
    sampler2D diffuse;
};
uniform Material material;
out vec4 outputColor;
void main() { outputColor = vec4(material.color, 1.0); }
";

    #[test]
    fn load_extracts_vertex_then_fragment_uniforms() {
        let gl = RecordingGl::new();
        let program =
            ShaderProgram::load_from_source(&gl, VERTEX.to_owned(), FRAGMENT.to_owned()).unwrap();

        assert_eq!(
            program.uniforms(),
            &[
                UniformDeclaration::new(UniformType::Float, "wobble"),
                UniformDeclaration::new(UniformType::Vec3, "color"),
                UniformDeclaration::new(UniformType::Texture2D, "diffuse"),
            ]
        );
        assert_eq!(program.vertex_source(), VERTEX);
        assert_eq!(program.fragment_source(), FRAGMENT);
        // both stage objects are released once linked
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteShader(_))), 2);
    }

    #[test]
    fn fragment_compile_failure_releases_vertex_stage() {
        let gl = RecordingGl::new();
        gl.failing_stage.set(Some(ShaderStage::Fragment));

        let err = ShaderProgram::load_from_source(&gl, VERTEX.to_owned(), FRAGMENT.to_owned())
            .unwrap_err();

        match err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(log.contains("syntax error"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteShader(_))), 1);
        assert_eq!(gl.count(|c| matches!(c, GlCall::LinkProgram(_))), 0);
    }

    #[test]
    fn vertex_compile_failure_stops_early() {
        let gl = RecordingGl::new();
        gl.failing_stage.set(Some(ShaderStage::Vertex));

        let err = ShaderProgram::load_from_source(&gl, VERTEX.to_owned(), FRAGMENT.to_owned())
            .unwrap_err();

        assert!(matches!(
            err,
            ShaderError::Compile {
                stage: ShaderStage::Vertex,
                ..
            }
        ));
        assert_eq!(gl.count(|c| matches!(c, GlCall::CompileShader(_))), 1);
    }

    #[test]
    fn link_failure_releases_both_stages() {
        let gl = RecordingGl::new();
        gl.fail_link.set(true);

        let err = ShaderProgram::load_from_source(&gl, VERTEX.to_owned(), FRAGMENT.to_owned())
            .unwrap_err();

        assert!(matches!(err, ShaderError::Link { ref log } if log.contains("unresolved")));
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteShader(_))), 2);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let gl = RecordingGl::new();
        let err = ShaderProgram::load_from_file(
            &gl,
            "/nonexistent/shader.vert",
            "/nonexistent/shader.frag",
        )
        .unwrap_err();

        match err {
            ShaderError::Io { path, .. } => assert_eq!(path, Path::new("/nonexistent/shader.vert")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(gl.take_calls().is_empty());
    }

    #[test]
    fn set_uniform_ignores_unknown_names() {
        let gl = RecordingGl::new();
        let program =
            ShaderProgram::load_from_source(&gl, VERTEX.to_owned(), FRAGMENT.to_owned()).unwrap();
        gl.missing_uniforms.borrow_mut().insert("time".to_owned());

        program.set_uniform(&gl, "time", Uniform::Float(1.0));
        program.set_uniform(&gl, "material.wobble", Uniform::Float(2.0));

        assert_eq!(
            gl.uniform_sets(),
            vec![("material.wobble".to_owned(), Uniform::Float(2.0))]
        );
    }

    #[test]
    fn default_pair_exposes_its_material() {
        let gl = RecordingGl::new();
        let (vertex, fragment) = GlslDialect::Core.default_sources();
        let program = ShaderProgram::load_from_source(&gl, vertex, fragment).unwrap();

        assert_eq!(
            program.uniforms(),
            &[
                UniformDeclaration::new(UniformType::Vec3, "color"),
                UniformDeclaration::new(UniformType::Float, "shininess"),
                UniformDeclaration::new(UniformType::Texture2D, "diffuse"),
            ]
        );
    }

    #[test]
    fn default_pair_starts_with_dialect_header() {
        let (vertex, fragment) = GlslDialect::Es.default_sources();
        assert!(vertex.starts_with("#version 300 es\nprecision highp float;\n"));
        assert!(fragment.starts_with("#version 300 es\nprecision highp float;\n"));
        assert_eq!(vertex.matches("#version").count(), 1);

        let (vertex, fragment) = GlslDialect::Core.default_sources();
        assert!(vertex.starts_with("#version 330 core\n"));
        assert!(fragment.starts_with("#version 330 core\n"));
        assert_eq!(fragment.matches("#version").count(), 1);
    }

    #[test]
    fn conflicting_duplicate_keeps_first_declaration() {
        let merged = merge_schemas(
            vec![UniformDeclaration::new(UniformType::Float, "a")],
            vec![
                UniformDeclaration::new(UniformType::Vec2, "a"),
                UniformDeclaration::new(UniformType::Vec3, "b"),
            ],
        );
        assert_eq!(
            merged,
            vec![
                UniformDeclaration::new(UniformType::Float, "a"),
                UniformDeclaration::new(UniformType::Vec3, "b"),
            ]
        );
    }
}
