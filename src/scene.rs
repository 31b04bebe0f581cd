//! The viewer's GPU-side state: one rotating mesh drawn with the active material.
//!
//! A [`Scene`] is what the GUI drives. "Compile" maps to [`Scene::compile`],
//! "Apply" to [`Scene::apply`], and every displayed frame to
//! [`Scene::advance`] followed by [`Scene::draw`].

use std::{path::Path, rc::Rc};

use glam::{Mat4, Vec3};
use log::{debug, info, warn};

use crate::{
    config::{Model, ViewerConfig},
    error::{ApplyError, ShaderError},
    gl::Gl,
    material::{FieldEdit, Material},
    renderer::{Environment, FrameUniforms, Renderable},
    shader::{GlslDialect, ShaderProgram},
};

#[derive(Debug)]
pub struct Scene<G: Gl> {
    gl: G,
    renderable: Renderable,
    model: Model,
    settings: ViewerConfig,
    angle: f32,
}

impl<G: Gl> Scene<G> {
    /// Uploads the configured mesh and starts with the embedded default shader.
    pub fn new(gl: G, settings: ViewerConfig, dialect: GlslDialect) -> Result<Self, ShaderError> {
        let (vertex, fragment) = dialect.default_sources();
        let program = ShaderProgram::load_from_source(&gl, vertex, fragment)?;
        Ok(Self::with_program(gl, settings, program))
    }

    /// Like [`Scene::new`], but starts with a shader pair from disk.
    pub fn from_files(
        gl: G,
        settings: ViewerConfig,
        vertex: &Path,
        fragment: &Path,
    ) -> Result<Self, ShaderError> {
        let program = ShaderProgram::load_from_file(&gl, vertex, fragment)?;
        info!(
            "Starting with {} + {}",
            vertex.display(),
            fragment.display()
        );
        Ok(Self::with_program(gl, settings, program))
    }

    /// Compiles a shader pair into the scene held by `slot`.
    ///
    /// An empty slot, e.g. after the default shader failed to build, gets a
    /// new scene started from the pair. `Ok` means the pair is now the active
    /// program; on failure `slot` is left as it was.
    pub fn compile_into(
        slot: &mut Option<Self>,
        gl: impl FnOnce() -> G,
        settings: &ViewerConfig,
        vertex: &Path,
        fragment: &Path,
    ) -> Result<(), ShaderError> {
        if let Some(scene) = slot.as_mut() {
            return scene.compile(vertex, fragment);
        }
        *slot = Some(Self::from_files(gl(), settings.clone(), vertex, fragment)?);
        Ok(())
    }

    fn with_program(gl: G, settings: ViewerConfig, program: ShaderProgram) -> Self {
        let mut material = Material::new(Rc::new(program));
        if let Err(e) = material.apply_uniforms(&gl) {
            warn!("{e}");
        }

        let model = settings.model;
        let buffer = model.mesh().upload(&gl);
        let renderable = Renderable::bind(&gl, buffer, material);

        Self {
            gl,
            renderable,
            model,
            settings,
            angle: 0.0,
        }
    }

    pub fn gl(&self) -> &G {
        &self.gl
    }

    pub fn material(&self) -> &Material {
        self.renderable.material()
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn settings(&self) -> &ViewerConfig {
        &self.settings
    }

    /// Rotation speed, scale and clear color can change at any time.
    pub fn settings_mut(&mut self) -> &mut ViewerConfig {
        &mut self.settings
    }

    /// Applies a GUI edit. Nothing reaches the GPU until [`Scene::apply`].
    pub fn edit(&mut self, field: usize, edit: FieldEdit) -> bool {
        self.renderable.material_mut().edit(field, edit)
    }

    /// Builds a program from a shader pair on disk and makes it current.
    ///
    /// On failure the current program and material stay active. On success
    /// the material starts over with default values, which are applied
    /// right away.
    pub fn compile(&mut self, vertex: &Path, fragment: &Path) -> Result<(), ShaderError> {
        let program = ShaderProgram::load_from_file(&self.gl, vertex, fragment)?;
        info!(
            "Compiled {} + {} ({} material uniform(s))",
            vertex.display(),
            fragment.display(),
            program.uniforms().len()
        );

        let previous = self
            .renderable
            .material_mut()
            .set_program(&self.gl, Rc::new(program));
        self.renderable.rebind(&self.gl);
        release_program(&self.gl, previous);

        if let Err(e) = self.renderable.material_mut().apply_uniforms(&self.gl) {
            warn!("{e}");
        }
        Ok(())
    }

    /// Pushes the edited values to the program.
    pub fn apply(&mut self) -> Result<(), ApplyError> {
        self.renderable.material_mut().apply_uniforms(&self.gl)
    }

    /// Switches to another built-in mesh and re-applies the material.
    pub fn set_model(&mut self, model: Model) -> Result<(), ApplyError> {
        let buffer = model.mesh().upload(&self.gl);
        let previous = self.renderable.set_buffer(&self.gl, buffer);
        previous.release(&self.gl);
        self.model = model;
        debug!("Showing {}", model.label());
        self.apply()
    }

    /// Advances the rotation by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.rotate(dt * self.settings.rotation_speed);
    }

    /// Rotates by `radians` around +Y, e.g. while dragging.
    pub fn rotate(&mut self, radians: f32) {
        self.angle = (self.angle + radians) % std::f32::consts::TAU;
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn frame_uniforms(&self, aspect: f32, time: f32) -> FrameUniforms {
        FrameUniforms {
            model: Mat4::from_rotation_y(self.angle)
                * Mat4::from_scale(Vec3::splat(self.settings.scale)),
            view: self.settings.view(),
            projection: self.settings.projection(aspect),
            camera_position: self.settings.camera_position(),
            time,
        }
    }

    pub fn environment(&self) -> Environment {
        self.settings.environment()
    }

    pub fn draw(&self, aspect: f32, time: f32) {
        self.gl.clear(self.settings.clear_color);
        self.renderable
            .draw(&self.gl, &self.frame_uniforms(aspect, time), &self.environment());
    }

    /// Deletes every GL object the scene owns and hands back the context.
    pub fn release(self) -> G {
        let (buffer, mut material) = self.renderable.into_parts();
        buffer.release(&self.gl);
        material.release_textures(&self.gl);
        let program = Rc::clone(material.program());
        drop(material);
        release_program(&self.gl, program);
        self.gl
    }
}

fn release_program(gl: &dyn Gl, program: Rc<ShaderProgram>) {
    match Rc::try_unwrap(program) {
        Ok(program) => program.release(gl),
        Err(program) => debug!("program {} still in use", program.handle().0),
    }
}
