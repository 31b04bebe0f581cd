//! Viewer settings, read from an optional TOML file.
//!
//! ```toml
//! vertex_shader = "shaders/toon.vert"
//! fragment_shader = "shaders/toon.frag"
//! model = "sphere"
//! rotation_speed = 1.0
//! clear_color = [0.1, 0.1, 0.1, 1.0]
//! ```

use std::{fs, path::Path, path::PathBuf};

use glam::{Mat4, Vec3};
use serde::Deserialize;

use crate::{error::ConfigError, mesh::Mesh, renderer::Environment};

/// The built-in meshes the viewer can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    #[default]
    Box,
    Plane,
    Sphere,
}

impl Model {
    pub const ALL: [Model; 3] = [Model::Box, Model::Plane, Model::Sphere];

    pub fn label(self) -> &'static str {
        match self {
            Self::Box => "Box",
            Self::Plane => "Plane",
            Self::Sphere => "Sphere",
        }
    }

    pub fn mesh(self) -> Mesh {
        match self {
            Self::Box => Mesh::cube(),
            Self::Plane => Mesh::plane(),
            Self::Sphere => Mesh::sphere(24, 32),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Both shader paths must be set for them to be used; otherwise the
    /// embedded default pair is loaded.
    pub vertex_shader: Option<PathBuf>,
    pub fragment_shader: Option<PathBuf>,
    pub model: Model,
    /// Radians per second.
    pub rotation_speed: f32,
    pub scale: f32,
    pub clear_color: [f32; 4],
    pub camera_position: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub light_direction: [f32; 3],
    pub light_color: [f32; 3],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            vertex_shader: None,
            fragment_shader: None,
            model: Model::Box,
            rotation_speed: 0.5,
            scale: 1.0,
            clear_color: [1.0, 1.0, 1.0, 1.0],
            camera_position: [0.0, 2.0, 3.0],
            fov_degrees: 45.0,
            near: 0.1,
            far: 10.0,
            light_direction: [0.5, 1.2, 1.5],
            light_color: [1.0, 1.0, 1.0],
        }
    }
}

impl ViewerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// The shader pair to load at start-up, if both paths are given.
    pub fn shader_paths(&self) -> Option<(&Path, &Path)> {
        Some((
            self.vertex_shader.as_deref()?,
            self.fragment_shader.as_deref()?,
        ))
    }

    pub fn environment(&self) -> Environment {
        Environment {
            light_direction: Vec3::from(self.light_direction),
            light_color: Vec3::from(self.light_color),
        }
    }

    pub fn camera_position(&self) -> Vec3 {
        Vec3::from(self.camera_position)
    }

    /// Camera looking at the origin with +Y up.
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.camera_position(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }
}
