use std::path::PathBuf;

use thiserror::Error;

use crate::gl::ShaderStage;

/// Why a shader pair could not become the active program.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to compile {stage} shader: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("failed to link program: {log}")]
    Link { log: String },
}

/// Why a texture field produced no binding.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to load texture {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Texture fields that failed during `Material::apply_uniforms`.
///
/// Every other field was still applied.
#[derive(Debug, Error)]
#[error("{} texture(s) failed to load: {}", .failures.len(), summary(.failures))]
pub struct ApplyError {
    pub failures: Vec<TextureError>,
}

fn summary(failures: &[TextureError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
