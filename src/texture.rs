//! Texture loading and per-draw texture unit assignment.

use std::path::Path;

use log::debug;

use crate::{
    error::TextureError,
    gl::{Gl, TextureHandle, UniformLocation},
    uniform::Uniform,
};

/// Decodes an image file and uploads it as an RGBA texture.
///
/// Rows are flipped so `(0, 0)` texture coordinates address the bottom-left
/// pixel, as OpenGL expects.
pub fn load(gl: &dyn Gl, path: &Path) -> Result<TextureHandle, TextureError> {
    let image = image::open(path).map_err(|source| TextureError::Load {
        path: path.to_owned(),
        source,
    })?;
    let image = image.flipv().to_rgba8();
    debug!(
        "Loaded texture {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(gl.create_texture(&image))
}

/// A texture to bind and the sampler uniform that reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding {
    pub texture: TextureHandle,
    /// `None` when the program optimised the sampler away.
    pub location: Option<UniformLocation>,
}

/// Textures a material wants bound for its draws.
///
/// Filled by `Material::apply_uniforms`, emptied before every apply. Units
/// are not stored: [`TextureBindings::bind`] hands out `0..n` in list order
/// on every draw.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextureBindings {
    entries: Vec<TextureBinding>,
}

impl TextureBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, binding: TextureBinding) {
        self.entries.push(binding);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextureBinding> {
        self.entries.iter()
    }

    /// Points the i-th sampler at texture unit `i` and binds its texture there.
    ///
    /// The owning program must be in use.
    pub fn bind(&self, gl: &dyn Gl) {
        for (unit, binding) in self.entries.iter().enumerate() {
            let unit = unit as u32;
            if let Some(location) = binding.location {
                gl.set_uniform(location, &Uniform::Int(unit as i32));
            }
            gl.bind_texture(unit, binding.texture);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::PathBuf;

    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::gl::recording::{GlCall, RecordingGl};

    pub(crate) fn write_png(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "material-viewer-{}-{name}.png",
            std::process::id()
        ));
        RgbaImage::from_pixel(4, 2, Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn load_uploads_decoded_image() {
        let gl = RecordingGl::new();
        let path = write_png("load");

        let texture = load(&gl, &path).unwrap();

        assert_eq!(gl.take_calls(), vec![GlCall::CreateTexture(texture, 4, 2)]);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn load_reports_missing_file() {
        let gl = RecordingGl::new();
        let err = load(&gl, Path::new("/nonexistent/texture.png")).unwrap_err();

        assert!(matches!(err, TextureError::Load { .. }));
        assert!(err.to_string().contains("/nonexistent/texture.png"));
        assert!(gl.take_calls().is_empty());
    }

    #[test]
    fn bind_assigns_dense_units_in_order() {
        let gl = RecordingGl::new();
        let first = gl.uniform_location(crate::gl::ProgramHandle(1), "material.albedo");
        let second = gl.uniform_location(crate::gl::ProgramHandle(1), "material.normal");

        let mut bindings = TextureBindings::new();
        bindings.push(TextureBinding {
            texture: TextureHandle(7),
            location: first,
        });
        bindings.push(TextureBinding {
            texture: TextureHandle(3),
            location: None,
        });
        bindings.push(TextureBinding {
            texture: TextureHandle(9),
            location: second,
        });

        bindings.bind(&gl);

        assert_eq!(
            gl.uniform_sets(),
            vec![
                ("material.albedo".to_owned(), Uniform::Int(0)),
                ("material.normal".to_owned(), Uniform::Int(2)),
            ]
        );
        assert_eq!(
            gl.texture_binds(),
            vec![
                (0, TextureHandle(7)),
                (1, TextureHandle(3)),
                (2, TextureHandle(9))
            ]
        );
    }

    #[test]
    fn empty_table_binds_nothing() {
        let gl = RecordingGl::new();
        TextureBindings::new().bind(&gl);
        assert!(gl.take_calls().is_empty());
    }
}
