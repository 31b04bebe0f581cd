//! Uniform types and values shared by the extractor, the material and the renderer.

use std::fmt;

use thiserror::Error;

/// The GLSL types a material block may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `sampler2D`
    Texture2D,
    /// `mat4`
    Mat4,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unsupported shader uniform: {0}")]
pub struct UnsupportedUniformType(pub String);

impl UniformType {
    /// Maps a GLSL type keyword to its uniform type.
    pub fn from_keyword(keyword: &str) -> Result<Self, UnsupportedUniformType> {
        match keyword {
            "float" => Ok(Self::Float),
            "vec2" => Ok(Self::Vec2),
            "vec3" => Ok(Self::Vec3),
            "vec4" => Ok(Self::Vec4),
            "sampler2D" => Ok(Self::Texture2D),
            "mat4" => Ok(Self::Mat4),
            other => Err(UnsupportedUniformType(other.to_owned())),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Texture2D => "sampler2D",
            Self::Mat4 => "mat4",
        }
    }
}

impl fmt::Display for UniformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One `<type> <name>;` line of a material block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformDeclaration {
    pub ty: UniformType,
    pub name: String,
}

impl UniformDeclaration {
    pub fn new(ty: UniformType, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
        }
    }

    /// The name the linked program knows this uniform by, e.g. `material.color`.
    pub fn qualified_name(&self) -> String {
        qualified_name(&self.name)
    }
}

pub(crate) fn qualified_name(field: &str) -> String {
    format!("material.{field}")
}

/// A value that can be written to a uniform location.
///
/// These correspond to the GLSL types the renderer and the material push.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    /// A single float value (`float` in GLSL)
    Float(f32),
    /// A 2-component vector (`vec2` in GLSL)
    Vec2([f32; 2]),
    /// A 3-component vector (`vec3` in GLSL)
    Vec3([f32; 3]),
    /// A 4-component vector (`vec4` in GLSL)
    Vec4([f32; 4]),
    /// A single integer value (`int` or a sampler unit in GLSL)
    Int(i32),
    /// A column-major 4x4 matrix (`mat4` in GLSL)
    Mat4([f32; 16]),
}

impl From<glam::Mat4> for Uniform {
    fn from(value: glam::Mat4) -> Self {
        Self::Mat4(value.to_cols_array())
    }
}

impl From<glam::Vec3> for Uniform {
    fn from(value: glam::Vec3) -> Self {
        Self::Vec3(value.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table_round_trips() {
        for ty in [
            UniformType::Float,
            UniformType::Vec2,
            UniformType::Vec3,
            UniformType::Vec4,
            UniformType::Texture2D,
            UniformType::Mat4,
        ] {
            assert_eq!(UniformType::from_keyword(ty.keyword()), Ok(ty));
        }
    }

    #[test]
    fn unknown_keyword_is_rejected() {
        let err = UniformType::from_keyword("samplerCube").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported shader uniform: samplerCube");
        assert!(UniformType::from_keyword("Float").is_err());
    }

    #[test]
    fn qualified_name_prefixes_struct() {
        let decl = UniformDeclaration::new(UniformType::Vec3, "color");
        assert_eq!(decl.qualified_name(), "material.color");
    }

    #[test]
    fn matrices_convert_column_major() {
        let m = glam::Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let Uniform::Mat4(cols) = Uniform::from(m) else {
            panic!("expected a matrix");
        };
        assert_eq!(&cols[12..15], &[1.0, 2.0, 3.0]);
    }
}
