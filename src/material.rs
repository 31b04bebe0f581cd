//! Editable values for a shader's material block.
//!
//! A [`Material`] holds one [`MaterialField`] per declaration of its program's
//! schema, in the same order. Editing a field only changes the value held
//! here; [`Material::apply_uniforms`] is the only place values reach the
//! program.

use std::{path::Path, rc::Rc};

use log::{debug, warn};

use crate::{
    error::ApplyError,
    gl::{Gl, TextureHandle},
    shader::ShaderProgram,
    texture::{self, TextureBinding, TextureBindings},
    uniform::{Uniform, UniformDeclaration, UniformType, qualified_name},
};

const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// A texture field's requested file and the texture last loaded from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureSlot {
    pub path: String,
    loaded: Option<TextureHandle>,
}

impl TextureSlot {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            loaded: None,
        }
    }

    /// The texture uploaded by the last apply, if it succeeded.
    pub fn loaded(&self) -> Option<TextureHandle> {
        self.loaded
    }

    fn release(&mut self, gl: &dyn Gl) {
        if let Some(texture) = self.loaded.take() {
            gl.delete_texture(texture);
        }
    }
}

/// The current value of a field, typed after its declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Column-major.
    Mat4([f32; 16]),
    Texture(TextureSlot),
}

impl FieldValue {
    /// Vectors start as `(1, 0, ...)` rather than zero.
    pub fn default_for(ty: UniformType) -> Self {
        match ty {
            UniformType::Float => Self::Float(0.0),
            UniformType::Vec2 => Self::Vec2([1.0, 0.0]),
            UniformType::Vec3 => Self::Vec3([1.0, 0.0, 0.0]),
            UniformType::Vec4 => Self::Vec4([1.0, 0.0, 0.0, 0.0]),
            UniformType::Mat4 => Self::Mat4(IDENTITY),
            UniformType::Texture2D => Self::Texture(TextureSlot::default()),
        }
    }

    pub fn ty(&self) -> UniformType {
        match self {
            Self::Float(_) => UniformType::Float,
            Self::Vec2(_) => UniformType::Vec2,
            Self::Vec3(_) => UniformType::Vec3,
            Self::Vec4(_) => UniformType::Vec4,
            Self::Mat4(_) => UniformType::Mat4,
            Self::Texture(_) => UniformType::Texture2D,
        }
    }
}

/// The kind of widget a field is edited with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// A single draggable number.
    Drag,
    /// A row of `n` draggable numbers.
    Row(usize),
    /// Four rows of four numbers.
    Matrix,
    /// A text box holding a file path.
    Path,
}

/// A single change made from the GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    /// Sets component `index` of a numeric field.
    Component(usize, f32),
    /// Replaces a texture field's file path.
    Path(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialField {
    name: String,
    pub value: FieldValue,
}

impl MaterialField {
    pub fn new(declaration: &UniformDeclaration) -> Self {
        Self {
            name: declaration.name.clone(),
            value: FieldValue::default_for(declaration.ty),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> UniformType {
        self.value.ty()
    }

    pub fn control(&self) -> Control {
        match &self.value {
            FieldValue::Float(_) => Control::Drag,
            FieldValue::Vec2(_) => Control::Row(2),
            FieldValue::Vec3(_) => Control::Row(3),
            FieldValue::Vec4(_) => Control::Row(4),
            FieldValue::Mat4(_) => Control::Matrix,
            FieldValue::Texture(_) => Control::Path,
        }
    }

    /// Numeric components, for fields edited with number widgets.
    pub fn components(&self) -> Option<&[f32]> {
        match &self.value {
            FieldValue::Float(v) => Some(std::slice::from_ref(v)),
            FieldValue::Vec2(v) => Some(v),
            FieldValue::Vec3(v) => Some(v),
            FieldValue::Vec4(v) => Some(v),
            FieldValue::Mat4(v) => Some(v),
            FieldValue::Texture(_) => None,
        }
    }

    pub fn components_mut(&mut self) -> Option<&mut [f32]> {
        match &mut self.value {
            FieldValue::Float(v) => Some(std::slice::from_mut(v)),
            FieldValue::Vec2(v) => Some(v),
            FieldValue::Vec3(v) => Some(v),
            FieldValue::Vec4(v) => Some(v),
            FieldValue::Mat4(v) => Some(v),
            FieldValue::Texture(_) => None,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match &self.value {
            FieldValue::Texture(slot) => Some(&slot.path),
            _ => None,
        }
    }

    pub fn path_mut(&mut self) -> Option<&mut String> {
        match &mut self.value {
            FieldValue::Texture(slot) => Some(&mut slot.path),
            _ => None,
        }
    }

    /// Applies a GUI edit. Returns `false` if it doesn't fit this field.
    pub fn edit(&mut self, edit: FieldEdit) -> bool {
        match edit {
            FieldEdit::Component(index, value) => {
                match self.components_mut().and_then(|c| c.get_mut(index)) {
                    Some(component) => {
                        *component = value;
                        true
                    }
                    None => false,
                }
            }
            FieldEdit::Path(path) => match self.path_mut() {
                Some(current) => {
                    *current = path;
                    true
                }
                None => false,
            },
        }
    }
}

/// The editable uniforms of one shader program.
#[derive(Debug)]
pub struct Material {
    program: Rc<ShaderProgram>,
    fields: Vec<MaterialField>,
    texture_bindings: TextureBindings,
}

impl Material {
    /// One default-valued field per declaration of `program`, in order.
    pub fn new(program: Rc<ShaderProgram>) -> Self {
        let fields = program.uniforms().iter().map(MaterialField::new).collect();
        Self {
            program,
            fields,
            texture_bindings: TextureBindings::new(),
        }
    }

    pub fn program(&self) -> &Rc<ShaderProgram> {
        &self.program
    }

    pub fn fields(&self) -> &[MaterialField] {
        &self.fields
    }

    /// Applies a GUI edit to the field at `index`.
    pub fn edit(&mut self, index: usize, edit: FieldEdit) -> bool {
        self.fields
            .get_mut(index)
            .is_some_and(|field| field.edit(edit))
    }

    pub fn texture_bindings(&self) -> &TextureBindings {
        &self.texture_bindings
    }

    /// Pushes every field to the program as `material.<name>`.
    ///
    /// Texture fields are reloaded from their current path and appended to
    /// the texture bindings, which are rebuilt from scratch. A texture that
    /// fails to load gets no binding; the remaining fields are still applied
    /// and the failures are returned together.
    pub fn apply_uniforms(&mut self, gl: &dyn Gl) -> Result<(), ApplyError> {
        let program = Rc::clone(&self.program);
        gl.use_program(program.handle());
        self.texture_bindings.clear();

        let mut failures = Vec::new();
        for field in &mut self.fields {
            let name = qualified_name(&field.name);
            let value = match &mut field.value {
                FieldValue::Float(v) => Uniform::Float(*v),
                FieldValue::Vec2(v) => Uniform::Vec2(*v),
                FieldValue::Vec3(v) => Uniform::Vec3(*v),
                FieldValue::Vec4(v) => Uniform::Vec4(*v),
                FieldValue::Mat4(v) => Uniform::Mat4(*v),
                FieldValue::Texture(slot) => {
                    slot.release(gl);
                    if slot.path.trim().is_empty() {
                        debug!("texture `{}` has no path, leaving it unbound", field.name);
                        continue;
                    }
                    match texture::load(gl, Path::new(slot.path.trim())) {
                        Ok(texture) => {
                            slot.loaded = Some(texture);
                            self.texture_bindings.push(TextureBinding {
                                texture,
                                location: program.uniform_location(gl, &name),
                            });
                        }
                        Err(e) => {
                            warn!("{e}");
                            failures.push(e);
                        }
                    }
                    continue;
                }
            };
            program.set_uniform(gl, &name, value);
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ApplyError { failures })
        }
    }

    /// Binds the textures of the last apply to units `0..n`.
    pub fn bind_textures(&self, gl: &dyn Gl) {
        self.texture_bindings.bind(gl);
    }

    /// Adopts a freshly loaded program.
    ///
    /// All previous values and bindings are dropped, even for fields whose
    /// name survives. Returns the program that was replaced.
    pub fn set_program(&mut self, gl: &dyn Gl, program: Rc<ShaderProgram>) -> Rc<ShaderProgram> {
        self.release_textures(gl);
        let fresh = Self::new(program);
        let previous = std::mem::replace(self, fresh);
        previous.program
    }

    /// Deletes every texture loaded by this material.
    pub fn release_textures(&mut self, gl: &dyn Gl) {
        self.texture_bindings.clear();
        for field in &mut self.fields {
            if let FieldValue::Texture(slot) = &mut field.value {
                slot.release(gl);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gl::recording::{GlCall, RecordingGl},
        texture::tests::write_png,
    };

    const VERTEX: &str = "#version 330 core
in vec3 vert;
void main() { gl_Position = vec4(vert, 1.0); }
";

    fn program(gl: &RecordingGl, fragment: &str) -> Rc<ShaderProgram> {
        Rc::new(
            ShaderProgram::load_from_source(gl, VERTEX.to_owned(), fragment.to_owned()).unwrap(),
        )
    }

    #[test]
    fn one_default_field_per_declaration() {
        let gl = RecordingGl::new();
        let material = Material::new(program(
            &gl,
            "struct Material {
    float a;
    vec2 b;
    vec3 c;
    vec4 d;
    sampler2D e;
    mat4 f;
};",
        ));

        let program = material.program();
        assert_eq!(material.fields().len(), program.uniforms().len());
        for (field, declaration) in material.fields().iter().zip(program.uniforms()) {
            assert_eq!(field.name(), declaration.name);
            assert_eq!(field.ty(), declaration.ty);
        }

        let values: Vec<_> = material.fields().iter().map(|f| f.value.clone()).collect();
        assert_eq!(
            values,
            vec![
                FieldValue::Float(0.0),
                FieldValue::Vec2([1.0, 0.0]),
                FieldValue::Vec3([1.0, 0.0, 0.0]),
                FieldValue::Vec4([1.0, 0.0, 0.0, 0.0]),
                FieldValue::Texture(TextureSlot::default()),
                FieldValue::Mat4(IDENTITY),
            ]
        );
    }

    #[test]
    fn controls_follow_field_types() {
        let gl = RecordingGl::new();
        let material = Material::new(program(
            &gl,
            "struct Material { float a; vec3 c; sampler2D e; mat4 f; };",
        ));

        let controls: Vec<_> = material.fields().iter().map(MaterialField::control).collect();
        assert_eq!(
            controls,
            vec![Control::Drag, Control::Row(3), Control::Path, Control::Matrix]
        );
    }

    #[test]
    fn edits_only_touch_matching_fields() {
        let gl = RecordingGl::new();
        let mut material = Material::new(program(
            &gl,
            "struct Material { vec2 offset; sampler2D diffuse; };",
        ));

        assert!(material.edit(0, FieldEdit::Component(1, 0.25)));
        assert!(!material.edit(0, FieldEdit::Component(2, 1.0)));
        assert!(!material.edit(0, FieldEdit::Path("x.png".to_owned())));
        assert!(material.edit(1, FieldEdit::Path("wood.png".to_owned())));
        assert!(!material.edit(1, FieldEdit::Component(0, 1.0)));
        assert!(!material.edit(5, FieldEdit::Component(0, 1.0)));

        assert_eq!(material.fields()[0].components(), Some(&[1.0, 0.25][..]));
        assert_eq!(material.fields()[1].path(), Some("wood.png"));
        // editing never reaches the GPU
        assert_eq!(gl.count(|c| matches!(c, GlCall::SetUniform(..))), 0);
    }

    #[test]
    fn apply_sets_qualified_uniforms_and_binds_textures() {
        let gl = RecordingGl::new();
        let mut material = Material::new(program(
            &gl,
            "struct Material {
    vec3 color;
    sampler2D diffuse;
};",
        ));

        assert_eq!(
            material.fields(),
            &[
                MaterialField {
                    name: "color".to_owned(),
                    value: FieldValue::Vec3([1.0, 0.0, 0.0]),
                },
                MaterialField {
                    name: "diffuse".to_owned(),
                    value: FieldValue::Texture(TextureSlot::new("")),
                },
            ]
        );

        let texture_path = write_png("apply");
        assert!(material.edit(0, FieldEdit::Component(0, 0.0)));
        assert!(material.edit(0, FieldEdit::Component(1, 1.0)));
        assert!(material.edit(1, FieldEdit::Path(texture_path.display().to_string())));

        material.apply_uniforms(&gl).unwrap();

        assert_eq!(material.texture_bindings().len(), 1);
        assert_eq!(
            gl.uniform_sets(),
            vec![("material.color".to_owned(), Uniform::Vec3([0.0, 1.0, 0.0]))]
        );

        let FieldValue::Texture(slot) = &material.fields()[1].value else {
            panic!("expected a texture field");
        };
        let texture = slot.loaded().unwrap();

        gl.take_calls();
        material.bind_textures(&gl);
        assert_eq!(gl.texture_binds(), vec![(0, texture)]);
        assert_eq!(
            gl.uniform_sets(),
            vec![("material.diffuse".to_owned(), Uniform::Int(0))]
        );

        std::fs::remove_file(texture_path).ok();
    }

    #[test]
    fn repeated_apply_rebuilds_bindings() {
        let gl = RecordingGl::new();
        let mut material = Material::new(program(
            &gl,
            "struct Material { sampler2D albedo; float gloss; sampler2D normal; };",
        ));
        let albedo = write_png("repeat-albedo");
        let normal = write_png("repeat-normal");
        material.edit(0, FieldEdit::Path(albedo.display().to_string()));
        material.edit(2, FieldEdit::Path(normal.display().to_string()));

        for _ in 0..2 {
            gl.take_calls();
            material.apply_uniforms(&gl).unwrap();
            assert_eq!(material.texture_bindings().len(), 2);

            gl.take_calls();
            material.bind_textures(&gl);
            let units: Vec<u32> = gl.texture_binds().iter().map(|(unit, _)| *unit).collect();
            assert_eq!(units, vec![0, 1]);
        }

        // each apply releases what the previous one loaded
        gl.take_calls();
        material.apply_uniforms(&gl).unwrap();
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteTexture(_))), 2);

        std::fs::remove_file(albedo).ok();
        std::fs::remove_file(normal).ok();
    }

    #[test]
    fn failed_texture_is_skipped_and_reported() {
        let gl = RecordingGl::new();
        let mut material = Material::new(program(
            &gl,
            "struct Material { sampler2D broken; float gloss; sampler2D good; };",
        ));
        let good = write_png("partial");
        material.edit(0, FieldEdit::Path("/nonexistent/broken.png".to_owned()));
        material.edit(1, FieldEdit::Component(0, 0.5));
        material.edit(2, FieldEdit::Path(good.display().to_string()));

        let err = material.apply_uniforms(&gl).unwrap_err();

        assert_eq!(err.failures.len(), 1);
        assert_eq!(
            gl.uniform_sets(),
            vec![("material.gloss".to_owned(), Uniform::Float(0.5))]
        );
        assert_eq!(material.texture_bindings().len(), 1);

        gl.take_calls();
        material.bind_textures(&gl);
        assert_eq!(
            gl.uniform_sets(),
            vec![("material.good".to_owned(), Uniform::Int(0))]
        );

        std::fs::remove_file(good).ok();
    }

    #[test]
    fn empty_texture_path_is_left_unbound() {
        let gl = RecordingGl::new();
        let mut material = Material::new(program(&gl, "struct Material { sampler2D e; };"));

        material.apply_uniforms(&gl).unwrap();

        assert!(material.texture_bindings().is_empty());
    }

    #[test]
    fn new_program_discards_previous_values() {
        let gl = RecordingGl::new();
        let first = program(&gl, "struct Material { vec3 color; sampler2D diffuse; };");
        let mut material = Material::new(Rc::clone(&first));
        let texture_path = write_png("reload");
        material.edit(0, FieldEdit::Component(1, 0.75));
        material.edit(1, FieldEdit::Path(texture_path.display().to_string()));
        material.apply_uniforms(&gl).unwrap();
        assert_eq!(material.texture_bindings().len(), 1);

        let second = program(&gl, "struct Material { vec3 color; float gloss; };");
        gl.take_calls();
        let previous = material.set_program(&gl, Rc::clone(&second));

        assert!(Rc::ptr_eq(&previous, &first));
        assert!(Rc::ptr_eq(material.program(), &second));
        assert!(material.texture_bindings().is_empty());
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteTexture(_))), 1);
        assert_eq!(
            material.fields()[0].value,
            FieldValue::Vec3([1.0, 0.0, 0.0])
        );
        assert_eq!(material.fields()[1].value, FieldValue::Float(0.0));

        std::fs::remove_file(texture_path).ok();
    }
}
