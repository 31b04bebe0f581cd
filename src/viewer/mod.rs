//! Material viewer widget for GTK4.
//!
//! [`MaterialViewer`] shows a rotating mesh on the left and an inspector on
//! the right. The inspector lists one editor per field of the shader's
//! `struct Material`:
//!
//! - `float`, `vec2`, `vec3` and `vec4` get a row of spin buttons
//! - `mat4` gets a 4x4 grid
//! - `sampler2D` gets a text entry holding the image path
//!
//! Edits only reach the GPU when "Apply" is pressed. "Compile" rebuilds the
//! program from the two paths above it; a failure is shown verbatim and the
//! previous program stays active.
//!
//! # Example (from GJS)
//!
//! ```javascript
//! import MaterialViewer from "gi://MaterialViewer";
//!
//! const viewer = MaterialViewer.Widget.new("toon.vert", "toon.frag");
//! ```

use std::path::Path;

use glib::{Object, subclass::types::ObjectSubclassIsExt};
use gtk::glib;

use crate::{
    config::ViewerConfig,
    error::{ApplyError, ShaderError},
};

mod ffi;
mod imp;
mod inspector;

/// What [`MaterialViewer::compile`] did with a shader pair that built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    /// The pair is now the active program.
    Adopted,
    /// The widget isn't realized yet. The pair is compiled once it is.
    Deferred,
}

glib::wrapper! {
    /// A GTK4 widget for editing and previewing shader materials.
    pub struct MaterialViewer(ObjectSubclass<imp::MaterialViewer>)
        @extends gtk::Widget,
        @implements gtk::Accessible, gtk::Buildable, gtk::ConstraintTarget;
}

impl MaterialViewer {
    /// Creates a viewer. The scene itself is built once the widget is realized.
    pub fn new(config: ViewerConfig) -> Self {
        let this: Self = Object::new();
        this.imp().initialize(config);
        this
    }

    /// Replaces the shader pair.
    ///
    /// Before the widget is realized the paths are only remembered and
    /// [`CompileOutcome::Deferred`] is returned. On a realized widget whose
    /// scene couldn't start, the pair starts it.
    pub fn compile(&self, vertex: &Path, fragment: &Path) -> Result<CompileOutcome, ShaderError> {
        self.imp().compile(vertex, fragment)
    }

    /// Same as pressing "Apply".
    pub fn apply(&self) -> Result<(), ApplyError> {
        self.imp().apply()
    }
}
