//! Interactive material viewer.
//!
//! Shaders declare their editable inputs in a `struct Material` block. The
//! block is parsed out of the source ([`reflect`]), turned into typed,
//! editable fields ([`material`]) and pushed back to the program, texture
//! units included, whenever the user applies their edits.

pub mod config;
pub mod error;
pub mod gl;
pub mod material;
pub mod mesh;
pub mod reflect;
pub mod renderer;
pub mod scene;
pub mod shader;
pub mod texture;
pub mod uniform;

#[cfg(feature = "gtk")]
mod viewer;

#[cfg(feature = "gtk")]
pub use viewer::{CompileOutcome, MaterialViewer};

pub use config::{Model, ViewerConfig};
pub use error::{ApplyError, ConfigError, ShaderError, TextureError};
pub use material::{FieldEdit, FieldValue, Material, MaterialField};
pub use scene::Scene;
pub use shader::ShaderProgram;
pub use uniform::{Uniform, UniformDeclaration, UniformType};

#[cfg(feature = "gtk")]
static INIT: std::sync::Once = std::sync::Once::new();
#[cfg(feature = "gtk")]
static GLIB_LOGGER: glib::GlibLogger =
    glib::GlibLogger::new(glib::GlibLoggerFormat::Plain, glib::GlibLoggerDomain::CrateTarget);

/// Initializes GTK and routes `log` output to GLib's logger.
///
/// Safe to call more than once.
#[cfg(feature = "gtk")]
pub fn init() {
    INIT.call_once(|| {
        // gtk need to be initialized for most operations
        gtk::init().expect("GTK initialization failed");

        // initialize the `log` crate to forward to glib's logger
        let _ = log::set_logger(&GLIB_LOGGER);
        log::set_max_level(log::LevelFilter::Debug);
    });
}
