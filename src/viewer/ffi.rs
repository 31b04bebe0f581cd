//! C FFI bindings for `MaterialViewer`.
//!
//! These functions are called through GObject Introspection. They wrap the
//! safe Rust API and handle pointer and string conversion.
//!
//! # Safety
//!
//! Callers must pass valid widget pointers and null-terminated strings.

use std::{ffi::c_char, path::PathBuf};

use glib::{
    GString,
    ffi::{GFALSE, GTRUE, GType, gboolean},
    subclass::types::ObjectSubclass,
    translate::{FromGlibPtrNone, IntoGlib, ToGlibPtr},
    types::StaticType,
};
use log::error;

use super::CompileOutcome;
use crate::config::ViewerConfig;

pub type MaterialViewer = <super::imp::MaterialViewer as ObjectSubclass>::Instance;

/// Returns the `GType` for `MaterialViewer`.
///
/// This function is called by g-ir-scanner during introspection generation.
#[unsafe(no_mangle)]
pub extern "C" fn material_viewer_get_type() -> GType {
    <super::MaterialViewer as StaticType>::static_type().into_glib()
}

/// Creates a new `MaterialViewer` widget.
///
/// # Safety
///
/// `vertex` and `fragment` must each be null or a valid null-terminated C
/// string. The embedded default shader is used unless both are given.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn material_viewer_new(
    vertex: *const c_char,
    fragment: *const c_char,
) -> *mut MaterialViewer {
    crate::init();

    let config = ViewerConfig {
        vertex_shader: unsafe { optional_path(vertex) },
        fragment_shader: unsafe { optional_path(fragment) },
        ..ViewerConfig::default()
    };

    super::MaterialViewer::new(config).to_glib_full()
}

/// Compiles a new shader pair. Returns `TRUE` only once the pair is the
/// active program. `FALSE` means it failed to build, in which case the
/// previous shader stays active, or that the widget isn't realized yet and
/// the pair will be compiled when it is.
///
/// # Safety
///
/// `this` must be a valid `MaterialViewer`; `vertex` and `fragment` must be
/// valid null-terminated C strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn material_viewer_compile(
    this: *mut MaterialViewer,
    vertex: *const c_char,
    fragment: *const c_char,
) -> gboolean {
    let this = unsafe { super::MaterialViewer::from_glib_none(this) };
    let (Some(vertex), Some(fragment)) = (unsafe { optional_path(vertex) }, unsafe {
        optional_path(fragment)
    }) else {
        error!("material_viewer_compile needs both a vertex and a fragment shader path");
        return GFALSE;
    };

    match this.compile(&vertex, &fragment) {
        Ok(CompileOutcome::Adopted) => GTRUE,
        Ok(CompileOutcome::Deferred) | Err(_) => GFALSE,
    }
}

/// Pushes the edited material to the shader. Returns `FALSE` if any texture
/// failed to load.
///
/// # Safety
///
/// `this` must be a valid `MaterialViewer`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn material_viewer_apply(this: *mut MaterialViewer) -> gboolean {
    let this = unsafe { super::MaterialViewer::from_glib_none(this) };
    match this.apply() {
        Ok(()) => GTRUE,
        Err(_) => GFALSE,
    }
}

unsafe fn optional_path(path: *const c_char) -> Option<PathBuf> {
    if path.is_null() {
        return None;
    }
    let path = unsafe { GString::from_glib_none(path) };
    Some(PathBuf::from(path.as_str()))
}
