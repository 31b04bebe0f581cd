use std::{
    cell::{Cell, RefCell},
    path::{Path, PathBuf},
    rc::Rc,
    time::Instant,
};

use glib::Propagation;
use gtk::{GLArea, glib, prelude::*, subclass::prelude::*};
use log::{error, info, warn};

use super::{CompileOutcome, inspector};
use crate::{
    config::{Model, ViewerConfig},
    error::{ApplyError, ShaderError},
    gl::EpoxyGl,
    scene::Scene,
    shader::GlslDialect,
};

/// Radians of rotation per dragged pixel.
const DRAG_SENSITIVITY: f64 = 0.01;

/// Inspector widgets that are read or refreshed after construction.
#[derive(Debug)]
struct Panel {
    vertex: gtk::Entry,
    fragment: gtk::Entry,
    status: gtk::Label,
    fields: gtk::Box,
    apply: gtk::Button,
}

#[derive(Debug, Default)]
pub struct MaterialViewer {
    /// Viewport on the left, inspector on the right
    root: RefCell<Option<gtk::Paned>>,
    /// The [`GLArea`] the scene is drawn on
    area: RefCell<Option<GLArea>>,
    panel: RefCell<Option<Panel>>,
    /// Only exists while the area is realized
    scene: RefCell<Option<Scene<EpoxyGl>>>,
    /// Settings used to build the next scene
    config: RefCell<ViewerConfig>,
    started: Cell<Option<Instant>>,
    last_frame: Cell<Option<Instant>>,
    drag_offset: Cell<f64>,
}

#[glib::object_subclass]
impl ObjectSubclass for MaterialViewer {
    const NAME: &'static str = "MaterialViewerWidget";
    type Type = super::MaterialViewer;
    type ParentType = gtk::Widget;

    fn class_init(klass: &mut Self::Class) {
        klass.set_layout_manager_type::<gtk::BinLayout>();
    }
}

impl ObjectImpl for MaterialViewer {
    fn constructed(&self) {
        self.parent_constructed();
        let obj = self.obj();

        let area = GLArea::new();
        area.set_has_depth_buffer(true);
        area.set_hexpand(true);
        area.set_vexpand(true);

        let root = gtk::Paned::new(gtk::Orientation::Horizontal);
        root.set_start_child(Some(&area));
        root.set_resize_start_child(true);
        root.set_shrink_end_child(false);
        root.set_parent(&*obj);

        *self.area.borrow_mut() = Some(area);
        *self.root.borrow_mut() = Some(root);
    }

    fn dispose(&self) {
        if let Some(root) = self.root.borrow_mut().take() {
            root.unparent();
        }
    }
}

impl WidgetImpl for MaterialViewer {}

impl MaterialViewer {
    pub fn initialize(&self, config: ViewerConfig) {
        let area = self.area();
        self.build_panel(&config);
        *self.config.borrow_mut() = config;

        // using weakrefs to prevent reference loop
        let this = self.downgrade();
        area.connect_realize(move |area| {
            area.make_current();
            if let Some(e) = area.error() {
                error!("Failed to initialize material viewer: {e}");
                return;
            }

            if let Some(this) = this.upgrade() {
                this.create_scene(area);
            }
        });

        let this = self.downgrade();
        area.connect_unrealize(move |area| {
            area.make_current();
            if let Some(e) = area.error() {
                error!("Failed to release material viewer: {e}");
                return;
            }

            if let Some(scene) = this.upgrade().and_then(|x| x.scene.borrow_mut().take()) {
                scene.release();
            }
        });

        let this = self.downgrade();
        area.connect_render(move |area, _ctx| {
            if let Some(e) = area.error() {
                error!("Failed to render material viewer: {e}");
                return Propagation::Stop;
            }

            if let Some(this) = this.upgrade() {
                this.render(area);
            }

            Propagation::Stop
        });

        area.add_tick_callback(|area, _clock| {
            area.queue_render();
            glib::ControlFlow::Continue
        });

        let drag = gtk::GestureDrag::new();
        let this = self.downgrade();
        drag.connect_drag_begin(move |_, _, _| {
            if let Some(this) = this.upgrade() {
                this.drag_offset.set(0.0);
            }
        });
        let this = self.downgrade();
        drag.connect_drag_update(move |_, offset_x, _| {
            if let Some(this) = this.upgrade() {
                let delta = offset_x - this.drag_offset.replace(offset_x);
                if let Some(scene) = this.scene.borrow_mut().as_mut() {
                    scene.rotate((delta * DRAG_SENSITIVITY) as f32);
                }
            }
        });
        area.add_controller(drag);
    }

    /// Compiles a new shader pair, or remembers it for when the area gets
    /// realized.
    pub fn compile(&self, vertex: &Path, fragment: &Path) -> Result<CompileOutcome, ShaderError> {
        if let Some(panel) = self.panel.borrow().as_ref() {
            panel.vertex.set_text(&vertex.to_string_lossy());
            panel.fragment.set_text(&fragment.to_string_lossy());
        }
        {
            let mut config = self.config.borrow_mut();
            config.vertex_shader = Some(vertex.to_owned());
            config.fragment_shader = Some(fragment.to_owned());
        }

        let area = self.area();
        if !area.is_realized() {
            info!("Deferring shader compilation until the viewer is shown");
            return Ok(CompileOutcome::Deferred);
        }

        area.make_current();
        let config = self.config.borrow().clone();
        let result = Scene::compile_into(
            &mut self.scene.borrow_mut(),
            EpoxyGl::new,
            &config,
            vertex,
            fragment,
        );

        match &result {
            Ok(()) => {
                self.set_status(None);
                self.rebuild_fields();
            }
            Err(e) => {
                error!("{e}");
                self.set_status(Some(&format!("ERROR: {e}")));
            }
        }
        area.queue_render();
        result.map(|()| CompileOutcome::Adopted)
    }

    /// Pushes the edited field values to the shader.
    pub fn apply(&self) -> Result<(), ApplyError> {
        let area = self.area();
        let result = {
            let mut scene = self.scene.borrow_mut();
            let Some(scene) = scene.as_mut() else {
                warn!("Couldn't apply material because the widget isn't being rendered");
                return Ok(());
            };
            area.make_current();
            scene.apply()
        };

        match &result {
            Ok(()) => self.set_status(None),
            Err(e) => {
                warn!("{e}");
                self.set_status(Some(&e.to_string()));
            }
        }
        area.queue_render();
        result
    }

    fn area(&self) -> GLArea {
        self.area
            .borrow()
            .clone()
            .expect("Missing GLArea, was this object properly initialized ?")
    }

    /// Starts the scene with the configured pair, falling back to the
    /// embedded default when there is none or it fails to build.
    fn create_scene(&self, area: &GLArea) {
        let config = self.config.borrow().clone();
        self.set_status(None);

        let mut scene = None;
        if let Some((vertex, fragment)) = config.shader_paths()
            && let Err(e) =
                Scene::compile_into(&mut scene, EpoxyGl::new, &config, vertex, fragment)
        {
            error!("{e}");
            self.set_status(Some(&format!("ERROR: {e}")));
        }

        if scene.is_none() {
            let dialect = if area.uses_es() {
                GlslDialect::Es
            } else {
                GlslDialect::Core
            };
            match Scene::new(EpoxyGl::new(), config, dialect) {
                Ok(default) => scene = Some(default),
                Err(e) => {
                    error!("Default shader failed to build: {e}");
                    self.set_status(Some(&format!("ERROR: {e}")));
                }
            }
        }

        *self.scene.borrow_mut() = scene;
        self.rebuild_fields();
    }

    fn render(&self, area: &GLArea) {
        let now = Instant::now();
        let started = self.started.get().unwrap_or(now);
        self.started.set(Some(started));
        let dt = self
            .last_frame
            .replace(Some(now))
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());

        let mut scene = self.scene.borrow_mut();
        let Some(scene) = scene.as_mut() else {
            return;
        };

        let aspect = area.width() as f32 / area.height().max(1) as f32;
        scene.advance(dt);
        scene.draw(aspect, now.duration_since(started).as_secs_f32());
    }

    fn set_status(&self, message: Option<&str>) {
        if let Some(panel) = self.panel.borrow().as_ref() {
            panel.status.set_text(message.unwrap_or_default());
            panel.status.set_visible(message.is_some());
        }
    }

    /// Replaces the field editors with ones for the current material.
    fn rebuild_fields(&self) {
        let panel = self.panel.borrow();
        let Some(panel) = panel.as_ref() else {
            return;
        };
        while let Some(child) = panel.fields.first_child() {
            panel.fields.remove(&child);
        }

        let scene = self.scene.borrow();
        let Some(scene) = scene.as_ref() else {
            return;
        };

        let fields = scene.material().fields();
        if fields.is_empty() {
            let hint = gtk::Label::new(Some("This shader declares no material uniforms."));
            hint.set_wrap(true);
            hint.set_xalign(0.0);
            panel.fields.append(&hint);
        }

        for (index, field) in fields.iter().enumerate() {
            let this = self.downgrade();
            let editor = inspector::field_editor(
                field,
                Rc::new(move |edit| {
                    if let Some(this) = this.upgrade()
                        && let Some(scene) = this.scene.borrow_mut().as_mut()
                    {
                        scene.edit(index, edit);
                    }
                }),
            );
            panel.fields.append(&editor);
        }
        panel.apply.set_sensitive(!fields.is_empty());
    }

    /// Updates the stored settings and the live scene's copy of them.
    fn update_settings(&self, update: impl Fn(&mut ViewerConfig)) {
        update(&mut self.config.borrow_mut());
        if let Some(scene) = self.scene.borrow_mut().as_mut() {
            update(scene.settings_mut());
        }
    }

    fn show_model(&self, model: Model) {
        self.config.borrow_mut().model = model;

        let area = self.area();
        let result = {
            let mut scene = self.scene.borrow_mut();
            let Some(scene) = scene.as_mut() else {
                return;
            };
            area.make_current();
            scene.set_model(model)
        };

        if let Err(e) = result {
            warn!("{e}");
            self.set_status(Some(&e.to_string()));
        }
        area.queue_render();
    }

    fn build_panel(&self, config: &ViewerConfig) {
        let content = gtk::Box::new(gtk::Orientation::Vertical, 8);
        content.set_margin_top(12);
        content.set_margin_bottom(12);
        content.set_margin_start(12);
        content.set_margin_end(12);

        // shader selection
        content.append(&heading("Shader"));
        let vertex = path_entry("Vertex shader", config.vertex_shader.as_deref());
        let fragment = path_entry("Fragment shader", config.fragment_shader.as_deref());
        content.append(&vertex);
        content.append(&fragment);

        let compile = gtk::Button::with_label("Compile");
        let this = self.downgrade();
        compile.connect_clicked(move |_| {
            let Some(this) = this.upgrade() else {
                return;
            };
            let Some((vertex, fragment)) = this.panel.borrow().as_ref().map(|panel| {
                (
                    PathBuf::from(panel.vertex.text().as_str()),
                    PathBuf::from(panel.fragment.text().as_str()),
                )
            }) else {
                return;
            };
            // errors are already shown in the status label
            let _ = this.compile(&vertex, &fragment);
        });
        content.append(&compile);

        let status = gtk::Label::new(None);
        status.set_wrap(true);
        status.set_xalign(0.0);
        status.set_selectable(true);
        status.add_css_class("error");
        status.set_visible(false);
        content.append(&status);

        // material fields
        content.append(&heading("Material"));
        let fields = gtk::Box::new(gtk::Orientation::Vertical, 6);
        content.append(&fields);

        let apply = gtk::Button::with_label("Apply");
        let this = self.downgrade();
        apply.connect_clicked(move |_| {
            if let Some(this) = this.upgrade() {
                let _ = this.apply();
            }
        });
        content.append(&apply);

        // model
        content.append(&heading("Model"));
        let models = gtk::Box::new(gtk::Orientation::Horizontal, 4);
        models.add_css_class("linked");
        let mut group: Option<gtk::ToggleButton> = None;
        for model in Model::ALL {
            let button = gtk::ToggleButton::with_label(model.label());
            button.set_group(group.as_ref());
            button.set_active(model == config.model);
            button.set_hexpand(true);
            let this = self.downgrade();
            button.connect_toggled(move |button| {
                if button.is_active()
                    && let Some(this) = this.upgrade()
                {
                    this.show_model(model);
                }
            });
            models.append(&button);
            group.get_or_insert(button);
        }
        content.append(&models);

        // display
        content.append(&heading("Display"));
        content.append(&caption("Rotation speed"));
        let this = self.downgrade();
        content.append(&inspector::number_row(
            &[config.rotation_speed],
            -10.0,
            10.0,
            move |_, value| {
                if let Some(this) = this.upgrade() {
                    this.update_settings(|settings| settings.rotation_speed = value);
                }
            },
        ));
        content.append(&caption("Scale"));
        let this = self.downgrade();
        content.append(&inspector::number_row(
            &[config.scale],
            0.01,
            100.0,
            move |_, value| {
                if let Some(this) = this.upgrade() {
                    this.update_settings(|settings| settings.scale = value);
                }
            },
        ));
        content.append(&caption("Clear color"));
        let this = self.downgrade();
        content.append(&inspector::number_row(
            &config.clear_color,
            0.0,
            1.0,
            move |index, value| {
                if let Some(this) = this.upgrade() {
                    this.update_settings(|settings| settings.clear_color[index] = value);
                }
            },
        ));

        let scrolled = gtk::ScrolledWindow::new();
        scrolled.set_hscrollbar_policy(gtk::PolicyType::Never);
        scrolled.set_min_content_width(320);
        scrolled.set_child(Some(&content));
        if let Some(root) = self.root.borrow().as_ref() {
            root.set_end_child(Some(&scrolled));
        }

        *self.panel.borrow_mut() = Some(Panel {
            vertex,
            fragment,
            status,
            fields,
            apply,
        });
    }
}

fn heading(text: &str) -> gtk::Label {
    let label = gtk::Label::new(Some(text));
    label.set_xalign(0.0);
    label.add_css_class("heading");
    label
}

fn caption(text: &str) -> gtk::Label {
    let label = gtk::Label::new(Some(text));
    label.set_xalign(0.0);
    label.add_css_class("caption");
    label
}

fn path_entry(placeholder: &str, path: Option<&Path>) -> gtk::Entry {
    let entry = gtk::Entry::new();
    entry.set_placeholder_text(Some(placeholder));
    if let Some(path) = path {
        entry.set_text(&path.to_string_lossy());
    }
    entry
}
