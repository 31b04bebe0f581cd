//! Widgets editing material fields in place.
//!
//! Widgets only report edits through their callback; pushing values to the
//! program is left to the "Apply" button.

use std::rc::Rc;

use gtk::prelude::*;

use crate::material::{Control, FieldEdit, MaterialField};

const RANGE: f64 = 9999.0;
const AXES: [&str; 4] = ["x", "y", "z", "w"];

/// A labelled editor for `field`, laid out after its [`Control`].
pub(super) fn field_editor(field: &MaterialField, on_edit: Rc<dyn Fn(FieldEdit)>) -> gtk::Widget {
    let row = gtk::Box::new(gtk::Orientation::Vertical, 2);
    let label = gtk::Label::new(Some(field.name()));
    label.set_xalign(0.0);
    label.set_tooltip_text(Some(&field.ty().to_string()));
    row.append(&label);

    match field.control() {
        Control::Drag | Control::Row(_) => {
            let values = field.components().unwrap_or_default();
            let on_edit = Rc::clone(&on_edit);
            row.append(&number_row(values, -RANGE, RANGE, move |index, value| {
                on_edit(FieldEdit::Component(index, value));
            }));
        }
        Control::Matrix => {
            let values = field.components().unwrap_or_default();
            row.append(&matrix_grid(values, on_edit));
        }
        Control::Path => {
            let entry = gtk::Entry::new();
            entry.set_placeholder_text(Some("path/to/texture.png"));
            entry.set_text(field.path().unwrap_or_default());
            entry.connect_changed(move |entry| on_edit(FieldEdit::Path(entry.text().into())));
            row.append(&entry);
        }
    }

    row.upcast()
}

/// One spin button per value, reporting `(index, value)` on change.
pub(super) fn number_row(
    values: &[f32],
    min: f64,
    max: f64,
    on_change: impl Fn(usize, f32) + 'static,
) -> gtk::Box {
    let row = gtk::Box::new(gtk::Orientation::Horizontal, 4);
    row.set_homogeneous(true);
    let on_change = Rc::new(on_change);

    for (index, value) in values.iter().enumerate() {
        let spin = spin_button(*value, min, max);
        if values.len() > 1 {
            spin.set_tooltip_text(AXES.get(index).copied());
        }
        let on_change = Rc::clone(&on_change);
        spin.connect_value_changed(move |spin| on_change(index, spin.value() as f32));
        row.append(&spin);
    }

    row
}

/// Four rows of four; values are column-major.
fn matrix_grid(values: &[f32], on_edit: Rc<dyn Fn(FieldEdit)>) -> gtk::Grid {
    let grid = gtk::Grid::new();
    grid.set_row_spacing(2);
    grid.set_column_spacing(2);

    for (index, value) in values.iter().enumerate() {
        let (column, row) = (index / 4, index % 4);
        let spin = spin_button(*value, -RANGE, RANGE);
        let on_edit = Rc::clone(&on_edit);
        spin.connect_value_changed(move |spin| {
            on_edit(FieldEdit::Component(index, spin.value() as f32));
        });
        grid.attach(&spin, column as i32, row as i32, 1, 1);
    }

    grid
}

fn spin_button(value: f32, min: f64, max: f64) -> gtk::SpinButton {
    let spin = gtk::SpinButton::with_range(min, max, 0.01);
    spin.set_digits(2);
    spin.set_value(f64::from(value));
    spin.set_hexpand(true);
    spin
}
