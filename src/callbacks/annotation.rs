//! Annotation callbacks: forward UI events into the session and redraw
//! from the view it returns.

use crate::utils::{cell_image, parse_color};
use crate::{AppWindow, LabelBar};
use cell_annotator::classes::BAR_COLORS;
use cell_annotator::{LabelId, Session, SessionView};
use slint::{ComponentHandle, ModelRc, VecModel};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared session handle held by every callback.
pub type SharedSession = Rc<RefCell<Session>>;

/// Sets up all annotation callbacks on the UI.
///
/// # Arguments
/// * `ui` - The AppWindow instance
/// * `session` - The session the callbacks drive
/// * `channel` - Image channel to display
pub fn setup_annotation_callbacks(ui: &AppWindow, session: SharedSession, channel: usize) {
    setup_label_selected(ui, session.clone());
    setup_next_cell(ui, session.clone(), channel);
    setup_previous_cell(ui, session, channel);
}

/// Push a session view into the window.
pub fn render(ui: &AppWindow, session: &Session, view: &SessionView, channel: usize) {
    ui.set_heading(view.heading().into());
    match view.image.and_then(|index| cell_image(session.images(), index, channel)) {
        Some(image) => {
            ui.set_cell_image(image);
            ui.set_has_image(true);
        }
        None => ui.set_has_image(false),
    }
    render_controls(ui, view);

    let counts = view.counts.tallied();
    let bars: Vec<LabelBar> = LabelId::tallied()
        .zip(counts)
        .map(|(label, count)| LabelBar {
            name: label.name().into(),
            count: count as i32,
            color: parse_color(BAR_COLORS[label.get() as usize]).unwrap_or_default(),
        })
        .collect();
    let max_count = counts.iter().copied().max().unwrap_or(0).max(1);
    ui.set_max_count(max_count as i32);
    ui.set_bars(ModelRc::new(VecModel::from(bars)));
}

/// Selection and button state only; used when the image and counts are unchanged.
fn render_controls(ui: &AppWindow, view: &SessionView) {
    ui.set_selected_label(view.pending_label.map_or(-1, |l| l.get() as i32));
    ui.set_next_enabled(view.can_advance);
    ui.set_back_enabled(view.can_retreat);
}

fn setup_label_selected(ui: &AppWindow, session: SharedSession) {
    let ui_weak = ui.as_weak();
    ui.on_label_selected(move |id| {
        let Some(ui) = ui_weak.upgrade() else { return };
        let mut session = session.borrow_mut();
        let view = match u8::try_from(id).ok().and_then(LabelId::new) {
            Some(label) => session.set_pending_label(label),
            None => session.clear_pending_label(),
        };
        render_controls(&ui, &view);
    });
}

fn setup_next_cell(ui: &AppWindow, session: SharedSession, channel: usize) {
    let ui_weak = ui.as_weak();
    ui.on_next_cell(move || {
        let Some(ui) = ui_weak.upgrade() else { return };
        let mut session = session.borrow_mut();
        match session.advance() {
            Ok(view) => {
                ui.set_status_text("".into());
                render(&ui, &session, &view, channel);
            }
            Err(e) => {
                log::error!("Failed to save annotations: {e}");
                ui.set_status_text(format!("Failed to save annotations: {e}").into());
                render(&ui, &session, &session.view(), channel);
            }
        }
    });
}

fn setup_previous_cell(ui: &AppWindow, session: SharedSession, channel: usize) {
    let ui_weak = ui.as_weak();
    ui.on_previous_cell(move || {
        let Some(ui) = ui_weak.upgrade() else { return };
        let mut session = session.borrow_mut();
        let view = session.retreat();
        render(&ui, &session, &view, channel);
    });
}
