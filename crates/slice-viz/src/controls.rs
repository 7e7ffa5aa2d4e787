//! Keyboard and mouse bindings for driving a [`Session`].

use log::{debug, warn};
use macroquad::prelude::*;
use slice_plane::interaction::{ModeKind, Modifiers, PointerEvent, Viewport};
use slice_plane::{Orientation, Session};

/// Distance, in scene units, one push/pull step moves the selection.
pub const PUSH_PULL_STEP: f64 = 1.0;

/// A discrete command bound to a key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    SetMode(ModeKind),
    Undo,
    Redo,
    Reset(Orientation),
    DeleteSelection,
    PushPull(f64),
    GrowHandle,
    ShrinkHandle,
}

fn ctrl_down() -> bool {
    is_key_down(KeyCode::LeftControl) || is_key_down(KeyCode::RightControl)
}

/// Modifier keys currently held.
pub fn modifiers() -> Modifiers {
    let mut modifiers = Modifiers::empty();
    if is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift) {
        modifiers |= Modifiers::SHIFT;
    }
    if ctrl_down() {
        modifiers |= Modifiers::CTRL;
    }
    if is_key_down(KeyCode::LeftAlt) || is_key_down(KeyCode::RightAlt) {
        modifiers |= Modifiers::ALT;
    }
    modifiers
}

/// Routes window input to the session.
#[derive(Debug, Default)]
pub struct Controls {
    dragging: bool,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a left-button gesture is in progress.
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// The actions whose keys went down this frame.
    pub fn poll_actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        let ctrl = ctrl_down();

        if is_key_pressed(KeyCode::Key1) {
            actions.push(Action::SetMode(ModeKind::Rotation));
        }
        if is_key_pressed(KeyCode::Key2) {
            actions.push(Action::SetMode(ModeKind::Normal));
        }
        if is_key_pressed(KeyCode::Key3) {
            actions.push(Action::SetMode(ModeKind::Segment));
        }

        if ctrl && is_key_pressed(KeyCode::Z) {
            actions.push(Action::Undo);
        } else if is_key_pressed(KeyCode::Z) {
            actions.push(Action::Reset(Orientation::Xy));
        }
        if ctrl && is_key_pressed(KeyCode::Y) {
            actions.push(Action::Redo);
        } else if is_key_pressed(KeyCode::Y) {
            actions.push(Action::Reset(Orientation::Xz));
        }
        if is_key_pressed(KeyCode::X) {
            actions.push(Action::Reset(Orientation::Yz));
        }

        if is_key_pressed(KeyCode::Delete) || is_key_pressed(KeyCode::Backspace) {
            actions.push(Action::DeleteSelection);
        }
        if is_key_pressed(KeyCode::PageUp) {
            actions.push(Action::PushPull(PUSH_PULL_STEP));
        }
        if is_key_pressed(KeyCode::PageDown) {
            actions.push(Action::PushPull(-PUSH_PULL_STEP));
        }
        if is_key_pressed(KeyCode::Equal) {
            actions.push(Action::GrowHandle);
        }
        if is_key_pressed(KeyCode::Minus) {
            actions.push(Action::ShrinkHandle);
        }
        actions
    }

    /// Forwards this frame's left-button press, drag or release.
    pub fn forward_mouse(&mut self, session: &mut Session, viewport: &dyn Viewport) {
        let (x, y) = mouse_position();
        let event = PointerEvent::new(x as f64, y as f64).with_modifiers(modifiers());

        let result = if is_mouse_button_pressed(MouseButton::Left) {
            self.dragging = true;
            session.mouse_press(viewport, &event)
        } else if self.dragging && is_mouse_button_released(MouseButton::Left) {
            self.dragging = false;
            session.mouse_release(viewport, &event)
        } else if self.dragging && is_mouse_button_down(MouseButton::Left) {
            session.mouse_drag(viewport, &event)
        } else {
            Ok(())
        };

        if let Err(err) = result {
            warn!("pointer event failed: {err}");
        }
    }

    /// Applies one action. Failures are logged; the session stays usable.
    pub fn apply(&self, action: Action, session: &mut Session, viewport: &dyn Viewport) {
        debug!("action {action:?}");
        let result = match action {
            Action::SetMode(kind) => session.set_view_mode(kind, viewport),
            Action::Undo => session.undo(viewport).map(|_| ()),
            Action::Redo => session.redo(viewport).map(|_| ()),
            Action::Reset(orientation) => session.reset_orientation(orientation),
            Action::DeleteSelection => session.delete_selection().map(|_| ()),
            Action::PushPull(distance) => session.push_pull(distance),
            Action::GrowHandle => {
                let size = session.state().handle_size();
                session.set_handle_size(size * 1.25)
            }
            Action::ShrinkHandle => {
                let size = session.state().handle_size();
                session.set_handle_size(size / 1.25)
            }
        };

        if let Err(err) = result {
            warn!("{action:?} failed: {err}");
        }
    }
}
