//! A segmentation session: state, history and the current interaction mode.

mod config;
mod state;

pub use config::SessionConfig;
pub use state::SegmentationState;

use state::validate_scale;

use log::debug;
use nalgebra::{Point3, Vector3};

use crate::interaction::{
    InteractionMode, ModeContext, ModeKind, PointerEvent, ViewMode, ViewParameters, Viewport,
};
use crate::model::{PointModel, Selection};
use crate::plane::{ListenerId, PlaneAttitude};
use crate::undo::{
    ChangeSelection, ChangeView, ChangeViewMode, Command, MoveGlyph, PushPull, RemovePoints,
    ResetOrientation, SetHandleSize, SetScale, UndoStack,
};
use crate::Result;

/// The axis-aligned orientations the plane can be reset to, named by the
/// two axes spanning the plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Xy,
    Xz,
    Yz,
}

impl Orientation {
    /// The plane normal for this orientation.
    pub fn normal(self) -> Vector3<f64> {
        match self {
            Orientation::Xy => Vector3::z(),
            Orientation::Xz => Vector3::y(),
            Orientation::Yz => Vector3::x(),
        }
    }
}

/// Owns everything a host needs to drive the segmentation engine.
///
/// Every operation that changes the state goes through the undo stack, so
/// the host can offer undo and redo for all of them. Operations that would
/// not change anything record nothing.
#[derive(Debug)]
pub struct Session {
    state: SegmentationState,
    history: UndoStack<SegmentationState>,
    mode: ViewMode,
}

impl Session {
    /// # Errors
    /// [`Error::DivideByZero`](crate::Error::DivideByZero) if the configured
    /// normal is zero, [`Error::InvalidScale`](crate::Error::InvalidScale) if
    /// a scale component is not finite and positive.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        Self::with_points(config, PointModel::new())
    }

    /// A session whose point ids come from the host's own point factory.
    pub fn with_points(config: &SessionConfig, points: PointModel) -> Result<Self> {
        Ok(Self {
            state: SegmentationState::with_points(config, points)?,
            history: UndoStack::new(),
            mode: ViewMode::default(),
        })
    }

    #[inline]
    pub fn state(&self) -> &SegmentationState {
        &self.state
    }

    #[inline]
    pub fn history(&self) -> &UndoStack<SegmentationState> {
        &self.history
    }

    #[inline]
    pub fn mode(&self) -> &ViewMode {
        &self.mode
    }

    /// Location of a point being placed in segment mode, in pixel coordinates.
    pub fn pending_point(&self) -> Option<Point3<f64>> {
        match &self.mode {
            ViewMode::Segment(mode) => mode.pending(),
            _ => None,
        }
    }

    /// Screen rectangle of a selection gesture in progress.
    pub fn selection_rect(&self) -> Option<((f64, f64), (f64, f64))> {
        match &self.mode {
            ViewMode::Segment(mode) => mode.selection_rect(),
            _ => None,
        }
    }

    /// Registers a callback run after every change of the plane.
    pub fn add_plane_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&PlaneAttitude) + 'static,
    {
        self.state.plane.add_listener(listener)
    }

    pub fn remove_plane_listener(&mut self, id: ListenerId) -> bool {
        self.state.plane.remove_listener(id)
    }

    pub fn mouse_press(&mut self, viewport: &dyn Viewport, event: &PointerEvent) -> Result<()> {
        let mut ctx = ModeContext {
            state: &mut self.state,
            history: &mut self.history,
            viewport,
        };
        self.mode.on_press(&mut ctx, event)
    }

    pub fn mouse_drag(&mut self, viewport: &dyn Viewport, event: &PointerEvent) -> Result<()> {
        let mut ctx = ModeContext {
            state: &mut self.state,
            history: &mut self.history,
            viewport,
        };
        self.mode.on_drag(&mut ctx, event)
    }

    pub fn mouse_release(&mut self, viewport: &dyn Viewport, event: &PointerEvent) -> Result<()> {
        let mut ctx = ModeContext {
            state: &mut self.state,
            history: &mut self.history,
            viewport,
        };
        self.mode.on_release(&mut ctx, event)
    }

    /// Switches the interaction mode, recording the switch together with the
    /// handle move the new mode makes on entry.
    pub fn set_view_mode(&mut self, kind: ModeKind, viewport: &dyn Viewport) -> Result<()> {
        let current = self.state.view_mode;
        if current == kind {
            return Ok(());
        }

        let handle = self.state.handle;
        self.history.begin_macro("Change Mode");
        match self.switch_mode(current, kind, handle, viewport) {
            Ok(()) => self.history.end_macro(),
            Err(err) => {
                self.state.handle = handle;
                self.history.abort_macro(&mut self.state)?;
                self.sync_mode(viewport)?;
                Err(err)
            }
        }
    }

    /// Undoes the last step. Returns `false` if there was nothing to undo.
    pub fn undo(&mut self, viewport: &dyn Viewport) -> Result<bool> {
        let undone = self.history.undo(&mut self.state)?;
        self.sync_mode(viewport)?;
        Ok(undone)
    }

    /// Redoes the next step. Returns `false` if there was nothing to redo.
    pub fn redo(&mut self, viewport: &dyn Viewport) -> Result<bool> {
        let redone = self.history.redo(&mut self.state)?;
        self.sync_mode(viewport)?;
        Ok(redone)
    }

    /// Copies the selected points `scale` scene units along the plane normal
    /// and moves the plane with them.
    pub fn push_pull(&mut self, scale: f64) -> Result<()> {
        let ids = self.state.selection.to_vec();
        self.record(PushPull::new(ids, scale))
    }

    /// # Errors
    /// [`Error::InvalidScale`](crate::Error::InvalidScale) unless every
    /// component is finite and positive; nothing is recorded.
    pub fn set_scale(&mut self, scale: Vector3<f64>) -> Result<()> {
        validate_scale(&scale)?;
        if scale == self.state.scale {
            return Ok(());
        }
        self.record(SetScale::new(self.state.scale, scale))
    }

    pub fn set_selection(&mut self, selection: Selection) -> Result<()> {
        if selection == self.state.selection {
            return Ok(());
        }
        self.record(ChangeSelection::new(self.state.selection.clone(), selection))
    }

    /// Deletes the selected points. Returns `false` if nothing was selected.
    pub fn delete_selection(&mut self) -> Result<bool> {
        if self.state.selection.is_empty() {
            return Ok(false);
        }
        let ids = self.state.selection.to_vec();
        self.record(RemovePoints::new(ids))?;
        Ok(true)
    }

    /// Turns the plane to an axis-aligned orientation about its rotation point.
    pub fn reset_orientation(&mut self, orientation: Orientation) -> Result<()> {
        let before = self.state.plane.attitude();
        if PlaneAttitude::new(before.point(), orientation.normal()) == before {
            return Ok(());
        }
        self.record(ResetOrientation::new(before, orientation))
    }

    pub fn change_view(&mut self, view: ViewParameters) -> Result<()> {
        if view == self.state.view {
            return Ok(());
        }
        self.record(ChangeView::new(self.state.view, view))
    }

    pub fn set_handle_size(&mut self, size: f64) -> Result<()> {
        if size == self.state.handle_size {
            return Ok(());
        }
        self.record(SetHandleSize::new(self.state.handle_size, size))
    }

    fn record<C>(&mut self, command: C) -> Result<()>
    where
        C: Command<SegmentationState> + 'static,
    {
        self.history.push(command, &mut self.state)
    }

    fn switch_mode(
        &mut self,
        from: ModeKind,
        to: ModeKind,
        handle: Point3<f64>,
        viewport: &dyn Viewport,
    ) -> Result<()> {
        self.history
            .push(ChangeViewMode::new(from, to), &mut self.state)?;
        self.sync_mode(viewport)?;

        let mut ctx = ModeContext {
            state: &mut self.state,
            history: &mut self.history,
            viewport,
        };
        self.mode.enter(&mut ctx)?;
        let placed = self.state.handle;
        if placed != handle {
            self.history
                .push(MoveGlyph::new(handle, placed), &mut self.state)?;
        }
        Ok(())
    }

    /// Replaces the mode slot if the recorded mode changed.
    ///
    /// The new mode is not entered: the handle it would place is part of the
    /// recorded switch, so undo and redo already restore it.
    fn sync_mode(&mut self, viewport: &dyn Viewport) -> Result<()> {
        let wanted = self.state.view_mode;
        if self.mode.kind() == wanted {
            return Ok(());
        }

        debug!("switching mode {:?} -> {:?}", self.mode.kind(), wanted);
        let mut ctx = ModeContext {
            state: &mut self.state,
            history: &mut self.history,
            viewport,
        };
        self.mode.leave(&mut ctx)?;
        self.mode = ViewMode::from_kind(wanted);
        Ok(())
    }
}
