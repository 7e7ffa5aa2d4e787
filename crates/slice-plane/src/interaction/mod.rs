//! Mouse-driven manipulation of the plane and the annotated points.
//!
//! The host owns the window and the camera. It forwards press, drag and
//! release events together with a [`Viewport`] that maps between screen and
//! scene. Exactly one mode is current at a time; switching goes through
//! [`InteractionMode::leave`] and [`InteractionMode::enter`].

mod normal;
mod rotation;
mod segment;
mod viewport;

pub use normal::NormalMode;
pub use rotation::{trackball_rotate, RotationMode};
pub use segment::SegmentMode;
pub use viewport::{
    ViewParameters, Viewport, FAR_PLANE_DEPTH, NEAR_PLANE_DEPTH, PICK_RADIUS,
};

use nalgebra::Point3;

use crate::session::SegmentationState;
use crate::undo::{MoveGlyph, MovePlane, UndoStack};
use crate::{PlaneAttitude, Result};

/// Keyboard modifiers held during a pointer event.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Modifiers(u8);

bitflags::bitflags! {
    impl Modifiers: u8 {
        const SHIFT = 1;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
    }
}

/// A pointer event in host screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            modifiers: Modifiers::empty(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Which interaction mode is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModeKind {
    /// Free trackball rotation of the plane, or dragging its rotation point.
    #[default]
    Rotation,
    /// Sliding the plane along its normal.
    Normal,
    /// Placing, moving and selecting annotated points.
    Segment,
}

/// Everything a mode may touch while handling an event.
pub struct ModeContext<'a> {
    pub state: &'a mut SegmentationState,
    pub history: &'a mut UndoStack<SegmentationState>,
    pub viewport: &'a dyn Viewport,
}

/// The capabilities every interaction mode provides.
pub trait InteractionMode {
    fn kind(&self) -> ModeKind;

    fn enter(&mut self, _ctx: &mut ModeContext<'_>) -> Result<()> {
        Ok(())
    }

    fn leave(&mut self, _ctx: &mut ModeContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_press(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<()>;

    fn on_drag(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<()>;

    fn on_release(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<()>;
}

/// The current-mode slot.
#[derive(Debug, Clone)]
pub enum ViewMode {
    Rotation(RotationMode),
    Normal(NormalMode),
    Segment(SegmentMode),
}

impl ViewMode {
    /// A fresh, idle mode of the given kind.
    pub fn from_kind(kind: ModeKind) -> Self {
        match kind {
            ModeKind::Rotation => ViewMode::Rotation(RotationMode::default()),
            ModeKind::Normal => ViewMode::Normal(NormalMode::default()),
            ModeKind::Segment => ViewMode::Segment(SegmentMode::default()),
        }
    }

    fn as_mode(&mut self) -> &mut dyn InteractionMode {
        match self {
            ViewMode::Rotation(mode) => mode,
            ViewMode::Normal(mode) => mode,
            ViewMode::Segment(mode) => mode,
        }
    }
}

impl Default for ViewMode {
    fn default() -> Self {
        Self::from_kind(ModeKind::default())
    }
}

impl InteractionMode for ViewMode {
    fn kind(&self) -> ModeKind {
        match self {
            ViewMode::Rotation(_) => ModeKind::Rotation,
            ViewMode::Normal(_) => ModeKind::Normal,
            ViewMode::Segment(_) => ModeKind::Segment,
        }
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>) -> Result<()> {
        self.as_mode().enter(ctx)
    }

    fn leave(&mut self, ctx: &mut ModeContext<'_>) -> Result<()> {
        self.as_mode().leave(ctx)
    }

    fn on_press(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<()> {
        self.as_mode().on_press(ctx, event)
    }

    fn on_drag(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<()> {
        self.as_mode().on_drag(ctx, event)
    }

    fn on_release(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<()> {
        self.as_mode().on_release(ctx, event)
    }
}

/// Records a finished plane gesture as one undo step: the plane move and, if
/// the handle moved, the handle move from `handle_start` to where it is now.
/// If either push fails the partial macro is reverted.
pub(crate) fn record_plane_move(
    ctx: &mut ModeContext<'_>,
    label: &str,
    start: PlaneAttitude,
    end: PlaneAttitude,
    handle_start: Point3<f64>,
) -> Result<()> {
    let handle_end = ctx.state.handle;
    ctx.history.begin_macro(label);
    let mut pushed = ctx.history.push(MovePlane::new(start, end), ctx.state);
    if pushed.is_ok() && handle_end != handle_start {
        pushed = ctx
            .history
            .push(MoveGlyph::new(handle_start, handle_end), ctx.state);
    }
    match pushed {
        Ok(()) => ctx.history.end_macro(),
        Err(err) => {
            ctx.history.abort_macro(ctx.state)?;
            Err(err)
        }
    }
}
