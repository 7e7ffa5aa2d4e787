//! Linear undo/redo history with nestable macros.
//!
//! Every mutation of a segmentation session is a [`Command`]. Pushing a
//! command runs it and records it; undo and redo walk the history. A macro
//! groups a run of commands into one user-visible step.

mod commands;
mod stack;

pub use commands::{
    AddPoint, ChangeSelection, ChangeView, ChangeViewMode, MoveGlyph, MovePlane, MovePoint,
    PushPull, RemovePoints, ResetOrientation, SetHandleSize, SetScale,
};
pub use stack::{Command, Macro, UndoStack};
