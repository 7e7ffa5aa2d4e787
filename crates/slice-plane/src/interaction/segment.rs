use nalgebra::Point3;

use crate::algorithms::intersect_line_plane;
use crate::interaction::{
    InteractionMode, ModeContext, ModeKind, Modifiers, PointerEvent, FAR_PLANE_DEPTH,
    NEAR_PLANE_DEPTH,
};
use crate::model::{AnnotatedPoint, Selection, SelectionMode};
use crate::undo::{AddPoint, ChangeSelection, MovePoint};
use crate::Result;

#[derive(Debug, Clone, Default)]
enum Gesture {
    #[default]
    Idle,
    Select {
        mode: SelectionMode,
        start: (f64, f64),
        current: (f64, f64),
        before: Selection,
    },
    Place {
        location: Point3<f64>,
    },
    Grab {
        before: AnnotatedPoint,
    },
}

/// Places, moves and selects annotated points on the current plane.
///
/// - Ctrl+press on a point grabs it; dragging slides it over the plane.
/// - Ctrl+press elsewhere starts a new point under the cursor.
/// - Shift+press starts a selection: a click picks one point, a drag picks
///   every point inside the rectangle. Alt makes the pick additive.
///
/// Each gesture becomes one undo step when the button is released.
#[derive(Debug, Clone, Default)]
pub struct SegmentMode {
    gesture: Gesture,
}

impl SegmentMode {
    /// Pixel location of the point being placed.
    pub fn pending(&self) -> Option<Point3<f64>> {
        match &self.gesture {
            Gesture::Place { location } => Some(*location),
            _ => None,
        }
    }

    /// Screen corners of the selection rectangle being dragged.
    pub fn selection_rect(&self) -> Option<((f64, f64), (f64, f64))> {
        match &self.gesture {
            Gesture::Select { start, current, .. } => Some((*start, *current)),
            _ => None,
        }
    }
}

impl InteractionMode for SegmentMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Segment
    }

    fn leave(&mut self, ctx: &mut ModeContext<'_>) -> Result<()> {
        if let Gesture::Grab { before } = std::mem::take(&mut self.gesture) {
            ctx.state
                .points
                .move_point(before.id, before.location, before.attitude)?;
        }
        Ok(())
    }

    fn on_press(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<()> {
        let scale = ctx.state.scale;
        self.gesture = if event.modifiers.contains(Modifiers::SHIFT) {
            let mode = if event.modifiers.contains(Modifiers::ALT) {
                SelectionMode::Additive
            } else {
                SelectionMode::Exclusive
            };
            Gesture::Select {
                mode,
                start: (event.x, event.y),
                current: (event.x, event.y),
                before: ctx.state.selection.clone(),
            }
        } else if event.modifiers.contains(Modifiers::CTRL) {
            match ctx
                .viewport
                .pick_point(event.x, event.y, &ctx.state.points, &scale)
            {
                Some(id) => Gesture::Grab {
                    before: ctx.state.points.status(id)?,
                },
                None => match point_on_plane(ctx, event) {
                    Some(hit) => Gesture::Place {
                        location: ctx.state.to_pixels(&hit),
                    },
                    None => Gesture::Idle,
                },
            }
        } else {
            Gesture::Idle
        };
        Ok(())
    }

    fn on_drag(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<()> {
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Select { current, .. } => *current = (event.x, event.y),
            Gesture::Place { location } => {
                if let Some(hit) = point_on_plane(ctx, event) {
                    *location = ctx.state.to_pixels(&hit);
                }
            }
            Gesture::Grab { before } => {
                if let Some(hit) = point_on_plane(ctx, event) {
                    let location = ctx.state.to_pixels(&hit);
                    ctx.state
                        .points
                        .move_point(before.id, location, before.attitude)?;
                }
            }
        }
        Ok(())
    }

    fn on_release(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<()> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => Ok(()),
            Gesture::Select {
                mode,
                start,
                before,
                ..
            } => {
                let scale = ctx.state.scale;
                let mut after = before.clone();
                if start.0 != event.x || start.1 != event.y {
                    let hits = ctx.viewport.pick_points_in_rect(
                        start,
                        (event.x, event.y),
                        &ctx.state.points,
                        &scale,
                    );
                    after.apply_region(mode, hits);
                } else {
                    let hit = ctx
                        .viewport
                        .pick_point(event.x, event.y, &ctx.state.points, &scale);
                    after.apply_pick(mode, hit);
                }
                if after == before {
                    return Ok(());
                }
                ctx.history
                    .push(ChangeSelection::new(before, after), ctx.state)
            }
            Gesture::Place { location } => {
                let attitude = ctx.state.plane.attitude();
                ctx.history.push(AddPoint::new(location, attitude), ctx.state)
            }
            Gesture::Grab { before } => {
                let after = AnnotatedPoint {
                    id: before.id,
                    location: ctx.state.points.location(before.id)?,
                    attitude: ctx.state.plane.attitude(),
                };
                if after == before {
                    return Ok(());
                }
                ctx.history.push(MovePoint::new(before, after), ctx.state)
            }
        }
    }
}

/// Where the ray under the cursor meets the current plane, in scene coordinates.
fn point_on_plane(ctx: &ModeContext<'_>, event: &PointerEvent) -> Option<Point3<f64>> {
    let near = ctx.viewport.unproject(event.x, event.y, NEAR_PLANE_DEPTH);
    let far = ctx.viewport.unproject(event.x, event.y, FAR_PLANE_DEPTH);
    let plane = &ctx.state.plane;
    intersect_line_plane(&near, &far, &plane.rotation_point(), &plane.normal())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::testing::OrthoViewport;
    use crate::model::PointId;
    use crate::session::{SegmentationState, SessionConfig};
    use crate::undo::UndoStack;
    use approx::assert_relative_eq;

    fn ctrl(x: f64, y: f64) -> PointerEvent {
        PointerEvent::new(x, y).with_modifiers(Modifiers::CTRL)
    }

    fn shift(x: f64, y: f64) -> PointerEvent {
        PointerEvent::new(x, y).with_modifiers(Modifiers::SHIFT)
    }

    fn setup() -> (SegmentationState, UndoStack<SegmentationState>, OrthoViewport) {
        let state = SegmentationState::new(&SessionConfig::default()).unwrap();
        (state, UndoStack::new(), OrthoViewport::default())
    }

    fn place(
        mode: &mut SegmentMode,
        ctx: &mut ModeContext<'_>,
        x: f64,
        y: f64,
    ) -> PointId {
        mode.on_press(ctx, &ctrl(x, y)).unwrap();
        mode.on_release(ctx, &ctrl(x, y)).unwrap();
        ctx.state.points().ids().last().unwrap()
    }

    #[test]
    fn ctrl_click_places_point_on_plane() {
        let (mut state, mut history, viewport) = setup();
        let mut mode = SegmentMode::default();
        let mut ctx = ModeContext {
            state: &mut state,
            history: &mut history,
            viewport: &viewport,
        };

        mode.on_press(&mut ctx, &ctrl(20.0, 30.0)).unwrap();
        assert_relative_eq!(mode.pending().unwrap(), Point3::new(20.0, 30.0, 50.0), epsilon = 1e-9);
        mode.on_drag(&mut ctx, &ctrl(25.0, 30.0)).unwrap();
        mode.on_release(&mut ctx, &ctrl(25.0, 30.0)).unwrap();
        assert!(mode.pending().is_none());

        let id = ctx.state.points().ids().next().unwrap();
        assert_relative_eq!(
            ctx.state.points().location(id).unwrap(),
            Point3::new(25.0, 30.0, 50.0),
            epsilon = 1e-9
        );
        assert_eq!(ctx.state.points().attitude(id).unwrap(), ctx.state.plane().attitude());

        assert_eq!(history.undo_label(), Some("Add Point"));
        history.undo(&mut state).unwrap();
        assert!(state.points().is_empty());
    }

    #[test]
    fn ctrl_drag_moves_existing_point() {
        let (mut state, mut history, viewport) = setup();
        let mut mode = SegmentMode::default();
        let mut ctx = ModeContext {
            state: &mut state,
            history: &mut history,
            viewport: &viewport,
        };
        let id = place(&mut mode, &mut ctx, 20.0, 30.0);

        mode.on_press(&mut ctx, &ctrl(21.0, 31.0)).unwrap();
        mode.on_drag(&mut ctx, &ctrl(40.0, 30.0)).unwrap();
        mode.on_release(&mut ctx, &ctrl(40.0, 30.0)).unwrap();
        assert_eq!(ctx.state.points().len(), 1);
        assert_relative_eq!(
            ctx.state.points().location(id).unwrap(),
            Point3::new(40.0, 30.0, 50.0),
            epsilon = 1e-9
        );

        assert_eq!(history.undo_label(), Some("Move Point"));
        history.undo(&mut state).unwrap();
        assert_relative_eq!(
            state.points().location(id).unwrap(),
            Point3::new(20.0, 30.0, 50.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn shift_click_selects_and_deselects() {
        let (mut state, mut history, viewport) = setup();
        let mut mode = SegmentMode::default();
        let mut ctx = ModeContext {
            state: &mut state,
            history: &mut history,
            viewport: &viewport,
        };
        let a = place(&mut mode, &mut ctx, 20.0, 30.0);
        let b = place(&mut mode, &mut ctx, 60.0, 30.0);

        mode.on_press(&mut ctx, &shift(20.0, 30.0)).unwrap();
        mode.on_release(&mut ctx, &shift(20.0, 30.0)).unwrap();
        assert_eq!(ctx.state.selection().to_vec(), vec![a]);

        let additive = Modifiers::SHIFT | Modifiers::ALT;
        let event = PointerEvent::new(60.0, 30.0).with_modifiers(additive);
        mode.on_press(&mut ctx, &event).unwrap();
        mode.on_release(&mut ctx, &event).unwrap();
        assert_eq!(ctx.state.selection().to_vec(), vec![a, b]);

        // Exclusive click on empty space clears.
        mode.on_press(&mut ctx, &shift(150.0, 150.0)).unwrap();
        mode.on_release(&mut ctx, &shift(150.0, 150.0)).unwrap();
        assert!(ctx.state.selection().is_empty());
        assert_eq!(history.undo_label(), Some("Selection"));
    }

    #[test]
    fn shift_drag_selects_rectangle() {
        let (mut state, mut history, viewport) = setup();
        let mut mode = SegmentMode::default();
        let mut ctx = ModeContext {
            state: &mut state,
            history: &mut history,
            viewport: &viewport,
        };
        let a = place(&mut mode, &mut ctx, 20.0, 30.0);
        let _b = place(&mut mode, &mut ctx, 80.0, 80.0);

        mode.on_press(&mut ctx, &shift(10.0, 10.0)).unwrap();
        mode.on_drag(&mut ctx, &shift(50.0, 50.0)).unwrap();
        assert_eq!(mode.selection_rect(), Some(((10.0, 10.0), (50.0, 50.0))));
        mode.on_release(&mut ctx, &shift(50.0, 50.0)).unwrap();
        assert_eq!(ctx.state.selection().to_vec(), vec![a]);
    }

    #[test]
    fn shift_drag_along_one_axis_selects_rectangle() {
        let (mut state, mut history, viewport) = setup();
        let mut mode = SegmentMode::default();
        let mut ctx = ModeContext {
            state: &mut state,
            history: &mut history,
            viewport: &viewport,
        };
        let a = place(&mut mode, &mut ctx, 20.0, 30.0);
        let b = place(&mut mode, &mut ctx, 60.0, 30.0);
        let _c = place(&mut mode, &mut ctx, 60.0, 80.0);

        // A purely horizontal drag spans both points on its row.
        mode.on_press(&mut ctx, &shift(10.0, 30.0)).unwrap();
        mode.on_drag(&mut ctx, &shift(90.0, 30.0)).unwrap();
        mode.on_release(&mut ctx, &shift(90.0, 30.0)).unwrap();
        assert_eq!(ctx.state.selection().to_vec(), vec![a, b]);
    }

    #[test]
    fn leave_reverts_unfinished_grab() {
        let (mut state, mut history, viewport) = setup();
        let mut mode = SegmentMode::default();
        let mut ctx = ModeContext {
            state: &mut state,
            history: &mut history,
            viewport: &viewport,
        };
        let id = place(&mut mode, &mut ctx, 20.0, 30.0);

        mode.on_press(&mut ctx, &ctrl(20.0, 30.0)).unwrap();
        mode.on_drag(&mut ctx, &ctrl(70.0, 70.0)).unwrap();
        mode.leave(&mut ctx).unwrap();
        assert_relative_eq!(
            ctx.state.points().location(id).unwrap(),
            Point3::new(20.0, 30.0, 50.0),
            epsilon = 1e-9
        );
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn plain_click_is_ignored() {
        let (mut state, mut history, viewport) = setup();
        let mut mode = SegmentMode::default();
        let mut ctx = ModeContext {
            state: &mut state,
            history: &mut history,
            viewport: &viewport,
        };
        mode.on_press(&mut ctx, &PointerEvent::new(20.0, 30.0)).unwrap();
        mode.on_release(&mut ctx, &PointerEvent::new(20.0, 30.0)).unwrap();
        assert!(history.is_empty());
    }
}
