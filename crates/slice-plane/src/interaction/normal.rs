use log::trace;
use nalgebra::Point3;

use crate::algorithms::calculate_centroid;
use crate::interaction::{record_plane_move, InteractionMode, ModeContext, ModeKind, PointerEvent};
use crate::{PlaneAttitude, Result};

/// Slides the plane along its own normal by dragging the handle.
///
/// Mouse motion is unprojected at the handle's screen depth and only its
/// component along the normal is kept. The rotation point is then recentred
/// on the new cross-section, so the handle always sits at the middle of the
/// cut. Motion that would push the plane out of the box is ignored.
#[derive(Debug, Clone, Default)]
pub struct NormalMode {
    active: bool,
    previous: (f64, f64),
    start: Option<(PlaneAttitude, Point3<f64>)>,
}

impl NormalMode {
    /// Whether the handle is currently grabbed.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl InteractionMode for NormalMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Normal
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>) -> Result<()> {
        let plane = &ctx.state.plane;
        if let Some(centre) = calculate_centroid(
            &plane.rotation_point(),
            &plane.normal(),
            &ctx.state.dimensions(),
        ) {
            ctx.state.handle = centre;
        }
        Ok(())
    }

    fn on_press(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<()> {
        self.previous = (event.x, event.y);
        self.start = Some((ctx.state.plane.attitude(), ctx.state.handle));
        self.active = ctx.viewport.pick_handle(event.x, event.y, &ctx.state.handle);
        Ok(())
    }

    fn on_drag(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<()> {
        if !self.active {
            return Ok(());
        }

        let handle = ctx.state.handle;
        let depth = ctx.viewport.project(&handle).z;
        let current = ctx.viewport.unproject(event.x, event.y, depth);
        let previous = ctx.viewport.unproject(self.previous.0, self.previous.1, depth);
        self.previous = (event.x, event.y);

        let normal = ctx.state.plane.normal();
        let candidate = handle + normal * (current - previous).dot(&normal);
        if let Some(centre) = calculate_centroid(&candidate, &normal, &ctx.state.dimensions()) {
            ctx.state.plane.set_rotation_point(centre);
            ctx.state.handle = centre;
            trace!("plane slid to {:?}", centre);
        }
        Ok(())
    }

    fn on_release(&mut self, ctx: &mut ModeContext<'_>, _event: &PointerEvent) -> Result<()> {
        let start = self.start.take();
        if !self.active {
            return Ok(());
        }
        self.active = false;

        let end = ctx.state.plane.attitude();
        match start {
            Some((start, handle)) if start != end => {
                record_plane_move(ctx, "Move Plane", start, end, handle)
            }
            _ => Ok(()),
        }
    }
}
