use std::f64::consts::FRAC_PI_2;

use log::trace;
use nalgebra::{Point3, Vector3};

use crate::algorithms::{bound_coordinates_to_cuboid, calculate_centroid, intersect_line_plane};
use crate::interaction::{
    record_plane_move, InteractionMode, ModeContext, ModeKind, PointerEvent, ViewParameters,
    FAR_PLANE_DEPTH, NEAR_PLANE_DEPTH,
};
use crate::{PlaneAttitude, Result};

/// Reorients the plane with a virtual trackball, or drags its rotation point.
///
/// A press on the handle grabs it: dragging then slides the handle over the
/// plane, clamped to the box, and the release makes it the new rotation
/// point. A press anywhere else rotates the normal about the rotation point.
/// Each gesture that changed the plane is recorded as one "Rotate Plane" step.
#[derive(Debug, Clone, Default)]
pub struct RotationMode {
    active: bool,
    previous: (f64, f64),
    start: Option<(PlaneAttitude, Point3<f64>)>,
}

impl RotationMode {
    /// Whether the handle is currently grabbed.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl InteractionMode for RotationMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Rotation
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>) -> Result<()> {
        ctx.state.handle = ctx.state.plane.rotation_point();
        Ok(())
    }

    fn on_press(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<()> {
        self.previous = (event.x, event.y);
        self.start = Some((ctx.state.plane.attitude(), ctx.state.handle));
        self.active = ctx.viewport.pick_handle(event.x, event.y, &ctx.state.handle);
        Ok(())
    }

    fn on_drag(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<()> {
        let plane = &ctx.state.plane;
        let (point, normal) = (plane.rotation_point(), plane.normal());

        if self.active {
            let near = ctx.viewport.unproject(event.x, event.y, NEAR_PLANE_DEPTH);
            let far = ctx.viewport.unproject(event.x, event.y, FAR_PLANE_DEPTH);
            let dim = ctx.state.dimensions();
            let Some(on_plane) = intersect_line_plane(&near, &far, &point, &normal) else {
                return Ok(());
            };
            let Some(centroid) = calculate_centroid(&point, &normal, &dim) else {
                return Ok(());
            };
            ctx.state.handle = bound_coordinates_to_cuboid(&on_plane, &centroid, &dim);
            trace!("handle dragged to {:?}", ctx.state.handle);
            return Ok(());
        }

        let Some(rotated) = trackball_rotate(
            &normal,
            self.previous,
            (event.x, event.y),
            ctx.viewport.size(),
            &ctx.viewport.view_parameters(),
        ) else {
            return Ok(());
        };
        ctx.state.plane.set_plane_equation(rotated, point)?;
        trace!("plane normal rotated to {:?}", ctx.state.plane.normal());
        self.previous = (event.x, event.y);
        Ok(())
    }

    fn on_release(&mut self, ctx: &mut ModeContext<'_>, _event: &PointerEvent) -> Result<()> {
        if self.active {
            ctx.state.plane.set_rotation_point(ctx.state.handle);
            self.active = false;
        }

        let Some((start, handle)) = self.start.take() else {
            return Ok(());
        };
        let end = ctx.state.plane.attitude();
        if start == end {
            return Ok(());
        }

        record_plane_move(ctx, "Rotate Plane", start, end, handle)
    }
}

/// Rotates `normal` for a trackball drag from `from` to `to` (screen pixels).
///
/// The drag is turned into an axis built from the camera basis and the drag's
/// position relative to the viewport centre, and an angle proportional to
/// the drag length over the trackball radius, `min(width, height) / 2`. The
/// normal is rotated with Rodrigues' formula. Returns `None` for a zero-length
/// drag or an empty viewport.
pub fn trackball_rotate(
    normal: &Vector3<f64>,
    from: (f64, f64),
    to: (f64, f64),
    (width, height): (f64, f64),
    view: &ViewParameters,
) -> Option<Vector3<f64>> {
    let radius = width.min(height) / 2.0;
    let (delta_x, delta_y) = (to.0 - from.0, to.1 - from.1);
    let dist = delta_x.hypot(delta_y);
    if dist <= 0.0 || radius <= 0.0 {
        return None;
    }

    let dx = -delta_y / dist;
    let dy = delta_x / dist;
    let d = (dx * (to.0 - 0.5 * (width - 1.0)) + dy * (to.1 - 0.5 * (height - 1.0)))
        .clamp(-radius, radius);
    let phi = (d / radius).acos() - FRAC_PI_2;
    let angle = dist / radius;

    let b = view.up.try_normalize(f64::EPSILON)?;
    let a = view.direction().try_normalize(f64::EPSILON)?;
    let c = b.cross(&a).try_normalize(f64::EPSILON)?;
    let e = c * dx + b * dy;
    let axis = a * phi.sin() + e * phi.cos();

    let (sin, cos) = angle.sin_cos();
    Some(normal * cos + axis.cross(normal) * sin + axis * (axis.dot(normal) * (1.0 - cos)))
}
