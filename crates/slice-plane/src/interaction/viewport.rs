//! The host's camera, as seen by the interaction modes.

use nalgebra::{Point3, Vector3};

use crate::model::{PointId, PointModel};

/// Normalized depth of the near clipping plane passed to [`Viewport::unproject`].
pub const NEAR_PLANE_DEPTH: f64 = -1.0;

/// Normalized depth of the far clipping plane passed to [`Viewport::unproject`].
pub const FAR_PLANE_DEPTH: f64 = 1.0;

/// Default pick distance in screen pixels.
pub const PICK_RADIUS: f64 = 8.0;

/// Camera placement: eye position, look-at point and up direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParameters {
    pub eye: Point3<f64>,
    pub lookat: Point3<f64>,
    pub up: Vector3<f64>,
}

impl ViewParameters {
    pub fn new(eye: Point3<f64>, lookat: Point3<f64>, up: Vector3<f64>) -> Self {
        Self { eye, lookat, up }
    }

    /// Unnormalized viewing direction, `lookat - eye`.
    pub fn direction(&self) -> Vector3<f64> {
        self.lookat - self.eye
    }
}

impl Default for ViewParameters {
    /// Looking down the negative z axis at the origin, y up.
    fn default() -> Self {
        Self {
            eye: Point3::new(0.0, 0.0, 1.0),
            lookat: Point3::origin(),
            up: Vector3::y(),
        }
    }
}

/// Screen <-> scene mapping supplied by the host.
///
/// Screen coordinates are in pixels as the host reports them for mouse
/// events. Depth is normalized so that [`NEAR_PLANE_DEPTH`] and
/// [`FAR_PLANE_DEPTH`] unproject onto the near and far clipping planes.
///
/// The picking methods have defaults built on [`Viewport::project`]; hosts
/// with their own scene picker may override them.
pub trait Viewport {
    /// Scene point at screen position `(x, y)` and normalized `depth`.
    fn unproject(&self, x: f64, y: f64, depth: f64) -> Point3<f64>;

    /// Screen position and normalized depth of a scene point, as `(x, y, depth)`.
    fn project(&self, point: &Point3<f64>) -> Point3<f64>;

    /// Viewport width and height in pixels.
    fn size(&self) -> (f64, f64);

    fn view_parameters(&self) -> ViewParameters;

    fn pick_radius(&self) -> f64 {
        PICK_RADIUS
    }

    /// Whether the handle glyph at `handle` is under the cursor.
    fn pick_handle(&self, x: f64, y: f64, handle: &Point3<f64>) -> bool {
        let screen = self.project(handle);
        (screen.x - x).hypot(screen.y - y) <= self.pick_radius()
    }

    /// The point drawn nearest to the cursor, within the pick radius.
    ///
    /// Point locations are multiplied by `scale` to get their scene position.
    fn pick_point(
        &self,
        x: f64,
        y: f64,
        points: &PointModel,
        scale: &Vector3<f64>,
    ) -> Option<PointId> {
        let radius = self.pick_radius();
        points
            .iter()
            .map(|p| {
                let scene = Point3::from(p.location.coords.component_mul(scale));
                let screen = self.project(&scene);
                (p.id, (screen.x - x).hypot(screen.y - y))
            })
            .filter(|(_, dist)| *dist <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Points drawn inside the screen rectangle spanned by two corners.
    fn pick_points_in_rect(
        &self,
        corner_a: (f64, f64),
        corner_b: (f64, f64),
        points: &PointModel,
        scale: &Vector3<f64>,
    ) -> Vec<PointId> {
        let (left, right) = (corner_a.0.min(corner_b.0), corner_a.0.max(corner_b.0));
        let (top, bottom) = (corner_a.1.min(corner_b.1), corner_a.1.max(corner_b.1));
        points
            .iter()
            .filter(|p| {
                let scene = Point3::from(p.location.coords.component_mul(scale));
                let screen = self.project(&scene);
                (left..=right).contains(&screen.x) && (top..=bottom).contains(&screen.y)
            })
            .map(|p| p.id)
            .collect()
    }
}
