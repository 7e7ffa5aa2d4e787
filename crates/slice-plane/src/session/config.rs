use nalgebra::{Point3, Vector3};

use crate::interaction::ViewParameters;
use crate::{vectorops, Cuboid};

/// Starting values for a segmentation session.
///
/// ```
/// use nalgebra::Vector3;
/// use slice_plane::SessionConfig;
///
/// let config = SessionConfig::new()
///     .with_dimensions_px(Vector3::new(512.0, 512.0, 40.0))
///     .with_scale(Vector3::new(1.0, 1.0, 4.0));
/// assert_eq!(config.dimensions(), Vector3::new(512.0, 512.0, 160.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Image stack size in pixels.
    pub dimensions_px: Vector3<f64>,
    /// Per-axis voxel scale.
    pub scale: Vector3<f64>,
    /// Initial plane normal, normalized when the session starts.
    pub normal: Vector3<f64>,
    /// Initial rotation point. `None` means the centre of the box.
    pub rotation_point: Option<Point3<f64>>,
    /// Distance below which a point counts as lying on the current plane.
    pub on_plane_tolerance: f64,
    /// Size of the handle glyph the host draws.
    pub handle_size: f64,
    /// Initial camera.
    pub view: ViewParameters,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dimensions_px: Vector3::new(100.0, 100.0, 100.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            normal: Vector3::z(),
            rotation_point: None,
            on_plane_tolerance: 0.5,
            handle_size: 2.0,
            view: ViewParameters::default(),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimensions_px(mut self, dimensions_px: Vector3<f64>) -> Self {
        self.dimensions_px = dimensions_px;
        self
    }

    pub fn with_scale(mut self, scale: Vector3<f64>) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_normal(mut self, normal: Vector3<f64>) -> Self {
        self.normal = normal;
        self
    }

    pub fn with_rotation_point(mut self, point: Point3<f64>) -> Self {
        self.rotation_point = Some(point);
        self
    }

    pub fn with_on_plane_tolerance(mut self, tolerance: f64) -> Self {
        self.on_plane_tolerance = tolerance;
        self
    }

    pub fn with_handle_size(mut self, size: f64) -> Self {
        self.handle_size = size;
        self
    }

    pub fn with_view(mut self, view: ViewParameters) -> Self {
        self.view = view;
        self
    }

    /// Scaled box dimensions.
    pub fn dimensions(&self) -> Vector3<f64> {
        vectorops::elementwise_mult(&self.dimensions_px, &self.scale)
    }

    /// The configured rotation point, or the box centre.
    pub fn initial_rotation_point(&self) -> Point3<f64> {
        self.rotation_point
            .unwrap_or_else(|| Cuboid::new(self.dimensions()).centre())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.dimensions(), Vector3::new(100.0, 100.0, 100.0));
        assert_eq!(config.initial_rotation_point(), Point3::new(50.0, 50.0, 50.0));
        assert_eq!(config.normal, Vector3::z());
    }

    #[test]
    fn builders_override() {
        let config = SessionConfig::new()
            .with_dimensions_px(Vector3::new(10.0, 20.0, 30.0))
            .with_scale(Vector3::new(2.0, 1.0, 0.5))
            .with_rotation_point(Point3::new(1.0, 1.0, 1.0))
            .with_on_plane_tolerance(0.1);
        assert_eq!(config.dimensions(), Vector3::new(20.0, 20.0, 15.0));
        assert_eq!(config.initial_rotation_point(), Point3::new(1.0, 1.0, 1.0));
        assert_eq!(config.on_plane_tolerance, 0.1);
    }
}
