use nalgebra::{Point3, Vector3};

use crate::interaction::{ModeKind, ViewParameters};
use crate::model::{PointId, PointModel, Selection};
use crate::session::SessionConfig;
use crate::{vectorops, CrossSection, Cuboid, Error, Plane, Result};

/// Checks that every scale component is finite and positive.
pub(crate) fn validate_scale(scale: &Vector3<f64>) -> Result<()> {
    if scale.iter().all(|c| c.is_finite() && *c > 0.0) {
        Ok(())
    } else {
        Err(Error::InvalidScale)
    }
}

/// Everything a segmentation command can change.
///
/// The plane and the handle live in scene coordinates, which are pixel
/// coordinates multiplied by `scale`. Point locations are stored in pixel
/// coordinates so that changing the scale moves them with the image.
#[derive(Debug)]
pub struct SegmentationState {
    pub(crate) plane: Plane,
    pub(crate) handle: Point3<f64>,
    pub(crate) points: PointModel,
    pub(crate) selection: Selection,
    pub(crate) scale: Vector3<f64>,
    pub(crate) dimensions_px: Vector3<f64>,
    pub(crate) view: ViewParameters,
    pub(crate) view_mode: ModeKind,
    pub(crate) handle_size: f64,
    pub(crate) on_plane_tolerance: f64,
}

impl SegmentationState {
    /// # Errors
    /// [`Error::DivideByZero`] if the configured normal is zero, or
    /// [`Error::InvalidScale`] for a scale that is not finite and positive.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        Self::with_points(config, PointModel::new())
    }

    /// Like [`SegmentationState::new`], with a point model whose ids come
    /// from the host.
    pub fn with_points(config: &SessionConfig, points: PointModel) -> Result<Self> {
        validate_scale(&config.scale)?;
        let rotation_point = config.initial_rotation_point();
        Ok(Self {
            plane: Plane::new(config.normal, rotation_point)?,
            handle: rotation_point,
            points,
            selection: Selection::new(),
            scale: config.scale,
            dimensions_px: config.dimensions_px,
            view: config.view,
            view_mode: ModeKind::default(),
            handle_size: config.handle_size,
            on_plane_tolerance: config.on_plane_tolerance,
        })
    }

    #[inline]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Position of the handle glyph, in scene coordinates.
    #[inline]
    pub fn handle(&self) -> Point3<f64> {
        self.handle
    }

    #[inline]
    pub fn points(&self) -> &PointModel {
        &self.points
    }

    #[inline]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[inline]
    pub fn scale(&self) -> Vector3<f64> {
        self.scale
    }

    #[inline]
    pub fn dimensions_px(&self) -> Vector3<f64> {
        self.dimensions_px
    }

    /// Box dimensions in scene coordinates.
    pub fn dimensions(&self) -> Vector3<f64> {
        vectorops::elementwise_mult(&self.dimensions_px, &self.scale)
    }

    pub fn cuboid(&self) -> Cuboid {
        Cuboid::new(self.dimensions())
    }

    /// Where the current plane cuts the box, if it does.
    pub fn cross_section(&self) -> Option<CrossSection> {
        self.cuboid()
            .cross_section(&self.plane.rotation_point(), &self.plane.normal())
    }

    #[inline]
    pub fn view(&self) -> ViewParameters {
        self.view
    }

    #[inline]
    pub fn view_mode(&self) -> ModeKind {
        self.view_mode
    }

    #[inline]
    pub fn handle_size(&self) -> f64 {
        self.handle_size
    }

    #[inline]
    pub fn on_plane_tolerance(&self) -> f64 {
        self.on_plane_tolerance
    }

    /// Ids of the points lying on the current plane.
    pub fn points_on_plane(&self) -> Vec<PointId> {
        self.points.points_on_plane(
            &self.plane.rotation_point(),
            &self.plane.normal(),
            &self.scale,
            self.on_plane_tolerance,
        )
    }

    /// Scene position of a point stored in pixel coordinates.
    pub fn to_scene(&self, location: &Point3<f64>) -> Point3<f64> {
        Point3::from(vectorops::elementwise_mult(&location.coords, &self.scale))
    }

    /// Pixel coordinates of a scene position.
    pub fn to_pixels(&self, scene: &Point3<f64>) -> Point3<f64> {
        Point3::from(vectorops::elementwise_div(&scene.coords, &self.scale))
    }
}
