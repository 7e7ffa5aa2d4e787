//! Axis-aligned image volume `[0, dim.x] x [0, dim.y] x [0, dim.z]`.

use log::debug;
use nalgebra::{Point3, Vector3};

use crate::algorithms::GEOMETRY_TOLERANCE;
use crate::CrossSection;

/// The image stack volume, anchored at the origin.
///
/// Corners are ordered as:
/// - `0`: origin
/// - `1..=3`: the three corners one edge away, x, y, then xy
/// - `4..=7`: the same four lifted by `dim.z`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cuboid {
    dimensions: Vector3<f64>,
}

impl Cuboid {
    /// Creates a box with the given extent along each axis.
    pub fn new(dimensions: Vector3<f64>) -> Self {
        Self { dimensions }
    }

    #[inline]
    pub fn dimensions(&self) -> Vector3<f64> {
        self.dimensions
    }

    /// Centre of the volume.
    #[inline]
    pub fn centre(&self) -> Point3<f64> {
        Point3::from(self.dimensions * 0.5)
    }

    /// The eight corners of the volume.
    pub fn corners(&self) -> [Point3<f64>; 8] {
        let d = self.dimensions;
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(d.x, 0.0, 0.0),
            Point3::new(0.0, d.y, 0.0),
            Point3::new(d.x, d.y, 0.0),
            Point3::new(0.0, 0.0, d.z),
            Point3::new(d.x, 0.0, d.z),
            Point3::new(0.0, d.y, d.z),
            Point3::new(d.x, d.y, d.z),
        ]
    }

    /// Tolerance used for containment and de-duplication.
    ///
    /// [`GEOMETRY_TOLERANCE`] scaled by the largest extent, so that volumes
    /// measured in hundreds of units are not held to a unit-box tolerance.
    pub fn tolerance(&self) -> f64 {
        GEOMETRY_TOLERANCE * self.dimensions.amax().max(1.0)
    }

    /// Checks that every coordinate lies in `[0, dim[i]]`, widened by `tolerance`.
    pub fn contains(&self, point: &Point3<f64>, tolerance: f64) -> bool {
        (0..3).all(|i| point[i] >= -tolerance && point[i] <= self.dimensions[i] + tolerance)
    }

    /// Clamps each coordinate independently into the volume.
    pub fn clamp(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::new(
            point.x.clamp(0.0, self.dimensions.x.max(0.0)),
            point.y.clamp(0.0, self.dimensions.y.max(0.0)),
            point.z.clamp(0.0, self.dimensions.z.max(0.0)),
        )
    }

    /// Unique points where the plane crosses the volume's edges.
    ///
    /// Every edge lies on a line through a corner parallel to an axis, so the
    /// lines through all eight corners along all three axes are intersected
    /// with the plane. Axes (nearly) parallel to the plane are skipped, hits
    /// outside the volume are dropped, and hits closer than the tolerance to
    /// an earlier one are merged.
    pub fn plane_intersections(
        &self,
        plane_point: &Point3<f64>,
        plane_normal: &Vector3<f64>,
    ) -> Vec<Point3<f64>> {
        let tol = self.tolerance();
        let corners = self.corners();
        let mut unique: Vec<Point3<f64>> = Vec::with_capacity(6);

        for axis in [Vector3::x(), Vector3::y(), Vector3::z()] {
            let den = axis.dot(plane_normal);
            if den.abs() < GEOMETRY_TOLERANCE {
                continue;
            }

            for corner in &corners {
                let d = (plane_point - corner).dot(plane_normal) / den;
                let hit = corner + axis * d;
                if !self.contains(&hit, tol) {
                    continue;
                }
                if unique.iter().all(|u| (hit - u).norm() >= tol) {
                    unique.push(hit);
                }
            }
        }

        unique
    }

    /// The polygon the plane cuts from the volume.
    ///
    /// Returns `None` when the plane misses the volume or only grazes an edge
    /// or corner.
    pub fn cross_section(
        &self,
        plane_point: &Point3<f64>,
        plane_normal: &Vector3<f64>,
    ) -> Option<CrossSection> {
        let points = self.plane_intersections(plane_point, plane_normal);
        match CrossSection::from_points(&points) {
            Ok(section) => Some(section),
            Err(err) => {
                debug!("no cross-section ({} unique intersections): {}", points.len(), err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube(size: f64) -> Cuboid {
        Cuboid::new(Vector3::new(size, size, size))
    }

    #[test]
    fn corners_span_volume() {
        let b = Cuboid::new(Vector3::new(1.0, 2.0, 3.0));
        let corners = b.corners();
        assert_eq!(corners[0], Point3::origin());
        assert_eq!(corners[7], Point3::new(1.0, 2.0, 3.0));
        assert!(corners.iter().all(|c| b.contains(c, 0.0)));
    }

    #[test]
    fn centre_is_half_extent() {
        assert_eq!(
            Cuboid::new(Vector3::new(10.0, 20.0, 30.0)).centre(),
            Point3::new(5.0, 10.0, 15.0)
        );
    }

    #[test]
    fn contains_respects_tolerance() {
        let b = cube(10.0);
        let p = Point3::new(10.0 + 1e-9, 5.0, 5.0);
        assert!(!b.contains(&p, 0.0));
        assert!(b.contains(&p, 1e-8));
        assert!(!b.contains(&Point3::new(-0.1, 5.0, 5.0), 1e-8));
    }

    #[test]
    fn clamp_each_axis() {
        let b = Cuboid::new(Vector3::new(10.0, 20.0, 30.0));
        assert_eq!(
            b.clamp(&Point3::new(-5.0, 25.0, 15.0)),
            Point3::new(0.0, 20.0, 15.0)
        );
    }

    #[test]
    fn axis_aligned_cut_hits_four_edges() {
        let b = cube(100.0);
        let hits = b.plane_intersections(&Point3::new(50.0, 50.0, 50.0), &Vector3::z());
        assert_eq!(hits.len(), 4);
        for h in &hits {
            assert_relative_eq!(h.z, 50.0);
        }
    }

    #[test]
    fn diagonal_cut_is_hexagon() {
        let b = cube(2.0);
        let n = Vector3::new(1.0, 1.0, 1.0).normalize();
        let hits = b.plane_intersections(&Point3::new(1.0, 1.0, 1.0), &n);
        assert_eq!(hits.len(), 6);
    }

    #[test]
    fn corner_cut_merges_duplicates() {
        // Plane through three corners: each corner is hit by two axis lines.
        let b = cube(1.0);
        let n = Vector3::new(1.0, 1.0, 1.0).normalize();
        let hits = b.plane_intersections(&Point3::new(1.0, 0.0, 0.0), &n);
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn miss_has_no_section() {
        let b = cube(10.0);
        assert!(b.cross_section(&Point3::new(0.0, 0.0, 20.0), &Vector3::z()).is_none());
    }

    #[test]
    fn tolerance_scales_with_size() {
        assert_relative_eq!(cube(0.5).tolerance(), GEOMETRY_TOLERANCE);
        assert_relative_eq!(cube(1000.0).tolerance(), GEOMETRY_TOLERANCE * 1000.0);
    }
}
