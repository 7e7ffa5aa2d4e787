//! Stateless geometry on the cutting plane and the image volume.

use log::warn;
use nalgebra::{Point3, Vector3};

use crate::{CrossSection, Cuboid, Result};

/// Tolerance for parallel-line rejection and plane-membership checks.
pub const GEOMETRY_TOLERANCE: f64 = 1e-8;

/// Convergence threshold for [`geometric_median`].
pub const WEISZFELD_EPSILON: f64 = 1e-4;

/// Upper bound on Weiszfeld iterations before giving up on convergence.
pub const WEISZFELD_MAX_ITERATIONS: usize = 1000;

/// Intersects the line through `p1` and `p2` with a plane.
///
/// Returns `None` if the line is (nearly) parallel to the plane, or if the
/// computed point fails the plane-membership check because of floating-point
/// noise at grazing angles.
pub fn intersect_line_plane(
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    plane_point: &Point3<f64>,
    plane_normal: &Vector3<f64>,
) -> Option<Point3<f64>> {
    let direction = p2 - p1;
    let den = direction.dot(plane_normal);
    if den.abs() < GEOMETRY_TOLERANCE {
        return None;
    }

    let d = (plane_point - p1).dot(plane_normal) / den;
    let intersection = p1 + direction * d;

    if (plane_point - intersection).dot(plane_normal).abs() < GEOMETRY_TOLERANCE {
        Some(intersection)
    } else {
        None
    }
}

/// Centroid of the polygon the plane cuts from the box `[0, dim]`.
///
/// Returns `None` if the plane misses the box or touches it in fewer than
/// three distinct points.
pub fn calculate_centroid(
    plane_point: &Point3<f64>,
    plane_normal: &Vector3<f64>,
    dim: &Vector3<f64>,
) -> Option<Point3<f64>> {
    Cuboid::new(*dim)
        .cross_section(plane_point, plane_normal)
        .map(|section| section.centroid())
}

/// Area centroid of unordered coplanar points.
///
/// # Errors
/// [`Error::TooFewPoints`](crate::Error::TooFewPoints) or
/// [`Error::DegeneratePolygon`](crate::Error::DegeneratePolygon), see
/// [`CrossSection::from_points`].
pub fn polygon_centroid(points: &[Point3<f64>]) -> Result<Point3<f64>> {
    CrossSection::from_points(points).map(|section| section.centroid())
}

/// Geometric median of a point set (Weiszfeld's algorithm).
///
/// Starts from the mean and iterates until a step moves less than `eps`.
/// If an iterate lands on an input point, that point is returned.
///
/// Not used by the session itself; hosts call it directly, for example to
/// centre a view on a cluster of annotated points.
pub fn geometric_median(points: &[Point3<f64>], eps: f64) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }

    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    let mut estimate = Point3::from(sum / points.len() as f64);

    for _ in 0..WEISZFELD_MAX_ITERATIONS {
        let mut weighted = Vector3::zeros();
        let mut weight = 0.0;
        for p in points {
            let dist = (p - estimate).norm();
            if dist <= f64::EPSILON {
                return Some(*p);
            }
            weighted += p.coords / dist;
            weight += 1.0 / dist;
        }

        let next = Point3::from(weighted / weight);
        let step = (next - estimate).norm();
        estimate = next;
        if step < eps {
            return Some(estimate);
        }
    }

    warn!(
        "geometric median did not converge within {} iterations",
        WEISZFELD_MAX_ITERATIONS
    );
    Some(estimate)
}

/// Clamps each coordinate independently to `[0, dim[i]]`.
pub fn bound_coordinates_to_box(point: &Point3<f64>, dim: &Vector3<f64>) -> Point3<f64> {
    Cuboid::new(*dim).clamp(point)
}

/// Pulls `point` back toward `centroid` until it lies inside the box.
///
/// Points already inside are returned unchanged. Otherwise the result is the
/// point where the segment from `centroid` to `point` leaves the box, so a
/// point on the cutting plane stays on it. A centroid outside the box falls
/// back to per-axis clamping.
pub fn bound_coordinates_to_cuboid(
    point: &Point3<f64>,
    centroid: &Point3<f64>,
    dim: &Vector3<f64>,
) -> Point3<f64> {
    let cuboid = Cuboid::new(*dim);
    if cuboid.contains(point, 0.0) {
        return *point;
    }
    if !cuboid.contains(centroid, 0.0) {
        return cuboid.clamp(point);
    }

    let direction = point - centroid;
    let mut t = 1.0_f64;
    for i in 0..3 {
        let limit = if direction[i] > 0.0 {
            (dim[i] - centroid[i]) / direction[i]
        } else if direction[i] < 0.0 {
            -centroid[i] / direction[i]
        } else {
            continue;
        };
        t = t.min(limit);
    }

    // Rounding can leave the result a hair outside.
    cuboid.clamp(&(centroid + direction * t.max(0.0)))
}
