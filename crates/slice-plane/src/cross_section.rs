//! Planar polygon built from an unordered set of coplanar points.

use std::f64::consts::PI;

use nalgebra::{Point2, Point3, Vector3};

use crate::{vectorops, Error, Result};

/// Areas below this, relative to the squared extent of the points, are
/// treated as a degenerate (collinear) polygon.
const RELATIVE_AREA_EPSILON: f64 = 1e-12;

/// A convex polygon where a plane cuts the volume.
///
/// Vertices are ordered by heading around their mean in an in-plane basis
/// `(e1, e2)` derived from the first three input points. The area is the
/// signed shoelace area in that basis, so its sign depends on the input
/// order and not on the plane normal.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSection {
    origin: Point3<f64>,
    e1: Vector3<f64>,
    e2: Vector3<f64>,
    vertices: Vec<Point3<f64>>,
    planar: Vec<Point2<f64>>,
    signed_area: f64,
}

impl CrossSection {
    /// Orders the points into a polygon and computes its area.
    ///
    /// # Errors
    /// - [`Error::TooFewPoints`] for fewer than three points.
    /// - [`Error::DegeneratePolygon`] if the first three points do not span a
    ///   plane or the polygon encloses (near) zero area.
    pub fn from_points(points: &[Point3<f64>]) -> Result<Self> {
        if points.len() < 3 {
            return Err(Error::TooFewPoints {
                count: points.len(),
            });
        }

        let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
        let origin = Point3::from(sum / points.len() as f64);

        let (e1, e2) = basis(&points[0], &points[1], &points[2])?;

        let mut projected: Vec<(f64, Point3<f64>, Point2<f64>)> = points
            .iter()
            .map(|p| {
                let diff = p - origin;
                let xy = Point2::new(diff.dot(&e1), diff.dot(&e2));
                (xy.y.atan2(xy.x) + PI, *p, xy)
            })
            .collect();
        projected.sort_by(|a, b| a.0.total_cmp(&b.0));

        let vertices: Vec<Point3<f64>> = projected.iter().map(|(_, p, _)| *p).collect();
        let planar: Vec<Point2<f64>> = projected.iter().map(|(_, _, xy)| *xy).collect();

        let signed_area = 0.5 * edges(&planar).map(|(a, b)| a.x * b.y - b.x * a.y).sum::<f64>();

        let extent = planar
            .iter()
            .map(|p| p.coords.amax())
            .fold(0.0_f64, f64::max);
        if signed_area.abs() <= RELATIVE_AREA_EPSILON * extent * extent {
            return Err(Error::DegeneratePolygon);
        }

        Ok(Self {
            origin,
            e1,
            e2,
            vertices,
            planar,
            signed_area,
        })
    }

    /// The vertices in heading order, without repeating the first one.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false: construction requires at least three vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Mean of the vertices, the origin of the in-plane basis.
    #[inline]
    pub fn mean(&self) -> Point3<f64> {
        self.origin
    }

    /// Orthonormal in-plane basis `(e1, e2)`.
    #[inline]
    pub fn basis(&self) -> (Vector3<f64>, Vector3<f64>) {
        (self.e1, self.e2)
    }

    /// Unit normal of the polygon's plane, `e1 x e2`.
    pub fn normal(&self) -> Vector3<f64> {
        self.e1.cross(&self.e2)
    }

    /// Shoelace area in the `(e1, e2)` basis; sign follows vertex winding.
    #[inline]
    pub fn signed_area(&self) -> f64 {
        self.signed_area
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.signed_area.abs()
    }

    /// Area-weighted centre of the polygon.
    pub fn centroid(&self) -> Point3<f64> {
        let mut cx = 0.0;
        let mut cy = 0.0;
        for (a, b) in edges(&self.planar) {
            let cross = a.x * b.y - b.x * a.y;
            cx += (a.x + b.x) * cross;
            cy += (a.y + b.y) * cross;
        }
        cx /= 6.0 * self.signed_area;
        cy /= 6.0 * self.signed_area;

        self.origin + self.e1 * cx + self.e2 * cy
    }
}

/// In-plane orthonormal basis from three points.
fn basis(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
) -> Result<(Vector3<f64>, Vector3<f64>)> {
    let degenerate = |_| Error::DegeneratePolygon;
    let e1 = vectorops::normalize(&(p1 - p0)).map_err(degenerate)?;
    let e3 = vectorops::normalize(&vectorops::cross(&e1, &(p2 - p0))).map_err(degenerate)?;
    let e2 = vectorops::normalize(&vectorops::cross(&e1, &e3)).map_err(degenerate)?;
    Ok((e1, e2))
}

/// Consecutive vertex pairs, closing back to the first vertex.
fn edges(planar: &[Point2<f64>]) -> impl Iterator<Item = (&Point2<f64>, &Point2<f64>)> {
    planar.iter().zip(planar.iter().cycle().skip(1))
}
