//! The cutting plane and its hashable attitude snapshot.

use std::fmt;
use std::hash::{Hash, Hasher};

use nalgebra::{Point3, Vector3};

use crate::{vectorops, Result};

/// Number of decimal digits two attitudes must agree to in order to be equal.
pub const ATTITUDE_PRECISION: i32 = 12;

/// Handle returned by [`Plane::add_listener`], used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

type Listener = Box<dyn FnMut(&PlaneAttitude)>;

/// The cutting plane through the image stack.
///
/// Defined by a unit normal and a rotation point the plane passes through.
/// Every setter notifies registered listeners synchronously, after both
/// fields hold their new values.
pub struct Plane {
    normal: Vector3<f64>,
    rotation_point: Point3<f64>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: usize,
}

impl Plane {
    /// Creates a plane from a normal and a point on it.
    /// The normal is normalized.
    ///
    /// # Errors
    /// [`Error::DivideByZero`](crate::Error::DivideByZero) if `normal` has zero length.
    pub fn new(normal: Vector3<f64>, rotation_point: Point3<f64>) -> Result<Self> {
        Ok(Self {
            normal: vectorops::normalize(&normal)?,
            rotation_point,
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    /// Returns the unit normal.
    #[inline]
    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    /// Returns the point the plane is defined to pass through.
    #[inline]
    pub fn rotation_point(&self) -> Point3<f64> {
        self.rotation_point
    }

    /// Sets the normal, renormalizing it. The rotation point is untouched.
    ///
    /// # Errors
    /// [`Error::DivideByZero`](crate::Error::DivideByZero) if `normal` has zero
    /// length; the plane is left unchanged.
    pub fn set_normal(&mut self, normal: Vector3<f64>) -> Result<()> {
        self.normal = vectorops::normalize(&normal)?;
        self.notify();
        Ok(())
    }

    pub fn set_rotation_point(&mut self, point: Point3<f64>) {
        self.rotation_point = point;
        self.notify();
    }

    /// Sets normal and rotation point together with a single notification.
    ///
    /// # Errors
    /// [`Error::DivideByZero`](crate::Error::DivideByZero) if `normal` has zero
    /// length; the plane is left unchanged.
    pub fn set_plane_equation(&mut self, normal: Vector3<f64>, point: Point3<f64>) -> Result<()> {
        self.normal = vectorops::normalize(&normal)?;
        self.rotation_point = point;
        self.notify();
        Ok(())
    }

    /// Restores a previously captured attitude.
    ///
    /// A normal that is already unit length is taken bit for bit, so that
    /// restoring a snapshot of this plane reproduces it exactly.
    pub fn set_attitude(&mut self, attitude: &PlaneAttitude) -> Result<()> {
        let normal = attitude.normal();
        if (normal.norm_squared() - 1.0).abs() > 4.0 * f64::EPSILON {
            return self.set_plane_equation(normal, attitude.point());
        }
        self.normal = normal;
        self.rotation_point = attitude.point();
        self.notify();
        Ok(())
    }

    /// Snapshot of the current placement.
    pub fn attitude(&self) -> PlaneAttitude {
        PlaneAttitude::new(self.rotation_point, self.normal)
    }

    /// Signed distance from `point` to the plane along the normal.
    #[inline]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&(point - self.rotation_point))
    }

    /// Registers a change listener, called after every mutation.
    pub fn add_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&PlaneAttitude) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn notify(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let attitude = self.attitude();
        for (_, listener) in &mut self.listeners {
            listener(&attitude);
        }
    }
}

impl Default for Plane {
    /// The XY plane through the origin.
    fn default() -> Self {
        Self {
            normal: Vector3::z(),
            rotation_point: Point3::origin(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }
}

impl fmt::Debug for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plane")
            .field("normal", &self.normal)
            .field("rotation_point", &self.rotation_point)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Immutable snapshot of a plane placement, usable as a map key.
///
/// Equality and hashing work on coordinates scaled by `10^ATTITUDE_PRECISION`
/// and truncated toward zero, so attitudes that agree to 12 decimal digits
/// are the same key. Floating-point equality is never used.
#[derive(Clone, Copy)]
pub struct PlaneAttitude {
    point: Point3<f64>,
    normal: Vector3<f64>,
    key: [i128; 6],
}

impl PlaneAttitude {
    pub fn new(point: Point3<f64>, normal: Vector3<f64>) -> Self {
        let scale = 10f64.powi(ATTITUDE_PRECISION);
        let q = |v: f64| (v * scale).trunc() as i128;
        let key = [
            q(point.x),
            q(point.y),
            q(point.z),
            q(normal.x),
            q(normal.y),
            q(normal.z),
        ];
        Self { point, normal, key }
    }

    #[inline]
    pub fn point(&self) -> Point3<f64> {
        self.point
    }

    #[inline]
    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }
}

impl PartialEq for PlaneAttitude {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PlaneAttitude {}

impl Hash for PlaneAttitude {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for PlaneAttitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaneAttitude")
            .field("point", &[self.point.x, self.point.y, self.point.z])
            .field("normal", &[self.normal.x, self.normal.y, self.normal.z])
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    #[test]
    fn new_normalizes() {
        let plane = Plane::new(Vector3::new(0.0, 0.0, 5.0), Point3::new(1.0, 2.0, 3.0)).unwrap();
        assert_relative_eq!(plane.normal(), Vector3::z());
        assert_eq!(plane.rotation_point(), Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn zero_normal_rejected_and_state_kept() {
        let mut plane = Plane::default();
        assert_eq!(plane.set_normal(Vector3::zeros()), Err(Error::DivideByZero));
        assert_eq!(
            plane.set_plane_equation(Vector3::zeros(), Point3::new(9.0, 9.0, 9.0)),
            Err(Error::DivideByZero)
        );
        assert_relative_eq!(plane.normal(), Vector3::z());
        assert_eq!(plane.rotation_point(), Point3::origin());
    }

    #[test]
    fn set_normal_keeps_point() {
        let mut plane = Plane::new(Vector3::z(), Point3::new(5.0, 5.0, 5.0)).unwrap();
        plane.set_normal(Vector3::new(1.0, 1.0, 0.0)).unwrap();
        assert_relative_eq!(plane.normal().norm(), 1.0, epsilon = 1e-12);
        assert_eq!(plane.rotation_point(), Point3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn listener_sees_consistent_state_once() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut plane = Plane::default();
        let sink = Rc::clone(&seen);
        plane.add_listener(move |a| sink.borrow_mut().push(*a));

        plane
            .set_plane_equation(Vector3::new(2.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
            .unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0],
            PlaneAttitude::new(Point3::new(1.0, 1.0, 1.0), Vector3::x())
        );
    }

    #[test]
    fn set_attitude_restores_snapshot_exactly() {
        let mut plane =
            Plane::new(Vector3::new(1.0, 2.0, 3.0), Point3::new(4.0, 5.0, 6.0)).unwrap();
        let snapshot = plane.attitude();
        plane.set_normal(Vector3::x()).unwrap();
        plane.set_attitude(&snapshot).unwrap();
        assert_eq!(plane.normal(), snapshot.normal());
        assert_eq!(plane.rotation_point(), snapshot.point());

        plane
            .set_attitude(&PlaneAttitude::new(Point3::origin(), Vector3::new(0.0, 3.0, 0.0)))
            .unwrap();
        assert_relative_eq!(plane.normal(), Vector3::y());
    }

    #[test]
    fn removed_listener_is_not_called() {
        let count = Rc::new(RefCell::new(0));
        let mut plane = Plane::default();
        let sink = Rc::clone(&count);
        let id = plane.add_listener(move |_| *sink.borrow_mut() += 1);

        plane.set_rotation_point(Point3::new(1.0, 0.0, 0.0));
        assert!(plane.remove_listener(id));
        assert!(!plane.remove_listener(id));
        plane.set_rotation_point(Point3::new(2.0, 0.0, 0.0));

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn attitude_equal_past_precision() {
        let a = PlaneAttitude::new(Point3::new(0.1234567890123, 1.0, 2.0), Vector3::z());
        let b = PlaneAttitude::new(Point3::new(0.1234567890124, 1.0, 2.0), Vector3::z());
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn attitude_differs_within_precision() {
        let a = PlaneAttitude::new(Point3::new(0.12345678901, 1.0, 2.0), Vector3::z());
        let b = PlaneAttitude::new(Point3::new(0.12345678902, 1.0, 2.0), Vector3::z());
        assert_ne!(a, b);

        let n1 = PlaneAttitude::new(Point3::origin(), Vector3::new(0.0, 0.00000000001, 1.0));
        let n2 = PlaneAttitude::new(Point3::origin(), Vector3::new(0.0, 0.00000000002, 1.0));
        assert_ne!(n1, n2);
    }

    #[test]
    fn signed_distance_sign() {
        let plane = Plane::new(Vector3::x(), Point3::new(5.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(plane.signed_distance(&Point3::new(7.0, 3.0, 1.0)), 2.0);
        assert_relative_eq!(plane.signed_distance(&Point3::new(4.0, 0.0, 0.0)), -1.0);
    }
}
