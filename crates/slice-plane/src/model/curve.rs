use nalgebra::Point3;

use crate::model::{PointId, PointModel};
use crate::Result;

/// An ordered run of point ids, optionally closed into a loop.
///
/// Re-adding the first id of a curve with more than two points closes it.
/// Removing an id drops it and everything after it, and reopens the curve.
///
/// A [`Session`](crate::Session) does not keep curves. Hosts that trace
/// outlines own one per outline and resolve it with [`CurveModel::locations`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurveModel {
    points: Vec<PointId>,
    closed: bool,
}

impl CurveModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `id`, or closes the curve if `id` is its first point.
    /// Any other id already on the curve is ignored.
    pub fn add_point(&mut self, id: PointId) {
        if self.closes(id) {
            self.closed = true;
        } else if !self.points.contains(&id) {
            self.points.push(id);
        }
    }

    /// Truncates the curve at `id`. Returns `false` if `id` is not on it.
    pub fn remove_point(&mut self, id: PointId) -> bool {
        match self.points.iter().position(|p| *p == id) {
            Some(index) => {
                self.points.truncate(index);
                self.closed = false;
                true
            }
            None => false,
        }
    }

    pub fn remove_all_points(&mut self) {
        self.points.clear();
        self.closed = false;
    }

    /// Whether adding `id` would close the curve.
    pub fn closes(&self, id: PointId) -> bool {
        self.points.len() > 2 && self.points.first() == Some(&id)
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[inline]
    pub fn points(&self) -> &[PointId] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.points.contains(&id)
    }

    /// Locations of the curve's points, repeating the first one when closed.
    ///
    /// # Errors
    /// [`Error::KeyNotFound`](crate::Error::KeyNotFound) if a point was
    /// removed from `model` behind the curve's back.
    pub fn locations(&self, model: &PointModel) -> Result<Vec<Point3<f64>>> {
        let mut locations = self
            .points
            .iter()
            .map(|id| model.location(*id))
            .collect::<Result<Vec<_>>>()?;
        if self.closed {
            if let Some(first) = locations.first().copied() {
                locations.push(first);
            }
        }
        Ok(locations)
    }
}
