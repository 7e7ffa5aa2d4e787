//! Point storage with a bidirectional point <-> attitude index.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use log::debug;
use nalgebra::{Point3, Vector3};

use crate::{Error, PlaneAttitude, Result};

/// Identifier of an annotated point, assigned by a [`PointFactory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(pub u32);

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point together with the plane placement it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotatedPoint {
    pub id: PointId,
    pub location: Point3<f64>,
    pub attitude: PlaneAttitude,
}

/// Source of fresh point ids.
///
/// Hosts that keep their own node store implement this to create the node and
/// report its id. [`SequentialIds`] is the standalone default.
pub trait PointFactory {
    /// Creates a point at `location` and returns its new id.
    ///
    /// # Errors
    /// [`Error::IdsExhausted`] if no further id can be produced.
    fn create_point(&mut self, location: &Point3<f64>) -> Result<PointId>;

    /// Called when a point is added under an id chosen elsewhere, such as a
    /// redo restoring a previously assigned id.
    fn reserve(&mut self, _id: PointId) {}
}

/// Hands out increasing ids starting at 1, skipping any reserved id.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    // Wider than `PointId` so reserving `u32::MAX` cannot overflow.
    next: u64,
}

impl SequentialIds {
    /// Starts handing out ids at `first`.
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: u64::from(first),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl PointFactory for SequentialIds {
    fn create_point(&mut self, _location: &Point3<f64>) -> Result<PointId> {
        let id = u32::try_from(self.next).map_err(|_| Error::IdsExhausted)?;
        self.next += 1;
        Ok(PointId(id))
    }

    fn reserve(&mut self, id: PointId) {
        self.next = self.next.max(u64::from(id.0) + 1);
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    location: Point3<f64>,
    attitude: PlaneAttitude,
}

/// Owns the annotated points.
///
/// Every id in the model appears exactly once in the bucket of its attitude,
/// and no bucket is ever empty. All mutation goes through the methods here.
pub struct PointModel {
    points: BTreeMap<PointId, Entry>,
    by_attitude: HashMap<PlaneAttitude, Vec<PointId>>,
    factory: Box<dyn PointFactory>,
}

impl Default for PointModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PointModel {
    /// Creates an empty model that assigns ids with [`SequentialIds`].
    pub fn new() -> Self {
        Self::with_factory(SequentialIds::default())
    }

    /// Creates an empty model that asks `factory` for new ids.
    pub fn with_factory<F: PointFactory + 'static>(factory: F) -> Self {
        Self {
            points: BTreeMap::new(),
            by_attitude: HashMap::new(),
            factory: Box::new(factory),
        }
    }

    /// Adds a point. With `id == None` a new id is taken from the factory;
    /// otherwise the given id is reused.
    ///
    /// # Errors
    /// [`Error::DuplicatePoint`] if the id (given or produced) is already
    /// present, or the factory's error if it cannot produce an id.
    pub fn add_point(
        &mut self,
        id: Option<PointId>,
        location: Point3<f64>,
        attitude: PlaneAttitude,
    ) -> Result<PointId> {
        let id = match id {
            Some(id) => {
                self.factory.reserve(id);
                id
            }
            None => self.factory.create_point(&location)?,
        };
        if self.points.contains_key(&id) {
            return Err(Error::DuplicatePoint(id));
        }

        self.by_attitude.entry(attitude).or_default().push(id);
        self.points.insert(id, Entry { location, attitude });
        debug!("added point {} at {:?}", id, location);
        Ok(id)
    }

    /// Moves a point, rebucketing it if its attitude changed.
    ///
    /// # Errors
    /// [`Error::KeyNotFound`] if `id` is unknown; nothing is changed.
    pub fn move_point(
        &mut self,
        id: PointId,
        location: Point3<f64>,
        attitude: PlaneAttitude,
    ) -> Result<()> {
        let entry = self.points.get_mut(&id).ok_or(Error::KeyNotFound(id))?;
        entry.location = location;
        if entry.attitude != attitude {
            let previous = std::mem::replace(&mut entry.attitude, attitude);
            detach(&mut self.by_attitude, &previous, id);
            self.by_attitude.entry(attitude).or_default().push(id);
        }
        Ok(())
    }

    /// Moves a point and, if its attitude changed, places it at `bucket_index`
    /// in the new bucket instead of at the end.
    ///
    /// Used to revert a move exactly. The index is clamped to the bucket length.
    ///
    /// # Errors
    /// [`Error::KeyNotFound`] if `id` is unknown.
    pub fn relocate_point(
        &mut self,
        id: PointId,
        location: Point3<f64>,
        attitude: PlaneAttitude,
        bucket_index: usize,
    ) -> Result<()> {
        let entry = self.points.get_mut(&id).ok_or(Error::KeyNotFound(id))?;
        entry.location = location;
        if entry.attitude != attitude {
            let previous = std::mem::replace(&mut entry.attitude, attitude);
            detach(&mut self.by_attitude, &previous, id);
            attach_at(&mut self.by_attitude, attitude, id, bucket_index);
        }
        Ok(())
    }

    /// Re-inserts a removed point under its old id at `bucket_index` within
    /// its attitude bucket. The index is clamped to the bucket length.
    ///
    /// # Errors
    /// [`Error::DuplicatePoint`] if the id is already present.
    pub fn insert_point(&mut self, status: AnnotatedPoint, bucket_index: usize) -> Result<()> {
        if self.points.contains_key(&status.id) {
            return Err(Error::DuplicatePoint(status.id));
        }
        self.factory.reserve(status.id);
        attach_at(&mut self.by_attitude, status.attitude, status.id, bucket_index);
        self.points.insert(
            status.id,
            Entry {
                location: status.location,
                attitude: status.attitude,
            },
        );
        Ok(())
    }

    /// Position of `id` within the bucket of its attitude.
    ///
    /// # Errors
    /// [`Error::KeyNotFound`] if `id` is unknown.
    pub fn bucket_index(&self, id: PointId) -> Result<usize> {
        let attitude = self.entry(id)?.attitude;
        self.points_for_attitude(&attitude)
            .iter()
            .position(|other| *other == id)
            .ok_or(Error::KeyNotFound(id))
    }

    /// Removes a point and returns what it held.
    ///
    /// # Errors
    /// [`Error::KeyNotFound`] if `id` is unknown.
    pub fn remove_point(&mut self, id: PointId) -> Result<AnnotatedPoint> {
        let entry = self.points.remove(&id).ok_or(Error::KeyNotFound(id))?;
        detach(&mut self.by_attitude, &entry.attitude, id);
        debug!("removed point {}", id);
        Ok(AnnotatedPoint {
            id,
            location: entry.location,
            attitude: entry.attitude,
        })
    }

    /// Removes several points. Either all ids are removed or none.
    ///
    /// Repeated ids are removed once; the result holds one entry per distinct
    /// id, in first-seen order.
    ///
    /// # Errors
    /// [`Error::KeyNotFound`] for the first unknown id.
    pub fn remove_points(&mut self, ids: &[PointId]) -> Result<Vec<AnnotatedPoint>> {
        let mut seen = HashSet::with_capacity(ids.len());
        let unique: Vec<PointId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if let Some(missing) = unique.iter().find(|id| !self.points.contains_key(id)) {
            return Err(Error::KeyNotFound(*missing));
        }
        unique.into_iter().map(|id| self.remove_point(id)).collect()
    }

    /// Re-creates points under fresh ids, keeping location and attitude.
    pub fn create_points(&mut self, statuses: &[AnnotatedPoint]) -> Result<Vec<PointId>> {
        statuses
            .iter()
            .map(|s| self.add_point(None, s.location, s.attitude))
            .collect()
    }

    /// # Errors
    /// [`Error::KeyNotFound`] if `id` is unknown.
    pub fn attitude(&self, id: PointId) -> Result<PlaneAttitude> {
        self.entry(id).map(|e| e.attitude)
    }

    /// # Errors
    /// [`Error::KeyNotFound`] if `id` is unknown.
    pub fn location(&self, id: PointId) -> Result<Point3<f64>> {
        self.entry(id).map(|e| e.location)
    }

    /// # Errors
    /// [`Error::KeyNotFound`] if `id` is unknown.
    pub fn status(&self, id: PointId) -> Result<AnnotatedPoint> {
        self.entry(id).map(|e| AnnotatedPoint {
            id,
            location: e.location,
            attitude: e.attitude,
        })
    }

    /// Ids placed under `attitude`, in insertion order.
    pub fn points_for_attitude(&self, attitude: &PlaneAttitude) -> &[PointId] {
        self.by_attitude
            .get(attitude)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Ids whose scaled location lies within `tolerance` of the plane through
    /// `plane_point` with unit `plane_normal`.
    pub fn points_on_plane(
        &self,
        plane_point: &Point3<f64>,
        plane_normal: &Vector3<f64>,
        scale: &Vector3<f64>,
        tolerance: f64,
    ) -> Vec<PointId> {
        let offset = plane_normal.dot(&plane_point.coords);
        self.points
            .iter()
            .filter(|(_, e)| {
                let scaled = e.location.coords.component_mul(scale);
                (plane_normal.dot(&scaled) - offset).abs() < tolerance
            })
            .map(|(id, _)| *id)
            .collect()
    }

    #[inline]
    pub fn contains(&self, id: PointId) -> bool {
        self.points.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = PointId> + '_ {
        self.points.keys().copied()
    }

    /// All points in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = AnnotatedPoint> + '_ {
        self.points.iter().map(|(id, e)| AnnotatedPoint {
            id: *id,
            location: e.location,
            attitude: e.attitude,
        })
    }

    /// Every attitude bucket and its ids, in no particular order.
    pub fn attitude_groups(&self) -> impl Iterator<Item = (&PlaneAttitude, &[PointId])> {
        self.by_attitude.iter().map(|(a, ids)| (a, ids.as_slice()))
    }

    fn entry(&self, id: PointId) -> Result<&Entry> {
        self.points.get(&id).ok_or(Error::KeyNotFound(id))
    }
}

impl fmt::Debug for PointModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointModel")
            .field("points", &self.points.len())
            .field("attitudes", &self.by_attitude.len())
            .finish()
    }
}

/// Takes `id` out of the bucket for `attitude`, dropping the bucket when empty.
fn detach(by_attitude: &mut HashMap<PlaneAttitude, Vec<PointId>>, attitude: &PlaneAttitude, id: PointId) {
    if let Some(bucket) = by_attitude.get_mut(attitude) {
        bucket.retain(|other| *other != id);
        if bucket.is_empty() {
            by_attitude.remove(attitude);
        }
    }
}

fn attach_at(
    by_attitude: &mut HashMap<PlaneAttitude, Vec<PointId>>,
    attitude: PlaneAttitude,
    id: PointId,
    bucket_index: usize,
) {
    let bucket = by_attitude.entry(attitude).or_default();
    bucket.insert(bucket_index.min(bucket.len()), id);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attitude(z: f64) -> PlaneAttitude {
        PlaneAttitude::new(Point3::new(0.0, 0.0, z), Vector3::z())
    }

    fn assert_consistent(model: &PointModel) {
        let mut seen: Vec<PointId> = Vec::new();
        for (att, ids) in model.attitude_groups() {
            assert!(!ids.is_empty());
            for id in ids {
                assert_eq!(model.attitude(*id).unwrap(), *att);
                seen.push(*id);
            }
        }
        seen.sort();
        assert_eq!(seen, model.ids().collect::<Vec<_>>());
    }

    #[test]
    fn grouping_by_attitude() {
        let (t1, t2) = (attitude(1.0), attitude(2.0));
        let mut model = PointModel::new();
        let a = model.add_point(None, Point3::new(1.0, 0.0, 1.0), t1).unwrap();
        let b = model.add_point(None, Point3::new(2.0, 0.0, 1.0), t1).unwrap();
        let c = model.add_point(None, Point3::new(3.0, 0.0, 2.0), t2).unwrap();

        assert_eq!(model.points_for_attitude(&t1), &[a, b]);
        assert_eq!(model.points_for_attitude(&t2), &[c]);

        model.move_point(b, Point3::new(2.0, 0.0, 2.0), t2).unwrap();
        assert_eq!(model.points_for_attitude(&t1), &[a]);
        assert_eq!(model.points_for_attitude(&t2), &[c, b]);
        assert_consistent(&model);
    }

    #[test]
    fn empty_bucket_is_dropped() {
        let t1 = attitude(1.0);
        let mut model = PointModel::new();
        let a = model.add_point(None, Point3::origin(), t1).unwrap();
        model.remove_point(a).unwrap();
        assert!(model.points_for_attitude(&t1).is_empty());
        assert_eq!(model.attitude_groups().count(), 0);
    }

    #[test]
    fn move_within_same_attitude_keeps_order() {
        let t1 = attitude(1.0);
        let mut model = PointModel::new();
        let a = model.add_point(None, Point3::origin(), t1).unwrap();
        let b = model.add_point(None, Point3::origin(), t1).unwrap();
        model.move_point(a, Point3::new(4.0, 4.0, 1.0), t1).unwrap();
        assert_eq!(model.points_for_attitude(&t1), &[a, b]);
        assert_eq!(model.location(a).unwrap(), Point3::new(4.0, 4.0, 1.0));
    }

    #[test]
    fn unknown_id_fails_loudly() {
        let mut model = PointModel::new();
        let ghost = PointId(42);
        assert_eq!(model.attitude(ghost), Err(Error::KeyNotFound(ghost)));
        assert_eq!(
            model.move_point(ghost, Point3::origin(), attitude(0.0)),
            Err(Error::KeyNotFound(ghost))
        );
        assert_eq!(model.remove_point(ghost), Err(Error::KeyNotFound(ghost)));
    }

    #[test]
    fn explicit_id_is_reused_and_reserved() {
        let mut model = PointModel::new();
        let id = model.add_point(Some(PointId(7)), Point3::origin(), attitude(0.0)).unwrap();
        assert_eq!(id, PointId(7));
        let next = model.add_point(None, Point3::origin(), attitude(0.0)).unwrap();
        assert_eq!(next, PointId(8));
        assert_eq!(
            model.add_point(Some(PointId(7)), Point3::origin(), attitude(0.0)),
            Err(Error::DuplicatePoint(PointId(7)))
        );
        assert_consistent(&model);
    }

    #[test]
    fn remove_points_is_all_or_nothing() {
        let mut model = PointModel::new();
        let a = model.add_point(None, Point3::origin(), attitude(0.0)).unwrap();
        assert_eq!(
            model.remove_points(&[a, PointId(99)]),
            Err(Error::KeyNotFound(PointId(99)))
        );
        assert!(model.contains(a));

        let removed = model.remove_points(&[a]).unwrap();
        assert_eq!(removed[0].id, a);
        assert!(model.is_empty());
    }

    #[test]
    fn remove_points_tolerates_repeated_ids() {
        let mut model = PointModel::new();
        let a = model.add_point(None, Point3::origin(), attitude(0.0)).unwrap();
        let b = model.add_point(None, Point3::origin(), attitude(0.0)).unwrap();

        let removed = model.remove_points(&[a, a]).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, a);
        assert_eq!(model.ids().collect::<Vec<_>>(), vec![b]);

        // A repeat next to an unknown id still changes nothing.
        assert_eq!(
            model.remove_points(&[b, b, PointId(99)]),
            Err(Error::KeyNotFound(PointId(99)))
        );
        assert!(model.contains(b));
        assert_consistent(&model);
    }

    #[test]
    fn sequential_ids_run_out_without_panicking() {
        let mut ids = SequentialIds::starting_at(u32::MAX);
        assert_eq!(ids.create_point(&Point3::origin()), Ok(PointId(u32::MAX)));
        assert_eq!(ids.create_point(&Point3::origin()), Err(Error::IdsExhausted));

        let mut model = PointModel::new();
        model.add_point(Some(PointId(u32::MAX)), Point3::origin(), attitude(0.0)).unwrap();
        assert_eq!(
            model.add_point(None, Point3::origin(), attitude(0.0)),
            Err(Error::IdsExhausted)
        );
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn create_points_assigns_fresh_ids() {
        let mut model = PointModel::new();
        let a = model.add_point(None, Point3::new(1.0, 1.0, 1.0), attitude(1.0)).unwrap();
        let status = model.status(a).unwrap();
        let created = model.create_points(&[status]).unwrap();
        assert_eq!(created.len(), 1);
        assert_ne!(created[0], a);
        assert_eq!(model.points_for_attitude(&attitude(1.0)), &[a, created[0]]);
    }

    #[test]
    fn on_plane_query_uses_scale() {
        let mut model = PointModel::new();
        let near = model.add_point(None, Point3::new(3.0, 3.0, 5.2), attitude(5.0)).unwrap();
        let _far = model.add_point(None, Point3::new(3.0, 3.0, 7.0), attitude(7.0)).unwrap();
        let unit = Vector3::new(1.0, 1.0, 1.0);
        let on = model.points_on_plane(&Point3::new(0.0, 0.0, 5.0), &Vector3::z(), &unit, 0.5);
        assert_eq!(on, vec![near]);

        // Doubling z scale moves both points away from z = 5.
        let stretched = Vector3::new(1.0, 1.0, 2.0);
        let on = model.points_on_plane(&Point3::new(0.0, 0.0, 5.0), &Vector3::z(), &stretched, 0.5);
        assert!(on.is_empty());
    }

    #[test]
    fn remove_then_insert_restores_order() {
        let t1 = attitude(1.0);
        let mut model = PointModel::new();
        let ids: Vec<_> = (0..3)
            .map(|i| model.add_point(None, Point3::new(i as f64, 0.0, 1.0), t1).unwrap())
            .collect();

        let index = model.bucket_index(ids[1]).unwrap();
        assert_eq!(index, 1);
        let status = model.remove_point(ids[1]).unwrap();
        model.insert_point(status, index).unwrap();
        assert_eq!(model.points_for_attitude(&t1), ids.as_slice());
    }

    #[test]
    fn relocate_reverts_move_exactly() {
        let (t1, t2) = (attitude(1.0), attitude(2.0));
        let mut model = PointModel::new();
        let a = model.add_point(None, Point3::origin(), t1).unwrap();
        let b = model.add_point(None, Point3::origin(), t1).unwrap();

        model.move_point(a, Point3::new(1.0, 1.0, 2.0), t2).unwrap();
        assert_eq!(model.points_for_attitude(&t1), &[b]);
        model.relocate_point(a, Point3::origin(), t1, 0).unwrap();
        assert_eq!(model.points_for_attitude(&t1), &[a, b]);
        assert!(model.points_for_attitude(&t2).is_empty());
    }

    struct EvenIds(u32);

    impl PointFactory for EvenIds {
        fn create_point(&mut self, _location: &Point3<f64>) -> Result<PointId> {
            self.0 += 2;
            Ok(PointId(self.0))
        }
    }

    #[test]
    fn custom_factory() {
        let mut model = PointModel::with_factory(EvenIds(0));
        assert_eq!(model.add_point(None, Point3::origin(), attitude(0.0)).unwrap(), PointId(2));
        assert_eq!(model.add_point(None, Point3::origin(), attitude(0.0)).unwrap(), PointId(4));
    }
}
