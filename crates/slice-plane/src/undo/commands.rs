//! The commands a segmentation session records.
//!
//! Each command stores absolute before/after values, so redo re-applies the
//! recorded result rather than replaying a delta.

use nalgebra::{Point3, Vector3};

use crate::interaction::{ModeKind, ViewParameters};
use crate::model::{AnnotatedPoint, PointId, Selection};
use crate::session::{Orientation, SegmentationState};
use crate::undo::Command;
use crate::{vectorops, PlaneAttitude, Result};

/// Moves the plane between two attitudes.
#[derive(Debug, Clone, Copy)]
pub struct MovePlane {
    before: PlaneAttitude,
    after: PlaneAttitude,
}

impl MovePlane {
    pub fn new(before: PlaneAttitude, after: PlaneAttitude) -> Self {
        Self { before, after }
    }
}

impl Command<SegmentationState> for MovePlane {
    fn label(&self) -> &str {
        "Move Plane"
    }

    fn redo(&mut self, target: &mut SegmentationState) -> Result<()> {
        target.plane.set_attitude(&self.after)
    }

    fn undo(&mut self, target: &mut SegmentationState) -> Result<()> {
        target.plane.set_attitude(&self.before)
    }
}

/// Moves the handle glyph.
#[derive(Debug, Clone, Copy)]
pub struct MoveGlyph {
    before: Point3<f64>,
    after: Point3<f64>,
}

impl MoveGlyph {
    pub fn new(before: Point3<f64>, after: Point3<f64>) -> Self {
        Self { before, after }
    }
}

impl Command<SegmentationState> for MoveGlyph {
    fn label(&self) -> &str {
        "Move Handle"
    }

    fn redo(&mut self, target: &mut SegmentationState) -> Result<()> {
        target.handle = self.after;
        Ok(())
    }

    fn undo(&mut self, target: &mut SegmentationState) -> Result<()> {
        target.handle = self.before;
        Ok(())
    }
}

/// Moves an annotated point, possibly onto another attitude.
#[derive(Debug, Clone, Copy)]
pub struct MovePoint {
    before: AnnotatedPoint,
    after: AnnotatedPoint,
    bucket_index: usize,
}

impl MovePoint {
    /// `before` and `after` describe the same point id.
    pub fn new(before: AnnotatedPoint, after: AnnotatedPoint) -> Self {
        Self {
            before,
            after,
            bucket_index: 0,
        }
    }
}

impl Command<SegmentationState> for MovePoint {
    fn label(&self) -> &str {
        "Move Point"
    }

    fn redo(&mut self, target: &mut SegmentationState) -> Result<()> {
        let id = self.before.id;
        self.bucket_index = target.points.bucket_index(id)?;
        target
            .points
            .move_point(id, self.after.location, self.after.attitude)
    }

    fn undo(&mut self, target: &mut SegmentationState) -> Result<()> {
        target.points.relocate_point(
            self.before.id,
            self.before.location,
            self.before.attitude,
            self.bucket_index,
        )
    }
}

/// Adds a point. The id assigned on the first redo is reused on later redos.
#[derive(Debug, Clone, Copy)]
pub struct AddPoint {
    location: Point3<f64>,
    attitude: PlaneAttitude,
    id: Option<PointId>,
}

impl AddPoint {
    /// `location` is in pixel coordinates.
    pub fn new(location: Point3<f64>, attitude: PlaneAttitude) -> Self {
        Self {
            location,
            attitude,
            id: None,
        }
    }

    /// The id of the added point, once the command has run.
    pub fn id(&self) -> Option<PointId> {
        self.id
    }
}

impl Command<SegmentationState> for AddPoint {
    fn label(&self) -> &str {
        "Add Point"
    }

    fn redo(&mut self, target: &mut SegmentationState) -> Result<()> {
        let id = target
            .points
            .add_point(self.id, self.location, self.attitude)?;
        self.id = Some(id);
        Ok(())
    }

    fn undo(&mut self, target: &mut SegmentationState) -> Result<()> {
        if let Some(id) = self.id {
            target.points.remove_point(id)?;
        }
        Ok(())
    }
}

/// Deletes points and drops them from the selection.
#[derive(Debug, Clone)]
pub struct RemovePoints {
    ids: Vec<PointId>,
    removed: Vec<(AnnotatedPoint, usize)>,
    selection: Selection,
}

impl RemovePoints {
    pub fn new(mut ids: Vec<PointId>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self {
            ids,
            removed: Vec::new(),
            selection: Selection::new(),
        }
    }
}

impl Command<SegmentationState> for RemovePoints {
    fn label(&self) -> &str {
        "Delete Points"
    }

    fn redo(&mut self, target: &mut SegmentationState) -> Result<()> {
        if let Some(missing) = self.ids.iter().find(|id| !target.points.contains(**id)) {
            return Err(crate::Error::KeyNotFound(*missing));
        }

        self.selection = target.selection.clone();
        self.removed.clear();
        for id in &self.ids {
            let index = target.points.bucket_index(*id)?;
            let status = target.points.remove_point(*id)?;
            self.removed.push((status, index));
            target.selection.remove(*id);
        }
        Ok(())
    }

    fn undo(&mut self, target: &mut SegmentationState) -> Result<()> {
        for (status, index) in self.removed.iter().rev() {
            target.points.insert_point(*status, *index)?;
        }
        target.selection = self.selection.clone();
        Ok(())
    }
}

/// Replaces the selection.
#[derive(Debug, Clone)]
pub struct ChangeSelection {
    before: Selection,
    after: Selection,
}

impl ChangeSelection {
    pub fn new(before: Selection, after: Selection) -> Self {
        Self { before, after }
    }
}

impl Command<SegmentationState> for ChangeSelection {
    fn label(&self) -> &str {
        "Selection"
    }

    fn redo(&mut self, target: &mut SegmentationState) -> Result<()> {
        target.selection = self.after.clone();
        Ok(())
    }

    fn undo(&mut self, target: &mut SegmentationState) -> Result<()> {
        target.selection = self.before.clone();
        Ok(())
    }
}

/// Changes the voxel scale.
#[derive(Debug, Clone, Copy)]
pub struct SetScale {
    before: Vector3<f64>,
    after: Vector3<f64>,
}

impl SetScale {
    pub fn new(before: Vector3<f64>, after: Vector3<f64>) -> Self {
        Self { before, after }
    }
}

impl Command<SegmentationState> for SetScale {
    fn label(&self) -> &str {
        "Set Scale"
    }

    fn redo(&mut self, target: &mut SegmentationState) -> Result<()> {
        target.scale = self.after;
        Ok(())
    }

    fn undo(&mut self, target: &mut SegmentationState) -> Result<()> {
        target.scale = self.before;
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct PushPullRestore {
    attitude: PlaneAttitude,
    handle: Point3<f64>,
    selection: Selection,
}

/// Copies points along the plane normal and moves the plane with them.
///
/// The rotation point and the handle move by `normal * scale`. Every listed
/// point is re-created at its location shifted by the same displacement, on
/// the plane's new attitude, and the copies become the selection. Undo
/// removes the copies and restores the plane, handle and selection.
#[derive(Debug, Clone)]
pub struct PushPull {
    ids: Vec<PointId>,
    scale: f64,
    created: Vec<PointId>,
    restore: Option<PushPullRestore>,
}

impl PushPull {
    pub fn new(ids: Vec<PointId>, scale: f64) -> Self {
        Self {
            ids,
            scale,
            created: Vec::new(),
            restore: None,
        }
    }

    /// Ids of the copies, once the command has run.
    pub fn created(&self) -> &[PointId] {
        &self.created
    }
}

impl Command<SegmentationState> for PushPull {
    fn label(&self) -> &str {
        "Push/Pull"
    }

    fn redo(&mut self, target: &mut SegmentationState) -> Result<()> {
        let sources = self
            .ids
            .iter()
            .map(|id| target.points.status(*id))
            .collect::<Result<Vec<_>>>()?;

        let attitude = target.plane.attitude();
        let displacement = attitude.normal() * self.scale;
        let shift = vectorops::elementwise_div(&displacement, &target.scale);

        let handle = target.handle;
        target
            .plane
            .set_rotation_point(attitude.point() + displacement);
        target.handle += displacement;
        let moved = target.plane.attitude();

        let mut created = Vec::with_capacity(sources.len());
        for (i, source) in sources.iter().enumerate() {
            let reuse = self.created.get(i).copied();
            match target.points.add_point(reuse, source.location + shift, moved) {
                Ok(id) => created.push(id),
                Err(err) => {
                    for id in created.iter().rev() {
                        target.points.remove_point(*id)?;
                    }
                    target.plane.set_attitude(&attitude)?;
                    target.handle = handle;
                    return Err(err);
                }
            }
        }

        self.restore = Some(PushPullRestore {
            attitude,
            handle,
            selection: target.selection.clone(),
        });
        target.selection = created.iter().copied().collect();
        self.created = created;
        Ok(())
    }

    fn undo(&mut self, target: &mut SegmentationState) -> Result<()> {
        for id in self.created.iter().rev() {
            target.points.remove_point(*id)?;
        }
        if let Some(restore) = &self.restore {
            target.plane.set_attitude(&restore.attitude)?;
            target.handle = restore.handle;
            target.selection = restore.selection.clone();
        }
        Ok(())
    }
}

/// Moves the camera.
#[derive(Debug, Clone, Copy)]
pub struct ChangeView {
    before: ViewParameters,
    after: ViewParameters,
}

impl ChangeView {
    pub fn new(before: ViewParameters, after: ViewParameters) -> Self {
        Self { before, after }
    }
}

impl Command<SegmentationState> for ChangeView {
    fn label(&self) -> &str {
        "Change View"
    }

    fn redo(&mut self, target: &mut SegmentationState) -> Result<()> {
        target.view = self.after;
        Ok(())
    }

    fn undo(&mut self, target: &mut SegmentationState) -> Result<()> {
        target.view = self.before;
        Ok(())
    }
}

/// Switches the interaction mode.
#[derive(Debug, Clone, Copy)]
pub struct ChangeViewMode {
    before: ModeKind,
    after: ModeKind,
}

impl ChangeViewMode {
    pub fn new(before: ModeKind, after: ModeKind) -> Self {
        Self { before, after }
    }
}

impl Command<SegmentationState> for ChangeViewMode {
    fn label(&self) -> &str {
        "Change Mode"
    }

    fn redo(&mut self, target: &mut SegmentationState) -> Result<()> {
        target.view_mode = self.after;
        Ok(())
    }

    fn undo(&mut self, target: &mut SegmentationState) -> Result<()> {
        target.view_mode = self.before;
        Ok(())
    }
}

/// Resizes the handle glyph.
#[derive(Debug, Clone, Copy)]
pub struct SetHandleSize {
    before: f64,
    after: f64,
}

impl SetHandleSize {
    pub fn new(before: f64, after: f64) -> Self {
        Self { before, after }
    }
}

impl Command<SegmentationState> for SetHandleSize {
    fn label(&self) -> &str {
        "Handle Size"
    }

    fn redo(&mut self, target: &mut SegmentationState) -> Result<()> {
        target.handle_size = self.after;
        Ok(())
    }

    fn undo(&mut self, target: &mut SegmentationState) -> Result<()> {
        target.handle_size = self.before;
        Ok(())
    }
}

/// Turns the plane to face an axis, keeping its rotation point.
#[derive(Debug, Clone, Copy)]
pub struct ResetOrientation {
    inner: MovePlane,
}

impl ResetOrientation {
    pub fn new(before: PlaneAttitude, orientation: Orientation) -> Self {
        let after = PlaneAttitude::new(before.point(), orientation.normal());
        Self {
            inner: MovePlane::new(before, after),
        }
    }
}

impl Command<SegmentationState> for ResetOrientation {
    fn label(&self) -> &str {
        "Reset Orientation"
    }

    fn redo(&mut self, target: &mut SegmentationState) -> Result<()> {
        self.inner.redo(target)
    }

    fn undo(&mut self, target: &mut SegmentationState) -> Result<()> {
        self.inner.undo(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionConfig;
    use approx::assert_relative_eq;

    fn state() -> SegmentationState {
        SegmentationState::new(&SessionConfig::default()).unwrap()
    }

    fn add(target: &mut SegmentationState, location: Point3<f64>) -> PointId {
        let mut command = AddPoint::new(location, target.plane.attitude());
        command.redo(target).unwrap();
        command.id().unwrap()
    }

    #[test]
    fn move_plane_round_trip() {
        let mut s = state();
        let before = s.plane().attitude();
        let after = PlaneAttitude::new(Point3::new(10.0, 10.0, 10.0), Vector3::x());
        let mut command = MovePlane::new(before, after);

        command.redo(&mut s).unwrap();
        assert_eq!(s.plane().attitude(), after);
        command.undo(&mut s).unwrap();
        assert_eq!(s.plane().attitude(), before);
    }

    #[test]
    fn add_point_reuses_id_on_redo() {
        let mut s = state();
        let mut command = AddPoint::new(Point3::new(1.0, 2.0, 50.0), s.plane().attitude());
        command.redo(&mut s).unwrap();
        let id = command.id().unwrap();
        command.undo(&mut s).unwrap();
        assert!(s.points().is_empty());
        command.redo(&mut s).unwrap();
        assert_eq!(command.id(), Some(id));
        assert!(s.points().contains(id));
    }

    #[test]
    fn remove_points_restores_selection_and_order() {
        let mut s = state();
        let ids: Vec<_> = (0..3)
            .map(|i| add(&mut s, Point3::new(i as f64, 0.0, 50.0)))
            .collect();
        s.selection = ids.iter().copied().collect();
        let attitude = s.plane().attitude();

        let mut command = RemovePoints::new(vec![ids[0], ids[2]]);
        command.redo(&mut s).unwrap();
        assert_eq!(s.points().points_for_attitude(&attitude), &[ids[1]]);
        assert_eq!(s.selection().to_vec(), vec![ids[1]]);

        command.undo(&mut s).unwrap();
        assert_eq!(s.points().points_for_attitude(&attitude), ids.as_slice());
        assert_eq!(s.selection().len(), 3);
    }

    #[test]
    fn remove_unknown_changes_nothing() {
        let mut s = state();
        let a = add(&mut s, Point3::origin());
        let mut command = RemovePoints::new(vec![a, PointId(500)]);
        assert!(command.redo(&mut s).is_err());
        assert!(s.points().contains(a));
    }

    #[test]
    fn push_pull_copies_along_normal() {
        let mut s = state();
        let a = add(&mut s, Point3::new(10.0, 20.0, 50.0));
        let before = s.plane().attitude();

        let mut command = PushPull::new(vec![a], 5.0);
        command.redo(&mut s).unwrap();

        assert_eq!(s.plane().rotation_point(), Point3::new(50.0, 50.0, 55.0));
        assert_eq!(s.handle(), Point3::new(50.0, 50.0, 55.0));
        let copy = command.created()[0];
        assert_relative_eq!(s.points().location(copy).unwrap(), Point3::new(10.0, 20.0, 55.0));
        assert_eq!(s.points().attitude(copy).unwrap(), s.plane().attitude());
        assert_eq!(s.selection().to_vec(), vec![copy]);

        command.undo(&mut s).unwrap();
        assert_eq!(s.plane().attitude(), before);
        assert_eq!(s.points().len(), 1);
        assert!(s.selection().is_empty());

        command.redo(&mut s).unwrap();
        assert_eq!(command.created(), &[copy]);
    }

    #[test]
    fn failed_push_pull_redo_changes_nothing() {
        let mut s = state();
        let a = add(&mut s, Point3::new(10.0, 20.0, 50.0));
        let b = add(&mut s, Point3::new(30.0, 20.0, 50.0));
        s.selection = [a, b].into_iter().collect();
        let before = s.plane().attitude();

        let mut command = PushPull::new(vec![a, b], 5.0);
        command.redo(&mut s).unwrap();
        let copies = command.created().to_vec();
        command.undo(&mut s).unwrap();

        // Occupy the id the second copy would reuse.
        s.points
            .add_point(Some(copies[1]), Point3::origin(), before)
            .unwrap();
        assert_eq!(command.redo(&mut s), Err(crate::Error::DuplicatePoint(copies[1])));

        assert_eq!(s.plane().attitude(), before);
        assert_eq!(s.handle(), before.point());
        assert!(!s.points().contains(copies[0]));
        assert_eq!(s.points().len(), 3);
        assert_eq!(s.selection().to_vec(), vec![a, b]);
    }

    #[test]
    fn push_pull_honours_scale() {
        let config = SessionConfig::default().with_scale(Vector3::new(1.0, 1.0, 2.0));
        let mut s = SegmentationState::new(&config).unwrap();
        let a = add(&mut s, Point3::new(10.0, 10.0, 50.0));
        let mut command = PushPull::new(vec![a], 4.0);
        command.redo(&mut s).unwrap();
        let copy = command.created()[0];
        // Four scene units along z are two pixels.
        assert_relative_eq!(s.points().location(copy).unwrap(), Point3::new(10.0, 10.0, 52.0));
    }

    #[test]
    fn reset_orientation_keeps_point() {
        let mut s = state();
        let start = PlaneAttitude::new(Point3::new(30.0, 40.0, 50.0), Vector3::new(1.0, 1.0, 0.0).normalize());
        s.plane.set_attitude(&start).unwrap();

        let mut command = ResetOrientation::new(start, Orientation::Xz);
        command.redo(&mut s).unwrap();
        assert_eq!(s.plane().normal(), Vector3::y());
        assert_eq!(s.plane().rotation_point(), Point3::new(30.0, 40.0, 50.0));
        command.undo(&mut s).unwrap();
        assert_eq!(s.plane().attitude(), start);
    }

    #[test]
    fn value_commands_swap() {
        let mut s = state();
        let mut scale = SetScale::new(s.scale(), Vector3::new(2.0, 2.0, 2.0));
        scale.redo(&mut s).unwrap();
        assert_eq!(s.dimensions(), Vector3::new(200.0, 200.0, 200.0));
        scale.undo(&mut s).unwrap();
        assert_eq!(s.scale(), Vector3::new(1.0, 1.0, 1.0));

        let mut mode = ChangeViewMode::new(ModeKind::Rotation, ModeKind::Segment);
        mode.redo(&mut s).unwrap();
        assert_eq!(s.view_mode(), ModeKind::Segment);
        mode.undo(&mut s).unwrap();
        assert_eq!(s.view_mode(), ModeKind::Rotation);

        let mut size = SetHandleSize::new(s.handle_size(), 7.5);
        size.redo(&mut s).unwrap();
        assert_eq!(s.handle_size(), 7.5);
        size.undo(&mut s).unwrap();
        assert_eq!(s.handle_size(), 2.0);
    }
}
