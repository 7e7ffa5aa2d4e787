use std::collections::BTreeSet;

use crate::model::PointId;

/// How a pick combines with the existing selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// The pick replaces the selection.
    #[default]
    Exclusive,
    /// The pick toggles or extends the selection.
    Additive,
}

/// The set of selected point ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<PointId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a single click.
    ///
    /// - Exclusive, no hit: clears.
    /// - Exclusive, hit: selects only the hit, unless it already was the sole
    ///   selection, in which case the selection is cleared.
    /// - Additive, hit: toggles the hit.
    /// - Additive, no hit: no change.
    pub fn apply_pick(&mut self, mode: SelectionMode, hit: Option<PointId>) {
        match (mode, hit) {
            (SelectionMode::Exclusive, None) => self.ids.clear(),
            (SelectionMode::Exclusive, Some(id)) => {
                let deselect = self.ids.len() == 1 && self.ids.contains(&id);
                self.ids.clear();
                if !deselect {
                    self.ids.insert(id);
                }
            }
            (SelectionMode::Additive, Some(id)) => {
                if !self.ids.remove(&id) {
                    self.ids.insert(id);
                }
            }
            (SelectionMode::Additive, None) => {}
        }
    }

    /// Applies a region pick: exclusive replaces, additive extends.
    pub fn apply_region<I>(&mut self, mode: SelectionMode, hits: I)
    where
        I: IntoIterator<Item = PointId>,
    {
        if mode == SelectionMode::Exclusive {
            self.ids.clear();
        }
        self.ids.extend(hits);
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.ids.contains(&id)
    }

    pub fn insert(&mut self, id: PointId) -> bool {
        self.ids.insert(id)
    }

    pub fn remove(&mut self, id: PointId) -> bool {
        self.ids.remove(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = PointId> + '_ {
        self.ids.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<PointId> {
        self.ids.iter().copied().collect()
    }

    pub fn as_set(&self) -> &BTreeSet<PointId> {
        &self.ids
    }
}

impl FromIterator<PointId> for Selection {
    fn from_iter<I: IntoIterator<Item = PointId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeSet<PointId>> for Selection {
    fn from(ids: BTreeSet<PointId>) -> Self {
        Self { ids }
    }
}
