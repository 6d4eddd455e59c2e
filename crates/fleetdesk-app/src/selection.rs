// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::{Row, RowKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Unchecked,
    Checked,
    Indeterminate,
}

/// Rows marked for a bulk action, keyed by stable row identity so that
/// re-sorting or searching never moves a mark onto a different record.
///
/// Operations take the current page's keys in display order; positions are
/// indexes into that slice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    keys: BTreeSet<RowKey>,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &RowKey) -> bool {
        self.keys.contains(key)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn toggle_all(&mut self, checked: bool, page: &[RowKey]) {
        if checked {
            self.keys = page.iter().cloned().collect();
        } else {
            self.keys.clear();
        }
    }

    /// Flips the row at `position`. Returns false when the position is not
    /// on the page.
    pub fn toggle_one(&mut self, position: usize, page: &[RowKey]) -> bool {
        let Some(key) = page.get(position) else {
            return false;
        };
        if !self.keys.remove(key) {
            self.keys.insert(key.clone());
        }
        true
    }

    /// Drops keys that are no longer on the page; returns how many went.
    pub fn retain_page(&mut self, page: &[RowKey]) -> usize {
        let before = self.keys.len();
        let on_page = page.iter().collect::<BTreeSet<_>>();
        self.keys.retain(|key| on_page.contains(key));
        before - self.keys.len()
    }

    pub fn positions(&self, page: &[RowKey]) -> Vec<usize> {
        page.iter()
            .enumerate()
            .filter(|(_, key)| self.keys.contains(*key))
            .map(|(position, _)| position)
            .collect()
    }

    pub fn check_state(&self, page: &[RowKey]) -> CheckState {
        let selected = page.iter().filter(|key| self.keys.contains(*key)).count();
        if selected == 0 {
            CheckState::Unchecked
        } else if selected == page.len() {
            CheckState::Checked
        } else {
            CheckState::Indeterminate
        }
    }
}

/// What a bulk action receives: selected page positions plus the rows and
/// keys behind them, all in page order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BulkSelection {
    pub positions: Vec<usize>,
    pub keys: Vec<RowKey>,
    pub rows: Vec<Row>,
}

impl BulkSelection {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{CheckState, Selection};
    use crate::RowKey;

    fn page(ids: &[&str]) -> Vec<RowKey> {
        ids.iter().map(|id| RowKey::Id((*id).to_owned())).collect()
    }

    #[test]
    fn toggle_all_round_trip_clears() {
        let keys = page(&["a", "b", "c"]);
        let mut selection = Selection::default();
        selection.toggle_all(true, &keys);
        assert_eq!(selection.len(), 3);
        assert_eq!(selection.check_state(&keys), CheckState::Checked);

        selection.toggle_all(false, &keys);
        assert!(selection.is_empty());
        assert_eq!(selection.check_state(&keys), CheckState::Unchecked);
    }

    #[test]
    fn toggle_one_twice_is_a_no_op() {
        let keys = page(&["a", "b", "c"]);
        let mut selection = Selection::default();
        assert!(selection.toggle_one(1, &keys));
        assert_eq!(selection.positions(&keys), vec![1]);
        assert_eq!(selection.check_state(&keys), CheckState::Indeterminate);
        assert!(selection.toggle_one(1, &keys));
        assert!(selection.is_empty());
    }

    #[test]
    fn toggle_one_ignores_positions_off_the_page() {
        let keys = page(&["a"]);
        let mut selection = Selection::default();
        assert!(!selection.toggle_one(1, &keys));
        assert!(selection.is_empty());
    }

    #[test]
    fn positions_follow_rows_after_reordering() {
        let mut selection = Selection::default();
        selection.toggle_one(0, &page(&["a", "b", "c"]));

        let reordered = page(&["c", "b", "a"]);
        assert_eq!(selection.positions(&reordered), vec![2]);
    }

    #[test]
    fn retain_page_drops_rows_that_left() {
        let mut selection = Selection::default();
        selection.toggle_all(true, &page(&["a", "b", "c"]));
        let removed = selection.retain_page(&page(&["b", "d"]));
        assert_eq!(removed, 2);
        assert_eq!(selection.positions(&page(&["b", "d"])), vec![0]);
    }

    #[test]
    fn empty_page_reads_unchecked() {
        let selection = Selection::default();
        assert_eq!(selection.check_state(&[]), CheckState::Unchecked);
    }
}
