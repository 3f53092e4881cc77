//! Whole-graph snapshot undo/redo.
//!
//! The manager never observes mutations. Callers push the current state with
//! [`HistoryManager::save_snapshot`] before every undoable edit.

use std::collections::VecDeque;

use nc_project::SerializedGraph;
use tracing::debug;

use crate::config::DEFAULT_HISTORY_DEPTH;

#[derive(Debug, Clone)]
pub struct HistoryManager {
    undo: VecDeque<SerializedGraph>,
    redo: Vec<SerializedGraph>,
    max_depth: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl HistoryManager {
    /// `max_depth` is clamped to at least one snapshot.
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Push `current` and discard the redo branch. Evicts the oldest snapshot
    /// past the depth limit.
    pub fn save_snapshot(&mut self, current: SerializedGraph) {
        self.undo.push_back(current);
        if self.undo.len() > self.max_depth {
            self.undo.pop_front();
            debug!(max_depth = self.max_depth, "evicted oldest snapshot");
        }
        self.redo.clear();
    }

    /// State to restore, or `None` when there is nothing to undo.
    pub fn undo(&mut self, current: SerializedGraph) -> Option<SerializedGraph> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    /// State to restore, or `None` when there is nothing to redo.
    pub fn redo(&mut self, current: SerializedGraph) -> Option<SerializedGraph> {
        let next = self.redo.pop()?;
        self.undo.push_back(current);
        if self.undo.len() > self.max_depth {
            self.undo.pop_front();
        }
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// `(undo, redo)` stack depths.
    pub fn depth(&self) -> (usize, usize) {
        (self.undo.len(), self.redo.len())
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nc_project::parse_json;
    use proptest::prelude::*;

    fn state(n: usize) -> SerializedGraph {
        let nodes: Vec<String> = (1..=n)
            .map(|i| format!(r#"{{"id": "node_{i}", "type": "relu"}}"#))
            .collect();
        parse_json(&format!(r#"{{"nodes": [{}], "edges": []}}"#, nodes.join(","))).unwrap()
    }

    #[test]
    fn undo_redo_are_mirrors() {
        let mut history = HistoryManager::default();
        assert!(history.undo(state(0)).is_none());

        history.save_snapshot(state(0));
        history.save_snapshot(state(1));
        assert_eq!(history.undo(state(2)), Some(state(1)));
        assert_eq!(history.undo(state(1)), Some(state(0)));
        assert!(!history.can_undo());
        assert_eq!(history.redo(state(0)), Some(state(1)));
        assert_eq!(history.depth(), (1, 1));
    }

    #[test]
    fn new_snapshot_clears_redo() {
        let mut history = HistoryManager::default();
        history.save_snapshot(state(0));
        history.undo(state(1));
        assert!(history.can_redo());
        history.save_snapshot(state(0));
        assert!(!history.can_redo());
    }

    #[test]
    fn depth_is_bounded() {
        let mut history = HistoryManager::new(2);
        for n in 0..5 {
            history.save_snapshot(state(n));
        }
        assert_eq!(history.depth(), (2, 0));
        assert_eq!(history.undo(state(5)), Some(state(4)));
        assert_eq!(history.undo(state(4)), Some(state(3)));
        assert!(history.undo(state(3)).is_none());
        assert_eq!(HistoryManager::new(0).max_depth(), 1);
    }

    proptest! {
        #[test]
        fn undo_count_is_bounded_by_depth(depth in 1usize..6, pushes in 0usize..20) {
            let mut history = HistoryManager::new(depth);
            for n in 0..pushes {
                history.save_snapshot(state(n % 3));
            }
            let mut undone = 0;
            while history.undo(state(0)).is_some() {
                undone += 1;
            }
            prop_assert_eq!(undone, pushes.min(depth));
            prop_assert_eq!(history.depth().1, undone);
        }
    }
}
