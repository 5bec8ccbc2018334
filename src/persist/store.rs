// Journaled project store
//
// The store owns the committed project state. Edits stage through
// save_region/save_item; an explicit commit makes the staged batch
// undo-visible. A mutation without a following commit is simply
// un-journaled - undo returns to the last committed state.

use crate::audio::SamplePool;
use crate::model::item::{Item, ItemStore};
use crate::model::ItemUid;
use crate::region::Region;
use std::collections::HashMap;
use std::collections::VecDeque;

/// Default maximum number of journal entries to keep
const DEFAULT_MAX_HISTORY: usize = 100;

/// The whole persistent state of one project
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProjectState {
    pub regions: HashMap<u64, Region>,
    pub items: ItemStore,
    pub pool: SamplePool,
}

/// One committed edit in the journal
#[derive(Debug, Clone)]
struct JournalEntry {
    description: String,
    timestamp: String,
    state: ProjectState,
}

/// Owns the project state and its undo/redo journal.
///
/// The journal holds snapshots of committed states. Committing pushes
/// the previous committed state onto the undo stack and clears the redo
/// stack; the history is bounded, dropping the oldest entry past the
/// limit.
pub struct ProjectStore {
    current: ProjectState,
    committed: ProjectState,
    dirty: bool,
    undo_stack: VecDeque<JournalEntry>,
    redo_stack: VecDeque<JournalEntry>,
    max_history: usize,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_HISTORY)
    }

    pub fn with_capacity(max_history: usize) -> Self {
        Self {
            current: ProjectState::default(),
            committed: ProjectState::default(),
            dirty: false,
            undo_stack: VecDeque::with_capacity(max_history),
            redo_stack: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    /// Replace the whole state, e.g. after loading a bundle.
    /// The journal is cleared; a loaded project starts fresh.
    pub fn reset(&mut self, state: ProjectState) {
        self.current = state.clone();
        self.committed = state;
        self.dirty = false;
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn state(&self) -> &ProjectState {
        &self.current
    }

    pub fn get_region(&self, uid: u64) -> Option<&Region> {
        self.current.regions.get(&uid)
    }

    /// Stage a region save. Undo-invisible until `commit`.
    pub fn save_region(&mut self, region: Region) {
        self.current.regions.insert(region.uid, region);
        self.dirty = true;
    }

    pub fn get_item_by_uid(&self, uid: ItemUid) -> Option<&Item> {
        self.current.items.get(uid)
    }

    /// Stage an item save. Undo-invisible until `commit`.
    pub fn save_item(&mut self, item: Item) {
        self.current.items.insert(item);
        self.dirty = true;
    }

    /// Item table of the working state, for item factory operations.
    /// Changes are staged like any save.
    pub fn items_mut(&mut self) -> &mut ItemStore {
        self.dirty = true;
        &mut self.current.items
    }

    pub fn items(&self) -> &ItemStore {
        &self.current.items
    }

    pub fn pool(&self) -> &SamplePool {
        &self.current.pool
    }

    pub fn pool_mut(&mut self) -> &mut SamplePool {
        self.dirty = true;
        &mut self.current.pool
    }

    /// Whether saves are staged but not yet committed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Journal the staged batch under `description`.
    ///
    /// Returns false (and journals nothing) when nothing was staged
    /// since the last commit.
    pub fn commit(&mut self, description: impl Into<String>) -> bool {
        if !self.dirty {
            return false;
        }
        self.undo_stack.push_back(JournalEntry {
            description: description.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            state: self.committed.clone(),
        });
        if self.undo_stack.len() > self.max_history {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
        self.committed = self.current.clone();
        self.dirty = false;
        true
    }

    /// Roll back to the state before the last commit.
    /// Uncommitted staged saves are discarded. Returns the description
    /// of the undone commit.
    pub fn undo(&mut self) -> Option<String> {
        let entry = self.undo_stack.pop_back()?;
        self.redo_stack.push_back(JournalEntry {
            description: entry.description.clone(),
            timestamp: entry.timestamp.clone(),
            state: self.committed.clone(),
        });
        self.committed = entry.state;
        self.current = self.committed.clone();
        self.dirty = false;
        Some(entry.description)
    }

    /// Re-apply the last undone commit
    pub fn redo(&mut self) -> Option<String> {
        let entry = self.redo_stack.pop_back()?;
        self.undo_stack.push_back(JournalEntry {
            description: entry.description.clone(),
            timestamp: entry.timestamp.clone(),
            state: self.committed.clone(),
        });
        self.committed = entry.state;
        self.current = self.committed.clone();
        self.dirty = false;
        Some(entry.description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description.as_str())
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region_named(uid: u64, name: &str) -> Region {
        Region::new(uid, name, 32.0)
    }

    #[test]
    fn test_save_then_commit_is_undoable() {
        let mut store = ProjectStore::new();
        store.save_region(region_named(1, "a"));
        assert!(store.is_dirty());
        assert!(store.commit("create region"));
        assert!(!store.is_dirty());

        assert!(store.can_undo());
        let undone = store.undo().unwrap();
        assert_eq!(undone, "create region");
        assert!(store.get_region(1).is_none());
    }

    #[test]
    fn test_commit_without_saves_is_noop() {
        let mut store = ProjectStore::new();
        assert!(!store.commit("nothing"));
        assert!(!store.can_undo());
    }

    #[test]
    fn test_uncommitted_save_is_unjournaled() {
        let mut store = ProjectStore::new();
        store.save_region(region_named(1, "a"));
        store.commit("create a");

        // Staged but never committed
        store.save_region(region_named(2, "b"));
        assert!(store.get_region(2).is_some());

        // Undo returns to before "create a"; the staged save vanishes
        // with it and was never separately journaled
        store.undo().unwrap();
        assert!(store.get_region(1).is_none());
        assert!(store.get_region(2).is_none());
    }

    #[test]
    fn test_redo_reapplies() {
        let mut store = ProjectStore::new();
        store.save_region(region_named(1, "a"));
        store.commit("create a");

        store.undo().unwrap();
        assert!(store.get_region(1).is_none());

        let redone = store.redo().unwrap();
        assert_eq!(redone, "create a");
        assert!(store.get_region(1).is_some());
    }

    #[test]
    fn test_new_commit_clears_redo() {
        let mut store = ProjectStore::new();
        store.save_region(region_named(1, "a"));
        store.commit("create a");
        store.undo().unwrap();
        assert!(store.can_redo());

        store.save_region(region_named(3, "c"));
        store.commit("create c");
        assert!(!store.can_redo());
    }

    #[test]
    fn test_history_limit() {
        let mut store = ProjectStore::with_capacity(3);
        for i in 0..5 {
            store.save_region(region_named(i, "r"));
            store.commit(format!("commit {}", i));
        }
        assert_eq!(store.undo_count(), 3);
    }

    #[test]
    fn test_item_saves_stage() {
        let mut store = ProjectStore::new();
        let uid = store.items_mut().create_item("melody");
        assert!(store.is_dirty());
        store.commit("create item");

        assert_eq!(store.get_item_by_uid(uid).unwrap().name, "melody");
        store.undo().unwrap();
        assert!(store.get_item_by_uid(uid).is_none());
    }
}
