// Items - reusable, uid-addressed containers of timeline events
//
// Multiple region references may share one item uid ("takes"). Items are
// owned by the project-wide ItemStore, never by a single region.

use crate::model::audio_item::AudioItemPlacement;
use crate::model::automation::AutomationPoint;
use crate::model::note::{self, Note};
use crate::model::{ItemUid, generate_uid};
use crate::time::beats_cmp;
use std::collections::HashMap;

/// Maximum number of events one item may hold. Batch edits that would
/// cross this abort with a user-visible warning; events already added
/// stay in place.
pub const MAX_ITEM_EVENT_COUNT: usize = 1024;

/// A uid-addressed container of notes, automation points and audio
/// placements
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Item {
    pub uid: ItemUid,
    pub name: String,
    notes: Vec<Note>,
    points: Vec<AutomationPoint>,
    audio: Vec<AudioItemPlacement>,
}

impl Item {
    pub fn new(uid: ItemUid, name: String) -> Self {
        Self {
            uid,
            name,
            notes: Vec::new(),
            points: Vec::new(),
            audio: Vec::new(),
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn points(&self) -> &[AutomationPoint] {
        &self.points
    }

    pub fn audio(&self) -> &[AudioItemPlacement] {
        &self.audio
    }

    pub fn event_count(&self) -> usize {
        self.notes.len() + self.points.len() + self.audio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event_count() == 0
    }

    /// Add a note, re-applying the same-pitch overlap repair invariant
    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
        note::repair_overlaps(&mut self.notes);
    }

    /// Remove the note matching `target` exactly
    pub fn remove_note(&mut self, target: &Note) -> Option<Note> {
        let index = self.notes.iter().position(|n| n == target)?;
        let removed = self.notes.remove(index);
        note::repair_overlaps(&mut self.notes);
        Some(removed)
    }

    /// Add an item-local automation point, keeping beat order
    pub fn add_point(&mut self, point: AutomationPoint) {
        let index = self
            .points
            .partition_point(|p| beats_cmp(p.beat, point.beat).is_le());
        self.points.insert(index, point);
    }

    /// Remove the point matching `target` exactly
    pub fn remove_point(&mut self, target: &AutomationPoint) -> Option<AutomationPoint> {
        let index = self.points.iter().position(|p| p == target)?;
        Some(self.points.remove(index))
    }

    /// Add an audio placement, keeping start order
    pub fn add_audio(&mut self, placement: AudioItemPlacement) {
        let index = self
            .audio
            .partition_point(|a| beats_cmp(a.start_beat, placement.start_beat).is_le());
        self.audio.insert(index, placement);
    }

    /// Append every event of `src`, shifted by `offset_beats`.
    ///
    /// Audio placement lengths are recomputed with `length_scale` so a
    /// segment merged from a part of the region with a different local
    /// tempo keeps its wall-clock duration.
    pub fn extend_shifted(&mut self, src: &Item, offset_beats: f64, length_scale: f64) {
        for n in &src.notes {
            self.notes.push(Note {
                start_beat: n.start_beat + offset_beats,
                ..*n
            });
        }
        note::repair_overlaps(&mut self.notes);

        for p in &src.points {
            self.add_point(p.shifted(offset_beats));
        }

        for a in &src.audio {
            let mut moved = a.clone();
            moved.placement_id = generate_uid();
            moved.start_beat = a.start_beat * length_scale + offset_beats;
            moved.length_beats = a.length_beats * length_scale;
            self.add_audio(moved);
        }
    }

}

/// Project-wide item table plus the takes registry.
///
/// The registry maps a base item uid to its alternate uids so take
/// cycling does not have to scan item names.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ItemStore {
    items: HashMap<ItemUid, Item>,
    takes: HashMap<ItemUid, Vec<ItemUid>>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Create a new empty item, returning its uid
    pub fn create_item(&mut self, name: impl Into<String>) -> ItemUid {
        let uid = generate_uid();
        self.items.insert(uid, Item::new(uid, name.into()));
        uid
    }

    pub fn insert(&mut self, item: Item) {
        self.items.insert(item.uid, item);
    }

    pub fn get(&self, uid: ItemUid) -> Option<&Item> {
        self.items.get(&uid)
    }

    pub fn get_mut(&mut self, uid: ItemUid) -> Option<&mut Item> {
        self.items.get_mut(&uid)
    }

    pub fn remove(&mut self, uid: ItemUid) -> Option<Item> {
        self.takes.remove(&uid);
        self.items.remove(&uid)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Item> {
        self.items.values().find(|i| i.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Clone `uid` under a new name and uid.
    ///
    /// The copy is registered as a take of the source so `next_take`
    /// can cycle through it.
    pub fn copy_item(&mut self, uid: ItemUid, new_name: impl Into<String>) -> Option<ItemUid> {
        let mut copy = self.items.get(&uid)?.clone();
        let new_uid = generate_uid();
        copy.uid = new_uid;
        copy.name = new_name.into();
        self.items.insert(new_uid, copy);
        self.takes.entry(uid).or_default().push(new_uid);
        Some(new_uid)
    }

    /// Alternate uids registered for `uid`
    pub fn takes_of(&self, uid: ItemUid) -> &[ItemUid] {
        self.takes.get(&uid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The base uid `uid` was copied from, when it is a registered take
    pub fn base_of(&self, uid: ItemUid) -> Option<ItemUid> {
        self.takes
            .iter()
            .find_map(|(base, takes)| takes.contains(&uid).then_some(*base))
    }

    /// Next take after `current` in the cycle base -> takes -> base
    pub fn next_take(&self, base: ItemUid, current: ItemUid) -> Option<ItemUid> {
        let takes = self.takes.get(&base)?;
        if takes.is_empty() {
            return None;
        }
        if current == base {
            return Some(takes[0]);
        }
        match takes.iter().position(|&t| t == current) {
            Some(i) if i + 1 < takes.len() => Some(takes[i + 1]),
            Some(_) => Some(base),
            None => Some(takes[0]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_note_repairs_overlaps() {
        let mut item = Item::new(1, "test".to_string());
        item.add_note(Note::new(0.0, 4.0, 60, 100));
        item.add_note(Note::new(1.0, 1.0, 60, 100));

        assert_eq!(item.notes().len(), 2);
        assert_eq!(item.notes()[0].length_beats, 1.0);
    }

    #[test]
    fn test_points_stay_sorted() {
        let mut item = Item::new(1, "test".to_string());
        item.add_point(AutomationPoint::control(2.0, 0, 64.0, 7, 0));
        item.add_point(AutomationPoint::control(0.5, 0, 32.0, 7, 0));
        item.add_point(AutomationPoint::control(1.0, 0, 90.0, 7, 0));

        let beats: Vec<f64> = item.points().iter().map(|p| p.beat).collect();
        assert_eq!(beats, vec![0.5, 1.0, 2.0]);
    }

    #[test]
    fn test_extend_shifted_concatenates() {
        let mut dst = Item::new(1, "glued".to_string());
        let mut src = Item::new(2, "src".to_string());
        src.add_note(Note::new(0.0, 1.0, 60, 100));
        src.add_point(AutomationPoint::control(0.5, 0, 64.0, 7, 0));

        dst.extend_shifted(&src, 4.0, 1.0);

        assert_eq!(dst.notes()[0].start_beat, 4.0);
        assert_eq!(dst.points()[0].beat, 4.5);
    }

    #[test]
    fn test_extend_shifted_scales_audio_lengths() {
        let mut dst = Item::new(1, "glued".to_string());
        let mut src = Item::new(2, "src".to_string());
        src.add_audio(AudioItemPlacement::new(generate_uid(), 10, 1.0, 2.0));

        // The source segment sat where the local tempo was twice as fast
        dst.extend_shifted(&src, 8.0, 2.0);

        assert_eq!(dst.audio()[0].start_beat, 10.0);
        assert_eq!(dst.audio()[0].length_beats, 4.0);
    }

    #[test]
    fn test_copy_item_registers_take() {
        let mut store = ItemStore::new();
        let base = store.create_item("verse");
        store.get_mut(base).unwrap().add_note(Note::new(0.0, 1.0, 60, 100));

        let alt = store.copy_item(base, "verse-alt").unwrap();

        assert_ne!(base, alt);
        assert_eq!(store.get(alt).unwrap().name, "verse-alt");
        assert_eq!(store.get(alt).unwrap().notes().len(), 1);
        assert_eq!(store.takes_of(base), &[alt]);
    }

    #[test]
    fn test_take_cycling() {
        let mut store = ItemStore::new();
        let base = store.create_item("verse");
        let a = store.copy_item(base, "verse-a").unwrap();
        let b = store.copy_item(base, "verse-b").unwrap();

        assert_eq!(store.next_take(base, base), Some(a));
        assert_eq!(store.next_take(base, a), Some(b));
        assert_eq!(store.next_take(base, b), Some(base));
    }

    #[test]
    fn test_next_take_without_takes() {
        let mut store = ItemStore::new();
        let base = store.create_item("verse");
        assert_eq!(store.next_take(base, base), None);
    }
}
