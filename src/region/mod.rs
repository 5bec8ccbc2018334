// Region timeline - ordered item references, markers, tempo lookup
//
// A region is a fixed-length slice of the song holding references to
// items placed on tracks, plus its markers and automation curves. It is
// owned by the project store and mutated only through the editor,
// followed by a save + commit pair.

use crate::audio::AudioItemTimeline;
use crate::automation::CurveEngine;
use crate::model::ItemUid;
use crate::model::marker::{LoopMarker, Marker, MarkerKind, TempoMarker, TextMarker};
use crate::time::{beats_cmp, beats_eq, round6};

/// Tempo assumed before the first tempo marker
pub const DEFAULT_TEMPO: f64 = 128.0;

/// Time signature assumed before the first tempo marker
pub const DEFAULT_TSIG: (u8, u8) = (4, 4);

/// Maximum number of item references one region may hold. Batch
/// operations that would cross this abort with a user-visible warning;
/// references already placed stay.
pub const MAX_REGION_ITEM_COUNT: usize = 128;

/// A placement of an item on a region track.
///
/// Several references may share one `item_uid`; removal matches the
/// whole reference, not just the uid.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ItemRef {
    pub track_num: u32,
    pub start_beat: f64,
    pub length_beats: f64,
    pub item_uid: ItemUid,
    /// Offset into the item content, in beats (trimmed/split items)
    pub start_offset: f64,
}

impl ItemRef {
    pub fn new(track_num: u32, start_beat: f64, length_beats: f64, item_uid: ItemUid) -> Self {
        assert!(start_beat >= 0.0, "item ref start must be >= 0");
        assert!(length_beats > 0.0, "item ref length must be > 0");
        Self {
            track_num,
            start_beat,
            length_beats,
            item_uid,
            start_offset: 0.0,
        }
    }

    pub fn end_beat(&self) -> f64 {
        self.start_beat + self.length_beats
    }
}

/// A fixed-length slice of the song timeline
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Region {
    pub uid: u64,
    pub name: String,
    pub length_beats: f64,
    refs: Vec<ItemRef>,
    markers: Vec<Marker>,
    pub curves: CurveEngine,
    pub audio: AudioItemTimeline,
}

impl Region {
    pub fn new(uid: u64, name: impl Into<String>, length_beats: f64) -> Self {
        assert!(length_beats > 0.0, "region length must be > 0");
        Self {
            uid,
            name: name.into(),
            length_beats,
            refs: Vec::new(),
            markers: Vec::new(),
            curves: CurveEngine::new(),
            audio: AudioItemTimeline::new(),
        }
    }

    /// Item references ordered by (track, start)
    pub fn refs(&self) -> &[ItemRef] {
        &self.refs
    }

    pub fn ref_count(&self) -> usize {
        self.refs.len()
    }

    /// Whether another reference still fits under the region cap
    pub fn at_capacity(&self) -> bool {
        self.refs.len() >= MAX_REGION_ITEM_COUNT
    }

    /// Insert a reference, keeping (track, start) order.
    /// Returns false without inserting when the region is at capacity.
    pub fn add_item_ref(&mut self, item_ref: ItemRef) -> bool {
        if self.at_capacity() {
            return false;
        }
        let index = self.refs.partition_point(|r| {
            (r.track_num, round6(r.start_beat)) <= (item_ref.track_num, round6(item_ref.start_beat))
        });
        self.refs.insert(index, item_ref);
        true
    }

    /// Remove the reference matching `target` exactly
    pub fn remove_item_ref(&mut self, target: &ItemRef) -> Option<ItemRef> {
        let index = self.refs.iter().position(|r| r == target)?;
        Some(self.refs.remove(index))
    }

    /// Mutable access for in-place edits; the caller must preserve
    /// (track, start) order or call `resort_refs` afterwards
    pub fn refs_mut(&mut self) -> &mut Vec<ItemRef> {
        &mut self.refs
    }

    /// Restore (track, start) order after in-place edits
    pub fn resort_refs(&mut self) {
        self.refs.sort_by(|a, b| {
            a.track_num
                .cmp(&b.track_num)
                .then_with(|| beats_cmp(a.start_beat, b.start_beat))
        });
    }

    /// References on one track, in start order
    pub fn refs_on_track(&self, track_num: u32) -> impl Iterator<Item = &ItemRef> {
        self.refs.iter().filter(move |r| r.track_num == track_num)
    }

    /// Reference covering `beat` on `track_num`, if any
    pub fn ref_at(&self, track_num: u32, beat: f64) -> Option<&ItemRef> {
        self.refs.iter().find(|r| {
            r.track_num == track_num
                && round6(beat) >= round6(r.start_beat)
                && round6(beat) < round6(r.end_beat())
        })
    }

    /// Apply a track permutation: a ref on old track `i` moves to
    /// `permutation[i]`. The permutation must cover every track index
    /// in use.
    pub fn reorder_tracks(&mut self, permutation: &[u32]) {
        for r in self.refs.iter_mut() {
            let old = r.track_num as usize;
            assert!(
                old < permutation.len(),
                "permutation does not cover track {}",
                old
            );
            r.track_num = permutation[old];
        }
        self.resort_refs();
    }

    /// Markers in beat order
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Whether a marker of `kind` already sits at `beat`
    pub fn has_marker(&self, beat: f64, kind: MarkerKind) -> bool {
        self.markers
            .iter()
            .any(|m| m.kind() == kind && beats_eq(m.beat(), beat))
    }

    /// Place a marker.
    ///
    /// Tempo and text markers are unique per beat: when one of the same
    /// kind already sits there, the call is a no-op and returns false
    /// (callers check `has_marker` first and overwrite via delete).
    /// A region keeps at most one loop marker; a new one replaces it.
    pub fn set_marker(&mut self, marker: Marker) -> bool {
        match marker.kind() {
            MarkerKind::Loop => {
                self.markers.retain(|m| m.kind() != MarkerKind::Loop);
            }
            MarkerKind::Tempo | MarkerKind::Text => {
                if self.has_marker(marker.beat(), marker.kind()) {
                    return false;
                }
            }
        }
        let index = self
            .markers
            .partition_point(|m| beats_cmp(m.beat(), marker.beat()).is_le());
        self.markers.insert(index, marker);
        true
    }

    /// Remove the marker of `kind` at `beat`, if present
    pub fn delete_marker(&mut self, beat: f64, kind: MarkerKind) -> Option<Marker> {
        let index = self
            .markers
            .iter()
            .position(|m| m.kind() == kind && beats_eq(m.beat(), beat))?;
        Some(self.markers.remove(index))
    }

    pub fn loop_marker(&self) -> Option<&LoopMarker> {
        self.markers.iter().find_map(|m| match m {
            Marker::Loop(lm) => Some(lm),
            _ => None,
        })
    }

    pub fn text_marker_at(&self, beat: f64) -> Option<&TextMarker> {
        self.markers.iter().find_map(|m| match m {
            Marker::Text(tm) if beats_eq(tm.beat, beat) => Some(tm),
            _ => None,
        })
    }

    /// Tempo in effect at `beat`: the nearest preceding tempo marker,
    /// or the 128 BPM default when none precedes it
    pub fn get_tempo_at_pos(&self, beat: f64) -> f64 {
        self.tempo_marker_at_or_before(beat)
            .map(|m| m.tempo)
            .unwrap_or(DEFAULT_TEMPO)
    }

    /// Time signature in effect at `beat`, defaulting to 4/4
    pub fn get_tsig_at_pos(&self, beat: f64) -> (u8, u8) {
        self.tempo_marker_at_or_before(beat)
            .map(|m| (m.tsig_num, m.tsig_den))
            .unwrap_or(DEFAULT_TSIG)
    }

    fn tempo_marker_at_or_before(&self, beat: f64) -> Option<&TempoMarker> {
        self.markers
            .iter()
            .filter_map(|m| match m {
                Marker::Tempo(tm) if round6(tm.beat) <= round6(beat) => Some(tm),
                _ => None,
            })
            .last()
    }

    /// Shift every item reference and automation point starting at or
    /// after `beat` forward by `length` beats (used by region paste)
    pub fn insert_space(&mut self, beat: f64, length: f64) {
        assert!(length > 0.0, "inserted space must be > 0");
        for r in self.refs.iter_mut() {
            if round6(r.start_beat) >= round6(beat) {
                r.start_beat += length;
            }
        }
        self.curves.insert_space(beat, length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::automation::AutomationPoint;

    fn region() -> Region {
        Region::new(1, "region-1", 32.0)
    }

    #[test]
    fn test_refs_kept_in_track_start_order() {
        let mut r = region();
        r.add_item_ref(ItemRef::new(1, 4.0, 4.0, 10));
        r.add_item_ref(ItemRef::new(0, 8.0, 4.0, 11));
        r.add_item_ref(ItemRef::new(0, 0.0, 4.0, 12));

        let order: Vec<(u32, f64)> = r.refs().iter().map(|x| (x.track_num, x.start_beat)).collect();
        assert_eq!(order, vec![(0, 0.0), (0, 8.0), (1, 4.0)]);
    }

    #[test]
    fn test_remove_matches_identity() {
        let mut r = region();
        r.add_item_ref(ItemRef::new(0, 0.0, 4.0, 10));
        r.add_item_ref(ItemRef::new(0, 4.0, 4.0, 10));

        // Same uid, different start: only the exact ref goes away
        let target = ItemRef::new(0, 4.0, 4.0, 10);
        assert!(r.remove_item_ref(&target).is_some());
        assert_eq!(r.ref_count(), 1);
        assert_eq!(r.refs()[0].start_beat, 0.0);

        assert!(r.remove_item_ref(&target).is_none());
    }

    #[test]
    fn test_capacity_refuses_insert() {
        let mut r = region();
        for i in 0..MAX_REGION_ITEM_COUNT {
            assert!(r.add_item_ref(ItemRef::new(0, i as f64, 1.0, 10)));
        }
        assert!(r.at_capacity());
        assert!(!r.add_item_ref(ItemRef::new(0, 500.0, 1.0, 10)));
        assert_eq!(r.ref_count(), MAX_REGION_ITEM_COUNT);
    }

    #[test]
    fn test_reorder_tracks() {
        let mut r = region();
        r.add_item_ref(ItemRef::new(0, 0.0, 4.0, 10));
        r.add_item_ref(ItemRef::new(1, 0.0, 4.0, 11));
        r.add_item_ref(ItemRef::new(2, 0.0, 4.0, 12));

        // Swap tracks 0 and 2
        r.reorder_tracks(&[2, 1, 0]);

        let uid_of_track: Vec<(u32, u64)> =
            r.refs().iter().map(|x| (x.track_num, x.item_uid)).collect();
        assert_eq!(uid_of_track, vec![(0, 12), (1, 11), (2, 10)]);
    }

    #[test]
    fn test_marker_uniqueness_per_beat() {
        let mut r = region();
        let tempo = Marker::Tempo(TempoMarker {
            beat: 8.0,
            tempo: 140.0,
            tsig_num: 4,
            tsig_den: 4,
        });
        assert!(r.set_marker(tempo.clone()));
        assert!(r.has_marker(8.0, MarkerKind::Tempo));

        // Second tempo marker on the same beat is refused
        let other = Marker::Tempo(TempoMarker {
            beat: 8.0,
            tempo: 90.0,
            tsig_num: 3,
            tsig_den: 4,
        });
        assert!(!r.set_marker(other));
        assert_eq!(r.get_tempo_at_pos(8.0), 140.0);

        // A text marker on the same beat is a different kind, fine
        assert!(r.set_marker(Marker::Text(TextMarker {
            beat: 8.0,
            text: "chorus".to_string(),
        })));
    }

    #[test]
    fn test_loop_marker_replaced() {
        let mut r = region();
        r.set_marker(Marker::Loop(LoopMarker {
            start_beat: 0.0,
            beat: 8.0,
        }));
        r.set_marker(Marker::Loop(LoopMarker {
            start_beat: 4.0,
            beat: 16.0,
        }));

        assert_eq!(r.loop_marker().unwrap().start_beat, 4.0);
        assert_eq!(r.markers().len(), 1);
    }

    #[test]
    fn test_tempo_lookup_nearest_preceding() {
        let mut r = region();
        assert_eq!(r.get_tempo_at_pos(0.0), DEFAULT_TEMPO);
        assert_eq!(r.get_tsig_at_pos(0.0), (4, 4));

        r.set_marker(Marker::Tempo(TempoMarker {
            beat: 4.0,
            tempo: 100.0,
            tsig_num: 3,
            tsig_den: 4,
        }));
        r.set_marker(Marker::Tempo(TempoMarker {
            beat: 16.0,
            tempo: 150.0,
            tsig_num: 7,
            tsig_den: 8,
        }));

        assert_eq!(r.get_tempo_at_pos(0.0), DEFAULT_TEMPO);
        assert_eq!(r.get_tempo_at_pos(4.0), 100.0);
        assert_eq!(r.get_tempo_at_pos(15.9), 100.0);
        assert_eq!(r.get_tempo_at_pos(16.0), 150.0);
        assert_eq!(r.get_tsig_at_pos(20.0), (7, 8));
    }

    #[test]
    fn test_delete_marker() {
        let mut r = region();
        r.set_marker(Marker::Text(TextMarker {
            beat: 2.0,
            text: "verse".to_string(),
        }));
        assert_eq!(r.text_marker_at(2.0).unwrap().text, "verse");
        assert!(r.delete_marker(2.0, MarkerKind::Text).is_some());
        assert!(!r.has_marker(2.0, MarkerKind::Text));
        assert!(r.delete_marker(2.0, MarkerKind::Text).is_none());
    }

    #[test]
    fn test_insert_space_shifts_refs_and_points() {
        let mut r = region();
        r.add_item_ref(ItemRef::new(0, 0.0, 2.0, 10));
        r.add_item_ref(ItemRef::new(0, 4.0, 2.0, 11));
        r.curves
            .add_point(AutomationPoint::control(1.0, 0, 64.0, 7, 0));
        r.curves
            .add_point(AutomationPoint::control(4.0, 0, 64.0, 7, 0));

        r.insert_space(4.0, 8.0);

        assert_eq!(r.refs()[0].start_beat, 0.0);
        assert_eq!(r.refs()[1].start_beat, 12.0);
        let beats: Vec<f64> = r.curves.points(7, 0).iter().map(|p| p.beat).collect();
        assert_eq!(beats, vec![1.0, 12.0]);
    }

    #[test]
    fn test_ref_at_hit_test() {
        let mut r = region();
        r.add_item_ref(ItemRef::new(0, 4.0, 4.0, 10));

        assert!(r.ref_at(0, 4.0).is_some());
        assert!(r.ref_at(0, 7.9).is_some());
        assert!(r.ref_at(0, 8.0).is_none());
        assert!(r.ref_at(1, 5.0).is_none());
    }
}
