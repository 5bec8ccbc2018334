// Note events inside an item
// Notes are stored in beats; sample conversion happens at the engine boundary

use crate::time::{beats_cmp, beats_eq};

/// A note event inside an item
///
/// Notes are kept sorted by `start_beat`. After any edit the overlap
/// repair pass runs so that no two notes of the same pitch overlap.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Note {
    /// Start position in beats, relative to the item start
    pub start_beat: f64,
    /// Length in beats
    pub length_beats: f64,
    /// MIDI note number (0-127, where 60 = C4)
    pub note_num: u8,
    /// MIDI velocity (1-127)
    pub velocity: u8,
}

impl Note {
    /// Creates a new note
    pub fn new(start_beat: f64, length_beats: f64, note_num: u8, velocity: u8) -> Self {
        assert!(start_beat >= 0.0, "note start must be >= 0");
        assert!(length_beats > 0.0, "note length must be > 0");
        assert!(note_num <= 127, "MIDI note number must be 0-127");
        assert!(
            (1..=127).contains(&velocity),
            "MIDI velocity must be 1-127"
        );
        Self {
            start_beat,
            length_beats,
            note_num,
            velocity,
        }
    }

    /// End position in beats
    pub fn end_beat(&self) -> f64 {
        self.start_beat + self.length_beats
    }

    /// Whether this note overlaps another in the beat domain
    pub fn overlaps(&self, other: &Note) -> bool {
        self.start_beat < other.end_beat() && other.start_beat < self.end_beat()
    }
}

/// Sort notes by start beat and truncate same-pitch overlaps.
///
/// Invariant re-applied after every note edit: for each pitch, a note may
/// not reach past the start of the next note of that pitch. Notes whose
/// length would collapse to zero are removed.
pub fn repair_overlaps(notes: &mut Vec<Note>) {
    notes.sort_by(|a, b| {
        beats_cmp(a.start_beat, b.start_beat).then_with(|| a.note_num.cmp(&b.note_num))
    });

    let mut removed = Vec::new();
    for i in 0..notes.len() {
        let (head, tail) = notes.split_at_mut(i + 1);
        let cur = &mut head[i];
        for next in tail.iter() {
            if next.note_num != cur.note_num {
                continue;
            }
            if beats_eq(next.start_beat, cur.start_beat) {
                // Identical start: the later entry wins, drop this one
                removed.push(i);
                break;
            }
            if next.start_beat < cur.end_beat() {
                cur.length_beats = next.start_beat - cur.start_beat;
            }
            break;
        }
    }
    for i in removed.into_iter().rev() {
        notes.remove(i);
    }
    notes.retain(|n| n.length_beats > 0.0);
}
