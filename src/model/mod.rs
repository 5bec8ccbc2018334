// Timeline data model - items, notes, automation points, audio placements, markers

pub mod audio_item;
pub mod automation;
pub mod item;
pub mod marker;
pub mod note;

pub use audio_item::{AudioItemPlacement, TimeStretchMode};
pub use automation::AutomationPoint;
pub use item::{Item, ItemStore};
pub use marker::{LoopMarker, Marker, MarkerKind, TempoMarker, TextMarker};
pub use note::Note;

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for items (shared by every region reference to the item)
pub type ItemUid = u64;

/// Unique identifier for entries in the sample pool
pub type SampleUid = u64;

/// Unique identifier for plugin instances targeted by automation
pub type PluginUid = u64;

/// Global uid generator (atomic for thread-safety)
static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// Generate a unique uid for items and placements
pub fn generate_uid() -> u64 {
    NEXT_UID.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uids_are_unique() {
        let a = generate_uid();
        let b = generate_uid();
        let c = generate_uid();
        assert!(a < b && b < c);
    }
}
