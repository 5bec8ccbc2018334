// Musical time - coordinate mapping and snap grids

pub mod coordinate;
pub mod grid;

pub use coordinate::{
    TimeCoordinate, beats_cmp, beats_eq, beats_to_seconds, round6, seconds_to_beats,
};
pub use grid::{AudioItemGrid, PianoRollGrid, SequencerGrid, SnapSetting};
