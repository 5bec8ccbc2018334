// Audio lane model - sample pool, placements, asynchronous time-stretch

pub mod pool;
pub mod stretch;
pub mod timeline;

pub use pool::{SampleEntry, SamplePool};
pub use stretch::{RenderedSample, StretchBackend, StretchJob, StretchSpec, ThreadedStretchBackend};
pub use timeline::{
    AudioItemTimeline, FADE_HANDLE_MIN_GAP, HandleKind, MAX_AUDIO_ITEM_COUNT, StretchCoordinator,
};
