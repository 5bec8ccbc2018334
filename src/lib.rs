// arranger - timeline and automation editing engine

pub mod audio;
pub mod automation;
pub mod editor;
pub mod engine;
pub mod messaging;
pub mod model;
pub mod persist;
pub mod region;
pub mod time;

// Re-export commonly used types for convenience
pub use audio::{AudioItemTimeline, SamplePool, StretchBackend, ThreadedStretchBackend};
pub use automation::{CurveEngine, LfoParams};
pub use editor::{EditorConfig, EditorMode, EditorSession, PointerEvent, ScenePos};
pub use engine::{EngineBridge, EngineMessage};
pub use messaging::{create_engine_channel, create_notification_channel, Notification};
pub use model::{AudioItemPlacement, AutomationPoint, Item, ItemStore, Marker, Note};
pub use persist::{ProjectState, ProjectStore};
pub use region::{ItemRef, Region};
pub use time::{SequencerGrid, SnapSetting, TimeCoordinate};
