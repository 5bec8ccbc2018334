// Automation curves - per-(plugin, port) sorted point lists

pub mod engine;
pub mod lfo;
pub mod transform;

pub use engine::{CurveEngine, CurveSegment};
pub use lfo::LfoParams;
pub use transform::{mul_from_slider, transform_value};
