// Batch add/multiply transform for automation values

use crate::model::automation::{CONTROL_MAX, CONTROL_MIN};

/// Derive the multiplier from the bipolar transform slider.
///
/// The slider center maps to unity gain. The step size is asymmetric:
/// each tick below zero removes 1% so -100 reaches exactly 0.0, while
/// each tick above zero adds 10%.
pub fn mul_from_slider(v: f64) -> f64 {
    if v < 0.0 { 1.0 + v * 0.01 } else { 1.0 + v * 0.1 }
}

/// Apply `old * mul + add`, clipped to the control range
pub fn transform_value(old: f64, mul: f64, add: f64) -> f64 {
    (old * mul + add).clamp(CONTROL_MIN, CONTROL_MAX)
}
