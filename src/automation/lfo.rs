// LFO point-curve synthesis
//
// Writes a sine sweep into a beat range as discrete automation points,
// one per 1/16 beat. Output is bit-for-bit deterministic for identical
// inputs: plain f64 arithmetic, no time or randomness involved.

use crate::model::automation::{AutomationPoint, CONTROL_MAX, CONTROL_MIN};
use crate::model::PluginUid;
use std::f64::consts::{PI, TAU};

/// Beat distance between generated points
pub const LFO_STEP_BEATS: f64 = 1.0 / 16.0;

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Parameters of one LFO sweep.
///
/// `freq_start`/`freq_end` are the radians the phase advances per
/// generated step; center, amplitude and frequency all interpolate
/// linearly from their start to their end value across the range.
/// `fade_in`/`fade_out` are normalized positions in `[0, 1]`; amplitude
/// ramps up before `fade_in` and down after `fade_out`. `fade_in = 0`
/// and `fade_out = 1` disable the envelope.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LfoParams {
    /// Initial phase as a percentage of a half turn: phase = percent * pi
    pub phase_percent: f64,
    pub freq_start: f64,
    pub freq_end: f64,
    pub amp_start: f64,
    pub amp_end: f64,
    pub center_start: f64,
    pub center_end: f64,
    pub fade_in: f64,
    pub fade_out: f64,
}

impl Default for LfoParams {
    fn default() -> Self {
        Self {
            phase_percent: 0.0,
            freq_start: TAU / 16.0,
            freq_end: TAU / 16.0,
            amp_start: 32.0,
            amp_end: 32.0,
            center_start: 64.0,
            center_end: 64.0,
            fade_in: 0.0,
            fade_out: 1.0,
        }
    }
}

/// Generate LFO points for `beat` in `[start_beat, end_beat]`.
///
/// Existing points in the range are the caller's concern (the editor
/// clears the range first so a re-run replaces the previous sweep).
pub fn generate(
    params: &LfoParams,
    start_beat: f64,
    end_beat: f64,
    plugin_uid: PluginUid,
    plugin_index: u32,
    port_num: u32,
) -> Vec<AutomationPoint> {
    assert!(end_beat > start_beat, "LFO range must be non-empty");

    let range = end_beat - start_beat;
    let steps = (range / LFO_STEP_BEATS).round() as usize;
    let mut points = Vec::with_capacity(steps + 1);
    let mut phase = params.phase_percent * PI;

    for i in 0..=steps {
        let beat = start_beat + i as f64 * LFO_STEP_BEATS;
        if beat > end_beat {
            break;
        }
        let pos = (beat - start_beat) / range;

        let center = lerp(params.center_start, params.center_end, pos);
        let mut amp = lerp(params.amp_start, params.amp_end, pos);
        if params.fade_in > 0.0 && pos < params.fade_in {
            amp *= pos / params.fade_in;
        }
        if params.fade_out < 1.0 && pos > params.fade_out {
            amp *= 1.0 - (pos - params.fade_out) / (1.0 - params.fade_out);
        }

        let value = (phase.sin() * amp + center).clamp(CONTROL_MIN, CONTROL_MAX);
        points.push(AutomationPoint {
            beat,
            port_num,
            value,
            plugin_uid,
            plugin_index,
            break_after: false,
        });

        phase = (phase + lerp(params.freq_start, params.freq_end, pos)) % TAU;
    }

    points
}
