// Automation point - a timed parameter value bound to a (plugin, port) pair

use crate::model::PluginUid;

/// Control values live on the 0-127 MIDI scale
pub const CONTROL_MIN: f64 = 0.0;
pub const CONTROL_MAX: f64 = 127.0;

/// Pitchbend values are bipolar
pub const PITCHBEND_MIN: f64 = -1.0;
pub const PITCHBEND_MAX: f64 = 1.0;

/// A timed parameter value for one plugin port.
///
/// Points for a given (plugin_uid, port_num) pair are always kept sorted
/// ascending by `beat` (see `automation::CurveEngine`).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AutomationPoint {
    /// Position in beats
    pub beat: f64,
    /// Port number on the target plugin
    pub port_num: u32,
    /// Value: 0-127 for control ports, -1..1 for pitchbend
    pub value: f64,
    /// Uid of the plugin instance this point targets
    pub plugin_uid: PluginUid,
    /// Index of the plugin in its track's chain
    pub plugin_index: u32,
    /// When set, the rendered curve does not connect this point to the
    /// next one. Display-only; storage order is unaffected.
    pub break_after: bool,
}

impl AutomationPoint {
    /// Creates a new control point, clamping the value to 0-127
    pub fn control(
        beat: f64,
        port_num: u32,
        value: f64,
        plugin_uid: PluginUid,
        plugin_index: u32,
    ) -> Self {
        Self {
            beat,
            port_num,
            value: value.clamp(CONTROL_MIN, CONTROL_MAX),
            plugin_uid,
            plugin_index,
            break_after: false,
        }
    }

    /// Creates a new pitchbend point, clamping the value to -1..1
    pub fn pitchbend(beat: f64, value: f64, plugin_uid: PluginUid, plugin_index: u32) -> Self {
        Self {
            beat,
            port_num: 0,
            value: value.clamp(PITCHBEND_MIN, PITCHBEND_MAX),
            plugin_uid,
            plugin_index,
            break_after: false,
        }
    }

    /// Copy of this point shifted along the beat axis
    pub fn shifted(&self, offset_beats: f64) -> Self {
        Self {
            beat: self.beat + offset_beats,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_clamps() {
        let p = AutomationPoint::control(0.0, 3, 200.0, 7, 0);
        assert_eq!(p.value, 127.0);
        let p = AutomationPoint::control(0.0, 3, -5.0, 7, 0);
        assert_eq!(p.value, 0.0);
    }

    #[test]
    fn test_pitchbend_clamps() {
        let p = AutomationPoint::pitchbend(0.0, 2.5, 7, 0);
        assert_eq!(p.value, 1.0);
        let p = AutomationPoint::pitchbend(0.0, -2.5, 7, 0);
        assert_eq!(p.value, -1.0);
    }

    #[test]
    fn test_shifted() {
        let p = AutomationPoint::control(2.0, 1, 64.0, 7, 0);
        let q = p.shifted(-2.0);
        assert_eq!(q.beat, 0.0);
        assert_eq!(q.value, 64.0);
        assert_eq!(q.port_num, 1);
    }
}
