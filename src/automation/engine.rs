// Curve storage and range operations
//
// One sorted point list per (plugin_uid, port_num) pair. Every mutation
// preserves ascending beat order; readers may rely on it.

use crate::automation::transform::{mul_from_slider, transform_value};
use crate::model::automation::AutomationPoint;
use crate::model::PluginUid;
use crate::time::{beats_cmp, round6};
use std::collections::HashMap;

/// Key addressing one automation curve
pub type CurveKey = (PluginUid, u32);

/// Holds every automation curve of one region
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CurveEngine {
    curves: HashMap<CurveKey, Vec<AutomationPoint>>,
}

impl CurveEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points of one curve, sorted ascending by beat
    pub fn points(&self, plugin_uid: PluginUid, port_num: u32) -> &[AutomationPoint] {
        self.curves
            .get(&(plugin_uid, port_num))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Curves currently holding at least one point
    pub fn keys(&self) -> impl Iterator<Item = &CurveKey> {
        self.curves.keys()
    }

    pub fn total_point_count(&self) -> usize {
        self.curves.values().map(Vec::len).sum()
    }

    /// Insert a point, keeping the curve sorted. Points at an equal
    /// (rounded) beat insert after the existing ones so a redraw at the
    /// same beat wins.
    pub fn add_point(&mut self, point: AutomationPoint) {
        let curve = self
            .curves
            .entry((point.plugin_uid, point.port_num))
            .or_default();
        let index = curve.partition_point(|p| beats_cmp(p.beat, point.beat).is_le());
        curve.insert(index, point);
    }

    /// Remove the point matching `target` exactly
    pub fn remove_point(&mut self, target: &AutomationPoint) -> Option<AutomationPoint> {
        let key = (target.plugin_uid, target.port_num);
        let curve = self.curves.get_mut(&key)?;
        let index = curve.iter().position(|p| p == target)?;
        let removed = curve.remove(index);
        if curve.is_empty() {
            self.curves.remove(&key);
        }
        Some(removed)
    }

    /// Remove every point of one curve with `beat` in `[start, end)`
    pub fn clear_range(&mut self, plugin_uid: PluginUid, port_num: u32, start: f64, end: f64) {
        if let Some(curve) = self.curves.get_mut(&(plugin_uid, port_num)) {
            curve.retain(|p| {
                let b = round6(p.beat);
                b < round6(start) || b >= round6(end)
            });
            if curve.is_empty() {
                self.curves.remove(&(plugin_uid, port_num));
            }
        }
    }

    /// Clipboard copy of the given plugins' points in `[start, end)`,
    /// rebased so the range start becomes beat zero
    pub fn copy_range_by_plugins(
        &self,
        plugin_uids: &[PluginUid],
        start: f64,
        end: f64,
    ) -> Vec<AutomationPoint> {
        self.copy_range_filtered(start, end, |p| plugin_uids.contains(&p.plugin_uid))
    }

    /// Clipboard copy of every curve's points in `[start, end)`, rebased
    pub fn copy_range_all(&self, start: f64, end: f64) -> Vec<AutomationPoint> {
        self.copy_range_filtered(start, end, |_| true)
    }

    fn copy_range_filtered(
        &self,
        start: f64,
        end: f64,
        keep: impl Fn(&AutomationPoint) -> bool,
    ) -> Vec<AutomationPoint> {
        let mut out: Vec<AutomationPoint> = self
            .curves
            .values()
            .flatten()
            .filter(|p| {
                let b = round6(p.beat);
                b >= round6(start) && b < round6(end) && keep(p)
            })
            .map(|p| p.shifted(-start))
            .collect();
        out.sort_by(|a, b| beats_cmp(a.beat, b.beat));
        out
    }

    /// Paste clipboard points at `offset_beats`
    pub fn paste_points(&mut self, points: &[AutomationPoint], offset_beats: f64) {
        for p in points {
            self.add_point(p.shifted(offset_beats));
        }
    }

    /// Shift every point with `beat >= beat` forward by `length` beats
    /// (region space insertion)
    pub fn insert_space(&mut self, beat: f64, length: f64) {
        for curve in self.curves.values_mut() {
            for p in curve.iter_mut() {
                if round6(p.beat) >= round6(beat) {
                    p.beat += length;
                }
            }
        }
    }

    /// Apply the add/multiply tool to one curve over `[start, end]`.
    ///
    /// `slider` is the bipolar multiplier slider value; `add` is the
    /// additive offset. Returns the number of points transformed.
    pub fn transform_range(
        &mut self,
        plugin_uid: PluginUid,
        port_num: u32,
        start: f64,
        end: f64,
        slider: f64,
        add: f64,
    ) -> usize {
        let mul = mul_from_slider(slider);
        let mut count = 0;
        if let Some(curve) = self.curves.get_mut(&(plugin_uid, port_num)) {
            for p in curve.iter_mut() {
                let b = round6(p.beat);
                if b >= round6(start) && b <= round6(end) {
                    p.value = transform_value(p.value, mul, add);
                    count += 1;
                }
            }
        }
        count
    }

    /// Line segments to draw for one curve.
    ///
    /// Consecutive points always produce a segment; when the left point
    /// has `break_after` set the segment is disconnected, meaning the
    /// renderer moves to it instead of extending the previous path.
    pub fn segments(&self, plugin_uid: PluginUid, port_num: u32) -> Vec<CurveSegment> {
        let points = self.points(plugin_uid, port_num);
        points
            .windows(2)
            .map(|w| CurveSegment {
                from: w[0],
                to: w[1],
                connected: !w[0].break_after,
            })
            .collect()
    }
}

/// One rendered piece of a curve between two adjacent points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSegment {
    pub from: AutomationPoint,
    pub to: AutomationPoint,
    /// False when the previous point carried `break_after`: the renderer
    /// starts a new path at `from` rather than joining
    pub connected: bool,
}
