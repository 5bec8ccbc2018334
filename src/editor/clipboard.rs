// Editing clipboard - item references and automation ranges

use crate::model::automation::AutomationPoint;
use crate::region::ItemRef;
use crate::time::round6;

/// Holds one copied block, rebased so its earliest start is beat zero
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clipboard {
    refs: Vec<ItemRef>,
    points: Vec<AutomationPoint>,
    length_beats: f64,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty() && self.points.is_empty()
    }

    pub fn refs(&self) -> &[ItemRef] {
        &self.refs
    }

    pub fn points(&self) -> &[AutomationPoint] {
        &self.points
    }

    /// Beat span of the copied block
    pub fn length_beats(&self) -> f64 {
        self.length_beats
    }

    /// Store a block. `refs` are rebased against their earliest start;
    /// `points` must already be rebased (the curve engine copy helpers
    /// do that).
    pub fn set(&mut self, refs: Vec<ItemRef>, points: Vec<AutomationPoint>) {
        let base = refs
            .iter()
            .map(|r| r.start_beat)
            .fold(f64::INFINITY, f64::min);
        let base = if base.is_finite() { base } else { 0.0 };

        self.refs = refs
            .into_iter()
            .map(|mut r| {
                r.start_beat = round6(r.start_beat - base);
                r
            })
            .collect();
        self.points = points;

        let ref_end = self
            .refs
            .iter()
            .map(|r| r.end_beat())
            .fold(0.0_f64, f64::max);
        let point_end = self.points.iter().map(|p| p.beat).fold(0.0_f64, f64::max);
        self.length_beats = ref_end.max(point_end);
    }

    pub fn clear(&mut self) {
        self.refs.clear();
        self.points.clear();
        self.length_beats = 0.0;
    }
}
