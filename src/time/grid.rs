// Snap grids for the three editing surfaces
//
// The sequencer canvas, the piano roll and the audio item lane each keep
// their own grid state. Sharing a grid between surfaces caused snapping in
// one view to silently change behavior in another.

/// Divisor used when snapping is off: 1/16 of a beat cell. Fully
/// unconstrained drags are unusable at typical zoom levels, so "off"
/// still rounds to a fine fixed grid.
pub const SNAP_OFF_DIVISIONS: f64 = 16.0;

/// Round `x` to the nearest multiple of `grid`
pub fn quantize(x: f64, grid: f64) -> f64 {
    (x / grid).round() * grid
}

/// Sequencer snap subdivision choice (grid lines per beat)
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SnapSetting {
    Off,
    Subdivisions(u8),
}

impl SnapSetting {
    /// The selectable settings, in menu order
    pub const CHOICES: [SnapSetting; 8] = [
        SnapSetting::Off,
        SnapSetting::Subdivisions(1),
        SnapSetting::Subdivisions(2),
        SnapSetting::Subdivisions(3),
        SnapSetting::Subdivisions(4),
        SnapSetting::Subdivisions(8),
        SnapSetting::Subdivisions(16),
        SnapSetting::Subdivisions(32),
    ];

    /// Grid lines per beat for this setting
    pub fn divisions_per_beat(&self) -> f64 {
        match self {
            SnapSetting::Off => SNAP_OFF_DIVISIONS,
            SnapSetting::Subdivisions(n) => *n as f64,
        }
    }
}

impl Default for SnapSetting {
    fn default() -> Self {
        SnapSetting::Subdivisions(1)
    }
}

/// Snap grid for the sequencer (arrangement) canvas
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SequencerGrid {
    px_per_beat: f64,
    snap: SnapSetting,
}

impl SequencerGrid {
    pub fn new(px_per_beat: f64, snap: SnapSetting) -> Self {
        assert!(px_per_beat > 0.0, "px_per_beat must be > 0");
        Self { px_per_beat, snap }
    }

    pub fn snap(&self) -> SnapSetting {
        self.snap
    }

    pub fn set_snap(&mut self, snap: SnapSetting) {
        self.snap = snap;
    }

    pub fn set_px_per_beat(&mut self, px_per_beat: f64) {
        assert!(px_per_beat > 0.0, "px_per_beat must be > 0");
        self.px_per_beat = px_per_beat;
    }

    /// Pixel width of one grid cell
    pub fn grid_px(&self) -> f64 {
        self.px_per_beat / self.snap.divisions_per_beat()
    }

    /// Snap a canvas x to the nearest grid line
    pub fn quantize_px(&self, px: f64) -> f64 {
        quantize(px, self.grid_px())
    }

    /// Snap the start of a freshly created item.
    ///
    /// A result below one grid unit clamps up to exactly one grid unit,
    /// so a click near the canvas origin never produces a zero-width,
    /// zero-offset item.
    pub fn quantize_new_item_start(&self, px: f64) -> f64 {
        let snapped = self.quantize_px(px);
        if snapped < self.grid_px() {
            self.grid_px()
        } else {
            snapped
        }
    }
}

impl Default for SequencerGrid {
    fn default() -> Self {
        Self::new(24.0, SnapSetting::default())
    }
}

/// Snap grid for the piano roll.
///
/// The divisor is derived from the open item's total beat length so the
/// grid lines always divide the item evenly, whatever its length.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PianoRollGrid {
    item_length_beats: f64,
    canvas_width_px: f64,
    snap_enabled: bool,
}

impl PianoRollGrid {
    /// Grid lines per beat when snapping is on
    const DIVISIONS_PER_BEAT: f64 = 4.0;

    pub fn new(item_length_beats: f64, canvas_width_px: f64) -> Self {
        assert!(item_length_beats > 0.0, "item length must be > 0");
        assert!(canvas_width_px > 0.0, "canvas width must be > 0");
        Self {
            item_length_beats,
            canvas_width_px,
            snap_enabled: true,
        }
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.snap_enabled = enabled;
    }

    /// Re-derive the grid for a newly opened item
    pub fn set_item_length_beats(&mut self, length_beats: f64) {
        assert!(length_beats > 0.0, "item length must be > 0");
        self.item_length_beats = length_beats;
    }

    /// Total number of grid cells across the item
    pub fn division_count(&self) -> f64 {
        let per_beat = if self.snap_enabled {
            Self::DIVISIONS_PER_BEAT
        } else {
            SNAP_OFF_DIVISIONS
        };
        self.item_length_beats * per_beat
    }

    /// Pixel width of one grid cell
    pub fn grid_px(&self) -> f64 {
        self.canvas_width_px / self.division_count()
    }

    /// Snap a canvas x to the nearest grid line
    pub fn quantize_px(&self, px: f64) -> f64 {
        quantize(px, self.grid_px())
    }

    /// Beat position inside the item for a canvas x
    pub fn px_to_beat(&self, px: f64) -> f64 {
        (px / self.canvas_width_px * self.item_length_beats).clamp(0.0, self.item_length_beats)
    }

    /// Beat length of one grid cell
    pub fn cell_beats(&self) -> f64 {
        self.item_length_beats / self.division_count()
    }
}

/// Snap grid for the audio item lane.
///
/// The subdivision scales with horizontal zoom: zoomed out, a fine grid
/// would put lines a pixel apart, so the grid coarsens as px_per_beat
/// shrinks.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioItemGrid {
    px_per_beat: f64,
    snap_enabled: bool,
}

impl AudioItemGrid {
    pub fn new(px_per_beat: f64) -> Self {
        assert!(px_per_beat > 0.0, "px_per_beat must be > 0");
        Self {
            px_per_beat,
            snap_enabled: true,
        }
    }

    pub fn set_px_per_beat(&mut self, px_per_beat: f64) {
        assert!(px_per_beat > 0.0, "px_per_beat must be > 0");
        self.px_per_beat = px_per_beat;
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.snap_enabled = enabled;
    }

    /// Grid lines per beat at the current zoom
    pub fn divisions_per_beat(&self) -> f64 {
        if !self.snap_enabled {
            return SNAP_OFF_DIVISIONS;
        }
        if self.px_per_beat >= 96.0 {
            16.0
        } else if self.px_per_beat >= 48.0 {
            8.0
        } else if self.px_per_beat >= 24.0 {
            4.0
        } else {
            1.0
        }
    }

    /// Pixel width of one grid cell
    pub fn grid_px(&self) -> f64 {
        self.px_per_beat / self.divisions_per_beat()
    }

    /// Snap a canvas x to the nearest grid line
    pub fn quantize_px(&self, px: f64) -> f64 {
        quantize(px, self.grid_px())
    }
}

impl Default for AudioItemGrid {
    fn default() -> Self {
        Self::new(24.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_rounds_to_nearest() {
        assert_eq!(quantize(50.0, 24.0), 48.0);
        assert_eq!(quantize(60.0, 24.0), 72.0);
        assert_eq!(quantize(0.0, 24.0), 0.0);
    }

    #[test]
    fn test_quantize_idempotent() {
        for grid in [6.0, 8.0, 12.0, 24.0, 96.0] {
            for x in [-13.0, 0.0, 3.7, 50.0, 1234.56] {
                let q = quantize(x, grid);
                assert_eq!(quantize(q, grid), q, "grid {} x {}", grid, x);
            }
        }
    }

    #[test]
    fn test_sequencer_grid_px() {
        let grid = SequencerGrid::new(24.0, SnapSetting::Subdivisions(4));
        assert_eq!(grid.grid_px(), 6.0);

        let beat_grid = SequencerGrid::new(24.0, SnapSetting::Subdivisions(1));
        assert_eq!(beat_grid.grid_px(), 24.0);
        // Click at x=50 with beat snap lands on beat 2
        assert_eq!(beat_grid.quantize_px(50.0), 48.0);
    }

    #[test]
    fn test_snap_off_uses_fine_grid() {
        let grid = SequencerGrid::new(32.0, SnapSetting::Off);
        assert_eq!(grid.grid_px(), 2.0);
        assert_eq!(grid.quantize_px(13.4), 14.0);
    }

    #[test]
    fn test_new_item_start_clamps_up() {
        let grid = SequencerGrid::new(24.0, SnapSetting::Subdivisions(1));

        // A click just past the origin quantizes to 0, then clamps to one cell
        assert_eq!(grid.quantize_new_item_start(3.0), 24.0);
        // Past the first cell the ordinary snap applies
        assert_eq!(grid.quantize_new_item_start(50.0), 48.0);
    }

    #[test]
    fn test_piano_roll_grid_divides_item_evenly() {
        let grid = PianoRollGrid::new(4.0, 960.0);
        // 4 beats * 4 divisions = 16 cells across 960 px
        assert_eq!(grid.division_count(), 16.0);
        assert_eq!(grid.grid_px(), 60.0);

        let odd = PianoRollGrid::new(3.0, 960.0);
        assert_eq!(odd.division_count(), 12.0);
        assert_eq!(odd.grid_px(), 80.0);
    }

    #[test]
    fn test_piano_roll_px_beat_mapping() {
        let grid = PianoRollGrid::new(4.0, 960.0);
        assert_eq!(grid.px_to_beat(480.0), 2.0);
        assert_eq!(grid.px_to_beat(-10.0), 0.0);
        assert_eq!(grid.px_to_beat(5000.0), 4.0);
        assert_eq!(grid.cell_beats(), 0.25);
    }

    #[test]
    fn test_audio_grid_scales_with_zoom() {
        let mut grid = AudioItemGrid::new(120.0);
        assert_eq!(grid.divisions_per_beat(), 16.0);

        grid.set_px_per_beat(48.0);
        assert_eq!(grid.divisions_per_beat(), 8.0);

        grid.set_px_per_beat(24.0);
        assert_eq!(grid.divisions_per_beat(), 4.0);

        grid.set_px_per_beat(10.0);
        assert_eq!(grid.divisions_per_beat(), 1.0);
    }

    #[test]
    fn test_grids_do_not_share_state() {
        let mut seq = SequencerGrid::new(24.0, SnapSetting::Subdivisions(1));
        let piano = PianoRollGrid::new(4.0, 960.0);
        let audio = AudioItemGrid::new(24.0);

        seq.set_snap(SnapSetting::Off);
        // Changing the sequencer grid leaves the other two untouched
        assert_eq!(piano.division_count(), 16.0);
        assert_eq!(audio.divisions_per_beat(), 4.0);
    }
}
