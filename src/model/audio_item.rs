// Audio placement on an audio lane - trim, fades, routing, time-stretch state

use crate::model::SampleUid;
use crate::time::seconds_to_beats;

/// Sample trim points and fades are promille values (thousandths of the
/// original sample length)
pub const PROMILLE_MAX: f64 = 1000.0;

/// Minimum promille distance kept between sample_start and sample_end
pub const TRIM_MIN_GAP: f64 = 1.0;

/// How a placement's audible length relates to the source sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum TimeStretchMode {
    None = 0,
    PitchOnly = 1,
    TimeOnly = 2,
    Rubberband = 3,
    RubberbandFormants = 4,
    Sbsms = 5,
    Paulstretch = 6,
}

impl TimeStretchMode {
    /// Whether this mode needs an out-of-process render before playback.
    /// PitchOnly and TimeOnly are applied in real time by the engine.
    pub fn requires_render(&self) -> bool {
        matches!(
            self,
            TimeStretchMode::Rubberband
                | TimeStretchMode::RubberbandFormants
                | TimeStretchMode::Sbsms
                | TimeStretchMode::Paulstretch
        )
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(TimeStretchMode::None),
            1 => Some(TimeStretchMode::PitchOnly),
            2 => Some(TimeStretchMode::TimeOnly),
            3 => Some(TimeStretchMode::Rubberband),
            4 => Some(TimeStretchMode::RubberbandFormants),
            5 => Some(TimeStretchMode::Sbsms),
            6 => Some(TimeStretchMode::Paulstretch),
            _ => None,
        }
    }
}

impl Default for TimeStretchMode {
    fn default() -> Self {
        TimeStretchMode::None
    }
}

/// One audio sample placed on an audio lane.
///
/// Trim points (`sample_start`/`sample_end`) and fades are stored as
/// clamped promille values; spacing rules between fade handles are
/// enforced by the editing layer, not here.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioItemPlacement {
    /// Identity of this placement (stable across edits)
    pub placement_id: u64,
    /// Sample pool uid of the audio this placement plays
    pub uid: SampleUid,
    /// Start position in beats
    pub start_beat: f64,
    /// Offset into the (trimmed) sample, in beats
    pub start_offset: f64,
    /// Audible length in beats
    pub length_beats: f64,
    /// Trim start, promille of the original sample
    pub sample_start: f64,
    /// Trim end, promille of the original sample
    pub sample_end: f64,
    /// Fade-in end position, promille
    pub fade_in: f64,
    /// Fade-out start position, promille
    pub fade_out: f64,
    /// Volume in dB
    pub vol: f64,
    /// Output track index
    pub output_track: u32,
    /// First aux send target track, if routed
    pub send1: Option<u32>,
    /// Second aux send target track, if routed
    pub send2: Option<u32>,
    /// Sidechain flags for the main output and the two sends
    pub sidechain: [bool; 3],
    pub time_stretch_mode: TimeStretchMode,
    /// Pitch shift in semitones at the placement start
    pub pitch_shift: f64,
    /// Pitch shift at the placement end (ramped modes)
    pub pitch_shift_end: f64,
    /// Stretch ratio at the placement start (1.0 = unchanged)
    pub timestretch_amt: f64,
    /// Stretch ratio at the placement end (ramped modes)
    pub timestretch_amt_end: f64,
    /// Rubberband crispness setting
    pub crispness: u8,
    pub reversed: bool,
}

impl AudioItemPlacement {
    /// Creates a placement playing the whole of `uid` from `start_beat`
    pub fn new(placement_id: u64, uid: SampleUid, start_beat: f64, length_beats: f64) -> Self {
        assert!(start_beat >= 0.0, "placement start must be >= 0");
        assert!(length_beats > 0.0, "placement length must be > 0");
        Self {
            placement_id,
            uid,
            start_beat,
            start_offset: 0.0,
            length_beats,
            sample_start: 0.0,
            sample_end: PROMILLE_MAX,
            fade_in: 0.0,
            fade_out: PROMILLE_MAX,
            vol: 0.0,
            output_track: 0,
            send1: None,
            send2: None,
            sidechain: [false; 3],
            time_stretch_mode: TimeStretchMode::None,
            pitch_shift: 0.0,
            pitch_shift_end: 0.0,
            timestretch_amt: 1.0,
            timestretch_amt_end: 1.0,
            crispness: 5,
            reversed: false,
        }
    }

    /// End position in beats
    pub fn end_beat(&self) -> f64 {
        self.start_beat + self.length_beats
    }

    /// Trim start, clamped so `sample_start < sample_end` holds
    pub fn set_sample_start(&mut self, promille: f64) {
        self.sample_start = promille.clamp(0.0, self.sample_end - TRIM_MIN_GAP);
    }

    /// Trim end, clamped so `sample_start < sample_end` holds
    pub fn set_sample_end(&mut self, promille: f64) {
        self.sample_end = promille.clamp(self.sample_start + TRIM_MIN_GAP, PROMILLE_MAX);
    }

    /// Store a fade-in position, clamped to the promille range
    pub fn set_fade_in(&mut self, promille: f64) {
        self.fade_in = promille.clamp(0.0, PROMILLE_MAX);
    }

    /// Store a fade-out position, clamped to the promille range
    pub fn set_fade_out(&mut self, promille: f64) {
        self.fade_out = promille.clamp(0.0, PROMILLE_MAX);
    }

    /// Clip this placement at the region boundary.
    ///
    /// `sample_length_seconds` is the untrimmed length of the source
    /// sample. When the placement's end would cross `region_length`
    /// beats, the visible width is truncated and `sample_end` is
    /// recomputed from the pixel geometry, clamped to `[1, 1000]`.
    /// Returns whether truncation occurred.
    pub fn clip_at_region_end(
        &mut self,
        region_length: f64,
        tempo: f64,
        sample_length_seconds: f64,
        px_per_beat: f64,
    ) -> bool {
        let original_length_beats = seconds_to_beats(tempo, sample_length_seconds);
        let original_length_px = original_length_beats * px_per_beat;
        if original_length_px <= 0.0 || self.start_beat >= region_length {
            return false;
        }

        let sample_start_px = self.sample_start / PROMILLE_MAX * original_length_px;
        let trimmed_beats =
            (self.sample_end - self.sample_start) / PROMILLE_MAX * original_length_beats;
        let end_beat = self.start_beat + trimmed_beats;

        if end_beat <= region_length {
            self.length_beats = trimmed_beats;
            return false;
        }

        let visible_beats = region_length - self.start_beat;
        let visible_px = visible_beats * px_per_beat;
        self.length_beats = visible_beats;
        self.sample_end = ((visible_px + sample_start_px) / original_length_px * PROMILLE_MAX)
            .clamp(TRIM_MIN_GAP, PROMILLE_MAX);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::beats_eq;

    #[test]
    fn test_stretch_mode_render_requirement() {
        assert!(!TimeStretchMode::None.requires_render());
        assert!(!TimeStretchMode::PitchOnly.requires_render());
        assert!(!TimeStretchMode::TimeOnly.requires_render());
        assert!(TimeStretchMode::Rubberband.requires_render());
        assert!(TimeStretchMode::RubberbandFormants.requires_render());
        assert!(TimeStretchMode::Sbsms.requires_render());
        assert!(TimeStretchMode::Paulstretch.requires_render());
    }

    #[test]
    fn test_stretch_mode_from_index() {
        assert_eq!(TimeStretchMode::from_index(3), Some(TimeStretchMode::Rubberband));
        assert_eq!(TimeStretchMode::from_index(7), None);
    }

    #[test]
    fn test_trim_clamps_keep_ordering() {
        let mut p = AudioItemPlacement::new(1, 10, 0.0, 4.0);
        p.set_sample_end(500.0);
        p.set_sample_start(600.0);
        assert!(p.sample_start < p.sample_end);
        assert_eq!(p.sample_start, 499.0);

        p.set_sample_end(-10.0);
        assert_eq!(p.sample_end, p.sample_start + TRIM_MIN_GAP);
    }

    #[test]
    fn test_clip_inside_region_is_noop() {
        let mut p = AudioItemPlacement::new(1, 10, 0.0, 4.0);
        // 2 s sample at 120 BPM is 4 beats; fits a 32-beat region
        let clipped = p.clip_at_region_end(32.0, 120.0, 2.0, 24.0);
        assert!(!clipped);
        assert!(beats_eq(p.length_beats, 4.0));
        assert_eq!(p.sample_end, PROMILLE_MAX);
    }

    #[test]
    fn test_clip_truncates_at_region_end() {
        // 60 s sample at 120 BPM is 120 beats; placed at beat 24 of a
        // 32-beat region only 8 beats stay visible
        let mut p = AudioItemPlacement::new(1, 10, 24.0, 120.0);
        let clipped = p.clip_at_region_end(32.0, 120.0, 60.0, 24.0);

        assert!(clipped);
        assert!(beats_eq(p.length_beats, 8.0));
        // Visible width in px must be (region_length - start) * px_per_beat
        assert_eq!(p.length_beats * 24.0, (32.0 - 24.0) * 24.0);
        // 8 of 120 beats visible from a zero trim start
        assert!((p.sample_end - 8.0 / 120.0 * 1000.0).abs() < 1e-9);
        assert!(p.sample_end >= 1.0 && p.sample_end <= 1000.0);
    }

    #[test]
    fn test_clip_respects_trim_start() {
        // Same 120-beat sample but trimmed to start at its midpoint
        let mut p = AudioItemPlacement::new(1, 10, 24.0, 60.0);
        p.set_sample_start(500.0);
        let clipped = p.clip_at_region_end(32.0, 120.0, 60.0, 24.0);

        assert!(clipped);
        assert!(beats_eq(p.length_beats, 8.0));
        // 500 promille of trim start plus 8/120 of the original length
        let expected = (8.0 * 24.0 + 0.5 * 120.0 * 24.0) / (120.0 * 24.0) * 1000.0;
        assert!((p.sample_end - expected).abs() < 1e-9);
    }
}
