// Per-lane audio arrangement - placement collection, boundary clipping,
// drag handles, stretch coordination

use crate::audio::stretch::{StretchBackend, StretchJob, StretchSpec};
use crate::model::audio_item::{AudioItemPlacement, PROMILLE_MAX, TRIM_MIN_GAP};
use crate::model::SampleUid;
use crate::time::{beats_cmp, round6};
use std::collections::{BTreeMap, HashMap};

/// Minimum promille spacing kept between the fade handles when a split
/// rebuilds them. Carried over from the original editor as-is.
pub const FADE_HANDLE_MIN_GAP: f64 = 90.0;

/// Maximum number of placements one timeline may hold
pub const MAX_AUDIO_ITEM_COUNT: usize = 256;

/// The draggable handles of a placement, addressed by kind instead of
/// by back-references between marker objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Start,
    End,
    FadeIn,
    FadeOut,
}

/// Audio placements of one region, grouped by lane
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioItemTimeline {
    lanes: BTreeMap<u32, Vec<AudioItemPlacement>>,
}

impl AudioItemTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placements(&self, lane: u32) -> &[AudioItemPlacement] {
        self.lanes.get(&lane).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn lanes(&self) -> impl Iterator<Item = (&u32, &Vec<AudioItemPlacement>)> {
        self.lanes.iter()
    }

    pub fn placement_count(&self) -> usize {
        self.lanes.values().map(Vec::len).sum()
    }

    pub fn at_capacity(&self) -> bool {
        self.placement_count() >= MAX_AUDIO_ITEM_COUNT
    }

    /// Insert a placement on `lane`, keeping start order.
    /// Returns false without inserting when the timeline is full.
    pub fn add_placement(&mut self, lane: u32, placement: AudioItemPlacement) -> bool {
        if self.at_capacity() {
            return false;
        }
        let placements = self.lanes.entry(lane).or_default();
        let index = placements
            .partition_point(|p| beats_cmp(p.start_beat, placement.start_beat).is_le());
        placements.insert(index, placement);
        true
    }

    pub fn remove_placement(&mut self, lane: u32, placement_id: u64) -> Option<AudioItemPlacement> {
        let placements = self.lanes.get_mut(&lane)?;
        let index = placements.iter().position(|p| p.placement_id == placement_id)?;
        let removed = placements.remove(index);
        if placements.is_empty() {
            self.lanes.remove(&lane);
        }
        Some(removed)
    }

    pub fn get(&self, lane: u32, placement_id: u64) -> Option<&AudioItemPlacement> {
        self.lanes
            .get(&lane)?
            .iter()
            .find(|p| p.placement_id == placement_id)
    }

    pub fn get_mut(&mut self, lane: u32, placement_id: u64) -> Option<&mut AudioItemPlacement> {
        self.lanes
            .get_mut(&lane)?
            .iter_mut()
            .find(|p| p.placement_id == placement_id)
    }

    /// Placement covering `beat` on `lane`, if any
    pub fn placement_at(&self, lane: u32, beat: f64) -> Option<&AudioItemPlacement> {
        self.placements(lane).iter().find(|p| {
            round6(beat) >= round6(p.start_beat) && round6(beat) < round6(p.end_beat())
        })
    }

    /// Drag one handle of a placement to `promille`.
    ///
    /// Trim handles keep `sample_start < sample_end`; fade handles keep
    /// `fade_in` at least `FADE_HANDLE_MIN_GAP` below `fade_out`.
    pub fn drag_handle(
        &mut self,
        lane: u32,
        placement_id: u64,
        handle: HandleKind,
        promille: f64,
    ) -> bool {
        let Some(p) = self.get_mut(lane, placement_id) else {
            return false;
        };
        match handle {
            HandleKind::Start => p.set_sample_start(promille),
            HandleKind::End => p.set_sample_end(promille),
            HandleKind::FadeIn => {
                p.set_fade_in(promille.min(p.fade_out - FADE_HANDLE_MIN_GAP));
            }
            HandleKind::FadeOut => {
                p.set_fade_out(promille.max(p.fade_in + FADE_HANDLE_MIN_GAP));
            }
        }
        true
    }

    /// Split a placement at `beat`, producing two placements that share
    /// the source sample. Fades are rebuilt on both sides with the
    /// minimum handle gap preserved.
    pub fn split_placement(
        &mut self,
        lane: u32,
        placement_id: u64,
        beat: f64,
        new_placement_id: u64,
    ) -> Option<u64> {
        let p = self.get(lane, placement_id)?;
        if round6(beat) <= round6(p.start_beat) || round6(beat) >= round6(p.end_beat()) {
            return None;
        }

        let fraction = (beat - p.start_beat) / p.length_beats;
        let mid = p.sample_start + (p.sample_end - p.sample_start) * fraction;
        let original_end = p.end_beat();

        let mut right = p.clone();
        let left = self.get_mut(lane, placement_id)?;

        left.length_beats = beat - left.start_beat;
        left.sample_end = mid.clamp(left.sample_start + TRIM_MIN_GAP, PROMILLE_MAX);
        left.set_fade_out(PROMILLE_MAX);
        left.set_fade_in(left.fade_in.min(PROMILLE_MAX - FADE_HANDLE_MIN_GAP));

        right.placement_id = new_placement_id;
        right.start_beat = beat;
        right.length_beats = original_end - beat;
        right.sample_start = mid.clamp(0.0, right.sample_end - TRIM_MIN_GAP);
        right.set_fade_in(0.0);
        right.set_fade_out(right.fade_out.max(FADE_HANDLE_MIN_GAP));

        self.add_placement(lane, right);
        Some(new_placement_id)
    }

    /// Clip every placement against the region boundary.
    ///
    /// `tempo_at` supplies the local tempo at a beat, `seconds_of` the
    /// untrimmed sample length; placements with unknown samples are left
    /// alone. Returns how many placements were truncated.
    pub fn clip_all_at_region_end(
        &mut self,
        region_length: f64,
        px_per_beat: f64,
        tempo_at: impl Fn(f64) -> f64,
        seconds_of: impl Fn(SampleUid) -> Option<f64>,
    ) -> usize {
        let mut clipped = 0;
        for placements in self.lanes.values_mut() {
            for p in placements.iter_mut() {
                let Some(seconds) = seconds_of(p.uid) else {
                    log::warn!("placement {} references unknown sample {}", p.placement_id, p.uid);
                    continue;
                };
                let tempo = tempo_at(p.start_beat);
                if p.clip_at_region_end(region_length, tempo, seconds, px_per_beat) {
                    clipped += 1;
                }
            }
        }
        clipped
    }
}

/// Tracks the outstanding stretch render per placement.
///
/// Not part of the journaled project state: jobs are transient and die
/// with the session. At most one job per placement is live; a new
/// request cancels and replaces the old handle.
#[derive(Default)]
pub struct StretchCoordinator {
    outstanding: HashMap<u64, StretchJob>,
}

impl StretchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_outstanding(&self, placement_id: u64) -> bool {
        self.outstanding.contains_key(&placement_id)
    }

    /// Request a render for `placement`.
    ///
    /// Realtime modes need no render and return false. A request that
    /// the backend refuses also returns false; nothing is outstanding
    /// afterwards either way.
    pub fn request(
        &mut self,
        backend: &mut dyn StretchBackend,
        placement: &AudioItemPlacement,
    ) -> bool {
        if !placement.time_stretch_mode.requires_render() {
            return false;
        }
        let spec = StretchSpec {
            sample_uid: placement.uid,
            mode: placement.time_stretch_mode,
            pitch_shift: placement.pitch_shift,
            pitch_shift_end: placement.pitch_shift_end,
            timestretch_amt: placement.timestretch_amt,
            timestretch_amt_end: placement.timestretch_amt_end,
            crispness: placement.crispness,
        };
        if let Some(old) = self.outstanding.remove(&placement.placement_id) {
            old.cancel();
        }
        match backend.request(&spec) {
            Some(job) => {
                self.outstanding.insert(placement.placement_id, job);
                true
            }
            None => {
                log::warn!(
                    "stretch render refused for placement {}",
                    placement.placement_id
                );
                false
            }
        }
    }

    /// Join the outstanding render for `placement` and substitute the
    /// rendered uid. Returns the new uid, or `None` when no job was
    /// outstanding or the render failed/was cancelled.
    pub fn finish(&mut self, placement: &mut AudioItemPlacement) -> Option<SampleUid> {
        let job = self.outstanding.remove(&placement.placement_id)?;
        let uid = job.wait()?;
        placement.uid = uid;
        Some(uid)
    }

    /// Cancel the outstanding render for `placement_id`, if any
    pub fn cancel(&mut self, placement_id: u64) {
        if let Some(job) = self.outstanding.remove(&placement_id) {
            job.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::stretch::ThreadedStretchBackend;
    use crate::model::audio_item::TimeStretchMode;
    use crate::model::generate_uid;
    use crate::time::beats_eq;

    fn placement(start: f64, length: f64) -> AudioItemPlacement {
        AudioItemPlacement::new(generate_uid(), 42, start, length)
    }

    #[test]
    fn test_lane_order() {
        let mut tl = AudioItemTimeline::new();
        let a = placement(4.0, 2.0);
        let b = placement(0.0, 2.0);
        tl.add_placement(0, a.clone());
        tl.add_placement(0, b.clone());
        tl.add_placement(1, placement(2.0, 2.0));

        assert_eq!(tl.placements(0).len(), 2);
        assert_eq!(tl.placements(0)[0].placement_id, b.placement_id);
        assert_eq!(tl.placement_count(), 3);
    }

    #[test]
    fn test_remove_placement() {
        let mut tl = AudioItemTimeline::new();
        let p = placement(0.0, 2.0);
        let id = p.placement_id;
        tl.add_placement(3, p);

        assert!(tl.remove_placement(3, id).is_some());
        assert!(tl.remove_placement(3, id).is_none());
        assert_eq!(tl.placement_count(), 0);
    }

    #[test]
    fn test_fade_handles_keep_gap() {
        let mut tl = AudioItemTimeline::new();
        let p = placement(0.0, 4.0);
        let id = p.placement_id;
        tl.add_placement(0, p);

        tl.drag_handle(0, id, HandleKind::FadeOut, 500.0);
        // Pushing the fade-in past the fade-out stops one gap short
        tl.drag_handle(0, id, HandleKind::FadeIn, 900.0);

        let p = tl.get(0, id).unwrap();
        assert_eq!(p.fade_out, 500.0);
        assert_eq!(p.fade_in, 500.0 - FADE_HANDLE_MIN_GAP);
        assert!(p.fade_in < p.fade_out);
    }

    #[test]
    fn test_split_placement_shares_sample() {
        let mut tl = AudioItemTimeline::new();
        let p = placement(2.0, 4.0);
        let id = p.placement_id;
        tl.add_placement(0, p);

        let new_id = generate_uid();
        tl.split_placement(0, id, 4.0, new_id).expect("split");

        let left = tl.get(0, id).unwrap();
        let right = tl.get(0, new_id).unwrap();

        assert!(beats_eq(left.length_beats, 2.0));
        assert!(beats_eq(right.start_beat, 4.0));
        assert!(beats_eq(right.length_beats, 2.0));
        assert_eq!(left.uid, right.uid);
        // Trim points meet at the split
        assert!((left.sample_end - 500.0).abs() < 1e-9);
        assert!((right.sample_start - 500.0).abs() < 1e-9);
        // Rebuilt fades respect the handle gap
        assert_eq!(left.fade_out, PROMILLE_MAX);
        assert_eq!(right.fade_in, 0.0);
        assert!(right.fade_out >= FADE_HANDLE_MIN_GAP);
    }

    #[test]
    fn test_split_outside_bounds_refused() {
        let mut tl = AudioItemTimeline::new();
        let p = placement(2.0, 4.0);
        let id = p.placement_id;
        tl.add_placement(0, p);

        assert!(tl.split_placement(0, id, 2.0, generate_uid()).is_none());
        assert!(tl.split_placement(0, id, 6.0, generate_uid()).is_none());
        assert_eq!(tl.placement_count(), 1);
    }

    #[test]
    fn test_clip_all_counts_truncations() {
        let mut tl = AudioItemTimeline::new();
        // 60 s at 120 BPM = 120 beats; overflows a 32-beat region
        tl.add_placement(0, placement(24.0, 120.0));
        // Short sample that fits
        let mut short = placement(0.0, 4.0);
        short.uid = 43;
        tl.add_placement(1, short);

        let clipped = tl.clip_all_at_region_end(32.0, 24.0, |_| 120.0, |uid| match uid {
            42 => Some(60.0),
            43 => Some(2.0),
            _ => None,
        });

        assert_eq!(clipped, 1);
        let p = &tl.placements(0)[0];
        assert!(beats_eq(p.length_beats, 8.0));
        assert!(p.sample_end >= 1.0 && p.sample_end <= 1000.0);
    }

    #[test]
    fn test_stretch_request_supersedes() {
        let mut backend = ThreadedStretchBackend::new(std::env::temp_dir(), |_| Some((44_100, 44_100)));
        let mut coord = StretchCoordinator::new();

        let mut p = placement(0.0, 4.0);
        p.time_stretch_mode = TimeStretchMode::Rubberband;

        assert!(coord.request(&mut backend, &p));
        assert!(coord.is_outstanding(p.placement_id));
        // Second request supersedes the first
        assert!(coord.request(&mut backend, &p));

        let uid = coord.finish(&mut p).expect("rendered uid");
        assert_eq!(p.uid, uid);
        assert!(!coord.is_outstanding(p.placement_id));
    }

    #[test]
    fn test_stretch_realtime_mode_is_no_job() {
        let mut backend = ThreadedStretchBackend::new(std::env::temp_dir(), |_| Some((44_100, 44_100)));
        let mut coord = StretchCoordinator::new();

        let mut p = placement(0.0, 4.0);
        p.time_stretch_mode = TimeStretchMode::PitchOnly;

        assert!(!coord.request(&mut backend, &p));
        assert!(coord.finish(&mut p).is_none());
    }
}
