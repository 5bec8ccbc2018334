// Structural editing commands - split, glue, takes, clipboard, markers,
// automation tools, audio lane operations
//
// Precondition failures warn and no-op; capacity failures abort the
// remainder of a batch but keep what was already applied.

use crate::automation::lfo::{self, LfoParams};
use crate::editor::session::EditorSession;
use crate::editor::{EditError, EditResult};
use crate::messaging::notification::NotificationCategory;
use crate::model::audio_item::{AudioItemPlacement, TimeStretchMode};
use crate::model::generate_uid;
use crate::model::item::MAX_ITEM_EVENT_COUNT;
use crate::model::marker::{LoopMarker, Marker, MarkerKind, TempoMarker, TextMarker};
use crate::model::{ItemUid, PluginUid, SampleUid};
use crate::audio::timeline::HandleKind;
use crate::region::ItemRef;
use crate::time::{beats_cmp, beats_eq, seconds_to_beats};
use std::cmp::Ordering;

impl EditorSession {
    // --- split -------------------------------------------------------------

    /// Split `target` at beat `p`.
    ///
    /// The original keeps `[start, p)`; the clone covers `[p, end)` with
    /// its content offset advanced by `p - start` so it plays the same
    /// material it did before the split.
    pub fn split_item_ref(&mut self, target: &ItemRef, p: f64) -> EditResult<bool> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(false);
        };
        if beats_cmp(p, target.start_beat) != Ordering::Greater
            || beats_cmp(p, target.end_beat()) != Ordering::Less
        {
            self.warn(NotificationCategory::Edit, "Split point is outside the item");
            return Ok(false);
        }
        let Some(pos) = region.refs().iter().position(|r| r == target) else {
            // Stale selection; nothing to split
            return Ok(false);
        };
        if region.at_capacity() {
            self.warn(
                NotificationCategory::Capacity,
                "Region item limit reached; item not split",
            );
            return Ok(false);
        }

        let original_end = target.end_beat();
        region.refs_mut()[pos].length_beats = p - target.start_beat;

        let clone_ref = ItemRef {
            track_num: target.track_num,
            start_beat: p,
            length_beats: original_end - p,
            item_uid: target.item_uid,
            start_offset: target.start_offset + (p - target.start_beat),
        };
        region.add_item_ref(clone_ref);

        self.selection.clear();
        self.store.save_region(region);
        self.commit_edit("Split item");
        Ok(true)
    }

    /// Split the item under a pointer x on `track_num`, at the snapped
    /// position
    pub fn split_at(&mut self, track_num: u32, scene_x: f64) -> EditResult<bool> {
        let Some(region) = self.open_region_clone()? else {
            return Ok(false);
        };
        let hit_beat = self.beat_at_x(scene_x);
        let Some(target) = region.ref_at(track_num, hit_beat).cloned() else {
            return Ok(false);
        };
        let p = self.coord.px_to_beat(self.seq_grid.quantize_px(scene_x));
        self.split_item_ref(&target, p)
    }

    // --- glue --------------------------------------------------------------

    /// Glue the selected references into one new item.
    ///
    /// Requires at least two references on a single track. Each source
    /// segment's events land shifted by the segment's relative start;
    /// audio placements are rescaled by the segment's local tempo so
    /// their wall-clock length survives re-anchoring. The first
    /// reference is replaced in place, the rest are removed.
    pub fn glue_selected(&mut self) -> EditResult<bool> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(false);
        };
        if self.selection.len() < 2 {
            self.warn(
                NotificationCategory::Edit,
                "Glue needs at least 2 items selected",
            );
            return Ok(false);
        }
        let track = self.selection[0].track_num;
        if self.selection.iter().any(|r| r.track_num != track) {
            self.warn(
                NotificationCategory::Edit,
                "Glue needs items on a single track",
            );
            return Ok(false);
        }

        let mut sel = self.selection.clone();
        sel.sort_by(|a, b| beats_cmp(a.start_beat, b.start_beat));
        let first = sel[0].clone();
        let last = sel[sel.len() - 1].clone();
        let glued_length = (last.start_beat - first.start_beat) + last.length_beats;
        let base_tempo = region.get_tempo_at_pos(first.start_beat);

        let first_name = self
            .store
            .get_item_by_uid(first.item_uid)
            .map(|i| i.name.clone())
            .ok_or(EditError::UnknownUid(first.item_uid))?;
        let glued_uid = self
            .store
            .items_mut()
            .create_item(format!("{}-glued", first_name));
        let mut glued = self
            .store
            .get_item_by_uid(glued_uid)
            .ok_or(EditError::UnknownUid(glued_uid))?
            .clone();

        for r in &sel {
            let src = self
                .store
                .get_item_by_uid(r.item_uid)
                .ok_or(EditError::UnknownUid(r.item_uid))?
                .clone();
            // Content beat c of the source shows on the timeline at
            // r.start - r.start_offset + c; rebase onto the glued item
            // anchored at first.start
            let offset = (r.start_beat - first.start_beat) - r.start_offset;
            let local_tempo = region.get_tempo_at_pos(r.start_beat);
            glued.extend_shifted(&src, offset, local_tempo / base_tempo);
        }

        if glued.event_count() > MAX_ITEM_EVENT_COUNT {
            // The glued item stays in the store but is never placed;
            // no rollback of what was already built
            self.store.save_item(glued);
            self.warn(
                NotificationCategory::Capacity,
                "Item event limit reached; glue aborted",
            );
            return Ok(false);
        }
        self.store.save_item(glued);

        let pos = region
            .refs()
            .iter()
            .position(|r| r == &first)
            .ok_or_else(|| EditError::InvalidState("selected ref not in region".to_string()))?;
        {
            let refs = region.refs_mut();
            refs[pos].item_uid = glued_uid;
            refs[pos].length_beats = glued_length;
            refs[pos].start_offset = 0.0;
        }
        for r in sel.iter().skip(1) {
            region.remove_item_ref(r);
        }

        self.selection.clear();
        self.store.save_region(region);
        self.commit_edit("Glue items");
        Ok(true)
    }

    // --- takes -------------------------------------------------------------

    /// Rename one instance of a shared item without touching the other
    /// references: copies the item under the new name, repoints only
    /// `target`, and registers the copy as a take of the original.
    pub fn rename_take(&mut self, target: &ItemRef, new_name: &str) -> EditResult<Option<ItemUid>> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(None);
        };
        let Some(pos) = region.refs().iter().position(|r| r == target) else {
            return Ok(None);
        };
        let new_uid = self
            .store
            .items_mut()
            .copy_item(target.item_uid, new_name)
            .ok_or(EditError::UnknownUid(target.item_uid))?;

        region.refs_mut()[pos].item_uid = new_uid;
        self.selection.clear();
        self.store.save_region(region);
        self.commit_edit("Rename take");
        Ok(Some(new_uid))
    }

    /// Swap `target` to the next registered take of its item
    pub fn cycle_take(&mut self, target: &ItemRef) -> EditResult<Option<ItemUid>> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(None);
        };
        let Some(pos) = region.refs().iter().position(|r| r == target) else {
            return Ok(None);
        };

        let next = {
            let items = self.store.items();
            let base = if !items.takes_of(target.item_uid).is_empty() {
                target.item_uid
            } else {
                items.base_of(target.item_uid).unwrap_or(target.item_uid)
            };
            items.next_take(base, target.item_uid)
        };
        let Some(next) = next else {
            self.warn(NotificationCategory::Edit, "Item has no takes");
            return Ok(None);
        };

        region.refs_mut()[pos].item_uid = next;
        self.store.save_region(region);
        self.commit_edit("Cycle take");
        Ok(Some(next))
    }

    // --- clipboard ---------------------------------------------------------

    /// Copy the selected references and the automation under their span
    pub fn copy_selected(&mut self) -> EditResult<bool> {
        if self.selection.is_empty() {
            self.warn(NotificationCategory::Edit, "Nothing selected to copy");
            return Ok(false);
        }
        let Some(region) = self.open_region_clone()? else {
            return Ok(false);
        };

        let start = self
            .selection
            .iter()
            .map(|r| r.start_beat)
            .fold(f64::INFINITY, f64::min);
        let end = self
            .selection
            .iter()
            .map(|r| r.end_beat())
            .fold(0.0_f64, f64::max);
        let points = region.curves.copy_range_all(start, end);

        let refs = self.selection.clone();
        self.clipboard.set(refs, points);
        Ok(true)
    }

    /// Copy, then remove the selected references
    pub fn cut_selected(&mut self) -> EditResult<bool> {
        if !self.copy_selected()? {
            return Ok(false);
        }
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(false);
        };
        for r in self.selection.clone() {
            region.remove_item_ref(&r);
        }
        self.selection.clear();
        self.store.save_region(region);
        self.commit_edit("Cut items");
        Ok(true)
    }

    /// Paste the clipboard block at `beat`: inserts space for the block,
    /// then places its references and automation points.
    ///
    /// Hitting the region item limit aborts the rest of the paste but
    /// keeps the references already placed.
    pub fn paste_at(&mut self, beat: f64) -> EditResult<usize> {
        if self.clipboard.is_empty() {
            self.warn(NotificationCategory::Edit, "Clipboard is empty");
            return Ok(0);
        }
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(0);
        };

        region.insert_space(beat, self.clipboard.length_beats());

        let mut placed = 0;
        let mut hit_capacity = false;
        for r in self.clipboard.refs().to_vec() {
            let mut moved = r;
            moved.start_beat += beat;
            if !region.add_item_ref(moved) {
                hit_capacity = true;
                break;
            }
            placed += 1;
        }
        region.curves.paste_points(self.clipboard.points(), beat);

        self.store.save_region(region);
        self.commit_edit("Paste");
        if hit_capacity {
            self.warn(
                NotificationCategory::Capacity,
                "Region item limit reached; paste aborted part-way",
            );
        }
        Ok(placed)
    }

    // --- markers -----------------------------------------------------------

    /// Place a tempo marker; refuses (with a warning) when one already
    /// sits at that beat
    pub fn set_tempo_marker(
        &mut self,
        beat: f64,
        tempo: f64,
        tsig_num: u8,
        tsig_den: u8,
    ) -> EditResult<bool> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(false);
        };
        if region.has_marker(beat, MarkerKind::Tempo) {
            self.warn(
                NotificationCategory::Edit,
                "A tempo marker already exists at this beat",
            );
            return Ok(false);
        }
        region.set_marker(Marker::Tempo(TempoMarker {
            beat,
            tempo,
            tsig_num,
            tsig_den,
        }));
        self.store.save_region(region);
        self.commit_edit("Set tempo marker");
        Ok(true)
    }

    /// Place a text marker; same uniqueness rule as tempo markers
    pub fn set_text_marker(&mut self, beat: f64, text: &str) -> EditResult<bool> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(false);
        };
        if region.has_marker(beat, MarkerKind::Text) {
            self.warn(
                NotificationCategory::Edit,
                "A text marker already exists at this beat",
            );
            return Ok(false);
        }
        region.set_marker(Marker::Text(TextMarker {
            beat,
            text: text.to_string(),
        }));
        self.store.save_region(region);
        self.commit_edit("Set text marker");
        Ok(true)
    }

    /// Place (or move) the loop marker
    pub fn set_loop_marker(&mut self, start_beat: f64, end_beat: f64) -> EditResult<bool> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(false);
        };
        region.set_marker(Marker::Loop(LoopMarker {
            start_beat,
            beat: end_beat,
        }));
        self.store.save_region(region);
        self.commit_edit("Set loop marker");
        Ok(true)
    }

    pub fn delete_marker(&mut self, beat: f64, kind: MarkerKind) -> EditResult<bool> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(false);
        };
        let removed = region.delete_marker(beat, kind).is_some();
        if removed {
            self.store.save_region(region);
            self.commit_edit("Delete marker");
        }
        Ok(removed)
    }

    /// Shift everything at or after `beat` forward by `length` beats
    pub fn insert_region_space(&mut self, beat: f64, length: f64) -> EditResult<bool> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(false);
        };
        region.insert_space(beat, length);
        self.store.save_region(region);
        self.commit_edit("Insert space");
        Ok(true)
    }

    // --- automation tools --------------------------------------------------

    /// Replace the automation in `[start, end]` with an LFO sweep.
    /// Returns the number of points written.
    pub fn run_lfo(
        &mut self,
        params: &LfoParams,
        plugin_uid: PluginUid,
        plugin_index: u32,
        port_num: u32,
        start_beat: f64,
        end_beat: f64,
    ) -> EditResult<usize> {
        if beats_cmp(end_beat, start_beat) != Ordering::Greater {
            self.warn(NotificationCategory::Edit, "LFO range is empty");
            return Ok(0);
        }
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(0);
        };

        region
            .curves
            .clear_range(plugin_uid, port_num, start_beat, end_beat);
        // The sweep writes an endpoint at `end_beat`, which the
        // half-open clear leaves behind; replace it too
        let stale: Vec<_> = region
            .curves
            .points(plugin_uid, port_num)
            .iter()
            .filter(|p| beats_eq(p.beat, end_beat))
            .cloned()
            .collect();
        for p in &stale {
            region.curves.remove_point(p);
        }
        let points = lfo::generate(
            params,
            start_beat,
            end_beat,
            plugin_uid,
            plugin_index,
            port_num,
        );
        let count = points.len();
        for p in points {
            region.curves.add_point(p);
        }

        self.store.save_region(region);
        self.commit_edit("Generate LFO");
        Ok(count)
    }

    /// Apply the add/multiply tool to one curve over `[start, end]`.
    /// Returns the number of points transformed.
    pub fn transform_automation(
        &mut self,
        plugin_uid: PluginUid,
        port_num: u32,
        start_beat: f64,
        end_beat: f64,
        slider: f64,
        add: f64,
    ) -> EditResult<usize> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(0);
        };
        let count = region
            .curves
            .transform_range(plugin_uid, port_num, start_beat, end_beat, slider, add);
        if count > 0 {
            self.store.save_region(region);
            self.commit_edit("Transform automation");
        }
        Ok(count)
    }

    /// Clear one curve over `[start, end)`
    pub fn clear_automation_range(
        &mut self,
        plugin_uid: PluginUid,
        port_num: u32,
        start_beat: f64,
        end_beat: f64,
    ) -> EditResult<bool> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(false);
        };
        region
            .curves
            .clear_range(plugin_uid, port_num, start_beat, end_beat);
        self.store.save_region(region);
        self.commit_edit("Clear automation");
        Ok(true)
    }

    // --- audio lane --------------------------------------------------------

    /// Drop a sample on an audio lane at a pointer x.
    ///
    /// The length comes from the sample's wall-clock duration at the
    /// local tempo; the placement is clipped against the region end
    /// straight away.
    pub fn add_audio_placement(
        &mut self,
        lane: u32,
        sample_uid: SampleUid,
        scene_x: f64,
    ) -> EditResult<Option<u64>> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(None);
        };
        let Ok(seconds) = self.store.pool().seconds_of(sample_uid) else {
            self.warn(NotificationCategory::Edit, "Unknown sample");
            return Ok(None);
        };
        if region.audio.at_capacity() {
            self.warn(
                NotificationCategory::Capacity,
                "Audio item limit reached; item not created",
            );
            return Ok(None);
        }

        let start_beat = self
            .coord
            .px_to_beat(self.audio_grid.quantize_px(scene_x));
        let tempo = region.get_tempo_at_pos(start_beat);
        let length_beats = seconds_to_beats(tempo, seconds);
        if length_beats <= 0.0 || start_beat >= region.length_beats {
            self.warn(NotificationCategory::Edit, "Sample does not fit the region");
            return Ok(None);
        }

        let placement_id = generate_uid();
        let mut placement =
            AudioItemPlacement::new(placement_id, sample_uid, start_beat, length_beats);
        placement.clip_at_region_end(
            region.length_beats,
            tempo,
            seconds,
            self.coord.px_per_beat(),
        );

        region.audio.add_placement(lane, placement);
        self.store.save_region(region);
        self.commit_edit("Add audio item");
        Ok(Some(placement_id))
    }

    /// Interactive handle drag. Stages the change without committing;
    /// `end_audio_drag` commits once when the drag ends.
    pub fn drag_audio_handle(
        &mut self,
        lane: u32,
        placement_id: u64,
        handle: HandleKind,
        promille: f64,
    ) -> EditResult<bool> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(false);
        };
        let moved = region.audio.drag_handle(lane, placement_id, handle, promille);
        if moved {
            self.store.save_region(region);
        }
        Ok(moved)
    }

    /// Commit the drag that `drag_audio_handle` staged
    pub fn end_audio_drag(&mut self) {
        self.commit_edit("Adjust audio item");
    }

    pub fn split_audio_placement(
        &mut self,
        lane: u32,
        placement_id: u64,
        beat: f64,
    ) -> EditResult<Option<u64>> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(None);
        };
        let new_id = generate_uid();
        let Some(created) = region.audio.split_placement(lane, placement_id, beat, new_id) else {
            self.warn(NotificationCategory::Edit, "Split point is outside the item");
            return Ok(None);
        };
        self.store.save_region(region);
        self.commit_edit("Split audio item");
        Ok(Some(created))
    }

    /// Change a placement's stretch parameters.
    ///
    /// Offline modes fire a render request; the handle supersedes any
    /// outstanding one for the placement. Returns whether a render job
    /// is now outstanding (realtime modes never render).
    pub fn set_stretch_params(
        &mut self,
        lane: u32,
        placement_id: u64,
        mode: TimeStretchMode,
        timestretch_amt: f64,
        timestretch_amt_end: f64,
        pitch_shift: f64,
        pitch_shift_end: f64,
    ) -> EditResult<bool> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(false);
        };
        let Some(placement) = region.audio.get_mut(lane, placement_id) else {
            return Ok(false);
        };
        placement.time_stretch_mode = mode;
        placement.timestretch_amt = timestretch_amt;
        placement.timestretch_amt_end = timestretch_amt_end;
        placement.pitch_shift = pitch_shift;
        placement.pitch_shift_end = pitch_shift_end;

        let requested = self
            .stretch
            .request(self.stretch_backend.as_mut(), placement);
        if mode.requires_render() && !requested {
            self.warn(
                NotificationCategory::Stretch,
                "Time-stretch render could not be started",
            );
        }

        self.store.save_region(region);
        self.commit_edit("Set time-stretch");
        Ok(requested)
    }

    /// Join the outstanding render for a placement and substitute the
    /// rendered sample uid. Called after interactive dragging ends,
    /// never during a drag.
    pub fn finish_stretch(&mut self, lane: u32, placement_id: u64) -> EditResult<Option<SampleUid>> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(None);
        };
        let Some(placement) = region.audio.get_mut(lane, placement_id) else {
            return Ok(None);
        };
        let Some(uid) = self.stretch.finish(placement) else {
            return Ok(None);
        };

        // Register the finished renders so length queries resolve
        for rendered in self.stretch_backend.completed() {
            self.store.pool_mut().insert_entry(crate::audio::SampleEntry {
                uid: rendered.uid,
                path: rendered.path,
                frames: rendered.frames,
                sample_rate: rendered.sample_rate,
            });
        }

        self.store.save_region(region);
        self.commit_edit("Apply time-stretch");
        Ok(Some(uid))
    }

    /// Clip every audio placement of the open region at the region end.
    /// Returns how many placements were truncated.
    pub fn clip_audio_at_region_end(&mut self) -> EditResult<usize> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(0);
        };
        let lookup = region.clone();
        let pool = self.store.pool().clone();
        let clipped = region.audio.clip_all_at_region_end(
            region.length_beats,
            self.coord.px_per_beat(),
            |beat| lookup.get_tempo_at_pos(beat),
            |uid| pool.seconds_of(uid).ok(),
        );
        if clipped > 0 {
            self.store.save_region(region);
            self.commit_edit("Clip audio items");
        }
        Ok(clipped)
    }
}
