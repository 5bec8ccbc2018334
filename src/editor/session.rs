// Editor session - single owner of the open region/item context
//
// Replaces the old pile of globals (current region, current item, zoom)
// with one object whose lifecycle follows region/item selection. All
// timeline mutations funnel through here, making this the single
// serialized writer the concurrency model requires.

use crate::audio::stretch::StretchBackend;
use crate::audio::timeline::StretchCoordinator;
use crate::editor::clipboard::Clipboard;
use crate::editor::config::EditorConfig;
use crate::editor::mode::{EditorMode, PointerEvent};
use crate::editor::{EditError, EditResult};
use crate::engine::EngineBridge;
use crate::messaging::channels::{EngineProducer, NotificationProducer};
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::model::automation::AutomationPoint;
use crate::model::ItemUid;
use crate::region::{ItemRef, Region};
use crate::persist::ProjectStore;
use crate::time::{AudioItemGrid, PianoRollGrid, SequencerGrid, TimeCoordinate};

/// Height of one arrangement track row in scene pixels
pub const TRACK_HEIGHT_PX: f64 = 64.0;

/// Length of a freshly drawn item
pub const DEFAULT_NEW_ITEM_BEATS: f64 = 1.0;

/// The editing engine's session state
pub struct EditorSession {
    pub(crate) store: ProjectStore,
    pub(crate) stretch_backend: Box<dyn StretchBackend>,
    pub(crate) stretch: StretchCoordinator,
    pub(crate) bridge: EngineBridge,
    notifications: NotificationProducer,
    config: EditorConfig,

    mode: EditorMode,

    pub(crate) open_region: Option<u64>,
    open_item: Option<ItemUid>,

    pub(crate) coord: TimeCoordinate,
    pub(crate) seq_grid: SequencerGrid,
    piano_grid: Option<PianoRollGrid>,
    pub(crate) audio_grid: AudioItemGrid,

    pub(crate) selection: Vec<ItemRef>,
    pub(crate) clipboard: Clipboard,

    item_counter: u64,
}

impl EditorSession {
    pub fn new(
        store: ProjectStore,
        stretch_backend: Box<dyn StretchBackend>,
        engine_tx: EngineProducer,
        notification_tx: NotificationProducer,
        config: EditorConfig,
    ) -> Self {
        let coord = TimeCoordinate::new(config.px_per_beat, 8.0);
        let seq_grid = SequencerGrid::new(config.px_per_beat, config.snap);
        let mut audio_grid = AudioItemGrid::new(config.px_per_beat);
        audio_grid.set_snap_enabled(config.audio_snap_enabled);

        Self {
            store,
            stretch_backend,
            stretch: StretchCoordinator::new(),
            bridge: EngineBridge::new(engine_tx),
            notifications: notification_tx,
            config,
            mode: EditorMode::default(),
            open_region: None,
            open_item: None,
            coord,
            seq_grid,
            piano_grid: None,
            audio_grid,
            selection: Vec::new(),
            clipboard: Clipboard::new(),
            item_counter: 0,
        }
    }

    // --- context & lifecycle ---------------------------------------------

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ProjectStore {
        &mut self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: EditorMode) {
        self.mode = mode;
    }

    pub fn open_region_uid(&self) -> Option<u64> {
        self.open_region
    }

    /// The open region, when one is open and still exists
    pub fn region(&self) -> Option<&Region> {
        self.store.get_region(self.open_region?)
    }

    /// Open a region for editing
    pub fn open_region(&mut self, uid: u64) -> EditResult<()> {
        let region = self
            .store
            .get_region(uid)
            .ok_or(EditError::UnknownUid(uid))?;
        self.coord.set_region_length_beats(region.length_beats);
        self.open_region = Some(uid);
        self.selection.clear();
        Ok(())
    }

    pub fn close_region(&mut self) {
        self.open_region = None;
        self.open_item = None;
        self.piano_grid = None;
        self.selection.clear();
    }

    pub fn open_item_uid(&self) -> Option<ItemUid> {
        self.open_item
    }

    /// Open an item in the piano roll. The grid divisor derives from
    /// `length_beats` (the reference length on the timeline) so grid
    /// lines divide the item evenly.
    pub fn open_item(&mut self, uid: ItemUid, length_beats: f64) -> EditResult<()> {
        if self.store.get_item_by_uid(uid).is_none() {
            return Err(EditError::UnknownUid(uid));
        }
        let canvas_px = length_beats * self.coord.px_per_beat();
        self.piano_grid = Some(PianoRollGrid::new(length_beats, canvas_px));
        self.open_item = Some(uid);
        Ok(())
    }

    pub fn close_item(&mut self) {
        self.open_item = None;
        self.piano_grid = None;
    }

    pub fn piano_grid(&self) -> Option<&PianoRollGrid> {
        self.piano_grid.as_ref()
    }

    pub fn seq_grid(&self) -> &SequencerGrid {
        &self.seq_grid
    }

    pub fn audio_grid(&self) -> &AudioItemGrid {
        &self.audio_grid
    }

    pub fn coord(&self) -> &TimeCoordinate {
        &self.coord
    }

    /// Change horizontal zoom; every grid derives its own state from it
    pub fn set_zoom(&mut self, px_per_beat: f64) {
        self.coord.set_px_per_beat(px_per_beat);
        self.seq_grid.set_px_per_beat(px_per_beat);
        self.audio_grid.set_px_per_beat(px_per_beat);
    }

    pub fn set_snap(&mut self, snap: crate::time::SnapSetting) {
        self.seq_grid.set_snap(snap);
    }

    pub fn selection(&self) -> &[ItemRef] {
        &self.selection
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    // --- coordinate helpers ----------------------------------------------

    /// Track row under a scene y
    pub fn track_at_y(&self, y: f64) -> u32 {
        (y.max(0.0) / TRACK_HEIGHT_PX) as u32
    }

    /// Unquantized beat under a scene x (hit-testing)
    pub fn beat_at_x(&self, x: f64) -> f64 {
        self.coord.px_to_beat(x)
    }

    // --- pointer dispatch -------------------------------------------------

    /// Route a pointer event through the active tool strategy
    pub fn handle_pointer(&mut self, event: PointerEvent) -> EditResult<()> {
        let strategy = self.mode.strategy();
        match event {
            PointerEvent::Press(pos) => strategy.on_press(self, pos),
            PointerEvent::Move(pos) => strategy.on_move(self, pos),
            PointerEvent::Release(pos) => strategy.on_release(self, pos),
        }
    }

    // --- engine & persistence plumbing -----------------------------------

    /// Move the playhead in the engine process
    pub fn set_playback_position(&mut self, beat: f64) -> bool {
        self.bridge.set_playback_position(beat)
    }

    /// Current cached playhead position
    pub fn playback_position(&self) -> f64 {
        self.bridge.playback_position()
    }

    /// Push one per-item FX parameter to the engine
    pub fn push_item_fx(&mut self, item_uid: ItemUid, port_num: u32, value: f64) -> bool {
        self.bridge.push_item_fx(item_uid, port_num, value)
    }

    /// Undo the last committed edit
    pub fn undo(&mut self) -> Option<String> {
        let description = self.store.undo()?;
        self.bridge.notify_committed();
        Some(description)
    }

    /// Redo the last undone edit
    pub fn redo(&mut self) -> Option<String> {
        let description = self.store.redo()?;
        self.bridge.notify_committed();
        Some(description)
    }

    pub(crate) fn warn(&mut self, category: NotificationCategory, message: &str) {
        log::debug!("edit warning: {}", message);
        let notification = Notification::warning(category, message.to_string());
        let _ = ringbuf::traits::Producer::try_push(&mut self.notifications, notification);
    }

    /// Commit staged saves and tell the engine
    pub(crate) fn commit_edit(&mut self, description: &str) {
        if self.store.commit(description) {
            self.bridge.notify_committed();
        }
    }

    /// Working copy of the open region; warns and yields None when no
    /// region is open
    pub(crate) fn open_region_clone(&mut self) -> EditResult<Option<Region>> {
        let Some(uid) = self.open_region else {
            self.warn(NotificationCategory::Edit, "No region is open");
            return Ok(None);
        };
        match self.store.get_region(uid) {
            Some(region) => Ok(Some(region.clone())),
            None => Err(EditError::UnknownUid(uid)),
        }
    }

    // --- core editing commands -------------------------------------------

    /// Draw a new item at a pointer x on `track_num`.
    ///
    /// The start quantizes to the sequencer grid with the new-item
    /// boundary rule (a result under one grid cell clamps up to one
    /// cell). Returns the new reference, or None for a warned no-op.
    pub fn create_item_at(&mut self, track_num: u32, scene_x: f64) -> EditResult<Option<ItemRef>> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(None);
        };
        if region.at_capacity() {
            self.warn(
                NotificationCategory::Capacity,
                "Region item limit reached; item not created",
            );
            return Ok(None);
        }

        let snapped_px = self.seq_grid.quantize_new_item_start(scene_x);
        let start_beat = self.coord.px_to_beat(snapped_px);

        self.item_counter += 1;
        let name = format!("item-{}", self.item_counter);
        let item_uid = self.store.items_mut().create_item(name);

        let item_ref = ItemRef::new(track_num, start_beat, DEFAULT_NEW_ITEM_BEATS, item_uid);
        region.add_item_ref(item_ref.clone());
        self.store.save_region(region);
        self.commit_edit("Draw item");
        Ok(Some(item_ref))
    }

    /// Erase the reference under (track, beat), if any
    pub fn erase_ref_at(&mut self, track_num: u32, beat: f64) -> EditResult<bool> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(false);
        };
        let Some(target) = region.ref_at(track_num, beat).cloned() else {
            return Ok(false);
        };
        region.remove_item_ref(&target);
        self.selection.retain(|r| r != &target);
        self.store.save_region(region);
        self.commit_edit("Erase item");
        Ok(true)
    }

    /// Select the reference under (track, beat); empty space clears
    pub fn select_ref_at(&mut self, track_num: u32, beat: f64) {
        let hit = self
            .region()
            .and_then(|region| region.ref_at(track_num, beat).cloned());
        match hit {
            Some(item_ref) => self.selection = vec![item_ref],
            None => self.selection.clear(),
        }
    }

    /// Add a reference to the selection (shift-click)
    pub fn extend_selection(&mut self, item_ref: ItemRef) {
        if !self.selection.contains(&item_ref) {
            self.selection.push(item_ref);
        }
    }

    // --- automation CRUD (pointer entry points) ---------------------------

    /// Add an automation point at a pointer x. The beat snaps to the
    /// sequencer grid; the value is clamped by the point constructor.
    pub fn add_automation_point(
        &mut self,
        plugin_uid: u64,
        plugin_index: u32,
        port_num: u32,
        scene_x: f64,
        value: f64,
    ) -> EditResult<Option<AutomationPoint>> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(None);
        };
        let beat = self.coord.px_to_beat(self.seq_grid.quantize_px(scene_x));
        let point = AutomationPoint::control(beat, port_num, value, plugin_uid, plugin_index);
        region.curves.add_point(point);
        self.store.save_region(region);
        self.commit_edit("Add automation point");
        Ok(Some(point))
    }

    /// Remove the exact automation point
    pub fn remove_automation_point(&mut self, target: &AutomationPoint) -> EditResult<bool> {
        let Some(mut region) = self.open_region_clone()? else {
            return Ok(false);
        };
        let removed = region.curves.remove_point(target).is_some();
        if removed {
            self.store.save_region(region);
            self.commit_edit("Remove automation point");
        }
        Ok(removed)
    }

    // --- piano roll --------------------------------------------------------

    /// Draw a note in the open item at a pointer x.
    ///
    /// The start snaps to the piano-roll grid; the length is one grid
    /// cell. The same-pitch overlap repair runs on insert.
    pub fn draw_note(
        &mut self,
        scene_x: f64,
        note_num: u8,
        velocity: u8,
    ) -> EditResult<Option<crate::model::Note>> {
        let Some(item_uid) = self.open_item else {
            self.warn(NotificationCategory::Edit, "No item is open");
            return Ok(None);
        };
        let grid = self
            .piano_grid
            .ok_or_else(|| EditError::InvalidState("open item without a grid".to_string()))?;
        let mut item = self
            .store
            .get_item_by_uid(item_uid)
            .ok_or(EditError::UnknownUid(item_uid))?
            .clone();

        if item.event_count() >= crate::model::item::MAX_ITEM_EVENT_COUNT {
            self.warn(
                NotificationCategory::Capacity,
                "Item event limit reached; note not created",
            );
            return Ok(None);
        }

        let beat = grid.px_to_beat(grid.quantize_px(scene_x));
        let note = crate::model::Note::new(beat, grid.cell_beats(), note_num, velocity.clamp(1, 127));
        item.add_note(note);
        self.store.save_item(item);
        self.commit_edit("Draw note");
        Ok(Some(note))
    }

    /// Erase the exact note from the open item
    pub fn erase_note(&mut self, target: &crate::model::Note) -> EditResult<bool> {
        let Some(item_uid) = self.open_item else {
            self.warn(NotificationCategory::Edit, "No item is open");
            return Ok(false);
        };
        let mut item = self
            .store
            .get_item_by_uid(item_uid)
            .ok_or(EditError::UnknownUid(item_uid))?
            .clone();
        let removed = item.remove_note(target).is_some();
        if removed {
            self.store.save_item(item);
            self.commit_edit("Erase note");
        }
        Ok(removed)
    }
}
