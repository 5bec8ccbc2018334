// Editing tools - one strategy per editor mode
//
// Pointer events from the render surface dispatch through a single
// strategy interface keyed by the tagged mode, instead of swapping
// per-widget event handlers.

use crate::editor::session::EditorSession;
use crate::editor::EditResult;

/// A pointer position in scene coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenePos {
    pub x: f64,
    pub y: f64,
}

impl ScenePos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pointer events delivered by the render surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press(ScenePos),
    Move(ScenePos),
    Release(ScenePos),
}

/// The active editing tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    Select,
    Draw,
    Erase,
    Split,
}

impl EditorMode {
    /// The strategy implementing this mode
    pub fn strategy(self) -> &'static dyn ToolStrategy {
        match self {
            EditorMode::Select => &SelectTool,
            EditorMode::Draw => &DrawTool,
            EditorMode::Erase => &EraseTool,
            EditorMode::Split => &SplitTool,
        }
    }
}

/// Behavior of one editing tool on the arrangement canvas
pub trait ToolStrategy: Sync {
    fn on_press(&self, session: &mut EditorSession, pos: ScenePos) -> EditResult<()>;

    fn on_move(&self, session: &mut EditorSession, pos: ScenePos) -> EditResult<()> {
        let _ = (session, pos);
        Ok(())
    }

    fn on_release(&self, session: &mut EditorSession, pos: ScenePos) -> EditResult<()> {
        let _ = (session, pos);
        Ok(())
    }
}

/// Select: press sets the selection to the hit item, empty space clears
pub struct SelectTool;

impl ToolStrategy for SelectTool {
    fn on_press(&self, session: &mut EditorSession, pos: ScenePos) -> EditResult<()> {
        let track = session.track_at_y(pos.y);
        let beat = session.beat_at_x(pos.x);
        session.select_ref_at(track, beat);
        Ok(())
    }
}

/// Draw: press creates a new quantized item on the hit track
pub struct DrawTool;

impl ToolStrategy for DrawTool {
    fn on_press(&self, session: &mut EditorSession, pos: ScenePos) -> EditResult<()> {
        let track = session.track_at_y(pos.y);
        session.create_item_at(track, pos.x)?;
        Ok(())
    }
}

/// Erase: press removes the hit item; dragging keeps erasing
pub struct EraseTool;

impl ToolStrategy for EraseTool {
    fn on_press(&self, session: &mut EditorSession, pos: ScenePos) -> EditResult<()> {
        let track = session.track_at_y(pos.y);
        let beat = session.beat_at_x(pos.x);
        session.erase_ref_at(track, beat)?;
        Ok(())
    }

    fn on_move(&self, session: &mut EditorSession, pos: ScenePos) -> EditResult<()> {
        self.on_press(session, pos)
    }
}

/// Split: press splits the hit item at the snapped position
pub struct SplitTool;

impl ToolStrategy for SplitTool {
    fn on_press(&self, session: &mut EditorSession, pos: ScenePos) -> EditResult<()> {
        let track = session.track_at_y(pos.y);
        session.split_at(track, pos.x)?;
        Ok(())
    }
}
