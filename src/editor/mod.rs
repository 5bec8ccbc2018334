// Editing engine - session, modes, commands, clipboard
//
// Every mutation of the timeline model goes through one EditorSession,
// the single serialized writer. Commands follow the same shape: check
// preconditions (warn + no-op on failure), mutate a working copy, save
// it back, commit.

pub mod clipboard;
pub mod commands;
pub mod config;
pub mod mode;
pub mod session;

pub use clipboard::Clipboard;
pub use config::EditorConfig;
pub use mode::{EditorMode, PointerEvent, ScenePos};
pub use session::EditorSession;

use std::fmt;

/// Result type for editing commands
pub type EditResult<T> = Result<T, EditError>;

/// Errors that indicate a defect in an editing command.
///
/// Expected failures (no region open, capacity reached, not enough
/// items selected) are NOT errors: they surface as user notifications
/// and the command becomes a no-op.
#[derive(Debug, Clone)]
pub enum EditError {
    /// Command execution failed
    ExecutionFailed(String),
    /// Invalid state for this operation
    InvalidState(String),
    /// A uid pointed at nothing
    UnknownUid(u64),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::ExecutionFailed(msg) => write!(f, "Execution failed: {}", msg),
            EditError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            EditError::UnknownUid(uid) => write!(f, "Unknown uid: {}", uid),
        }
    }
}

impl std::error::Error for EditError {}
