// Persistence - journaled project store and bundle I/O

pub mod bundle;
pub mod serialization;
pub mod store;

pub use bundle::{BundleManifest, FormatVersion, load_bundle, save_bundle};
pub use store::{ProjectState, ProjectStore};

/// Persistence error types
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("File system error: {0}")]
    FileSystemError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid bundle structure: {0}")]
    InvalidStructure(String),

    #[error("Invalid bundle format version")]
    InvalidVersion,

    #[error("Missing required files in bundle")]
    MissingFiles,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
