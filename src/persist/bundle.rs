// Bundle I/O - one project as a ZIP archive
//
// Layout: manifest.json (metadata + format version), project.ron (the
// whole state), items/<uid>.json (one file per item, for external
// tooling). Staged through a temp directory, zipped, then cleaned up.

use crate::persist::serialization::*;
use crate::persist::store::ProjectState;
use crate::persist::PersistError;
use std::fs::File;
use std::path::Path;
use zip::{ZipArchive, ZipWriter};

/// Bundle format version
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FormatVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl FormatVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn current() -> Self {
        Self::new(1, 0, 0)
    }

    /// Bundles from the same major version load; anything else refuses
    pub fn can_load(&self) -> bool {
        self.major == Self::current().major
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Bundle metadata
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BundleManifest {
    pub name: String,
    pub version: FormatVersion,
    pub created: String,
    pub modified: String,
}

impl BundleManifest {
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            name: name.into(),
            version: FormatVersion::current(),
            created: now.clone(),
            modified: now,
        }
    }
}

/// Save the project state as a bundle at `bundle_path`
pub fn save_bundle(
    state: &ProjectState,
    name: &str,
    bundle_path: &Path,
) -> Result<(), PersistError> {
    let bundle_dir = bundle_path
        .parent()
        .ok_or_else(|| PersistError::FileSystemError("Invalid bundle path".to_string()))?;
    std::fs::create_dir_all(bundle_dir).map_err(|e| {
        PersistError::FileSystemError(format!("Failed to create bundle directory: {}", e))
    })?;

    // Stage into a temp directory next to the bundle
    let temp_dir = bundle_dir.join(format!(".temp_{}", name.replace(' ', "_")));
    std::fs::create_dir_all(&temp_dir).map_err(|e| {
        PersistError::FileSystemError(format!("Failed to create temp directory: {}", e))
    })?;

    let manifest = BundleManifest::new(name);
    let manifest_json = serialize_manifest_to_json(&manifest)?;
    std::fs::write(temp_dir.join("manifest.json"), manifest_json)
        .map_err(|e| PersistError::FileSystemError(format!("Failed to write manifest: {}", e)))?;

    let state_ron = serialize_state_to_ron(state)?;
    std::fs::write(temp_dir.join("project.ron"), state_ron)
        .map_err(|e| PersistError::FileSystemError(format!("Failed to write project: {}", e)))?;

    // One JSON file per item for external tooling
    let items_dir = temp_dir.join("items");
    std::fs::create_dir_all(&items_dir).map_err(|e| {
        PersistError::FileSystemError(format!("Failed to create items directory: {}", e))
    })?;
    for item in state.items.iter() {
        let item_json = serde_json::to_string_pretty(item).map_err(|e| {
            PersistError::SerializationError(format!("Failed to serialize item {}: {}", item.uid, e))
        })?;
        std::fs::write(items_dir.join(format!("{}.json", item.uid)), item_json).map_err(|e| {
            PersistError::FileSystemError(format!("Failed to write item {}: {}", item.uid, e))
        })?;
    }

    let zip_file = File::create(bundle_path)
        .map_err(|e| PersistError::FileSystemError(format!("Failed to create ZIP file: {}", e)))?;
    let mut zip_writer = ZipWriter::new(zip_file);
    add_directory_to_zip(&mut zip_writer, &temp_dir)?;
    zip_writer.finish().map_err(PersistError::Zip)?;

    std::fs::remove_dir_all(&temp_dir).map_err(|e| {
        PersistError::FileSystemError(format!("Failed to clean up temp directory: {}", e))
    })?;

    Ok(())
}

/// Load a bundle, returning its manifest and state
pub fn load_bundle(bundle_path: &Path) -> Result<(BundleManifest, ProjectState), PersistError> {
    let zip_file = File::open(bundle_path)
        .map_err(|e| PersistError::FileSystemError(format!("Failed to open bundle: {}", e)))?;
    let mut zip_archive = ZipArchive::new(zip_file).map_err(PersistError::Zip)?;

    let temp_dir = std::env::temp_dir().join(format!("bundle_extract_{}", std::process::id()));
    zip_archive.extract(&temp_dir).map_err(PersistError::Zip)?;

    let result = load_extracted(&temp_dir);

    // Best-effort cleanup either way
    let _ = std::fs::remove_dir_all(&temp_dir);

    result
}

fn load_extracted(dir: &Path) -> Result<(BundleManifest, ProjectState), PersistError> {
    let manifest_path = dir.join("manifest.json");
    if !manifest_path.exists() {
        return Err(PersistError::MissingFiles);
    }
    let manifest_json = std::fs::read_to_string(&manifest_path)
        .map_err(|e| PersistError::FileSystemError(format!("Failed to read manifest: {}", e)))?;
    let manifest = deserialize_manifest_from_json(&manifest_json)?;

    if !manifest.version.can_load() {
        return Err(PersistError::InvalidVersion);
    }

    let state_path = dir.join("project.ron");
    if !state_path.exists() {
        return Err(PersistError::MissingFiles);
    }
    let state_ron = std::fs::read_to_string(&state_path)
        .map_err(|e| PersistError::FileSystemError(format!("Failed to read project: {}", e)))?;
    let state = deserialize_state_from_ron(&state_ron)?;

    Ok((manifest, state))
}

/// Add every file under `dir_path` to the archive, paths relative to it
fn add_directory_to_zip(
    zip_writer: &mut ZipWriter<File>,
    dir_path: &Path,
) -> Result<(), PersistError> {
    use walkdir::WalkDir;

    for entry in WalkDir::new(dir_path) {
        let entry = entry
            .map_err(|e| PersistError::FileSystemError(format!("Failed to walk directory: {}", e)))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let file_name = path.strip_prefix(dir_path).map_err(|e| {
            PersistError::FileSystemError(format!("Failed to get relative path: {}", e))
        })?;
        let zip_path = format!("{}", file_name.display());

        let file = File::open(path).map_err(|e| {
            PersistError::FileSystemError(format!("Failed to open file for ZIP: {}", e))
        })?;

        let options: zip::write::FileOptions<()> = zip::write::FileOptions::default();
        zip_writer.start_file(&*zip_path, options)?;

        let mut file_reader = std::io::BufReader::new(file);
        std::io::copy(&mut file_reader, zip_writer)
            .map_err(|e| PersistError::FileSystemError(format!("Failed to write to ZIP: {}", e)))?;
    }

    Ok(())
}
