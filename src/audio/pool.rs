// Sample pool - uid-addressed WAV metadata
//
// Placements reference samples by uid only. The pool reads WAV headers
// (never the audio data) to answer length queries for clipping and for
// the stretch backend.

use crate::model::SampleUid;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use walkdir::WalkDir;

/// Errors raised while scanning or registering samples
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid WAV file {path}: {source}")]
    InvalidWav {
        path: PathBuf,
        source: hound::Error,
    },

    #[error("Unknown sample uid {0}")]
    UnknownUid(SampleUid),
}

/// Metadata for one registered sample
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SampleEntry {
    pub uid: SampleUid,
    pub path: PathBuf,
    pub frames: u64,
    pub sample_rate: u32,
}

impl SampleEntry {
    /// Untrimmed sample length in seconds
    pub fn seconds(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }
}

static NEXT_SAMPLE_UID: AtomicU64 = AtomicU64::new(1);

fn next_sample_uid() -> SampleUid {
    NEXT_SAMPLE_UID.fetch_add(1, Ordering::Relaxed)
}

/// Project-wide sample registry
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SamplePool {
    entries: HashMap<SampleUid, SampleEntry>,
}

impl SamplePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, uid: SampleUid) -> Option<&SampleEntry> {
        self.entries.get(&uid)
    }

    /// Untrimmed length in seconds of `uid`
    pub fn seconds_of(&self, uid: SampleUid) -> Result<f64, PoolError> {
        self.get(uid)
            .map(SampleEntry::seconds)
            .ok_or(PoolError::UnknownUid(uid))
    }

    /// Register one WAV file, reading only its header
    pub fn register_file(&mut self, path: &Path) -> Result<SampleUid, PoolError> {
        let reader = hound::WavReader::open(path).map_err(|source| PoolError::InvalidWav {
            path: path.to_path_buf(),
            source,
        })?;
        let spec = reader.spec();
        let uid = next_sample_uid();
        self.entries.insert(
            uid,
            SampleEntry {
                uid,
                path: path.to_path_buf(),
                frames: reader.duration() as u64,
                sample_rate: spec.sample_rate,
            },
        );
        Ok(uid)
    }

    /// Register a sample produced by the stretch backend. The rendered
    /// file may not exist yet when the uid is allocated, so the length
    /// is supplied by the renderer.
    pub fn register_rendered(&mut self, path: PathBuf, frames: u64, sample_rate: u32) -> SampleUid {
        let uid = next_sample_uid();
        self.entries.insert(
            uid,
            SampleEntry {
                uid,
                path,
                frames,
                sample_rate,
            },
        );
        uid
    }

    /// Insert an entry under a uid the renderer already allocated
    pub fn insert_entry(&mut self, entry: SampleEntry) {
        self.entries.insert(entry.uid, entry);
    }

    /// Recursively register every `.wav` under `dir`.
    ///
    /// Unreadable files are skipped with a warning so one broken sample
    /// does not abort a library scan. Returns how many files were added.
    pub fn scan_directory(&mut self, dir: &Path) -> Result<usize, PoolError> {
        let mut added = 0;
        for entry in WalkDir::new(dir) {
            let entry = entry.map_err(|e| PoolError::Io(e.into()))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_wav = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("wav"))
                .unwrap_or(false);
            if !is_wav {
                continue;
            }
            match self.register_file(path) {
                Ok(_) => added += 1,
                Err(e) => log::warn!("skipping sample {}: {}", path.display(), e),
            }
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn write_test_wav(path: &Path, frames: u32, sample_rate: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..frames {
            writer.write_sample(0_i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_register_file_reads_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beep.wav");
        write_test_wav(&path, 44_100, 44_100);

        let mut pool = SamplePool::new();
        let uid = pool.register_file(&path).unwrap();

        let entry = pool.get(uid).unwrap();
        assert_eq!(entry.frames, 44_100);
        assert_eq!(entry.sample_rate, 44_100);
        assert_eq!(pool.seconds_of(uid).unwrap(), 1.0);
    }

    #[test]
    fn test_register_invalid_wav_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        File::create(&path).unwrap();

        let mut pool = SamplePool::new();
        assert!(matches!(
            pool.register_file(&path),
            Err(PoolError::InvalidWav { .. })
        ));
    }

    #[test]
    fn test_scan_directory_skips_non_wav() {
        let dir = tempfile::tempdir().unwrap();
        write_test_wav(&dir.path().join("a.wav"), 100, 44_100);
        let nested = dir.path().join("kits");
        std::fs::create_dir(&nested).unwrap();
        write_test_wav(&nested.join("b.WAV"), 200, 48_000);
        std::fs::write(dir.path().join("readme.txt"), "not audio").unwrap();
        // A broken wav is skipped, not fatal
        File::create(dir.path().join("broken.wav")).unwrap();

        let mut pool = SamplePool::new();
        let added = pool.scan_directory(dir.path()).unwrap();
        assert_eq!(added, 2);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_unknown_uid() {
        let pool = SamplePool::new();
        assert!(matches!(
            pool.seconds_of(9_999_999),
            Err(PoolError::UnknownUid(_))
        ));
    }
}
