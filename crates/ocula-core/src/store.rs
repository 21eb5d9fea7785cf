//! Calibration persistence — one JSON document, written by full overwrite.
//!
//! Loading is fail-open: a missing file means "uncalibrated", and a
//! malformed file logs a warning and also means "uncalibrated" rather than
//! aborting the session.

use crate::calibration::CalibrationParameters;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to write calibration file {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to create calibration directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to encode calibration parameters: {0}")]
    Encode(#[from] serde_json::Error),
}

/// File-backed store for fitted calibration parameters.
///
/// The path is explicit configuration passed at construction; the store
/// never invents a default location.
pub struct CalibrationStore {
    path: PathBuf,
}

impl CalibrationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load persisted parameters.
    ///
    /// Returns `None` when the file does not exist or cannot be parsed;
    /// parse and read failures are logged as warnings, never propagated —
    /// tracking proceeds uncalibrated.
    pub fn load(&self) -> Option<CalibrationParameters> {
        if !self.path.exists() {
            return None;
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "calibration file unreadable; proceeding uncalibrated");
                return None;
            }
        };

        match serde_json::from_str::<CalibrationParameters>(&contents) {
            Ok(params) => {
                tracing::info!(
                    path = %self.path.display(),
                    num_points = params.num_points,
                    "loaded calibration"
                );
                Some(params)
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "calibration file malformed; proceeding uncalibrated");
                None
            }
        }
    }

    /// Persist parameters: create parent directories as needed, then fully
    /// overwrite the file with pretty JSON.
    pub fn save(&self, params: &CalibrationParameters) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }

        let file = File::create(&self.path).map_err(|source| StoreError::Write {
            path: self.path.display().to_string(),
            source,
        })?;
        serde_json::to_writer_pretty(file, params)?;

        tracing::info!(path = %self.path.display(), "saved calibration");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_path(name: &str) -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "ocula-store-test-{}-{}-{}",
            std::process::id(),
            n,
            name
        ))
    }

    fn sample_params() -> CalibrationParameters {
        CalibrationParameters {
            h_offset: 0.0312,
            v_offset: -0.0178,
            h_scale: 1.4142,
            v_scale: 0.8891,
            num_points: 9,
            timestamp: 1_700_000_123.456,
        }
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let store = CalibrationStore::new(temp_path("missing/calibration.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_load_round_trip_exact() {
        let dir = temp_path("roundtrip");
        let store = CalibrationStore::new(dir.join("calibration.json"));
        let params = sample_params();

        store.save(&params).unwrap();
        let loaded = store.load().unwrap();

        // JSON numeric encoding must reproduce the exact floats.
        assert_eq!(loaded, params);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = temp_path("nested");
        let store = CalibrationStore::new(dir.join("a/b/calibration.json"));
        store.save(&sample_params()).unwrap();
        assert!(store.path().exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_malformed_is_none() {
        let dir = temp_path("malformed");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("calibration.json");
        fs::write(&path, "{ not json ").unwrap();

        let store = CalibrationStore::new(&path);
        assert!(store.load().is_none());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_overwrites_previous() {
        let dir = temp_path("overwrite");
        let store = CalibrationStore::new(dir.join("calibration.json"));

        store.save(&sample_params()).unwrap();
        let mut updated = sample_params();
        updated.h_offset = 0.5;
        updated.num_points = 5;
        store.save(&updated).unwrap();

        assert_eq!(store.load().unwrap(), updated);
        fs::remove_dir_all(&dir).ok();
    }
}
