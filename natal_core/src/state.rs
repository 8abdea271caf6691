//! Active contraction-session persistence with file locking.
//!
//! The session must survive across CLI invocations (a contraction is
//! started in one invocation and stopped in another), so it is saved
//! after every mutation and loaded with proper locking to prevent
//! concurrent access issues.

use crate::{ContractionSession, Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl ContractionSession {
    /// Load the session from a file with shared locking
    ///
    /// Returns a fresh session if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns a fresh session.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No session file found, starting a fresh session");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open session file {:?}: {}. Starting fresh.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        // Acquire shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock session file {:?}: {}. Starting fresh.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read session file {:?}: {}. Starting fresh.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<ContractionSession>(&contents) {
            Ok(session) => {
                tracing::debug!("Loaded contraction session from {:?}", path);
                Ok(session)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse session file {:?}: {}. Starting fresh.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save the session to a file with exclusive locking
    ///
    /// Atomically writes the session by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "session path missing parent")
        })?)?;

        // Acquire exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace old session file
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved contraction session to {:?}", path);
        Ok(())
    }

    /// Load the session, modify it, and save it back atomically
    ///
    /// This is a convenience method that handles the load-modify-save
    /// pattern with proper error handling.
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut ContractionSession) -> Result<()>,
    {
        let mut session = Self::load(path)?;
        f(&mut session)?;
        session.save(path)?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let session_path = temp_dir.path().join("session.json");

        let t0 = Utc::now();
        let mut session = ContractionSession::new(t0);
        session.start_contraction(t0).unwrap();
        session
            .stop_contraction(t0 + Duration::seconds(50), None)
            .unwrap();
        session
            .start_contraction(t0 + Duration::seconds(300))
            .unwrap();

        // Save
        session.save(&session_path).unwrap();

        // Load
        let loaded = ContractionSession::load(&session_path).unwrap();

        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.contractions.len(), 1);
        assert!(loaded.is_timing());
        assert_eq!(
            loaded.contractions[0].duration(),
            Some(Duration::seconds(50))
        );
    }

    #[test]
    fn test_load_nonexistent_returns_fresh_session() {
        let temp_dir = tempfile::tempdir().unwrap();
        let session_path = temp_dir.path().join("nonexistent.json");

        let session = ContractionSession::load(&session_path).unwrap();
        assert!(session.contractions.is_empty());
        assert!(!session.is_timing());
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let session_path = temp_dir.path().join("session.json");

        // Initialize empty session
        ContractionSession::default().save(&session_path).unwrap();

        // Update using the update helper
        let t0 = Utc::now();
        ContractionSession::update(&session_path, |session| {
            session.start_contraction(t0)?;
            Ok(())
        })
        .unwrap();

        // Verify update persisted
        let loaded = ContractionSession::load(&session_path).unwrap();
        assert!(loaded.is_timing());
    }

    #[test]
    fn test_corrupted_session_starts_fresh() {
        let temp_dir = tempfile::tempdir().unwrap();
        let session_path = temp_dir.path().join("corrupted.json");

        // Write invalid JSON
        std::fs::write(&session_path, "{ invalid json }").unwrap();

        let result = ContractionSession::load(&session_path);
        assert!(result.is_ok());
        let session = result.unwrap();
        assert!(session.contractions.is_empty());
        assert!(!session.is_timing());
    }

    #[test]
    fn test_atomic_save() {
        let temp_dir = tempfile::tempdir().unwrap();
        let session_path = temp_dir.path().join("session.json");

        let session = ContractionSession::default();
        session.save(&session_path).unwrap();

        // Verify session file exists and no stray temp files remain
        assert!(session_path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "session.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only session.json, found extras: {:?}",
            extras
        );
    }
}
