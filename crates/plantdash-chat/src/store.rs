//! File-backed transcript persistence.
//!
//! One pretty-printed JSON array per machine in the history directory, plus
//! a default file for conversations without a selected machine.

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use plantdash_core::config::ChatConfig;
use plantdash_core::types::Transcript;

use crate::error::ChatError;
use crate::key::EntityKey;

/// Reads and writes transcripts under a single directory.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    dir: PathBuf,
    default_file: String,
}

impl TranscriptStore {
    pub fn new(dir: impl Into<PathBuf>, default_file: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            default_file: default_file.into(),
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(&config.history_dir, &config.default_file)
    }

    /// Reject a machine whose file would be the shared default transcript.
    ///
    /// Compared case-insensitively, since the history directory may live on
    /// a case-insensitive filesystem.
    pub fn check_key(&self, key: Option<&EntityKey>) -> Result<(), ChatError> {
        match key {
            Some(key) if key.file_name().eq_ignore_ascii_case(&self.default_file) => {
                Err(ChatError::InvalidKey(format!(
                    "{} is reserved for the shared history",
                    key
                )))
            }
            _ => Ok(()),
        }
    }

    /// Backing file for a machine, or the default file when `key` is `None`.
    pub fn path_for(&self, key: Option<&EntityKey>) -> PathBuf {
        match key {
            Some(key) => self.dir.join(key.file_name()),
            None => self.dir.join(&self.default_file),
        }
    }

    /// Load the persisted transcript.
    ///
    /// A missing, unreadable or malformed file yields an empty transcript.
    /// Malformed content is discarded with a warning; the file itself is left
    /// untouched until the next save.
    pub fn load(&self, key: Option<&EntityKey>) -> Transcript {
        if let Err(e) = self.check_key(key) {
            warn!(error = %e, "Refusing to load transcript");
            return Transcript::new();
        }
        let path = self.path_for(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No transcript yet, starting empty");
                return Transcript::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Transcript unreadable, starting empty");
                return Transcript::new();
            }
        };

        match serde_json::from_slice::<Transcript>(&bytes) {
            Ok(transcript) => {
                debug!(path = %path.display(), turns = transcript.len(), "Transcript loaded");
                transcript
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Discarding malformed transcript, starting empty"
                );
                Transcript::new()
            }
        }
    }

    /// Overwrite the backing file with the full transcript.
    ///
    /// Writes to a temporary file in the same directory and renames it over
    /// the target, so readers see either the old or the new content.
    pub fn save(&self, key: Option<&EntityKey>, transcript: &Transcript) -> Result<(), ChatError> {
        self.check_key(key)?;
        let path = self.path_for(key);
        std::fs::create_dir_all(&self.dir)?;

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        transcript.serialize(&mut serializer)?;

        let mut temp = NamedTempFile::new_in(&self.dir)?;
        temp.write_all(&buf)?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| ChatError::Io(e.error))?;

        info!(path = %path.display(), turns = transcript.len(), "Transcript saved");
        Ok(())
    }
}
