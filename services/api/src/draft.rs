//! services/api/src/draft.rs
//!
//! File-backed persistence for the in-progress composition: one fixed slot,
//! written on every edit and read back when a composer session starts.
//! Corrupt or missing content degrades to the default letter rather than
//! erroring.

use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::warn;
use valentine_core::domain::{LetterContent, PartialLetter};

/// A single-slot draft store keyed by a fixed file path.
#[derive(Clone, Debug)]
pub struct DraftStore {
    path: PathBuf,
}

impl DraftStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Reads the saved draft. Missing fields are filled from the defaults;
    /// an unreadable or unparseable file is treated as no draft at all.
    pub fn load(&self) -> LetterContent {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Failed to read draft at {:?}: {e}", self.path);
                }
                return LetterContent::default();
            }
        };

        match serde_json::from_str::<PartialLetter>(&raw) {
            Ok(partial) => LetterContent::with_defaults(partial),
            Err(e) => {
                warn!("Discarding corrupt draft at {:?}: {e}", self.path);
                LetterContent::default()
            }
        }
    }

    /// Persists the draft. Last writer wins; failures are logged and
    /// swallowed so an edit never fails because the disk did.
    pub fn save(&self, letter: &LetterContent) {
        let serialized = match serde_json::to_string_pretty(letter) {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!("Failed to serialize draft: {e}");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, serialized) {
            warn!("Failed to write draft at {:?}: {e}", self.path);
        }
    }
}
