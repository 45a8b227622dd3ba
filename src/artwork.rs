use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

use crate::domain::token::AccessToken;

#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("filesystem error: {0}")]
    Fs(#[from] io::Error),

    #[error("artwork cache lock poisoned")]
    Poisoned,
}

#[derive(Default)]
struct CacheEntry {
    bytes: Vec<u8>,
    token: Option<AccessToken>,
}

/// Holds the single current cover image and the token that unlocks it.
///
/// `replace` and `read_if_match` serialize on one mutex; the image bytes and
/// their token only ever change together, so a reader can never pair fresh
/// bytes with a stale token or vice versa. The optional backing file is
/// written inside the same critical section, before the in-memory commit, so
/// a failed write leaves the previous entry fully intact.
pub struct AlbumArtCache {
    entry: Mutex<CacheEntry>,
    backing_path: Option<PathBuf>,
}

impl AlbumArtCache {
    pub fn new(backing_path: Option<PathBuf>) -> Self {
        Self {
            entry: Mutex::new(CacheEntry::default()),
            backing_path,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// Atomically swap in a new image under a freshly minted token. The
    /// previous token stops matching as soon as this returns.
    pub fn replace(&self, bytes: Vec<u8>, token: AccessToken) -> Result<(), ArtworkError> {
        let mut entry = self.entry.lock().map_err(|_| ArtworkError::Poisoned)?;

        if let Some(path) = &self.backing_path {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, &bytes)?;
        }

        entry.bytes = bytes;
        entry.token = Some(token);
        Ok(())
    }

    /// Returns the current image only for the exact current token. Any other
    /// token, or an empty cache, reads as not found.
    pub fn read_if_match(&self, token: &AccessToken) -> Result<Option<Vec<u8>>, ArtworkError> {
        let entry = self.entry.lock().map_err(|_| ArtworkError::Poisoned)?;
        match &entry.token {
            Some(current) if current == token => Ok(Some(entry.bytes.clone())),
            _ => Ok(None),
        }
    }

    pub fn has_art(&self) -> bool {
        self.entry
            .lock()
            .map(|entry| entry.token.is_some())
            .unwrap_or(false)
    }
}
