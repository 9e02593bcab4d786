//! Periodic saving of the open whiteboard.

use super::{Storage, StorageResult};
use crate::document::Whiteboard;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Key under which the most recently saved whiteboard is mirrored.
pub const LAST_WHITEBOARD_KEY: &str = "__last_whiteboard__";

/// Saves a whiteboard when it has changed and the interval has elapsed.
///
/// Changes are detected either through [`mark_dirty`](Self::mark_dirty) or by
/// comparing the board fingerprint with the one last saved.
pub struct AutoSave<S: Storage> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    dirty: bool,
    saved_fingerprint: Option<u64>,
}

impl<S: Storage> AutoSave<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            dirty: false,
            saved_fingerprint: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether `board` differs from what was last saved or loaded.
    pub fn has_changes(&self, board: &Whiteboard) -> bool {
        self.dirty || self.saved_fingerprint != Some(board.fingerprint())
    }

    /// Whether a save is due for `board`.
    pub fn should_save(&self, board: &Whiteboard) -> bool {
        if !self.has_changes(board) {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save if due. Returns whether a save happened.
    pub async fn maybe_save(&mut self, board: &Whiteboard) -> StorageResult<bool> {
        if !self.should_save(board) {
            return Ok(false);
        }
        self.save(board).await?;
        Ok(true)
    }

    /// Save now, under the board UUID and as the last whiteboard.
    pub async fn save(&mut self, board: &Whiteboard) -> StorageResult<()> {
        let key = board.uuid().to_string();
        self.storage.save(&key, board).await?;
        self.storage.save(LAST_WHITEBOARD_KEY, board).await?;

        log::debug!("auto-saved whiteboard {key}");
        self.mark_saved(board);
        Ok(())
    }

    pub async fn load(&mut self, id: &str) -> StorageResult<Whiteboard> {
        let board = self.storage.load(id).await?;
        self.mark_saved(&board);
        Ok(board)
    }

    /// Load the most recently saved whiteboard, if any.
    pub async fn load_last(&mut self) -> Option<Whiteboard> {
        match self.storage.load(LAST_WHITEBOARD_KEY).await {
            Ok(board) => {
                self.mark_saved(&board);
                Some(board)
            }
            Err(err) => {
                log::debug!("no last whiteboard: {err}");
                None
            }
        }
    }

    /// Stored whiteboard keys, without the last-whiteboard mirror.
    pub async fn list(&self) -> StorageResult<Vec<String>> {
        let mut ids = self.storage.list().await?;
        ids.retain(|id| id != LAST_WHITEBOARD_KEY);
        Ok(ids)
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    fn mark_saved(&mut self, board: &Whiteboard) {
        self.last_save = Some(Instant::now());
        self.dirty = false;
        self.saved_fingerprint = Some(board.fingerprint());
    }
}
