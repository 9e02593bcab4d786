//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::document::Whiteboard;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

/// In-memory storage for tests and ephemeral sessions.
///
/// Whiteboards are kept as JSON snapshots, so a load goes through the same
/// serde path as [`FileStorage`](super::FileStorage): live displacements are
/// dropped and invalid frames are rejected.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    snapshots: RwLock<HashMap<String, String>>,
    saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves since creation.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    /// Raw JSON stored under `id`.
    pub fn snapshot(&self, id: &str) -> Option<String> {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, board: &Whiteboard) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let json = serde_json::to_string(board);
        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            self.snapshots
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(id, json);
            self.saves.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Whiteboard>> {
        let id = id.to_string();
        Box::pin(async move {
            let json = self.snapshot(&id).ok_or_else(|| StorageError::NotFound(id.clone()))?;
            Whiteboard::from_json(&json)
                .map_err(|e| StorageError::Serialization(format!("Failed to parse whiteboard {id}: {e}")))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            self.snapshots
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let snapshots = self.snapshots.read().unwrap_or_else(PoisonError::into_inner);
            Ok(snapshots.keys().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let snapshots = self.snapshots.read().unwrap_or_else(PoisonError::into_inner);
            Ok(snapshots.contains_key(&id))
        })
    }
}
