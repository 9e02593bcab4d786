//! Whiteboard document: canvas size, scraps, free strokes and view-port.

use crate::error::{EngineError, EngineResult};
use crate::frame::Frame;
use crate::scrap::{Scrap, ScrapId};
use crate::stroke::SketchStroke;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::{DefaultHasher, Entry};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Row id of a whiteboard that has not been persisted yet.
pub const TEMP_ID: i64 = -1;

/// A4 landscape in model units.
pub const A4_LANDSCAPE: Size = Size::new(297.0, 210.0);

/// Notifications raised by whiteboard mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    ScrapAdded(ScrapId),
    ScrapRemoved(ScrapId),
    StrokePushed,
    StrokePopped,
    StrokesCleared,
}

/// Thumbnail image written by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
struct ScrapEntry {
    /// Insertion sequence, breaks z ties.
    seq: u64,
    scrap: Scrap,
}

#[derive(Serialize, Deserialize)]
struct WhiteboardRecord {
    id: i64,
    uuid: Uuid,
    created_at: u64,
    modified_at: u64,
    width: f64,
    height: f64,
    thumbnail: Option<Thumbnail>,
    view_port: Rect,
    scraps: Vec<Scrap>,
    strokes: Vec<SketchStroke>,
}

/// The whiteboard aggregate.
///
/// Stores the view-port but does not clamp it; the view-port controller owns
/// that invariant. Mutations are expected from a single owning thread.
#[derive(Debug, Serialize, Deserialize)]
#[serde(into = "WhiteboardRecord", from = "WhiteboardRecord")]
pub struct Whiteboard {
    pub id: i64,
    uuid: Uuid,
    created_at: u64,
    modified_at: u64,
    size: Size,
    pub thumbnail: Option<Thumbnail>,
    view_port: Rect,
    scraps: HashMap<ScrapId, ScrapEntry>,
    next_seq: u64,
    strokes: Vec<SketchStroke>,
    observers: Vec<Sender<DocumentEvent>>,
}

impl Default for Whiteboard {
    fn default() -> Self {
        Self::new(A4_LANDSCAPE)
    }
}

impl Whiteboard {
    /// Create an empty whiteboard whose view-port covers the whole canvas.
    pub fn new(size: Size) -> Self {
        let now = now_millis();
        Self {
            id: TEMP_ID,
            uuid: Uuid::new_v4(),
            created_at: now,
            modified_at: now,
            size,
            thumbnail: None,
            view_port: size.to_rect(),
            scraps: HashMap::new(),
            next_seq: 0,
            strokes: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn modified_at(&self) -> u64 {
        self.modified_at
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn bounds(&self) -> Rect {
        self.size.to_rect()
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
        self.touch();
    }

    pub fn view_port(&self) -> Rect {
        self.view_port
    }

    /// Store the view-port as given. Clamping is the caller's job.
    pub fn set_view_port(&mut self, view_port: Rect) {
        self.view_port = view_port;
        self.touch();
    }

    /// Receive notifications for every subsequent mutation.
    pub fn subscribe(&mut self) -> Receiver<DocumentEvent> {
        let (tx, rx) = channel();
        self.observers.push(tx);
        rx
    }

    // Scraps /////////////////////////////////////////////////////////////////

    /// Add a scrap. Fails without side effects if the id is already present
    /// or the committed frame is invalid.
    pub fn add_scrap(&mut self, scrap: Scrap) -> EngineResult<()> {
        let id = scrap.id();
        scrap.committed_frame().validated()?;
        match self.scraps.entry(id) {
            Entry::Occupied(_) => return Err(EngineError::DuplicateIdentity(id)),
            Entry::Vacant(slot) => {
                slot.insert(ScrapEntry {
                    seq: self.next_seq,
                    scrap,
                });
            }
        }
        self.next_seq += 1;
        self.touch();
        self.notify(DocumentEvent::ScrapAdded(id));
        Ok(())
    }

    pub fn remove_scrap(&mut self, id: ScrapId) -> Option<Scrap> {
        let entry = self.scraps.remove(&id)?;
        self.touch();
        self.notify(DocumentEvent::ScrapRemoved(id));
        Some(entry.scrap)
    }

    pub fn scrap(&self, id: ScrapId) -> Option<&Scrap> {
        self.scraps.get(&id).map(|e| &e.scrap)
    }

    pub fn scrap_mut(&mut self, id: ScrapId) -> Option<&mut Scrap> {
        self.scraps.get_mut(&id).map(|e| &mut e.scrap)
    }

    pub fn contains_scrap(&self, id: ScrapId) -> bool {
        self.scraps.contains_key(&id)
    }

    pub fn scrap_count(&self) -> usize {
        self.scraps.len()
    }

    /// Scraps back to front: by z, then by insertion.
    pub fn scraps_ordered(&self) -> Vec<&Scrap> {
        let mut entries: Vec<&ScrapEntry> = self.scraps.values().collect();
        entries.sort_by_key(|e| (e.scrap.committed_frame().z, e.seq));
        entries.into_iter().map(|e| &e.scrap).collect()
    }

    /// Largest z among the scraps, or 0 for an empty board.
    pub fn highest_z(&self) -> i64 {
        self.scraps
            .values()
            .map(|e| e.scrap.committed_frame().z)
            .max()
            .unwrap_or(0)
    }

    /// The top-most scrap whose bounds contain `point` (model space).
    pub fn scrap_at(&self, point: Point) -> Option<ScrapId> {
        self.scraps_ordered()
            .into_iter()
            .rev()
            .find(|s| s.frame().bounds().contains(point))
            .map(Scrap::id)
    }

    /// Commit a frame for a scrap. Returns `false` if the scrap is unknown.
    pub fn set_scrap_frame(&mut self, id: ScrapId, frame: Frame) -> EngineResult<bool> {
        let frame = frame.validated()?;
        let Some(entry) = self.scraps.get(&id) else {
            return Ok(false);
        };
        entry.scrap.frame_handle().commit(frame);
        self.touch();
        Ok(true)
    }

    // Strokes ////////////////////////////////////////////////////////////////

    pub fn strokes(&self) -> &[SketchStroke] {
        &self.strokes
    }

    pub fn push_stroke(&mut self, stroke: SketchStroke) {
        self.strokes.push(stroke);
        self.touch();
        self.notify(DocumentEvent::StrokePushed);
    }

    pub fn pop_stroke(&mut self) -> EngineResult<SketchStroke> {
        let stroke = self
            .strokes
            .pop()
            .ok_or(EngineError::EmptyCollection("strokes"))?;
        self.touch();
        self.notify(DocumentEvent::StrokePopped);
        Ok(stroke)
    }

    pub fn remove_all_strokes(&mut self) {
        self.strokes.clear();
        self.touch();
        self.notify(DocumentEvent::StrokesCleared);
    }

    // Misc ///////////////////////////////////////////////////////////////////

    pub fn is_blank(&self) -> bool {
        self.scraps.is_empty() && self.strokes.is_empty()
    }

    /// Hash of everything that is persisted as content: scrap ids, committed
    /// frames, scrap content and free strokes.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for scrap in self.scraps_ordered() {
            scrap.id().hash(&mut hasher);
            let f = scrap.committed_frame();
            for v in [f.x, f.y, f.scale_x, f.scale_y, f.rotation, f.width, f.height] {
                v.to_bits().hash(&mut hasher);
            }
            f.z.hash(&mut hasher);
            scrap.content_fingerprint().hash(&mut hasher);
        }
        self.strokes.len().hash(&mut hasher);
        for stroke in &self.strokes {
            stroke.len().hash(&mut hasher);
            let b = stroke.bounds();
            for v in [b.x0, b.y0, b.x1, b.y1] {
                v.to_bits().hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn touch(&mut self) {
        self.modified_at = now_millis().max(self.modified_at);
    }

    fn notify(&mut self, event: DocumentEvent) {
        self.observers.retain(|tx| tx.send(event).is_ok());
    }
}

impl Clone for Whiteboard {
    /// Deep copy of the content. Observers are not carried over.
    fn clone(&self) -> Self {
        WhiteboardRecord::from_ref(self).into()
    }
}

impl WhiteboardRecord {
    fn from_ref(board: &Whiteboard) -> Self {
        Self {
            id: board.id,
            uuid: board.uuid,
            created_at: board.created_at,
            modified_at: board.modified_at,
            width: board.size.width,
            height: board.size.height,
            thumbnail: board.thumbnail.clone(),
            view_port: board.view_port,
            scraps: board.scraps_ordered().into_iter().cloned().collect(),
            strokes: board.strokes.clone(),
        }
    }
}

impl From<Whiteboard> for WhiteboardRecord {
    fn from(board: Whiteboard) -> Self {
        Self::from_ref(&board)
    }
}

impl From<WhiteboardRecord> for Whiteboard {
    fn from(record: WhiteboardRecord) -> Self {
        let mut scraps = HashMap::with_capacity(record.scraps.len());
        let mut next_seq = 0;
        for scrap in record.scraps {
            scraps.insert(scrap.id(), ScrapEntry { seq: next_seq, scrap });
            next_seq += 1;
        }
        Self {
            id: record.id,
            uuid: record.uuid,
            created_at: record.created_at,
            modified_at: record.modified_at,
            size: Size::new(record.width, record.height),
            thumbnail: record.thumbnail,
            view_port: record.view_port,
            scraps,
            next_seq,
            strokes: record.strokes,
            observers: Vec::new(),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
