//! Scraps: independently placed content on the canvas.

use crate::error::{EngineError, EngineResult};
use crate::frame::Frame;
use crate::stroke::SketchStroke;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use uuid::Uuid;

/// Unique identifier for scraps.
pub type ScrapId = Uuid;

/// Committed frame plus the live displacement of an in-flight gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub committed: Frame,
    pub displacement: Frame,
}

impl FrameState {
    /// What a renderer should draw: `committed + displacement`.
    pub fn current(&self) -> Frame {
        self.committed.add(self.displacement)
    }
}

/// Frame storage shared between the gesture thread and renderers.
///
/// Both halves of [`FrameState`] live behind one lock so a reader always sees
/// a displacement that belongs to the committed frame it is paired with.
#[derive(Debug)]
pub struct SharedFrame {
    state: RwLock<FrameState>,
}

impl SharedFrame {
    pub fn new(committed: Frame) -> Self {
        Self {
            state: RwLock::new(FrameState {
                committed,
                displacement: Frame::ZERO_DISPLACEMENT,
            }),
        }
    }

    /// Consistent copy of the committed frame and displacement.
    pub fn snapshot(&self) -> FrameState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn committed(&self) -> Frame {
        self.snapshot().committed
    }

    pub fn displacement(&self) -> Frame {
        self.snapshot().displacement
    }

    /// Committed frame composed with the live displacement.
    pub fn current(&self) -> Frame {
        self.snapshot().current()
    }

    /// Replace the live preview displacement without committing it.
    pub fn set_displacement(&self, displacement: Frame) {
        self.write(|state| state.displacement = displacement);
    }

    pub fn clear_displacement(&self) {
        self.set_displacement(Frame::ZERO_DISPLACEMENT);
    }

    /// Commit a new frame. Any live displacement is discarded with it.
    pub fn commit(&self, frame: Frame) {
        self.write(|state| {
            state.committed = frame;
            state.displacement = Frame::ZERO_DISPLACEMENT;
        });
    }

    fn write(&self, f: impl FnOnce(&mut FrameState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }
}

/// What a scrap displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScrapContent {
    /// Strokes in scrap-local coordinates.
    Sketch(Vec<SketchStroke>),
    Text(String),
}

impl ScrapContent {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match self {
            ScrapContent::Sketch(strokes) => {
                0u8.hash(&mut hasher);
                for stroke in strokes {
                    stroke.z.hash(&mut hasher);
                    stroke.pen.color.hash(&mut hasher);
                    stroke.pen.is_eraser.hash(&mut hasher);
                    stroke.pen.size.to_bits().hash(&mut hasher);
                    for p in stroke.points() {
                        p.position.x.to_bits().hash(&mut hasher);
                        p.position.y.to_bits().hash(&mut hasher);
                    }
                }
            }
            ScrapContent::Text(text) => {
                1u8.hash(&mut hasher);
                text.hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

#[derive(Serialize, Deserialize)]
struct ScrapRecord {
    id: ScrapId,
    frame: Frame,
    content: ScrapContent,
}

/// A positionable content unit owned by one whiteboard.
///
/// Equality and hashing follow the identity only, so they stay stable while
/// the frame or content changes.
#[derive(Debug, Serialize, Deserialize)]
#[serde(into = "ScrapRecord", try_from = "ScrapRecord")]
pub struct Scrap {
    id: ScrapId,
    frame: Arc<SharedFrame>,
    content: ScrapContent,
    fingerprint: Mutex<Option<u64>>,
}

impl Scrap {
    pub fn new(id: ScrapId, frame: Frame, content: ScrapContent) -> Self {
        Self {
            id,
            frame: Arc::new(SharedFrame::new(frame)),
            content,
            fingerprint: Mutex::new(None),
        }
    }

    /// An empty sketch scrap.
    pub fn sketch(id: ScrapId, frame: Frame) -> Self {
        Self::new(id, frame, ScrapContent::Sketch(Vec::new()))
    }

    pub fn text(id: ScrapId, frame: Frame, text: impl Into<String>) -> Self {
        Self::new(id, frame, ScrapContent::Text(text.into()))
    }

    pub fn id(&self) -> ScrapId {
        self.id
    }

    /// Committed frame plus live displacement.
    pub fn frame(&self) -> Frame {
        self.frame.current()
    }

    pub fn committed_frame(&self) -> Frame {
        self.frame.committed()
    }

    /// Handle for manipulators and renderers that outlive a borrow of the scrap.
    pub fn frame_handle(&self) -> Arc<SharedFrame> {
        Arc::clone(&self.frame)
    }

    pub fn content(&self) -> &ScrapContent {
        &self.content
    }

    /// Mutable access to the content. Invalidates the cached fingerprint.
    pub fn content_mut(&mut self) -> &mut ScrapContent {
        *self.fingerprint.get_mut().unwrap_or_else(PoisonError::into_inner) = None;
        &mut self.content
    }

    /// Append a stroke to a sketch scrap. Returns `false` for other content.
    pub fn push_stroke(&mut self, stroke: SketchStroke) -> bool {
        match self.content_mut() {
            ScrapContent::Sketch(strokes) => {
                strokes.push(stroke);
                true
            }
            ScrapContent::Text(_) => false,
        }
    }

    /// Hash of the content, computed once and cached until the content changes.
    pub fn content_fingerprint(&self) -> u64 {
        let mut cached = self.fingerprint.lock().unwrap_or_else(PoisonError::into_inner);
        *cached.get_or_insert_with(|| self.content.fingerprint())
    }
}

impl Clone for Scrap {
    fn clone(&self) -> Self {
        Self::new(self.id, self.committed_frame(), self.content.clone())
    }
}

impl PartialEq for Scrap {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Scrap {}

impl Hash for Scrap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl From<Scrap> for ScrapRecord {
    fn from(scrap: Scrap) -> Self {
        Self {
            id: scrap.id,
            frame: scrap.committed_frame(),
            content: scrap.content,
        }
    }
}

impl TryFrom<ScrapRecord> for Scrap {
    type Error = EngineError;

    fn try_from(record: ScrapRecord) -> EngineResult<Self> {
        Ok(Self::new(record.id, record.frame.validated()?, record.content))
    }
}
