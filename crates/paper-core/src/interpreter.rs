//! Translation of sketch gestures into editor intents.

use crate::error::{EngineError, EngineResult};
use crate::frame::Frame;
use crate::geometry::CoordinateMapper;
use crate::gesture::GestureEvent;
use crate::scrap::ScrapId;
use kurbo::{Point, Size};
use uuid::Uuid;

/// Size of a freshly created sketch scrap before any stroke lands in it.
pub const NEW_SCRAP_SIZE: Size = Size::new(1.0, 1.0);

/// High-level editor intent produced from a gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// Events that must be applied together, in order.
    Group(Vec<DomainEvent>),
    ClearFocus,
    AddScrap { id: ScrapId, frame: Frame },
    FocusScrap(ScrapId),
    StartSketch(Point),
    DoSketch(Point),
    StopSketch,
}

impl DomainEvent {
    /// Expand nested groups into a flat, ordered list.
    pub fn flatten(events: Vec<DomainEvent>) -> Vec<DomainEvent> {
        let mut out = Vec::with_capacity(events.len());
        for event in events {
            match event {
                DomainEvent::Group(inner) => out.extend(Self::flatten(inner)),
                other => out.push(other),
            }
        }
        out
    }
}

/// Stateless gesture-to-intent translator for sketching on empty canvas.
///
/// Holds no state between calls, so independent gesture streams may share
/// one instance across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanvasGestureInterpreter;

impl CanvasGestureInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Interpret one drag event. `highest_z` is the current top of the stack.
    pub fn interpret(
        &self,
        event: &GestureEvent,
        mapper: &dyn CoordinateMapper,
        highest_z: i64,
    ) -> EngineResult<Vec<DomainEvent>> {
        self.interpret_with_id(event, mapper, highest_z, Uuid::new_v4())
    }

    /// Like [`interpret`](Self::interpret) with a caller-chosen id for the
    /// scrap a drag-begin creates.
    pub fn interpret_with_id(
        &self,
        event: &GestureEvent,
        mapper: &dyn CoordinateMapper,
        highest_z: i64,
        new_id: ScrapId,
    ) -> EngineResult<Vec<DomainEvent>> {
        match event {
            GestureEvent::DragBegin { start } => {
                let at = mapper.view_to_model(*start);
                let frame = Frame::new(at, NEW_SCRAP_SIZE, highest_z.saturating_add(1));
                Ok(vec![DomainEvent::Group(vec![
                    DomainEvent::ClearFocus,
                    DomainEvent::AddScrap { id: new_id, frame },
                    DomainEvent::FocusScrap(new_id),
                    DomainEvent::StartSketch(at),
                ])])
            }
            GestureEvent::OnDrag { stop, .. } => {
                Ok(vec![DomainEvent::DoSketch(mapper.view_to_model(*stop))])
            }
            GestureEvent::DragEnd { .. } => Ok(vec![DomainEvent::StopSketch, DomainEvent::ClearFocus]),
            other => Err(EngineError::UnsupportedGesture(other.kind())),
        }
    }
}
