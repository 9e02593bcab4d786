//! Sketching a stroke into a freshly created scrap.

use super::{Manipulator, ManipulatorPhase, ManipulatorStep};
use crate::gesture::GestureEvent;
use crate::scrap::ScrapId;
use crate::stroke::PenStyle;
use crate::widget::{ScrapWidget, WidgetManager};
use kurbo::Point;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug)]
enum Target {
    /// The widget has not been created yet. Points pile up here.
    Waiting { buffered: Vec<Point>, finishing: bool },
    Attached(Arc<ScrapWidget>),
}

/// Streams drag points into the widget of a new scrap.
///
/// The scrap is added to the document before this manipulator starts, but its
/// widget only appears once the document notification has been processed.
/// Until then points are buffered; if the widget does not show up before the
/// deadline the sequence aborts.
#[derive(Debug)]
pub struct SketchManipulator {
    scrap_id: ScrapId,
    pen: PenStyle,
    origin: Point,
    phase: ManipulatorPhase,
    wait_timeout: Duration,
    deadline: Option<Instant>,
    /// Stroke simplification tolerance in model units; 0 keeps every point.
    tolerance: f64,
    target: Target,
}

impl SketchManipulator {
    pub fn new(scrap_id: ScrapId, pen: PenStyle, wait_timeout: Duration) -> Self {
        Self {
            scrap_id,
            pen,
            origin: Point::ZERO,
            phase: ManipulatorPhase::NotStarted,
            wait_timeout,
            deadline: None,
            tolerance: 0.0,
            target: Target::Waiting {
                buffered: Vec::new(),
                finishing: false,
            },
        }
    }

    pub fn with_simplify_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.max(0.0);
        self
    }

    /// Whether points still go to the buffer.
    pub fn is_waiting(&self) -> bool {
        matches!(self.target, Target::Waiting { .. })
    }

    /// Drag-end was seen but the widget is still missing.
    pub fn is_finishing(&self) -> bool {
        matches!(self.target, Target::Waiting { finishing: true, .. })
    }

    fn relative(&self, point: Point) -> Point {
        (point - self.origin).to_point()
    }

    fn push(&mut self, point: Point) {
        let point = self.relative(point);
        match &mut self.target {
            Target::Waiting { buffered, .. } => buffered.push(point),
            Target::Attached(widget) => widget.sketch_to(point),
        }
    }

    /// Attach to the widget if it exists, then finish if drag-end was seen.
    fn advance(&mut self, widgets: &WidgetManager) -> ManipulatorStep {
        if let Target::Waiting { buffered, finishing } = &mut self.target {
            let Some(widget) = widgets.get(self.scrap_id) else {
                return self.check_deadline();
            };
            if let Err(err) = widget.begin_sketch(self.pen) {
                log::error!("cannot sketch into scrap {}: {err}", self.scrap_id);
                return self.abort();
            }
            widget.mark_busy();
            for point in buffered.drain(..) {
                widget.sketch_to(point);
            }
            let finishing = *finishing;
            log::debug!("sketch attached to widget of scrap {}", self.scrap_id);
            self.target = Target::Attached(widget);
            if finishing {
                return self.commit();
            }
        }
        ManipulatorStep::Continue
    }

    fn check_deadline(&mut self) -> ManipulatorStep {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                log::warn!(
                    "widget for scrap {} did not appear within {:?}",
                    self.scrap_id,
                    self.wait_timeout
                );
                self.abort()
            }
            _ => ManipulatorStep::Continue,
        }
    }

    fn commit(&mut self) -> ManipulatorStep {
        let Target::Attached(widget) = &self.target else {
            return ManipulatorStep::Continue;
        };
        let command = widget.end_sketch(self.tolerance);
        widget.mark_not_busy();
        match command {
            Some(command) => {
                self.phase = ManipulatorPhase::Committed;
                log::debug!("sketch into scrap {} committed", self.scrap_id);
                ManipulatorStep::Committed(command)
            }
            None => {
                self.phase = ManipulatorPhase::Aborted;
                ManipulatorStep::Aborted
            }
        }
    }

    fn abort(&mut self) -> ManipulatorStep {
        if let Target::Attached(widget) = &self.target {
            widget.cancel_sketch();
            widget.mark_not_busy();
        }
        self.phase = ManipulatorPhase::Aborted;
        log::debug!("sketch into scrap {} aborted", self.scrap_id);
        ManipulatorStep::Aborted
    }
}

impl Manipulator for SketchManipulator {
    fn scrap_id(&self) -> ScrapId {
        self.scrap_id
    }

    fn phase(&self) -> ManipulatorPhase {
        self.phase
    }

    fn handle(&mut self, event: &GestureEvent, widgets: &WidgetManager) -> ManipulatorStep {
        match (self.phase, event) {
            (ManipulatorPhase::Committed | ManipulatorPhase::Aborted, _) => {
                log::warn!(
                    "dropping late {:?} for finished sketch on scrap {}",
                    event.kind(),
                    self.scrap_id
                );
                ManipulatorStep::Ignored
            }
            (ManipulatorPhase::NotStarted, GestureEvent::DragBegin { start }) => {
                self.origin = *start;
                self.deadline = Some(Instant::now() + self.wait_timeout);
                self.phase = ManipulatorPhase::Running;
                self.push(*start);
                self.advance(widgets)
            }
            (ManipulatorPhase::NotStarted, _) => {
                self.phase = ManipulatorPhase::Aborted;
                ManipulatorStep::Aborted
            }
            (ManipulatorPhase::Running, _) if self.is_finishing() => {
                // The stroke is complete; only the widget is outstanding.
                log::debug!("sketch on scrap {} skips {:?} while finishing", self.scrap_id, event.kind());
                self.advance(widgets)
            }
            (ManipulatorPhase::Running, GestureEvent::OnDrag { stop, .. }) => {
                self.push(*stop);
                self.advance(widgets)
            }
            (ManipulatorPhase::Running, GestureEvent::DragEnd { stop, .. }) => {
                self.push(*stop);
                match &mut self.target {
                    Target::Waiting { finishing, .. } => {
                        *finishing = true;
                        self.advance(widgets)
                    }
                    Target::Attached(_) => self.commit(),
                }
            }
            (ManipulatorPhase::Running, _) => self.abort(),
        }
    }

    fn poll(&mut self, widgets: &WidgetManager) -> ManipulatorStep {
        match self.phase {
            ManipulatorPhase::Running => self.advance(widgets),
            ManipulatorPhase::NotStarted => ManipulatorStep::Continue,
            ManipulatorPhase::Committed | ManipulatorPhase::Aborted => ManipulatorStep::Ignored,
        }
    }

    fn cancel(&mut self) {
        if !self.phase.is_terminal() {
            self.abort();
        }
    }
}
