//! Moving an existing scrap with one pointer.

use super::{Manipulator, ManipulatorPhase, ManipulatorStep};
use crate::command::WhiteboardCommand;
use crate::frame::Frame;
use crate::gesture::GestureEvent;
use crate::scrap::{ScrapId, SharedFrame};
use crate::widget::{ScrapWidget, WidgetManager};
use kurbo::Point;
use std::sync::Arc;

/// Drags one scrap, previewing through the frame displacement and
/// committing once on drag-end.
///
/// The displacement is always `stop - start` of the current event, where
/// `start` is the original down point, so a missed intermediate event does
/// not skew the result.
#[derive(Debug)]
pub struct DragManipulator {
    scrap_id: ScrapId,
    frame: Arc<SharedFrame>,
    phase: ManipulatorPhase,
    start_frame: Frame,
    widget: Option<Arc<ScrapWidget>>,
}

impl DragManipulator {
    pub fn new(scrap_id: ScrapId, frame: Arc<SharedFrame>) -> Self {
        let start_frame = frame.committed();
        Self {
            scrap_id,
            frame,
            phase: ManipulatorPhase::NotStarted,
            start_frame,
            widget: None,
        }
    }

    fn displacement(start: Point, stop: Point) -> Frame {
        Frame::translation(stop - start)
    }

    fn begin(&mut self, widgets: &WidgetManager) -> ManipulatorStep {
        self.start_frame = self.frame.committed();
        self.widget = widgets.get(self.scrap_id);
        if let Some(widget) = &self.widget {
            widget.mark_busy();
        }
        self.phase = ManipulatorPhase::Running;
        log::debug!("drag started on scrap {}", self.scrap_id);
        ManipulatorStep::Continue
    }

    fn finish(&mut self, phase: ManipulatorPhase) {
        self.phase = phase;
        if let Some(widget) = self.widget.take() {
            widget.mark_not_busy();
        }
    }

    fn abort(&mut self) -> ManipulatorStep {
        self.frame.clear_displacement();
        self.finish(ManipulatorPhase::Aborted);
        log::debug!("drag on scrap {} aborted", self.scrap_id);
        ManipulatorStep::Aborted
    }
}

impl Manipulator for DragManipulator {
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
                    "dropping late {:?} for finished drag on scrap {}",
                    event.kind(),
                    self.scrap_id
                );
                ManipulatorStep::Ignored
            }
            (ManipulatorPhase::NotStarted, GestureEvent::DragBegin { .. }) => self.begin(widgets),
            (ManipulatorPhase::NotStarted, _) => {
                // Not a drag sequence at all.
                self.phase = ManipulatorPhase::Aborted;
                ManipulatorStep::Aborted
            }
            (ManipulatorPhase::Running, GestureEvent::OnDrag { start, stop }) => {
                self.frame.set_displacement(Self::displacement(*start, *stop));
                ManipulatorStep::Continue
            }
            (ManipulatorPhase::Running, GestureEvent::DragEnd { start, stop }) => {
                let delta = Self::displacement(*start, *stop);
                self.frame.commit(self.start_frame.add(delta));
                self.finish(ManipulatorPhase::Committed);
                log::debug!("drag on scrap {} committed", self.scrap_id);
                ManipulatorStep::Committed(WhiteboardCommand::UpdateScrapFrame {
                    scrap_id: self.scrap_id,
                    from: self.start_frame,
                    delta,
                })
            }
            (ManipulatorPhase::Running, _) => self.abort(),
        }
    }

    fn cancel(&mut self) {
        if !self.phase.is_terminal() {
            self.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrap::Scrap;
    use kurbo::{Size, Vec2};
    use uuid::Uuid;

    fn setup() -> (Scrap, WidgetManager) {
        let scrap = Scrap::sketch(
            Uuid::new_v4(),
            Frame::new(Point::ZERO, Size::new(10.0, 10.0), 1),
        );
        let mut widgets = WidgetManager::new();
        widgets.create(&scrap).unwrap();
        (scrap, widgets)
    }

    #[test]
    fn test_delta_is_relative_to_down_point() {
        let (scrap, widgets) = setup();
        let mut drag = DragManipulator::new(scrap.id(), scrap.frame_handle());
        let down = Point::new(10.0, 10.0);

        assert_eq!(drag.handle(&GestureEvent::DragBegin { start: down }, &widgets), ManipulatorStep::Continue);
        assert_eq!(widgets.state(scrap.id()), crate::widget::WidgetState::Busy);

        drag.handle(&GestureEvent::OnDrag { start: down, stop: Point::new(15.0, 12.0) }, &widgets);
        assert_eq!(scrap.frame().position(), Point::new(5.0, 2.0));
        assert_eq!(scrap.committed_frame().position(), Point::ZERO);

        let step = drag.handle(&GestureEvent::DragEnd { start: down, stop: Point::new(20.0, 10.0) }, &widgets);
        let ManipulatorStep::Committed(WhiteboardCommand::UpdateScrapFrame { delta, from, .. }) = step else {
            panic!("expected a frame update, got {step:?}");
        };
        assert_eq!(delta, Frame::translation(Vec2::new(10.0, 0.0)));
        assert_eq!(from.position(), Point::ZERO);
        assert_eq!(scrap.committed_frame().position(), Point::new(10.0, 0.0));
        assert_eq!(scrap.frame_handle().displacement(), Frame::ZERO_DISPLACEMENT);
        assert_eq!(drag.phase(), ManipulatorPhase::Committed);
        assert!(!widgets.get(scrap.id()).unwrap().is_busy());
    }

    #[test]
    fn test_pinch_interrupt_aborts_without_change() {
        let (scrap, widgets) = setup();
        let before = scrap.frame();
        let mut drag = DragManipulator::new(scrap.id(), scrap.frame_handle());
        let down = Point::new(1.0, 1.0);

        drag.handle(&GestureEvent::DragBegin { start: down }, &widgets);
        drag.handle(&GestureEvent::OnDrag { start: down, stop: Point::new(30.0, 30.0) }, &widgets);
        let step = drag.handle(
            &GestureEvent::PinchBegin {
                start: vec![Point::ZERO, Point::new(5.0, 5.0)],
                stop: vec![Point::ZERO, Point::new(6.0, 6.0)],
            },
            &widgets,
        );
        assert_eq!(step, ManipulatorStep::Aborted);
        assert_eq!(scrap.frame(), before);
        assert_eq!(drag.phase(), ManipulatorPhase::Aborted);
    }

    #[test]
    fn test_non_drag_sequence_is_ignored() {
        let (scrap, widgets) = setup();
        let mut drag = DragManipulator::new(scrap.id(), scrap.frame_handle());
        assert_eq!(
            drag.handle(&GestureEvent::Tap { down: Point::ZERO }, &widgets),
            ManipulatorStep::Aborted
        );
        assert!(drag.is_terminal());
    }

    #[test]
    fn test_late_events_are_dropped() {
        let (scrap, widgets) = setup();
        let mut drag = DragManipulator::new(scrap.id(), scrap.frame_handle());
        let down = Point::ZERO;
        drag.handle(&GestureEvent::DragBegin { start: down }, &widgets);
        drag.handle(&GestureEvent::DragEnd { start: down, stop: Point::new(3.0, 0.0) }, &widgets);

        let step = drag.handle(&GestureEvent::OnDrag { start: down, stop: Point::new(50.0, 50.0) }, &widgets);
        assert_eq!(step, ManipulatorStep::Ignored);
        assert_eq!(scrap.frame().position(), Point::new(3.0, 0.0));
    }

    #[test]
    fn test_cancel_clears_preview() {
        let (scrap, widgets) = setup();
        let mut drag = DragManipulator::new(scrap.id(), scrap.frame_handle());
        let down = Point::ZERO;
        drag.handle(&GestureEvent::DragBegin { start: down }, &widgets);
        drag.handle(&GestureEvent::OnDrag { start: down, stop: Point::new(4.0, 4.0) }, &widgets);
        drag.cancel();
        assert_eq!(scrap.frame().position(), Point::ZERO);
        assert_eq!(drag.phase(), ManipulatorPhase::Aborted);
        assert_eq!(drag.poll(&widgets), ManipulatorStep::Ignored);
    }
}
