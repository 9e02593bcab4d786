//! Scrap widget with live frame preview and stroke accumulation.

use crate::command::WhiteboardCommand;
use crate::error::{EngineError, EngineResult};
use crate::frame::Frame;
use crate::scrap::{Scrap, ScrapContent, ScrapId, SharedFrame};
use crate::stroke::{PenStyle, SketchStroke};
use kurbo::{Point, Rect};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// What kind of content the widget presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Sketch,
    Text,
}

#[derive(Debug, Default)]
struct SketchState {
    /// Committed strokes, scrap-local.
    strokes: Vec<SketchStroke>,
    /// Stroke being drawn, if any.
    current: Option<SketchStroke>,
}

/// Interactive view of one scrap.
#[derive(Debug)]
pub struct ScrapWidget {
    id: ScrapId,
    kind: WidgetKind,
    frame: Arc<SharedFrame>,
    busy: AtomicBool,
    sketch: Mutex<SketchState>,
}

impl ScrapWidget {
    pub fn new(scrap: &Scrap) -> Self {
        let (kind, strokes) = match scrap.content() {
            ScrapContent::Sketch(strokes) => (WidgetKind::Sketch, strokes.clone()),
            ScrapContent::Text(_) => (WidgetKind::Text, Vec::new()),
        };
        Self {
            id: scrap.id(),
            kind,
            frame: scrap.frame_handle(),
            busy: AtomicBool::new(false),
            sketch: Mutex::new(SketchState {
                strokes,
                current: None,
            }),
        }
    }

    pub fn id(&self) -> ScrapId {
        self.id
    }

    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    /// Frame to draw: committed plus live displacement.
    pub fn frame(&self) -> Frame {
        self.frame.current()
    }

    pub fn frame_handle(&self) -> &Arc<SharedFrame> {
        &self.frame
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn mark_busy(&self) {
        self.busy.store(true, Ordering::Release);
    }

    pub fn mark_not_busy(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn is_sketching(&self) -> bool {
        self.lock_sketch().current.is_some()
    }

    /// Start a stroke. Only sketch widgets accept strokes, one at a time.
    pub fn begin_sketch(&self, pen: PenStyle) -> EngineResult<()> {
        if self.kind != WidgetKind::Sketch {
            return Err(EngineError::IllegalLifecycleState(format!(
                "widget {} does not accept strokes",
                self.id
            )));
        }
        let mut sketch = self.lock_sketch();
        if sketch.current.is_some() {
            return Err(EngineError::IllegalLifecycleState(format!(
                "widget {} is already sketching",
                self.id
            )));
        }
        let z = i64::try_from(sketch.strokes.len()).unwrap_or(i64::MAX);
        sketch.current = Some(SketchStroke::new(pen, z));
        Ok(())
    }

    /// Append a point in scrap-local coordinates to the stroke in progress.
    pub fn sketch_to(&self, point: Point) {
        if let Some(stroke) = self.lock_sketch().current.as_mut() {
            stroke.add_point(point);
        }
    }

    /// Points of the stroke in progress.
    pub fn pending_points(&self) -> usize {
        self.lock_sketch().current.as_ref().map_or(0, SketchStroke::len)
    }

    /// Drop the stroke in progress.
    pub fn cancel_sketch(&self) {
        self.lock_sketch().current = None;
    }

    /// Finish the stroke in progress.
    ///
    /// Simplifies the stroke with `tolerance` (model units, 0 keeps every
    /// point), fits the scrap frame around all strokes and returns the
    /// resulting command. Returns `None` if nothing was drawn.
    pub fn end_sketch(&self, tolerance: f64) -> Option<WhiteboardCommand> {
        let mut sketch = self.lock_sketch();
        let mut stroke = sketch.current.take()?;
        if stroke.is_empty() {
            return None;
        }
        if tolerance > 0.0 {
            stroke.simplify(tolerance);
        }
        sketch.strokes.push(stroke);

        let local = sketch
            .strokes
            .iter()
            .map(SketchStroke::bounds)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO);
        let origin = local.origin().to_vec2();
        for stroke in &mut sketch.strokes {
            stroke.offset(-origin);
        }

        let committed = self.frame.committed();
        let frame = Frame {
            x: committed.x + origin.x * committed.scale_x,
            y: committed.y + origin.y * committed.scale_y,
            width: local.width(),
            height: local.height(),
            ..committed
        };
        self.frame.commit(frame);

        Some(WhiteboardCommand::AddScrap {
            scrap_id: self.id,
            frame,
            content: ScrapContent::Sketch(sketch.strokes.clone()),
        })
    }

    fn lock_sketch(&self) -> std::sync::MutexGuard<'_, SketchState> {
        self.sketch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;
    use uuid::Uuid;

    fn sketch_widget(at: Point) -> ScrapWidget {
        let scrap = Scrap::sketch(Uuid::new_v4(), Frame::new(at, Size::new(1.0, 1.0), 1));
        ScrapWidget::new(&scrap)
    }

    #[test]
    fn test_sketch_produces_fitted_frame() {
        let widget = sketch_widget(Point::new(100.0, 100.0));
        let pen = PenStyle { size: 2.0, ..PenStyle::default() };
        widget.begin_sketch(pen).unwrap();
        widget.sketch_to(Point::new(0.0, 0.0));
        widget.sketch_to(Point::new(10.0, -20.0));

        let Some(WhiteboardCommand::AddScrap { scrap_id, frame, content }) = widget.end_sketch(0.0) else {
            panic!("expected an add-scrap command");
        };
        assert_eq!(scrap_id, widget.id());
        // Local bounds are (-1, -21)..(11, 1).
        assert_eq!(frame.position(), Point::new(99.0, 79.0));
        assert_eq!(frame.size(), Size::new(12.0, 22.0));
        assert_eq!(frame.z, 1);
        assert_eq!(widget.frame(), frame);

        let ScrapContent::Sketch(strokes) = content else {
            panic!("expected sketch content");
        };
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].points()[0].position, Point::new(1.0, 21.0));
        assert!(!widget.is_sketching());
    }

    #[test]
    fn test_end_sketch_simplifies_stroke() {
        let widget = sketch_widget(Point::ZERO);
        widget.begin_sketch(PenStyle::default()).unwrap();
        for p in [(0.0, 0.0), (5.0, 0.1), (10.0, -0.1), (15.0, 0.0), (15.0, 10.0)] {
            widget.sketch_to(Point::new(p.0, p.1));
        }
        assert_eq!(widget.pending_points(), 5);

        let Some(WhiteboardCommand::AddScrap { content: ScrapContent::Sketch(strokes), .. }) =
            widget.end_sketch(0.5)
        else {
            panic!("expected a sketch commit");
        };
        assert_eq!(strokes[0].len(), 3);
    }

    #[test]
    fn test_double_begin_is_illegal() {
        let widget = sketch_widget(Point::ZERO);
        widget.begin_sketch(PenStyle::default()).unwrap();
        assert!(matches!(
            widget.begin_sketch(PenStyle::default()),
            Err(EngineError::IllegalLifecycleState(_))
        ));
    }

    #[test]
    fn test_text_widget_rejects_sketch() {
        let scrap = Scrap::text(Uuid::new_v4(), Frame::default(), "hi");
        let widget = ScrapWidget::new(&scrap);
        assert_eq!(widget.kind(), WidgetKind::Text);
        assert!(widget.begin_sketch(PenStyle::default()).is_err());
    }

    #[test]
    fn test_cancel_and_empty_end() {
        let widget = sketch_widget(Point::ZERO);
        assert!(widget.end_sketch(0.0).is_none());

        widget.begin_sketch(PenStyle::default()).unwrap();
        widget.sketch_to(Point::new(1.0, 1.0));
        assert_eq!(widget.pending_points(), 1);
        widget.cancel_sketch();
        assert!(widget.end_sketch(0.0).is_none());
    }

    #[test]
    fn test_busy_flag() {
        let widget = sketch_widget(Point::ZERO);
        widget.mark_busy();
        assert!(widget.is_busy());
        widget.mark_not_busy();
        assert!(!widget.is_busy());
    }
}
