//! Low-level pointer gestures delivered by the platform gesture detector.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Discriminant of a [`GestureEvent`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureKind {
    TouchBegin,
    TouchEnd,
    Tap,
    DragBegin,
    OnDrag,
    DragEnd,
    PinchBegin,
    OnPinch,
    PinchEnd,
}

/// One event of a touch sequence, in view-pixel coordinates unless it has
/// been mapped.
///
/// Drag events carry the original down point as `start` for the whole
/// sequence; `stop` is the latest pointer position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureEvent {
    TouchBegin,
    TouchEnd,
    Tap { down: Point },
    DragBegin { start: Point },
    OnDrag { start: Point, stop: Point },
    DragEnd { start: Point, stop: Point },
    PinchBegin { start: Vec<Point>, stop: Vec<Point> },
    OnPinch { start: Vec<Point>, stop: Vec<Point> },
    PinchEnd { start: Vec<Point>, stop: Vec<Point> },
}

impl GestureEvent {
    pub fn kind(&self) -> GestureKind {
        match self {
            GestureEvent::TouchBegin => GestureKind::TouchBegin,
            GestureEvent::TouchEnd => GestureKind::TouchEnd,
            GestureEvent::Tap { .. } => GestureKind::Tap,
            GestureEvent::DragBegin { .. } => GestureKind::DragBegin,
            GestureEvent::OnDrag { .. } => GestureKind::OnDrag,
            GestureEvent::DragEnd { .. } => GestureKind::DragEnd,
            GestureEvent::PinchBegin { .. } => GestureKind::PinchBegin,
            GestureEvent::OnPinch { .. } => GestureKind::OnPinch,
            GestureEvent::PinchEnd { .. } => GestureKind::PinchEnd,
        }
    }

    /// Apply `f` to every coordinate carried by the event.
    pub fn map_points(&self, f: impl Fn(Point) -> Point) -> GestureEvent {
        let map_all = |points: &[Point]| points.iter().map(|&p| f(p)).collect::<Vec<_>>();
        match self {
            GestureEvent::TouchBegin => GestureEvent::TouchBegin,
            GestureEvent::TouchEnd => GestureEvent::TouchEnd,
            GestureEvent::Tap { down } => GestureEvent::Tap { down: f(*down) },
            GestureEvent::DragBegin { start } => GestureEvent::DragBegin { start: f(*start) },
            GestureEvent::OnDrag { start, stop } => GestureEvent::OnDrag {
                start: f(*start),
                stop: f(*stop),
            },
            GestureEvent::DragEnd { start, stop } => GestureEvent::DragEnd {
                start: f(*start),
                stop: f(*stop),
            },
            GestureEvent::PinchBegin { start, stop } => GestureEvent::PinchBegin {
                start: map_all(start),
                stop: map_all(stop),
            },
            GestureEvent::OnPinch { start, stop } => GestureEvent::OnPinch {
                start: map_all(start),
                stop: map_all(stop),
            },
            GestureEvent::PinchEnd { start, stop } => GestureEvent::PinchEnd {
                start: map_all(start),
                stop: map_all(stop),
            },
        }
    }
}

/// Coarse gesture type remembered within one touch sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureRecord {
    Tap,
    Drag,
    Pinch,
}

/// Number of records a [`GestureHistory`] keeps.
pub const GESTURE_HISTORY_LEN: usize = 8;

/// Short rolling history of the gestures seen since the last touch-begin.
/// Only the latest [`GESTURE_HISTORY_LEN`] records are kept.
#[derive(Debug, Clone, Default)]
pub struct GestureHistory {
    records: Vec<GestureRecord>,
}

impl GestureHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn push(&mut self, record: GestureRecord) {
        if self.records.len() == GESTURE_HISTORY_LEN {
            self.records.remove(0);
        }
        self.records.push(record);
    }

    pub fn contains(&self, record: GestureRecord) -> bool {
        self.records.contains(&record)
    }

    pub fn records(&self) -> &[GestureRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_points_drag() {
        let event = GestureEvent::OnDrag {
            start: Point::new(1.0, 2.0),
            stop: Point::new(3.0, 4.0),
        };
        let mapped = event.map_points(|p| Point::new(p.x * 2.0, p.y * 2.0));
        assert_eq!(
            mapped,
            GestureEvent::OnDrag {
                start: Point::new(2.0, 4.0),
                stop: Point::new(6.0, 8.0),
            }
        );
    }

    #[test]
    fn test_map_points_pinch() {
        let event = GestureEvent::OnPinch {
            start: vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)],
            stop: vec![Point::new(0.0, 1.0), Point::new(1.0, 1.0)],
        };
        let mapped = event.map_points(|p| Point::new(p.x + 10.0, p.y));
        let GestureEvent::OnPinch { start, stop } = mapped else {
            panic!("kind changed");
        };
        assert_eq!(start[1], Point::new(11.0, 0.0));
        assert_eq!(stop[0], Point::new(10.0, 1.0));
    }

    #[test]
    fn test_history() {
        let mut history = GestureHistory::new();
        history.push(GestureRecord::Drag);
        history.push(GestureRecord::Pinch);
        assert!(history.contains(GestureRecord::Pinch));
        history.clear();
        assert!(!history.contains(GestureRecord::Pinch));
        assert!(history.records().is_empty());
    }

    #[test]
    fn test_history_keeps_latest_records() {
        let mut history = GestureHistory::new();
        history.push(GestureRecord::Pinch);
        for _ in 0..GESTURE_HISTORY_LEN {
            history.push(GestureRecord::Tap);
        }
        assert_eq!(history.records().len(), GESTURE_HISTORY_LEN);
        assert!(!history.contains(GestureRecord::Pinch));

        history.push(GestureRecord::Drag);
        assert_eq!(history.records().len(), GESTURE_HISTORY_LEN);
        assert_eq!(history.records().last(), Some(&GestureRecord::Drag));
    }

    #[test]
    fn test_json_format() {
        let event: GestureEvent =
            serde_json::from_str(r#"{"type":"drag_begin","start":{"x":1.0,"y":2.0}}"#).unwrap();
        assert_eq!(event, GestureEvent::DragBegin { start: Point::new(1.0, 2.0) });
        assert_eq!(event.kind(), GestureKind::DragBegin);
    }
}
