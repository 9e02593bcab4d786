//! Sketch strokes and pen attributes.

use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Smallest pen size in model units.
pub const MIN_PEN_SIZE: f64 = 1.0;
/// Largest pen size in model units.
pub const MAX_PEN_SIZE: f64 = 60.0;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Pen attributes shared by every point of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenStyle {
    pub color: SerializableColor,
    pub is_eraser: bool,
    /// Pen size in model units.
    pub size: f64,
}

impl Default for PenStyle {
    fn default() -> Self {
        Self {
            color: SerializableColor::black(),
            is_eraser: false,
            size: 5.0,
        }
    }
}

impl PenStyle {
    /// Pen with the size clamped into the supported range.
    pub fn clamped(self) -> Self {
        Self {
            size: self.size.clamp(MIN_PEN_SIZE, MAX_PEN_SIZE),
            ..self
        }
    }
}

/// A stroke sample, optionally stamped with the time it was captured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<u64>,
}

impl From<Point> for StrokePoint {
    fn from(position: Point) -> Self {
        Self { position, time_ms: None }
    }
}

/// An ordered list of points drawn with one pen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SketchStroke {
    points: Vec<StrokePoint>,
    pub pen: PenStyle,
    pub z: i64,
    #[serde(skip)]
    bounds: OnceLock<Rect>,
}

impl PartialEq for SketchStroke {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points && self.pen == other.pen && self.z == other.z
    }
}

impl SketchStroke {
    pub fn new(pen: PenStyle, z: i64) -> Self {
        Self {
            points: Vec::new(),
            pen: pen.clamped(),
            z,
            bounds: OnceLock::new(),
        }
    }

    pub fn from_points(pen: PenStyle, z: i64, points: impl IntoIterator<Item = StrokePoint>) -> Self {
        let mut stroke = Self::new(pen, z);
        stroke.points.extend(points);
        stroke
    }

    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn add_point(&mut self, point: impl Into<StrokePoint>) {
        self.points.push(point.into());
        self.bounds = OnceLock::new();
    }

    /// Translate every point of the stroke.
    pub fn offset(&mut self, delta: Vec2) {
        for p in &mut self.points {
            p.position += delta;
        }
        self.bounds = OnceLock::new();
    }

    /// Bounding box of the points, inflated by half the pen size.
    pub fn bounds(&self) -> Rect {
        *self.bounds.get_or_init(|| {
            let mut iter = self.points.iter().map(|p| p.position);
            let Some(first) = iter.next() else {
                return Rect::ZERO;
            };
            let rect = iter.fold(Rect::from_points(first, first), |r, p| r.union_pt(p));
            let half = self.pen.size / 2.0;
            rect.inflate(half, half)
        })
    }

    /// Drop points that deviate less than `tolerance` from the simplified path.
    pub fn simplify(&mut self, tolerance: f64) {
        if self.points.len() < 3 {
            return;
        }
        self.points = rdp_simplify(&self.points, tolerance);
        self.bounds = OnceLock::new();
    }
}

/// Ramer-Douglas-Peucker line simplification.
fn rdp_simplify(points: &[StrokePoint], tolerance: f64) -> Vec<StrokePoint> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let mut max_dist = 0.0;
    let mut max_index = 0;
    for (i, p) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let dist = perpendicular_distance(p.position, first.position, last.position);
        if dist > max_dist {
            max_dist = dist;
            max_index = i;
        }
    }

    if max_dist > tolerance {
        let mut left = rdp_simplify(&points[..=max_index], tolerance);
        let right = rdp_simplify(&points[max_index..], tolerance);
        // The junction point is shared by both halves.
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

fn perpendicular_distance(point: Point, line_start: Point, line_end: Point) -> f64 {
    let line = line_end - line_start;
    let len_sq = line.hypot2();
    if len_sq < f64::EPSILON {
        return (point - line_start).hypot();
    }
    line.cross(point - line_start).abs() / len_sq.sqrt()
}
