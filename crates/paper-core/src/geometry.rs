//! Pure geometry helpers for pointer math.

use crate::error::{EngineError, EngineResult};
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Squared length below which two pointers are treated as coincident.
const MIN_POINTER_SPAN_SQ: f64 = 1e-12;

/// Turn direction of three points.
///
/// Uses a y-up convention: a positive cross product is counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
    Collinear,
}

impl Orientation {
    /// The orientation seen when the order of the points is mirrored.
    pub fn reversed(self) -> Self {
        match self {
            Orientation::Clockwise => Orientation::CounterClockwise,
            Orientation::CounterClockwise => Orientation::Clockwise,
            Orientation::Collinear => Orientation::Collinear,
        }
    }
}

/// Orientation of `p3` relative to the directed line `p1 -> p2`.
pub fn orientation(p1: Point, p2: Point, p3: Point) -> Orientation {
    let cross = (p2 - p1).cross(p3 - p1);
    if cross > 0.0 {
        Orientation::CounterClockwise
    } else if cross < 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::Collinear
    }
}

/// Two-finger transform decomposed into translation, scale and rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinchTransform {
    /// Translation of the pointer midpoint.
    pub translation: Vec2,
    /// Uniform scale change.
    pub scale: f64,
    /// Rotation change in radians.
    pub rotation: f64,
    /// Midpoint of the two start pointers.
    pub pivot: Point,
}

impl PinchTransform {
    /// A transform that changes nothing.
    pub const IDENTITY: Self = Self {
        translation: Vec2::ZERO,
        scale: 1.0,
        rotation: 0.0,
        pivot: Point::ZERO,
    };

    /// Pure translation, as produced by a single pointer.
    pub fn pan(start: Point, stop: Point) -> Self {
        Self {
            translation: stop - start,
            pivot: start,
            ..Self::IDENTITY
        }
    }

    /// Scale about the pivot followed by translation. Rotation is ignored.
    pub fn zoom_pan(&self) -> Affine {
        Affine::translate(self.translation) * Affine::scale_about(self.scale, self.pivot)
    }
}

/// Decompose the motion of two pointers into a [`PinchTransform`].
///
/// Only the first two entries of each slice are used. Fewer than two
/// pointers, or coincident start pointers, are rejected since both indicate a
/// gesture-detection bug upstream.
pub fn pinch_transform(start: &[Point], stop: &[Point]) -> EngineResult<PinchTransform> {
    if start.len() < 2 || stop.len() < 2 {
        return Err(EngineError::InvalidArgument(format!(
            "pinch needs two pointers, got {} start and {} stop",
            start.len(),
            stop.len()
        )));
    }

    if !start[..2].iter().chain(&stop[..2]).all(|p| p.is_finite()) {
        return Err(EngineError::InvalidArgument(
            "pinch pointers must be finite".to_string(),
        ));
    }

    let start_vec = start[1] - start[0];
    let stop_vec = stop[1] - stop[0];
    if start_vec.hypot2() < MIN_POINTER_SPAN_SQ {
        return Err(EngineError::InvalidArgument(
            "pinch start pointers are coincident".to_string(),
        ));
    }

    let start_pivot = start[0].midpoint(start[1]);
    let stop_pivot = stop[0].midpoint(stop[1]);

    Ok(PinchTransform {
        translation: stop_pivot - start_pivot,
        scale: stop_vec.hypot() / start_vec.hypot(),
        rotation: stop_vec.atan2() - start_vec.atan2(),
        pivot: start_pivot,
    })
}

/// Maps between view pixels and model units.
///
/// Implementations depend on the current layout (padding, view-port), so the
/// canvas supplies one per call rather than the interpreter owning one.
pub trait CoordinateMapper {
    fn view_to_model(&self, point: Point) -> Point;
    fn model_to_view(&self, point: Point) -> Point;
}

/// An affine is read as the model-to-view transform.
impl CoordinateMapper for Affine {
    fn view_to_model(&self, point: Point) -> Point {
        self.inverse() * point
    }

    fn model_to_view(&self, point: Point) -> Point {
        *self * point
    }
}
