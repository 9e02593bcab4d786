//! Scrap placement in model space.

use crate::error::{EngineError, EngineResult};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Position, scale, rotation, size and stacking order of a scrap.
///
/// A committed frame keeps `scale_x` and `scale_y` strictly positive. A frame
/// used as a displacement is a plain component-wise delta and may carry any
/// values, including zero scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Rotation in radians.
    pub rotation: f64,
    pub width: f64,
    pub height: f64,
    /// Stacking key. Ties are broken by insertion order in the document.
    pub z: i64,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            width: 0.0,
            height: 0.0,
            z: 0,
        }
    }
}

impl Frame {
    /// The displacement that changes nothing.
    pub const ZERO_DISPLACEMENT: Self = Self {
        x: 0.0,
        y: 0.0,
        scale_x: 0.0,
        scale_y: 0.0,
        rotation: 0.0,
        width: 0.0,
        height: 0.0,
        z: 0,
    };

    /// Unit-scale frame at a position with the given size and z.
    pub fn new(position: Point, size: Size, z: i64) -> Self {
        Self {
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
            z,
            ..Self::default()
        }
    }

    /// A pure translation displacement.
    pub fn translation(delta: Vec2) -> Self {
        Self {
            x: delta.x,
            y: delta.y,
            ..Self::ZERO_DISPLACEMENT
        }
    }

    /// Component-wise sum. Used to compose a committed frame with a live
    /// displacement without touching either.
    pub fn add(self, other: Frame) -> Frame {
        Frame {
            x: self.x + other.x,
            y: self.y + other.y,
            scale_x: self.scale_x + other.scale_x,
            scale_y: self.scale_y + other.scale_y,
            rotation: self.rotation + other.rotation,
            width: self.width + other.width,
            height: self.height + other.height,
            z: self.z + other.z,
        }
    }

    /// Component-wise negation.
    pub fn negate(self) -> Frame {
        Frame {
            x: -self.x,
            y: -self.y,
            scale_x: -self.scale_x,
            scale_y: -self.scale_y,
            rotation: -self.rotation,
            width: -self.width,
            height: -self.height,
            z: -self.z,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether the frame satisfies the committed-frame invariant: finite
    /// components and strictly positive scale.
    pub fn is_valid(&self) -> bool {
        let finite = [self.x, self.y, self.scale_x, self.scale_y, self.rotation, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        finite && self.scale_x > 0.0 && self.scale_y > 0.0
    }

    /// `Ok(self)` for a valid committed frame, `InvalidArgument` otherwise.
    pub fn validated(self) -> EngineResult<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(EngineError::InvalidArgument(format!(
                "committed frame needs finite values and positive scale, got {self:?}"
            )))
        }
    }

    /// Transform from scrap-local coordinates to model coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate((self.x, self.y))
            * Affine::rotate(self.rotation)
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }

    /// Axis-aligned bounds in model space.
    pub fn bounds(&self) -> Rect {
        let local = Rect::from_origin_size(Point::ZERO, self.size());
        self.transform().transform_rect_bbox(local)
    }
}
