//! View-port controller for pinch zoom and pan.
//!
//! The view-port is the visible part of the canvas in model units. Its size is
//! kept within `[min, max]` and its rectangle inside the canvas bounds.

use crate::error::{EngineError, EngineResult};
use crate::geometry::{CoordinateMapper, PinchTransform, pinch_transform};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use std::cell::Cell;

/// Default ratio between the largest and smallest view-port.
pub const VIEW_PORT_MIN_SCALE: f64 = 32.0;

/// Pinch scale below which an update is treated as collapsed and dropped.
const MIN_PINCH_SCALE: f64 = 1e-6;

/// State captured when a view-port gesture starts.
#[derive(Debug, Clone, Copy)]
struct Baseline {
    view_port: Rect,
    matrix: Affine,
}

/// Owns the view-port rectangle and the model-to-view matrix.
#[derive(Debug)]
pub struct ViewPortController {
    canvas_size: Size,
    view_size: Size,
    padding: f64,
    min_scale: f64,
    view_port: Rect,
    min: Size,
    max: Size,
    base: Size,
    /// View pixels per model unit when the whole canvas is visible.
    fit_scale: f64,
    /// Model-to-view matrix; `None` when it must be recomputed.
    matrix: Cell<Option<Affine>>,
    baseline: Option<Baseline>,
}

impl ViewPortController {
    pub fn new(canvas_size: Size, view_size: Size, padding: f64, min_scale: f64) -> EngineResult<Self> {
        if !(min_scale >= 1.0) {
            return Err(EngineError::InvalidArgument(format!(
                "view-port min scale must be at least 1, got {min_scale}"
            )));
        }
        let mut controller = Self {
            canvas_size: Size::ZERO,
            view_size,
            padding: padding.max(0.0),
            min_scale,
            view_port: Rect::ZERO,
            min: Size::ZERO,
            max: Size::ZERO,
            base: Size::ZERO,
            fit_scale: 1.0,
            matrix: Cell::new(None),
            baseline: None,
        };
        controller.set_canvas_size(canvas_size)?;
        Ok(controller)
    }

    /// Derive the size limits from a new canvas size and show all of it.
    pub fn set_canvas_size(&mut self, size: Size) -> EngineResult<()> {
        if !(size.width > 0.0 && size.height > 0.0) {
            return Err(EngineError::InvalidArgument(format!(
                "canvas size must be positive, got {}x{}",
                size.width, size.height
            )));
        }
        self.canvas_size = size;
        self.update_limits();
        self.reset();
        Ok(())
    }

    /// Change the layout of the view the canvas is drawn into. The
    /// view-port is reset to the new maximum.
    pub fn set_view_size(&mut self, view_size: Size, padding: f64) {
        self.view_size = view_size;
        self.padding = padding.max(0.0);
        self.update_limits();
        self.reset();
    }

    /// The largest view-port has the aspect ratio of the view space and just
    /// fits in the canvas; the smallest is `min_scale` times smaller.
    fn update_limits(&mut self) {
        let space = Size::new(
            self.view_size.width - 2.0 * self.padding,
            self.view_size.height - 2.0 * self.padding,
        );
        let canvas = self.canvas_size;
        if space.width > 0.0 && space.height > 0.0 {
            // Model units per view pixel with the largest view-port.
            let model_per_px = (canvas.width / space.width).min(canvas.height / space.height);
            self.max = Size::new(model_per_px * space.width, model_per_px * space.height);
            self.fit_scale = 1.0 / model_per_px;
        } else {
            log::warn!("view space {}x{} is empty, showing the whole canvas", space.width, space.height);
            self.max = canvas;
            self.fit_scale = 1.0;
        }
        self.min = Size::new(self.max.width / self.min_scale, self.max.height / self.min_scale);
        self.base = self.max;
    }

    /// Show the whole canvas again.
    pub fn reset(&mut self) {
        self.view_port = Rect::from_origin_size(Point::ZERO, self.max);
        self.baseline = None;
        self.matrix.set(None);
    }

    pub fn view_port(&self) -> Rect {
        self.view_port
    }

    /// Replace the view-port, constrained to the current limits.
    pub fn set_view_port(&mut self, view_port: Rect) -> Rect {
        self.view_port = constrain(view_port, self.canvas_bounds(), self.min, self.max);
        self.matrix.set(None);
        self.view_port
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas_size
    }

    pub fn canvas_bounds(&self) -> Rect {
        Rect::from_origin_size(Point::ZERO, self.canvas_size)
    }

    pub fn min_size(&self) -> Size {
        self.min
    }

    pub fn max_size(&self) -> Size {
        self.max
    }

    /// Zoom factor relative to the whole-canvas view.
    pub fn scale(&self) -> f64 {
        self.base.width / self.view_port.width()
    }

    /// Model-to-view transform, recomputed lazily.
    pub fn matrix(&self) -> Affine {
        if let Some(matrix) = self.matrix.get() {
            return matrix;
        }
        let matrix = Affine::translate(Vec2::new(self.padding, self.padding))
            * Affine::scale(self.fit_scale * self.scale())
            * Affine::translate(-self.view_port.origin().to_vec2());
        self.matrix.set(Some(matrix));
        matrix
    }

    pub fn is_updating(&self) -> bool {
        self.baseline.is_some()
    }

    /// Snapshot the view-port and matrix a gesture starts from.
    pub fn begin_update(&mut self) {
        self.baseline = Some(Baseline {
            view_port: self.view_port,
            matrix: self.matrix(),
        });
    }

    /// Apply a two-pointer update given in view pixels, relative to the
    /// gesture start. Rotation is ignored.
    pub fn on_update(&mut self, start: &[Point], stop: &[Point]) -> EngineResult<Rect> {
        let transform = pinch_transform(start, stop)?;
        Ok(self.apply(transform))
    }

    /// Apply a single-pointer pan given in view pixels.
    pub fn on_pan(&mut self, start: Point, stop: Point) -> Rect {
        self.apply(PinchTransform::pan(start, stop))
    }

    /// Finish the gesture; the current view-port stays.
    pub fn stop_update(&mut self) -> Rect {
        self.baseline = None;
        self.view_port
    }

    fn apply(&mut self, transform: PinchTransform) -> Rect {
        if self.baseline.is_none() {
            log::warn!("view-port update without begin, starting one now");
            self.begin_update();
        }
        let Some(baseline) = self.baseline else {
            return self.view_port;
        };
        if !(transform.scale.is_finite() && transform.scale >= MIN_PINCH_SCALE) || !transform.translation.is_finite()
        {
            log::warn!("dropping degenerate view-port update {transform:?}");
            return self.view_port;
        }

        let matrix = transform.zoom_pan() * baseline.matrix;
        let origin = matrix.inverse() * Point::new(self.padding, self.padding);
        let size = Size::new(
            baseline.view_port.width() / transform.scale,
            baseline.view_port.height() / transform.scale,
        );
        let candidate = Rect::from_origin_size(origin, size);
        self.set_view_port(candidate)
    }
}

impl CoordinateMapper for ViewPortController {
    fn view_to_model(&self, point: Point) -> Point {
        self.matrix().inverse() * point
    }

    fn model_to_view(&self, point: Point) -> Point {
        self.matrix() * point
    }
}

/// Clamp a candidate view-port into `[min, max]` and then into `bounds`.
///
/// Size is clamped first, symmetric about the candidate's center, then the
/// rectangle is translated into the bounds. A rectangle wider than the bounds
/// is pinned to the left edge, a taller one to the top edge.
pub fn constrain(candidate: Rect, bounds: Rect, min: Size, max: Size) -> Rect {
    let center = candidate.center();
    let width = candidate.width().clamp(min.width, max.width.max(min.width));
    let height = candidate.height().clamp(min.height, max.height.max(min.height));
    let mut rect = Rect::from_center_size(center, Size::new(width, height));

    if rect.x0 < bounds.x0 || rect.width() > bounds.width() {
        rect = rect + Vec2::new(bounds.x0 - rect.x0, 0.0);
    } else if rect.x1 > bounds.x1 {
        rect = rect + Vec2::new(bounds.x1 - rect.x1, 0.0);
    }
    if rect.y0 < bounds.y0 || rect.height() > bounds.height() {
        rect = rect + Vec2::new(0.0, bounds.y0 - rect.y0);
    } else if rect.y1 > bounds.y1 {
        rect = rect + Vec2::new(0.0, bounds.y1 - rect.y1);
    }
    rect
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn controller() -> ViewPortController {
        // 2 view pixels per model unit at full view.
        ViewPortController::new(Size::new(300.0, 200.0), Size::new(600.0, 400.0), 0.0, VIEW_PORT_MIN_SCALE)
            .unwrap()
    }

    fn assert_rect_close(a: Rect, b: Rect) {
        for (x, y) in [(a.x0, b.x0), (a.y0, b.y0), (a.x1, b.x1), (a.y1, b.y1)] {
            assert!((x - y).abs() < 1e-6, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn test_limits_from_canvas() {
        let vp = controller();
        assert_eq!(vp.max_size(), Size::new(300.0, 200.0));
        assert_eq!(vp.min_size(), Size::new(300.0 / 32.0, 200.0 / 32.0));
        assert_eq!(vp.view_port(), Rect::new(0.0, 0.0, 300.0, 200.0));
        assert!((vp.scale() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(ViewPortController::new(Size::ZERO, Size::new(1.0, 1.0), 0.0, 32.0).is_err());
        assert!(ViewPortController::new(Size::new(1.0, 1.0), Size::new(1.0, 1.0), 0.0, 0.5).is_err());
        let mut vp = controller();
        vp.begin_update();
        assert!(matches!(
            vp.on_update(&[Point::ZERO], &[Point::ZERO]),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_mapping_roundtrip() {
        let mut vp = ViewPortController::new(Size::new(300.0, 200.0), Size::new(620.0, 420.0), 10.0, 32.0).unwrap();
        assert_eq!(vp.view_to_model(Point::new(10.0, 10.0)), Point::ZERO);
        let model = vp.view_to_model(Point::new(210.0, 110.0));
        assert!((model.x - 100.0).abs() < EPS && (model.y - 50.0).abs() < EPS);

        vp.set_view_port(Rect::new(100.0, 50.0, 250.0, 150.0));
        let original = Point::new(123.0, 77.0);
        let back = vp.model_to_view(vp.view_to_model(original));
        assert!((back.x - original.x).abs() < 1e-9 && (back.y - original.y).abs() < 1e-9);
    }

    #[test]
    fn test_pinch_zoom_in_about_pivot() {
        let mut vp = controller();
        vp.begin_update();
        // Spread two pointers around view (300, 200), the canvas center.
        let start = [Point::new(250.0, 200.0), Point::new(350.0, 200.0)];
        let stop = [Point::new(200.0, 200.0), Point::new(400.0, 200.0)];
        let rect = vp.on_update(&start, &stop).unwrap();
        vp.stop_update();

        assert_rect_close(rect, Rect::new(75.0, 50.0, 225.0, 150.0));
        assert!((vp.scale() - 2.0).abs() < EPS);
        assert!(!vp.is_updating());
    }

    #[test]
    fn test_updates_are_relative_to_baseline() {
        let mut vp = controller();
        vp.begin_update();
        let start = [Point::new(250.0, 200.0), Point::new(350.0, 200.0)];
        vp.on_update(&start, &[Point::new(240.0, 200.0), Point::new(360.0, 200.0)]).unwrap();
        let rect = vp
            .on_update(&start, &[Point::new(200.0, 200.0), Point::new(400.0, 200.0)])
            .unwrap();
        assert_rect_close(rect, Rect::new(75.0, 50.0, 225.0, 150.0));
    }

    #[test]
    fn test_pan_moves_opposite_to_finger() {
        let mut vp = controller();
        vp.set_view_port(Rect::new(100.0, 50.0, 250.0, 150.0));
        vp.begin_update();
        // 4 view px per model unit at this zoom.
        let rect = vp.on_pan(Point::new(100.0, 100.0), Point::new(140.0, 80.0));
        assert_rect_close(rect, Rect::new(90.0, 55.0, 240.0, 155.0));
    }

    #[test]
    fn test_zoom_out_is_clamped_to_canvas() {
        let mut vp = controller();
        vp.begin_update();
        let start = [Point::new(200.0, 200.0), Point::new(400.0, 200.0)];
        let stop = [Point::new(290.0, 200.0), Point::new(310.0, 200.0)];
        let rect = vp.on_update(&start, &stop).unwrap();
        assert_rect_close(rect, Rect::new(0.0, 0.0, 300.0, 200.0));
    }

    #[test]
    fn test_collapsed_pinch_keeps_view_port() {
        let mut vp = controller();
        vp.begin_update();
        let start = [Point::new(250.0, 200.0), Point::new(350.0, 200.0)];
        let zoomed = vp
            .on_update(&start, &[Point::new(200.0, 200.0), Point::new(400.0, 200.0)])
            .unwrap();

        let rect = vp
            .on_update(&start, &[Point::new(300.0, 200.0), Point::new(300.0, 200.0)])
            .unwrap();
        assert_eq!(rect, zoomed);
        assert_eq!(vp.view_port(), zoomed);
        let model = vp.view_to_model(Point::new(10.0, 10.0));
        assert!(model.is_finite());
    }

    #[test]
    fn test_limits_follow_view_aspect() {
        // A square view over a 3:2 canvas: only a 200x200 part fits.
        let vp = ViewPortController::new(Size::new(300.0, 200.0), Size::new(600.0, 600.0), 0.0, 32.0).unwrap();
        assert_eq!(vp.max_size(), Size::new(200.0, 200.0));
        assert_eq!(vp.min_size(), Size::new(200.0 / 32.0, 200.0 / 32.0));
        assert_rect_close(vp.view_port(), Rect::new(0.0, 0.0, 200.0, 200.0));

        // The visible corners map onto the view-port corners.
        let bottom_right = vp.view_to_model(Point::new(600.0, 600.0));
        assert!((bottom_right.x - 200.0).abs() < EPS && (bottom_right.y - 200.0).abs() < EPS);
        let near_bottom = vp.view_to_model(Point::new(300.0, 590.0));
        assert!(vp.canvas_bounds().contains(near_bottom));
    }

    #[test]
    fn test_set_view_size_recomputes_limits() {
        let mut vp = controller();
        vp.set_view_port(Rect::new(10.0, 10.0, 60.0, 40.0));
        vp.set_view_size(Size::new(400.0, 800.0), 0.0);
        assert_eq!(vp.max_size(), Size::new(100.0, 200.0));
        assert_rect_close(vp.view_port(), Rect::new(0.0, 0.0, 100.0, 200.0));
        assert!((vp.scale() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_reset() {
        let mut vp = controller();
        vp.set_view_port(Rect::new(10.0, 10.0, 60.0, 40.0));
        vp.reset();
        assert_eq!(vp.view_port(), Rect::new(0.0, 0.0, 300.0, 200.0));
    }

    #[test]
    fn test_constrain_size_then_position() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let min = Size::new(10.0, 10.0);
        let max = Size::new(100.0, 100.0);

        // Too small, centered at (2, 2): grows to 10x10 then slides in.
        assert_eq!(
            constrain(Rect::new(1.0, 1.0, 3.0, 3.0), bounds, min, max),
            Rect::new(0.0, 0.0, 10.0, 10.0)
        );
        // Too large and off to the right: shrinks to the max then slides in.
        assert_eq!(
            constrain(Rect::new(50.0, -20.0, 250.0, 180.0), bounds, min, max),
            Rect::new(0.0, 0.0, 100.0, 100.0)
        );
        // Overflowing the far edges.
        assert_eq!(
            constrain(Rect::new(95.0, 92.0, 115.0, 112.0), bounds, min, max),
            Rect::new(80.0, 80.0, 100.0, 100.0)
        );
    }

    #[test]
    fn test_constrain_is_idempotent() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 60.0);
        let min = Size::new(5.0, 3.0);
        // Larger than the bounds, to exercise the pinned case as well.
        let max = Size::new(150.0, 90.0);
        let candidates = [
            Rect::new(-50.0, -50.0, 300.0, 10.0),
            Rect::new(10.0, 10.0, 11.0, 11.0),
            Rect::new(90.0, 50.0, 130.0, 80.0),
            Rect::new(20.0, 20.0, 40.0, 30.0),
            Rect::new(-10.0, 55.0, 0.0, 70.0),
        ];
        for r in candidates {
            let once = constrain(r, bounds, min, max);
            assert_eq!(constrain(once, bounds, min, max), once, "for {r:?}");
        }
    }
}
