//! Editor configuration handed to the canvas at construction.

use crate::document::A4_LANDSCAPE;
use crate::error::{EngineError, EngineResult};
use crate::stroke::PenStyle;
use crate::viewport::VIEW_PORT_MIN_SCALE;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum pointer travel in view pixels between two accepted sketch points.
pub const MIN_PATH_SEGMENT: f64 = 8.0;

/// How long a sketch waits for the widget of its new scrap.
pub const WIDGET_WAIT_TIMEOUT_MS: u64 = 850;

/// Default stroke simplification tolerance, in model units.
pub const STROKE_TOLERANCE: f64 = 0.5;

/// Tunables for the canvas engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Ratio between the largest and the smallest view-port.
    pub view_port_min_scale: f64,
    pub min_path_segment: f64,
    pub widget_wait_timeout_ms: u64,
    /// Max deviation, in model units, of points dropped from a finished stroke.
    pub stroke_tolerance: f64,
    /// Size of new whiteboards, in model units.
    pub default_canvas_size: Size,
    pub pen: PenStyle,
    /// Padding around the canvas inside the view, in view pixels.
    pub padding: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            view_port_min_scale: VIEW_PORT_MIN_SCALE,
            min_path_segment: MIN_PATH_SEGMENT,
            widget_wait_timeout_ms: WIDGET_WAIT_TIMEOUT_MS,
            stroke_tolerance: STROKE_TOLERANCE,
            default_canvas_size: A4_LANDSCAPE,
            pen: PenStyle::default(),
            padding: 0.0,
        }
    }
}

impl EditorConfig {
    pub fn widget_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.widget_wait_timeout_ms)
    }

    /// Reject values the engine cannot work with. The pen is clamped instead.
    pub fn validate(mut self) -> EngineResult<Self> {
        if !(self.view_port_min_scale >= 1.0) {
            return Err(EngineError::InvalidArgument(format!(
                "view_port_min_scale must be at least 1, got {}",
                self.view_port_min_scale
            )));
        }
        if !(self.min_path_segment >= 0.0) {
            return Err(EngineError::InvalidArgument(format!(
                "min_path_segment must not be negative, got {}",
                self.min_path_segment
            )));
        }
        if !(self.stroke_tolerance >= 0.0) {
            return Err(EngineError::InvalidArgument(format!(
                "stroke_tolerance must not be negative, got {}",
                self.stroke_tolerance
            )));
        }
        let size = self.default_canvas_size;
        if !(size.width > 0.0 && size.height > 0.0) {
            return Err(EngineError::InvalidArgument(format!(
                "default_canvas_size must be positive, got {}x{}",
                size.width, size.height
            )));
        }
        if !(self.padding >= 0.0) {
            return Err(EngineError::InvalidArgument(format!(
                "padding must not be negative, got {}",
                self.padding
            )));
        }
        self.pen = self.pen.clamped();
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::MAX_PEN_SIZE;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.view_port_min_scale, 32.0);
        assert_eq!(config.min_path_segment, 8.0);
        assert_eq!(config.widget_wait_timeout(), Duration::from_millis(850));
        assert_eq!(config.default_canvas_size, Size::new(297.0, 210.0));
        assert_eq!(config.stroke_tolerance, 0.5);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{"padding": 12.0}"#).unwrap();
        assert_eq!(config.padding, 12.0);
        assert_eq!(config.widget_wait_timeout_ms, WIDGET_WAIT_TIMEOUT_MS);
    }

    #[test]
    fn test_validate() {
        let mut config = EditorConfig::default();
        config.pen.size = 500.0;
        assert_eq!(config.validate().unwrap().pen.size, MAX_PEN_SIZE);

        let bad = EditorConfig {
            view_port_min_scale: 0.5,
            ..EditorConfig::default()
        };
        assert!(matches!(bad.validate(), Err(EngineError::InvalidArgument(_))));

        let bad = EditorConfig {
            default_canvas_size: Size::new(0.0, 10.0),
            ..EditorConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
