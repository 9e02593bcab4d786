//! Paper Core Library
//!
//! Canvas interaction engine for the Paper whiteboard: turns pointer gestures
//! into scrap edits, sketches and view-port changes.

pub mod canvas;
pub mod command;
pub mod config;
pub mod document;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod gesture;
pub mod interpreter;
pub mod manipulator;
pub mod scrap;
pub mod storage;
pub mod stroke;
pub mod viewport;
pub mod widget;

pub use canvas::{Canvas, GestureRoute, RenderEvent};
pub use command::WhiteboardCommand;
pub use config::EditorConfig;
pub use document::{A4_LANDSCAPE, DocumentEvent, TEMP_ID, Thumbnail, Whiteboard};
pub use error::{EngineError, EngineResult};
pub use frame::Frame;
pub use geometry::{CoordinateMapper, Orientation, PinchTransform, orientation, pinch_transform};
pub use gesture::{GestureEvent, GestureHistory, GestureKind, GestureRecord};
pub use interpreter::{CanvasGestureInterpreter, DomainEvent};
pub use manipulator::{DragManipulator, Manipulator, ManipulatorPhase, ManipulatorStep, SketchManipulator};
pub use scrap::{FrameState, Scrap, ScrapContent, ScrapId, SharedFrame};
pub use storage::{AutoSave, FileStorage, MemoryStorage, Storage, StorageError, StorageResult};
pub use stroke::{MAX_PEN_SIZE, MIN_PEN_SIZE, PenStyle, SerializableColor, SketchStroke, StrokePoint};
pub use viewport::{ViewPortController, constrain};
pub use widget::{ScrapWidget, WidgetKind, WidgetManager, WidgetState};
