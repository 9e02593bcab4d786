//! Paper Application
//!
//! Headless shell that replays recorded touch sessions through the canvas
//! engine and persists the resulting whiteboard.

mod app;

pub use app::{App, AppError, AppResult, ReplayStats, Script, load_config};
