//! Widgets: the live, interactive counterparts of scraps.
//!
//! A widget is created when the canvas drains a scrap-added notification, so
//! it appears some time after the scrap itself. Widgets share the scrap's
//! frame handle and carry gesture-time state (busy flag, in-progress stroke).

mod manager;
mod scrap;
mod state;

pub use manager::WidgetManager;
pub use scrap::{ScrapWidget, WidgetKind};
pub use state::WidgetState;
