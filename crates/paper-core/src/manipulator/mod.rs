//! Per-touch-sequence state machines that turn raw gestures into commands.
//!
//! A manipulator goes `NotStarted -> Running -> Committed | Aborted` and is
//! single-use: once terminal it ignores every further event. Events are
//! expected in model coordinates.

mod drag;
mod sketch;

pub use drag::DragManipulator;
pub use sketch::SketchManipulator;

use crate::command::WhiteboardCommand;
use crate::gesture::GestureEvent;
use crate::scrap::ScrapId;
use crate::widget::WidgetManager;
use std::fmt::Debug;

/// Lifecycle phase of a manipulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManipulatorPhase {
    #[default]
    NotStarted,
    Running,
    Committed,
    Aborted,
}

impl ManipulatorPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Aborted)
    }
}

/// Outcome of feeding one event to a manipulator.
#[derive(Debug, Clone, PartialEq)]
pub enum ManipulatorStep {
    /// Still running; any preview has been published.
    Continue,
    /// Sequence finished with exactly one command.
    Committed(WhiteboardCommand),
    /// Sequence finished without a command. Not an error.
    Aborted,
    /// The manipulator was already terminal and dropped the event.
    Ignored,
}

impl ManipulatorStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed(_) | Self::Aborted)
    }
}

/// A single-use gesture-sequence state machine bound to one scrap.
pub trait Manipulator: Debug + Send {
    /// Scrap this manipulator owns for the duration of its sequence.
    fn scrap_id(&self) -> ScrapId;

    fn phase(&self) -> ManipulatorPhase;

    /// Feed the next event of the sequence.
    fn handle(&mut self, event: &GestureEvent, widgets: &WidgetManager) -> ManipulatorStep;

    /// Re-check external conditions between events, such as a widget that
    /// has appeared since the last event.
    fn poll(&mut self, _widgets: &WidgetManager) -> ManipulatorStep {
        if self.is_terminal() {
            ManipulatorStep::Ignored
        } else {
            ManipulatorStep::Continue
        }
    }

    /// Abort from outside, discarding any preview.
    fn cancel(&mut self);

    fn is_terminal(&self) -> bool {
        self.phase().is_terminal()
    }
}
