//! Committed whiteboard mutations produced by manipulators.

use crate::document::Whiteboard;
use crate::error::EngineResult;
use crate::frame::Frame;
use crate::scrap::{Scrap, ScrapContent, ScrapId};
use serde::{Deserialize, Serialize};

/// One committed change to the whiteboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WhiteboardCommand {
    /// A scrap was created or finished with the given frame and content.
    AddScrap {
        scrap_id: ScrapId,
        frame: Frame,
        content: ScrapContent,
    },
    RemoveScrap { scrap_id: ScrapId },
    /// A scrap frame moved from `from` by the component-wise `delta`.
    UpdateScrapFrame {
        scrap_id: ScrapId,
        from: Frame,
        delta: Frame,
    },
}

impl WhiteboardCommand {
    pub fn scrap_id(&self) -> ScrapId {
        match self {
            WhiteboardCommand::AddScrap { scrap_id, .. }
            | WhiteboardCommand::RemoveScrap { scrap_id }
            | WhiteboardCommand::UpdateScrapFrame { scrap_id, .. } => *scrap_id,
        }
    }

    /// Write the command into the whiteboard.
    ///
    /// Applying the same command twice leaves the board as after the first
    /// application; manipulators may already have written the frame through
    /// the shared handle.
    pub fn apply(&self, board: &mut Whiteboard) -> EngineResult<()> {
        match self {
            WhiteboardCommand::AddScrap {
                scrap_id,
                frame,
                content,
            } => {
                let frame = frame.validated()?;
                if !board.contains_scrap(*scrap_id) {
                    return board.add_scrap(Scrap::new(*scrap_id, frame, content.clone()));
                }
                if let Some(scrap) = board.scrap_mut(*scrap_id) {
                    *scrap.content_mut() = content.clone();
                }
                board.set_scrap_frame(*scrap_id, frame)?;
                Ok(())
            }
            WhiteboardCommand::RemoveScrap { scrap_id } => {
                board.remove_scrap(*scrap_id);
                Ok(())
            }
            WhiteboardCommand::UpdateScrapFrame { scrap_id, from, delta } => {
                board.set_scrap_frame(*scrap_id, from.add(*delta))?;
                Ok(())
            }
        }
    }
}
