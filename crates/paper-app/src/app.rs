//! Gesture replay shell around the canvas engine.

use kurbo::Size;
use paper_core::storage::AutoSave;
use paper_core::{
    Canvas, EditorConfig, EngineError, GestureEvent, RenderEvent, Storage, StorageError, Whiteboard,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use thiserror::Error;

/// Errors surfaced by the shell.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type AppResult<T> = Result<T, AppError>;

/// A recorded touch session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Size of the view the gestures were recorded in, in pixels.
    pub view_size: Size,
    pub gestures: Vec<GestureEvent>,
}

impl Script {
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Read the editor config, falling back to defaults without a file.
pub fn load_config(path: Option<&Path>) -> AppResult<EditorConfig> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let json = fs::read_to_string(path)?;
    let config: EditorConfig = serde_json::from_str(&json)?;
    log::info!("Loaded config from {}", path.display());
    Ok(config.validate()?)
}

/// Counters reported after a replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub gestures: usize,
    pub rejected: usize,
    pub render_events: usize,
    pub commands: usize,
    pub saves: usize,
}

/// Drives a canvas from a script and persists the result.
pub struct App<S: Storage> {
    canvas: Canvas,
    autosave: AutoSave<S>,
    renders: Receiver<RenderEvent>,
}

impl<S: Storage> App<S> {
    /// Open whiteboard `id`, or the last saved one, or a new one.
    pub async fn open(
        storage: Arc<S>,
        id: Option<&str>,
        config: EditorConfig,
        view_size: Size,
    ) -> AppResult<Self> {
        let mut autosave = AutoSave::new(storage);
        let board = match id {
            Some(id) => autosave.load(id).await?,
            None => match autosave.load_last().await {
                Some(board) => board,
                None => {
                    log::info!("Starting a new whiteboard");
                    Whiteboard::new(config.default_canvas_size)
                }
            },
        };
        log::info!("Opened whiteboard {}", board.uuid());

        let mut canvas = Canvas::new(board, config, view_size)?;
        let renders = canvas.subscribe();
        Ok(Self {
            canvas,
            autosave,
            renders,
        })
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Feed every gesture, tick the canvas after each and save as needed.
    ///
    /// Rejected gestures are counted and skipped; they are already logged by
    /// the canvas.
    pub async fn replay(&mut self, gestures: &[GestureEvent]) -> AppResult<ReplayStats> {
        let mut stats = ReplayStats::default();
        let first_command = self.canvas.commands().len();

        for gesture in gestures {
            stats.gestures += 1;
            if self.canvas.handle_gesture(gesture).is_err() {
                stats.rejected += 1;
            }
            self.canvas.tick()?;
            stats.render_events += self.log_renders();
            if self.autosave.maybe_save(self.canvas.board()).await? {
                stats.saves += 1;
            }
        }

        self.canvas.tick()?;
        stats.render_events += self.log_renders();
        if self.autosave.has_changes(self.canvas.board()) {
            self.autosave.save(self.canvas.board()).await?;
            stats.saves += 1;
        }
        stats.commands = self.canvas.commands().len() - first_command;
        Ok(stats)
    }

    fn log_renders(&self) -> usize {
        let mut count = 0;
        for event in self.renders.try_iter() {
            log::info!("render {event:?}");
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use paper_core::{MemoryStorage, WhiteboardCommand};
    use std::io::Write;

    fn sketch_script() -> Vec<GestureEvent> {
        let start = Point::new(100.0, 100.0);
        vec![
            GestureEvent::TouchBegin,
            GestureEvent::DragBegin { start },
            GestureEvent::OnDrag { start, stop: Point::new(120.0, 110.0) },
            GestureEvent::OnDrag { start, stop: Point::new(140.0, 130.0) },
            GestureEvent::DragEnd { start, stop: Point::new(150.0, 140.0) },
            GestureEvent::TouchEnd,
        ]
    }

    #[test]
    fn test_replay_sketch_and_save() {
        let storage = Arc::new(MemoryStorage::new());
        let mut app = pollster::block_on(App::open(
            Arc::clone(&storage),
            None,
            EditorConfig::default(),
            Size::new(594.0, 420.0),
        ))
        .unwrap();

        let stats = pollster::block_on(app.replay(&sketch_script())).unwrap();
        assert_eq!(stats.gestures, 6);
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.commands, 1);
        assert!(stats.saves >= 1);
        assert!(stats.render_events > 0);
        assert!(matches!(
            app.canvas().commands()[0],
            WhiteboardCommand::AddScrap { .. }
        ));

        let key = app.canvas().board().uuid().to_string();
        let saved = pollster::block_on(storage.load(&key)).unwrap();
        assert_eq!(saved.scrap_count(), 1);
        assert_eq!(saved.fingerprint(), app.canvas().board().fingerprint());
    }

    #[test]
    fn test_reopen_last_whiteboard() {
        let storage = Arc::new(MemoryStorage::new());
        let view = Size::new(594.0, 420.0);
        let mut app =
            pollster::block_on(App::open(Arc::clone(&storage), None, EditorConfig::default(), view)).unwrap();
        pollster::block_on(app.replay(&sketch_script())).unwrap();
        let uuid = app.canvas().board().uuid();

        let reopened = pollster::block_on(App::open(storage, None, EditorConfig::default(), view)).unwrap();
        assert_eq!(reopened.canvas().board().uuid(), uuid);
        assert_eq!(reopened.canvas().widgets().len(), 1);
    }

    #[test]
    fn test_open_missing_board_fails() {
        let storage = Arc::new(MemoryStorage::new());
        let result = pollster::block_on(App::open(
            storage,
            Some("missing"),
            EditorConfig::default(),
            Size::new(100.0, 100.0),
        ));
        assert!(matches!(result, Err(AppError::Storage(StorageError::NotFound(_)))));
    }

    #[test]
    fn test_rejected_gestures_are_counted() {
        let storage = Arc::new(MemoryStorage::new());
        let mut app = pollster::block_on(App::open(
            storage,
            None,
            EditorConfig::default(),
            Size::new(594.0, 420.0),
        ))
        .unwrap();
        let gestures = vec![
            GestureEvent::TouchBegin,
            GestureEvent::PinchBegin { start: vec![Point::ZERO], stop: vec![Point::ZERO] },
            GestureEvent::TouchEnd,
        ];
        let stats = pollster::block_on(app.replay(&gestures)).unwrap();
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.commands, 0);
    }

    #[test]
    fn test_load_config_and_script() {
        assert_eq!(load_config(None).unwrap(), EditorConfig::default());

        let mut config = tempfile::NamedTempFile::new().unwrap();
        write!(config, r#"{{"min_path_segment": 4.0}}"#).unwrap();
        assert_eq!(load_config(Some(config.path())).unwrap().min_path_segment, 4.0);

        let mut script = tempfile::NamedTempFile::new().unwrap();
        write!(
            script,
            r#"{{"view_size": {{"width": 10.0, "height": 20.0}}, "gestures": [{{"type": "touch_begin"}}, {{"type": "tap", "down": {{"x": 1.0, "y": 2.0}}}}]}}"#
        )
        .unwrap();
        let script = Script::from_path(script.path()).unwrap();
        assert_eq!(script.view_size, Size::new(10.0, 20.0));
        assert_eq!(script.gestures[1], GestureEvent::Tap { down: Point::new(1.0, 2.0) });
    }
}
