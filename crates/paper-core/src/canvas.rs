//! Canvas: gesture routing, manipulators and render notifications.

use crate::command::WhiteboardCommand;
use crate::config::EditorConfig;
use crate::document::{DocumentEvent, Whiteboard};
use crate::error::{EngineError, EngineResult};
use crate::geometry::CoordinateMapper;
use crate::gesture::{GestureEvent, GestureHistory, GestureRecord};
use crate::interpreter::{CanvasGestureInterpreter, DomainEvent};
use crate::manipulator::{DragManipulator, Manipulator, ManipulatorStep, SketchManipulator};
use crate::scrap::{Scrap, ScrapContent, ScrapId};
use crate::storage::{Storage, StorageError, StorageResult};
use crate::stroke::PenStyle;
use crate::viewport::ViewPortController;
use crate::widget::WidgetManager;
use kurbo::{Point, Rect, Size};
use peniko::Color;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, ThreadId};
use uuid::Uuid;

/// Notifications for the rendering backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderEvent {
    /// Something changed; redraw.
    Invalidation,
    DrawViewPort { canvas_size: Size, view_port: Rect },
    /// The canvas has no content; a cached raster can be dropped.
    EraseCanvas,
    AddScrapWidget(ScrapId),
    RemoveScrapWidget(ScrapId),
}

/// Where the events of the current touch sequence go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureRoute {
    #[default]
    Idle,
    ViewPort,
    DragScrap(ScrapId),
    Sketch(ScrapId),
}

/// The interactive whiteboard editor.
///
/// Must be driven from the thread that created it. Document notifications
/// are processed in [`tick`](Self::tick), so widgets for new scraps appear
/// one tick after the scrap itself.
#[derive(Debug)]
pub struct Canvas {
    owner: ThreadId,
    config: EditorConfig,
    board: Whiteboard,
    board_events: Receiver<DocumentEvent>,
    view_port: ViewPortController,
    interpreter: CanvasGestureInterpreter,
    history: GestureHistory,
    route: GestureRoute,
    manipulator: Option<Box<dyn Manipulator>>,
    /// Scrap created for the sketch in flight, removed again if the sketch aborts.
    pending_sketch: Option<ScrapId>,
    /// Last accepted sketch point, in view pixels.
    last_sketch_point: Option<Point>,
    /// View-pixel anchor of a single-pointer view-port pan.
    pan_anchor: Option<Point>,
    widgets: WidgetManager,
    pen: PenStyle,
    commands: Vec<WhiteboardCommand>,
    subscribers: Vec<Sender<RenderEvent>>,
}

impl Canvas {
    /// Open `board` for editing in a view of `view_size` pixels.
    pub fn new(mut board: Whiteboard, config: EditorConfig, view_size: Size) -> EngineResult<Self> {
        let config = config.validate()?;
        let mut view_port = ViewPortController::new(
            board.size(),
            view_size,
            config.padding,
            config.view_port_min_scale,
        )?;
        let visible = view_port.set_view_port(board.view_port());
        if visible != board.view_port() {
            board.set_view_port(visible);
        }

        let mut widgets = WidgetManager::new();
        for scrap in board.scraps_ordered() {
            widgets.create(scrap)?;
        }

        let board_events = board.subscribe();
        Ok(Self {
            owner: thread::current().id(),
            pen: config.pen,
            config,
            board,
            board_events,
            view_port,
            interpreter: CanvasGestureInterpreter::new(),
            history: GestureHistory::new(),
            route: GestureRoute::Idle,
            manipulator: None,
            pending_sketch: None,
            last_sketch_point: None,
            pan_anchor: None,
            widgets,
            commands: Vec::new(),
            subscribers: Vec::new(),
        })
    }

    pub fn board(&self) -> &Whiteboard {
        &self.board
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn view_port(&self) -> &ViewPortController {
        &self.view_port
    }

    pub fn widgets(&self) -> &WidgetManager {
        &self.widgets
    }

    pub fn route(&self) -> GestureRoute {
        self.route
    }

    pub fn history(&self) -> &GestureHistory {
        &self.history
    }

    /// Commands committed so far, oldest first.
    pub fn commands(&self) -> &[WhiteboardCommand] {
        &self.commands
    }

    pub fn has_active_manipulator(&self) -> bool {
        self.manipulator.is_some()
    }

    /// Receive render events. The current view-port and every existing
    /// widget are replayed to the new subscriber first.
    pub fn subscribe(&mut self) -> Receiver<RenderEvent> {
        let (tx, rx) = channel();
        let mut replay = vec![self.draw_view_port_event()];
        replay.extend(self.widgets.ids().map(RenderEvent::AddScrapWidget));
        if replay.into_iter().all(|event| tx.send(event).is_ok()) {
            self.subscribers.push(tx);
        }
        rx
    }

    // Pen ////////////////////////////////////////////////////////////////////

    pub fn pen(&self) -> PenStyle {
        self.pen
    }

    pub fn set_pen_color(&mut self, color: Color) {
        self.pen.color = color.into();
    }

    /// Set the pen size, clamped to the supported range.
    pub fn set_pen_size(&mut self, size: f64) {
        self.pen = PenStyle { size, ..self.pen }.clamped();
    }

    pub fn set_eraser(&mut self, is_eraser: bool) {
        self.pen.is_eraser = is_eraser;
    }

    // Entry points ///////////////////////////////////////////////////////////

    /// Route one gesture event, given in view pixels.
    pub fn handle_gesture(&mut self, event: &GestureEvent) -> EngineResult<()> {
        self.check_thread()?;
        let result = self.dispatch(event);
        if let Err(err) = &result {
            log::error!("gesture {:?} failed: {err}", event.kind());
        }
        result
    }

    /// Process document notifications and resume a manipulator that is
    /// waiting on them.
    pub fn tick(&mut self) -> EngineResult<()> {
        self.check_thread()?;
        self.drain_board_events();
        if let Some(manipulator) = self.manipulator.as_mut() {
            let step = manipulator.poll(&self.widgets);
            if step.is_terminal() {
                self.settle(step)?;
            }
        }
        Ok(())
    }

    /// Apply a command that did not come from a gesture.
    pub fn apply_command(&mut self, command: WhiteboardCommand) -> EngineResult<()> {
        self.check_thread()?;
        command.apply(&mut self.board)?;
        self.commands.push(command);
        self.emit(RenderEvent::Invalidation);
        Ok(())
    }

    /// Swap in another whiteboard, dropping all gesture state.
    pub fn replace_board(&mut self, mut board: Whiteboard) -> EngineResult<()> {
        self.check_thread()?;
        self.view_port.set_canvas_size(board.size())?;
        let visible = self.view_port.set_view_port(board.view_port());
        if visible != board.view_port() {
            board.set_view_port(visible);
        }

        self.cancel_manipulator();
        for id in self.widgets.ids().collect::<Vec<_>>() {
            self.emit(RenderEvent::RemoveScrapWidget(id));
        }
        self.widgets.clear();

        self.board_events = board.subscribe();
        self.board = board;
        let mut added = Vec::with_capacity(self.board.scrap_count());
        for scrap in self.board.scraps_ordered() {
            self.widgets.create(scrap)?;
            added.push(scrap.id());
        }
        for id in added {
            self.emit(RenderEvent::AddScrapWidget(id));
        }

        self.history.clear();
        self.route = GestureRoute::Idle;
        self.commands.clear();
        self.emit(self.draw_view_port_event());
        log::debug!("whiteboard {} opened", self.board.uuid());
        Ok(())
    }

    /// Save the whiteboard under its UUID.
    pub async fn save<S: Storage + ?Sized>(&self, storage: &S) -> StorageResult<()> {
        storage.save(&self.board.uuid().to_string(), &self.board).await
    }

    /// Load a whiteboard and make it the edited one.
    pub async fn load<S: Storage + ?Sized>(&mut self, storage: &S, id: &str) -> StorageResult<()> {
        let board = storage.load(id).await?;
        self.replace_board(board)
            .map_err(|err| StorageError::Other(err.to_string()))
    }

    // Routing ////////////////////////////////////////////////////////////////

    fn dispatch(&mut self, event: &GestureEvent) -> EngineResult<()> {
        match event {
            GestureEvent::TouchBegin => self.on_touch_begin(),
            GestureEvent::TouchEnd => self.on_touch_end(),
            GestureEvent::Tap { down } => {
                self.history.push(GestureRecord::Tap);
                self.on_tap(*down);
                Ok(())
            }
            GestureEvent::DragBegin { start } => {
                self.history.push(GestureRecord::Drag);
                self.on_drag_begin(event, *start)
            }
            GestureEvent::OnDrag { stop, .. } | GestureEvent::DragEnd { stop, .. } => {
                self.on_drag(event, *stop)
            }
            GestureEvent::PinchBegin { start, stop } => {
                self.history.push(GestureRecord::Pinch);
                self.cancel_manipulator();
                self.route = GestureRoute::ViewPort;
                self.pan_anchor = None;
                self.begin_view_port_update();
                self.update_view_port(start, stop)
            }
            GestureEvent::OnPinch { start, stop } => {
                if !self.view_port.is_updating() {
                    self.route = GestureRoute::ViewPort;
                    self.begin_view_port_update();
                }
                self.update_view_port(start, stop)
            }
            GestureEvent::PinchEnd { start, stop } => {
                let result = self.update_view_port(start, stop);
                self.finish_view_port_update();
                result
            }
        }
    }

    fn on_touch_begin(&mut self) -> EngineResult<()> {
        // Give a sketch still waiting for its widget a last chance.
        self.tick()?;
        self.cancel_manipulator();
        self.history.clear();
        self.route = GestureRoute::Idle;
        self.last_sketch_point = None;
        self.pan_anchor = None;
        Ok(())
    }

    fn on_touch_end(&mut self) -> EngineResult<()> {
        if self.view_port.is_updating() {
            self.finish_view_port_update();
        }
        if let Some(manipulator) = self.manipulator.as_mut() {
            let step = manipulator.handle(&GestureEvent::TouchEnd, &self.widgets);
            if step.is_terminal() {
                self.settle(step)?;
            }
        }
        self.route = GestureRoute::Idle;
        Ok(())
    }

    fn on_tap(&mut self, down: Point) {
        let at = self.view_port.view_to_model(down);
        match self.board.scrap_at(at) {
            Some(id) => self.widgets.focus(id),
            None => self.widgets.clear_focus(),
        }
        self.emit(RenderEvent::Invalidation);
    }

    fn on_drag_begin(&mut self, event: &GestureEvent, start: Point) -> EngineResult<()> {
        if self.history.contains(GestureRecord::Pinch) {
            self.route = GestureRoute::ViewPort;
            self.pan_anchor = Some(start);
            self.begin_view_port_update();
            return Ok(());
        }

        self.cancel_manipulator();
        let at = self.view_port.view_to_model(start);
        match self.board.scrap_at(at) {
            Some(id) => self.begin_scrap_drag(event, id),
            None => self.begin_sketch(event, start),
        }
    }

    fn begin_scrap_drag(&mut self, event: &GestureEvent, id: ScrapId) -> EngineResult<()> {
        let Some(scrap) = self.board.scrap(id) else {
            return Ok(());
        };
        log::debug!("routing drag to scrap {id}");
        self.route = GestureRoute::DragScrap(id);
        self.widgets.focus(id);
        self.manipulator = Some(Box::new(DragManipulator::new(id, scrap.frame_handle())));
        let mapped = self.to_model(event);
        self.feed_manipulator(&mapped)
    }

    fn begin_sketch(&mut self, event: &GestureEvent, start: Point) -> EngineResult<()> {
        let id = Uuid::new_v4();
        let events = self.interpreter.interpret_with_id(
            event,
            &self.view_port,
            self.board.highest_z(),
            id,
        )?;
        log::debug!("routing drag to new sketch scrap {id}");
        self.route = GestureRoute::Sketch(id);
        self.pending_sketch = Some(id);
        self.last_sketch_point = Some(start);
        self.manipulator = Some(Box::new(
            SketchManipulator::new(id, self.pen, self.config.widget_wait_timeout())
                .with_simplify_tolerance(self.config.stroke_tolerance),
        ));
        self.apply_domain_events(events, event)
    }

    fn on_drag(&mut self, event: &GestureEvent, stop: Point) -> EngineResult<()> {
        let is_end = matches!(event, GestureEvent::DragEnd { .. });
        match self.route {
            GestureRoute::ViewPort => {
                if !self.view_port.is_updating() {
                    self.begin_view_port_update();
                }
                let anchor = *self.pan_anchor.get_or_insert(stop);
                let view_port = self.view_port.on_pan(anchor, stop);
                self.board.set_view_port(view_port);
                self.emit(self.draw_view_port_event());
                if is_end {
                    self.finish_view_port_update();
                }
                Ok(())
            }
            GestureRoute::DragScrap(_) => {
                let mapped = self.to_model(event);
                self.feed_manipulator(&mapped)
            }
            GestureRoute::Sketch(_) => {
                if !is_end && self.too_close(stop) {
                    return Ok(());
                }
                self.last_sketch_point = Some(stop);
                let events = self.interpreter.interpret(event, &self.view_port, self.board.highest_z())?;
                self.apply_domain_events(events, event)
            }
            GestureRoute::Idle => {
                log::debug!("ignoring {:?} outside of a drag", event.kind());
                Ok(())
            }
        }
    }

    fn too_close(&self, stop: Point) -> bool {
        self.last_sketch_point
            .is_some_and(|last| last.distance(stop) < self.config.min_path_segment)
    }

    fn apply_domain_events(&mut self, events: Vec<DomainEvent>, source: &GestureEvent) -> EngineResult<()> {
        let mapped = self.to_model(source);
        for event in DomainEvent::flatten(events) {
            match event {
                DomainEvent::ClearFocus => self.widgets.clear_focus(),
                DomainEvent::AddScrap { id, frame } => self.board.add_scrap(Scrap::sketch(id, frame))?,
                DomainEvent::FocusScrap(id) => self.widgets.focus(id),
                DomainEvent::StartSketch(_) | DomainEvent::DoSketch(_) | DomainEvent::StopSketch => {
                    self.feed_manipulator(&mapped)?;
                }
                DomainEvent::Group(_) => {}
            }
        }
        Ok(())
    }

    // Manipulators ///////////////////////////////////////////////////////////

    fn feed_manipulator(&mut self, event: &GestureEvent) -> EngineResult<()> {
        let Some(manipulator) = self.manipulator.as_mut() else {
            log::debug!("no manipulator for {:?}", event.kind());
            return Ok(());
        };
        let step = manipulator.handle(event, &self.widgets);
        self.settle(step)
    }

    fn settle(&mut self, step: ManipulatorStep) -> EngineResult<()> {
        match step {
            ManipulatorStep::Continue => self.emit(RenderEvent::Invalidation),
            ManipulatorStep::Ignored => {}
            ManipulatorStep::Committed(command) => {
                self.manipulator = None;
                if self.pending_sketch == Some(command.scrap_id()) {
                    self.pending_sketch = None;
                }
                command.apply(&mut self.board)?;
                log::debug!("committed {command:?}");
                self.commands.push(command);
                self.emit(RenderEvent::Invalidation);
            }
            ManipulatorStep::Aborted => {
                if let Some(manipulator) = self.manipulator.take() {
                    self.discard_pending_sketch(manipulator.scrap_id());
                }
                self.emit(RenderEvent::Invalidation);
            }
        }
        Ok(())
    }

    fn cancel_manipulator(&mut self) {
        let Some(mut manipulator) = self.manipulator.take() else {
            return;
        };
        if !manipulator.is_terminal() {
            log::debug!("cancelling manipulator on scrap {}", manipulator.scrap_id());
            manipulator.cancel();
            self.emit(RenderEvent::Invalidation);
        }
        self.discard_pending_sketch(manipulator.scrap_id());
    }

    /// Remove the scrap of an aborted sketch if nothing was drawn into it.
    fn discard_pending_sketch(&mut self, id: ScrapId) {
        if self.pending_sketch != Some(id) {
            return;
        }
        self.pending_sketch = None;
        let empty = self
            .board
            .scrap(id)
            .is_some_and(|scrap| matches!(scrap.content(), ScrapContent::Sketch(strokes) if strokes.is_empty()));
        if empty {
            log::debug!("removing empty sketch scrap {id}");
            self.board.remove_scrap(id);
        }
    }

    // View-port //////////////////////////////////////////////////////////////

    fn begin_view_port_update(&mut self) {
        self.view_port.begin_update();
        if self.board.is_blank() {
            self.emit(RenderEvent::EraseCanvas);
        }
    }

    fn update_view_port(&mut self, start: &[Point], stop: &[Point]) -> EngineResult<()> {
        let view_port = self.view_port.on_update(start, stop)?;
        self.board.set_view_port(view_port);
        self.emit(self.draw_view_port_event());
        Ok(())
    }

    fn finish_view_port_update(&mut self) {
        let view_port = self.view_port.stop_update();
        self.board.set_view_port(view_port);
        self.pan_anchor = None;
    }

    fn draw_view_port_event(&self) -> RenderEvent {
        RenderEvent::DrawViewPort {
            canvas_size: self.board.size(),
            view_port: self.view_port.view_port(),
        }
    }

    // Plumbing ///////////////////////////////////////////////////////////////

    fn to_model(&self, event: &GestureEvent) -> GestureEvent {
        let inverse = self.view_port.matrix().inverse();
        event.map_points(|p| inverse * p)
    }

    fn drain_board_events(&mut self) {
        loop {
            match self.board_events.try_recv() {
                Ok(DocumentEvent::ScrapAdded(id)) => {
                    let Some(scrap) = self.board.scrap(id) else {
                        continue;
                    };
                    if let Err(err) = self.widgets.create(scrap) {
                        log::error!("{err}");
                        continue;
                    }
                    self.emit(RenderEvent::AddScrapWidget(id));
                }
                Ok(DocumentEvent::ScrapRemoved(id)) => {
                    if self.widgets.remove(id).is_some() {
                        self.emit(RenderEvent::RemoveScrapWidget(id));
                    }
                }
                Ok(_) => self.emit(RenderEvent::Invalidation),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }

    fn emit(&mut self, event: RenderEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    fn check_thread(&self) -> EngineResult<()> {
        let current = thread::current().id();
        if current == self.owner {
            return Ok(());
        }
        let err = EngineError::IllegalLifecycleState(format!(
            "canvas owned by {:?} used from {:?}",
            self.owner, current
        ));
        log::error!("{err}");
        Err(err)
    }
}
