//! Widget manager for tracking live scrap widgets.

use super::scrap::ScrapWidget;
use super::state::WidgetState;
use crate::error::{EngineError, EngineResult};
use crate::scrap::{Scrap, ScrapId};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of scrap widgets plus the editor focus.
///
/// Widgets are handed out as `Arc`s so manipulators can keep driving one
/// while the registry changes.
#[derive(Debug, Default)]
pub struct WidgetManager {
    widgets: HashMap<ScrapId, Arc<ScrapWidget>>,
    /// Scrap that holds the focus.
    focused: Option<ScrapId>,
}

impl WidgetManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the widget for a scrap.
    ///
    /// A scrap is bound to at most one widget.
    pub fn create(&mut self, scrap: &Scrap) -> EngineResult<Arc<ScrapWidget>> {
        if self.widgets.contains_key(&scrap.id()) {
            return Err(EngineError::IllegalLifecycleState(format!(
                "scrap {} already has a widget",
                scrap.id()
            )));
        }
        let widget = Arc::new(ScrapWidget::new(scrap));
        self.widgets.insert(scrap.id(), Arc::clone(&widget));
        Ok(widget)
    }

    /// Drop the widget of a scrap, releasing the focus if it held it.
    pub fn remove(&mut self, id: ScrapId) -> Option<Arc<ScrapWidget>> {
        if self.focused == Some(id) {
            self.focused = None;
        }
        self.widgets.remove(&id)
    }

    pub fn get(&self, id: ScrapId) -> Option<Arc<ScrapWidget>> {
        self.widgets.get(&id).cloned()
    }

    pub fn contains(&self, id: ScrapId) -> bool {
        self.widgets.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ScrapId> + '_ {
        self.widgets.keys().copied()
    }

    /// Give the focus to a scrap. The scrap need not have a widget yet.
    pub fn focus(&mut self, id: ScrapId) {
        self.focused = Some(id);
    }

    pub fn clear_focus(&mut self) {
        self.focused = None;
    }

    pub fn focused(&self) -> Option<ScrapId> {
        self.focused
    }

    /// Interaction state of a scrap's widget. Busy wins over focus.
    pub fn state(&self, id: ScrapId) -> WidgetState {
        match self.widgets.get(&id) {
            Some(widget) if widget.is_busy() => WidgetState::Busy,
            _ if self.focused == Some(id) => WidgetState::Focused,
            _ => WidgetState::Normal,
        }
    }

    /// Drop every widget.
    pub fn clear(&mut self) {
        self.widgets.clear();
        self.focused = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use uuid::Uuid;

    #[test]
    fn test_create_and_double_bind() {
        let mut manager = WidgetManager::new();
        let scrap = Scrap::sketch(Uuid::new_v4(), Frame::default());
        let widget = manager.create(&scrap).unwrap();
        assert_eq!(widget.id(), scrap.id());
        assert!(manager.contains(scrap.id()));
        assert!(matches!(
            manager.create(&scrap),
            Err(EngineError::IllegalLifecycleState(_))
        ));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_widget_shares_frame_handle() {
        let mut manager = WidgetManager::new();
        let scrap = Scrap::sketch(Uuid::new_v4(), Frame::default());
        let widget = manager.create(&scrap).unwrap();
        assert!(Arc::ptr_eq(widget.frame_handle(), &scrap.frame_handle()));
    }

    #[test]
    fn test_states() {
        let mut manager = WidgetManager::new();
        let scrap = Scrap::sketch(Uuid::new_v4(), Frame::default());
        let id = scrap.id();
        let widget = manager.create(&scrap).unwrap();

        assert_eq!(manager.state(id), WidgetState::Normal);
        manager.focus(id);
        assert_eq!(manager.state(id), WidgetState::Focused);
        widget.mark_busy();
        assert_eq!(manager.state(id), WidgetState::Busy);
        widget.mark_not_busy();
        manager.clear_focus();
        assert_eq!(manager.state(id), WidgetState::Normal);
    }

    #[test]
    fn test_remove_releases_focus() {
        let mut manager = WidgetManager::new();
        let scrap = Scrap::sketch(Uuid::new_v4(), Frame::default());
        manager.create(&scrap).unwrap();
        manager.focus(scrap.id());
        assert!(manager.remove(scrap.id()).is_some());
        assert_eq!(manager.focused(), None);
        assert!(manager.is_empty());
        assert!(manager.remove(scrap.id()).is_none());
    }
}
