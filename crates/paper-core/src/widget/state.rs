//! Widget state definitions.

/// The interaction state of a scrap widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetState {
    /// Displayed, no interaction.
    #[default]
    Normal,
    /// Holds the editor focus.
    Focused,
    /// A manipulator is driving the widget.
    Busy,
}

impl WidgetState {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }
}
