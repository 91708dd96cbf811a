use super::model::EditMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    SelectRect,
    SelectBrush,
    /// "Try the rectangle tool" affordance offered from brush mode.
    TryCrop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeTransition {
    pub from: EditMode,
    pub event: ModeEvent,
    pub to: EditMode,
}

impl ModeTransition {
    pub const fn new(from: EditMode, event: ModeEvent, to: EditMode) -> Self {
        Self { from, event, to }
    }

    pub fn changes_mode(&self) -> bool {
        self.from != self.to
    }
}
