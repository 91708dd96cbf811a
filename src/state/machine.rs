use super::error::{StateError, StateResult};
use super::{EditMode, ModeEvent, ModeTransition};

#[derive(Debug)]
pub struct ModeMachine {
    mode: EditMode,
    locked: bool,
    transition_history: Vec<ModeTransition>,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self {
            mode: EditMode::default(),
            locked: false,
            transition_history: Vec::new(),
        }
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Freezes the current mode; used while a rect-mode request is pending.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn can_transition(&self, event: ModeEvent) -> bool {
        !self.locked && self.next_mode(event).is_some()
    }

    pub fn next_mode(&self, event: ModeEvent) -> Option<EditMode> {
        use ModeEvent::*;
        match (self.mode, event) {
            (EditMode::Brush, SelectRect | TryCrop) => Some(EditMode::Rect),
            (EditMode::Rect, SelectRect) => Some(EditMode::Rect),
            (EditMode::Rect, SelectBrush) => Some(EditMode::Brush),
            (EditMode::Brush, SelectBrush) => Some(EditMode::Brush),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: ModeEvent) -> StateResult<ModeTransition> {
        tracing::debug!(from = %self.mode, event = ?event, "request mode transition");
        let from = self.mode;
        if self.locked {
            tracing::warn!(from = %from, event = ?event, "mode switch refused while locked");
            return Err(StateError::LockedWhileInFlight { from, event });
        }
        let next = self.next_mode(event).ok_or_else(|| {
            tracing::warn!(from = %from, event = ?event, "invalid mode transition requested");
            StateError::InvalidModeTransition { from, event }
        })?;

        let record = ModeTransition::new(from, event, next);
        self.mode = next;
        self.transition_history.push(record);
        Ok(record)
    }

    pub fn history(&self) -> &[ModeTransition] {
        &self.transition_history
    }
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ModeMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EditMode::{:?}", self.mode)
    }
}
