use crate::editor::CoordinateFields;
use crate::state::EditMode;

pub const PROCESS_LABEL: &str = "Remove watermark";
pub const PROCESS_BUSY_LABEL: &str = "Processing...";
pub const COPY_LABEL: &str = "Copy";
pub const COPY_BUSY_LABEL: &str = "Copying...";
pub const COPY_DONE_LABEL: &str = "Copied!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyState {
    #[default]
    Idle,
    Copying,
    Copied,
}

impl CopyState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => COPY_LABEL,
            Self::Copying => COPY_BUSY_LABEL,
            Self::Copied => COPY_DONE_LABEL,
        }
    }
}

/// Snapshot of how the controls should look, derived from controller state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlsView {
    pub mode: EditMode,
    pub image_loaded: bool,
    pub process_visible: bool,
    pub process_enabled: bool,
    pub process_label: &'static str,
    pub busy_cursor: bool,
    pub mask_visible: bool,
    pub cropper_visible: bool,
    pub brush_settings_visible: bool,
    pub rect_settings_visible: bool,
    pub result_panel_visible: bool,
    pub export_enabled: bool,
    pub undo_enabled: bool,
    pub copy_label: &'static str,
    pub copy_enabled: bool,
    pub coordinates: Option<CoordinateFields>,
}
