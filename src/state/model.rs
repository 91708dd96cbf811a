use std::fmt;

/// Input modality used to designate what the removal service should touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditMode {
    /// A single rectangular region picked with the cropping widget.
    Rect,
    /// Freehand strokes painted onto the mask surface.
    #[default]
    Brush,
}

impl EditMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::Brush => "brush",
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
