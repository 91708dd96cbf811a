//! Editing-session data: the session aggregate, the undo history, the
//! per-mode tools and the result magnifier.

pub mod history;
pub mod magnifier;
pub mod model;
pub mod tools;

pub use history::{HistoryError, HistoryResult, HistoryStack, HISTORY_CAPACITY};
pub use magnifier::{LensFrame, Magnifier, MAGNIFIER_ZOOM};
pub use model::{EditSession, EncodedImage, OriginalFile};
pub use tools::{
    default_region, ActionType, BrushOptions, CoordinateFields, DetachedCropper, MaskError,
    MaskSurface, RegionCropper, RegionHandler, RegionInbox, SelectionStore,
};
