mod mask;
mod selection;

pub use mask::{
    ActionType, BrushOptions, MaskError, MaskResult, MaskStroke, MaskSurface, BRUSH_SIZE_MAX,
    BRUSH_SIZE_MIN, DEFAULT_BRUSH_SIZE,
};
pub use selection::{
    default_region, CoordinateFields, DetachedCropper, RegionCropper, RegionHandler, RegionInbox, SelectionStore,
    DEFAULT_REGION_SIZE,
};
