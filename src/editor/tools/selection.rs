use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::geometry::{natural_pixel_rect, ElementBox, ImageSize, PixelRect, RegionRect, ScaleFactors};

/// Side length of the region proposed when the rectangle tool is entered.
pub const DEFAULT_REGION_SIZE: u32 = 100;

pub type RegionHandler = Box<dyn FnMut(RegionRect)>;

/// Capability surface of the rectangular cropping widget. Regions are
/// exchanged in displayed space; the widget keeps them inside the image.
pub trait RegionCropper {
    /// Shows the crop affordance over the displayed image.
    fn attach(&mut self, image: ElementBox);
    fn region(&self) -> Option<RegionRect>;
    fn set_region(&mut self, region: RegionRect);
    fn on_region_changed(&mut self, handler: RegionHandler);
    fn destroy(&mut self);
}

/// Queue the cropper's change handler writes into; drained by the controller
/// on its next dispatch.
#[derive(Debug, Clone, Default)]
pub struct RegionInbox {
    pending: Rc<RefCell<VecDeque<RegionRect>>>,
}

impl RegionInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(&self) -> RegionHandler {
        let pending = Rc::clone(&self.pending);
        Box::new(move |region| pending.borrow_mut().push_back(region))
    }

    pub fn drain(&self) -> Vec<RegionRect> {
        self.pending.borrow_mut().drain(..).collect()
    }

    pub fn discard(&self) {
        self.pending.borrow_mut().clear();
    }
}

/// Cropper without an on-screen widget. Programmatic regions are echoed to
/// the change handler the way an interactive widget reports them.
#[derive(Default)]
pub struct DetachedCropper {
    image: Option<ElementBox>,
    region: Option<RegionRect>,
    handler: Option<RegionHandler>,
}

impl DetachedCropper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.image.is_some()
    }
}

impl RegionCropper for DetachedCropper {
    fn attach(&mut self, image: ElementBox) {
        self.image = Some(image);
    }

    fn region(&self) -> Option<RegionRect> {
        self.region
    }

    fn set_region(&mut self, region: RegionRect) {
        let Some(image) = self.image else {
            return;
        };
        let x = region.x.clamp(0.0, image.width);
        let y = region.y.clamp(0.0, image.height);
        let contained = RegionRect::new(
            x,
            y,
            region.width.min(image.width - x),
            region.height.min(image.height - y),
        );
        self.region = Some(contained);
        if let Some(handler) = self.handler.as_mut() {
            handler(contained);
        }
    }

    fn on_region_changed(&mut self, handler: RegionHandler) {
        self.handler = Some(handler);
    }

    fn destroy(&mut self) {
        self.image = None;
        self.region = None;
        self.handler = None;
    }
}

/// Anchors a `min(100, w) x min(100, h)` region at the bottom-right corner.
pub fn default_region(natural: ImageSize) -> PixelRect {
    let width = DEFAULT_REGION_SIZE.min(natural.width);
    let height = DEFAULT_REGION_SIZE.min(natural.height);
    PixelRect::new(
        natural.width - width,
        natural.height - height,
        width,
        height,
    )
}

/// Values mirrored into the four numeric coordinate fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateFields {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl From<PixelRect> for CoordinateFields {
    fn from(rect: PixelRect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            w: rect.width,
            h: rect.height,
        }
    }
}

/// Committed rectangular selection in natural image space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionStore {
    selection: Option<PixelRect>,
}

impl SelectionStore {
    pub const fn new() -> Self {
        Self { selection: None }
    }

    pub fn current(&self) -> Option<PixelRect> {
        self.selection
    }

    pub fn coordinate_fields(&self) -> Option<CoordinateFields> {
        self.selection.map(CoordinateFields::from)
    }

    /// Converts a displayed-space region reported by the widget and commits
    /// the part of it that lies inside the image.
    pub fn commit_displayed(
        &mut self,
        region: RegionRect,
        displayed: ElementBox,
        natural: ImageSize,
    ) -> Option<PixelRect> {
        let scale = ScaleFactors::between(displayed, natural)?;
        let rect = natural_pixel_rect(scale.to_natural(region), natural)?;
        self.selection = Some(rect);
        Some(rect)
    }

    pub fn commit_natural(&mut self, rect: PixelRect, natural: ImageSize) -> Option<PixelRect> {
        let rect = rect.contained_in(natural)?;
        self.selection = Some(rect);
        Some(rect)
    }

    pub fn clear(&mut self) {
        self.selection = None;
    }
}
