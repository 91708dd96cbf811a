//! Geometric primitives and the conversions between displayed space (the
//! image as laid out on screen) and natural space (the source bitmap).

/// A point in floating-point pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pointer sample as reported by the input layer: page coordinates plus the
/// page scroll offset at the time of the event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerPosition {
    pub page_x: f64,
    pub page_y: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl PointerPosition {
    pub const fn new(page_x: f64, page_y: f64) -> Self {
        Self {
            page_x,
            page_y,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    pub const fn with_scroll(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }
}

/// Bounding box of a rendered element, relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementBox {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub const fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Rendered size rounded to whole pixels, as a drawable surface would be
    /// allocated.
    pub fn pixel_size(&self) -> Option<ImageSize> {
        if self.is_empty() {
            return None;
        }
        let width = self.width.round().max(1.0) as u32;
        let height = self.height.round().max(1.0) as u32;
        Some(ImageSize::new(width, height))
    }

    /// Maps a pointer sample to coordinates local to this element.
    pub fn local_point(&self, pointer: PointerPosition) -> Point {
        Point::new(
            pointer.page_x - self.left - pointer.scroll_x,
            pointer.page_y - self.top - pointer.scroll_y,
        )
    }
}

/// Pixel dimensions of a bitmap or surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Integer rectangle in natural image space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn fits_within(&self, bounds: ImageSize) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(bounds.width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(bounds.height)
    }

    /// Intersects the rectangle with the image bounds. Returns `None` when
    /// nothing of it remains inside the image.
    pub fn contained_in(&self, bounds: ImageSize) -> Option<Self> {
        if self.x >= bounds.width || self.y >= bounds.height {
            return None;
        }
        let width = self.width.min(bounds.width - self.x);
        let height = self.height.min(bounds.height - self.y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self::new(self.x, self.y, width, height))
    }
}

/// Floating-point rectangle, used for displayed-space regions reported by a
/// cropping widget.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RegionRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RegionRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Scale between displayed space and natural space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub sx: f64,
    pub sy: f64,
}

impl ScaleFactors {
    /// `natural / displayed` per axis. `None` when the image is not laid out.
    pub fn between(displayed: ElementBox, natural: ImageSize) -> Option<Self> {
        if displayed.is_empty() || natural.width == 0 || natural.height == 0 {
            return None;
        }
        Some(Self {
            sx: f64::from(natural.width) / displayed.width,
            sy: f64::from(natural.height) / displayed.height,
        })
    }

    pub fn to_natural_point(&self, point: Point) -> Point {
        Point::new(point.x * self.sx, point.y * self.sy)
    }

    pub fn to_natural(&self, region: RegionRect) -> RegionRect {
        RegionRect::new(
            region.x * self.sx,
            region.y * self.sy,
            region.width * self.sx,
            region.height * self.sy,
        )
    }

    pub fn to_displayed(&self, rect: PixelRect) -> RegionRect {
        RegionRect::new(
            f64::from(rect.x) / self.sx,
            f64::from(rect.y) / self.sy,
            f64::from(rect.width) / self.sx,
            f64::from(rect.height) / self.sy,
        )
    }
}

/// Rounds a natural-space region to integer pixels and contains it within the
/// image. Negative origins are pulled to zero and the extent shrunk by the
/// same amount.
pub fn natural_pixel_rect(region: RegionRect, bounds: ImageSize) -> Option<PixelRect> {
    let mut x = region.x.round();
    let mut y = region.y.round();
    let mut width = region.width.round();
    let mut height = region.height.round();
    if !(x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite()) {
        return None;
    }
    if x < 0.0 {
        width += x;
        x = 0.0;
    }
    if y < 0.0 {
        height += y;
        y = 0.0;
    }
    if width < 1.0 || height < 1.0 {
        return None;
    }
    let rect = PixelRect::new(
        saturating_u32(x),
        saturating_u32(y),
        saturating_u32(width),
        saturating_u32(height),
    );
    rect.contained_in(bounds)
}

fn saturating_u32(value: f64) -> u32 {
    value.clamp(0.0, f64::from(u32::MAX)) as u32
}
