//! Zoom lens shown over the rectangle-mode result image.

use crate::geometry::{ElementBox, PointerPosition};

pub const MAGNIFIER_ZOOM: f64 = 3.0;
pub const LENS_BORDER: f64 = 3.0;
pub const DEFAULT_LENS_SIZE: f64 = 120.0;

/// Placement of the lens for one pointer sample. `left`/`top` are relative to
/// the result container; the background offsets are the distances the zoomed
/// image is shifted up and left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensFrame {
    pub left: f64,
    pub top: f64,
    pub background_x: f64,
    pub background_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Lens {
    image: ElementBox,
    container: ElementBox,
    background_width: f64,
    background_height: f64,
}

#[derive(Debug, Clone)]
pub struct Magnifier {
    lens_width: f64,
    lens_height: f64,
    border: f64,
    zoom: f64,
    lens: Option<Lens>,
    visible: bool,
    frame: Option<LensFrame>,
}

impl Default for Magnifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Magnifier {
    pub fn new() -> Self {
        Self::with_lens(DEFAULT_LENS_SIZE, DEFAULT_LENS_SIZE)
    }

    pub fn with_lens(lens_width: f64, lens_height: f64) -> Self {
        Self {
            lens_width: lens_width.max(1.0),
            lens_height: lens_height.max(1.0),
            border: LENS_BORDER,
            zoom: MAGNIFIER_ZOOM,
            lens: None,
            visible: false,
            frame: None,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn is_created(&self) -> bool {
        self.lens.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn frame(&self) -> Option<LensFrame> {
        self.frame.filter(|_| self.visible)
    }

    /// Zoomed background size, `rendered * zoom`.
    pub fn background_size(&self) -> Option<(f64, f64)> {
        self.lens
            .map(|lens| (lens.background_width, lens.background_height))
    }

    /// Builds the lens for a freshly loaded result image. An image that is not
    /// rendered yet gets no lens.
    pub fn create(&mut self, image: ElementBox, container: ElementBox) {
        self.visible = false;
        self.frame = None;
        if image.is_empty() {
            self.lens = None;
            return;
        }
        self.lens = Some(Lens {
            image,
            container,
            background_width: image.width * self.zoom,
            background_height: image.height * self.zoom,
        });
    }

    pub fn resize(&mut self, image: ElementBox, container: ElementBox) {
        if let Some(lens) = self.lens.as_mut() {
            lens.image = image;
            lens.container = container;
            lens.background_width = image.width * self.zoom;
            lens.background_height = image.height * self.zoom;
        }
    }

    pub fn destroy(&mut self) {
        self.lens = None;
        self.visible = false;
        self.frame = None;
    }

    pub fn enter(&mut self) {
        if let Some(lens) = self.lens.as_mut() {
            lens.background_width = lens.image.width * self.zoom;
            lens.background_height = lens.image.height * self.zoom;
            self.visible = true;
        }
    }

    pub fn leave(&mut self) {
        self.visible = false;
    }

    pub fn track(&mut self, pointer: PointerPosition) -> Option<LensFrame> {
        let lens = self.lens?;
        let half_width = self.lens_width / 2.0;
        let half_height = self.lens_height / 2.0;
        let local = lens.image.local_point(pointer);

        let x = local
            .x
            .min(lens.image.width - half_width / self.zoom)
            .max(half_width / self.zoom);
        let y = local
            .y
            .min(lens.image.height - half_height / self.zoom)
            .max(half_height / self.zoom);

        let image_left = lens.image.left - lens.container.left;
        let image_top = lens.image.top - lens.container.top;
        let frame = LensFrame {
            left: image_left + x - half_width,
            top: image_top + y - half_height,
            background_x: x * self.zoom - half_width + self.border,
            background_y: y * self.zoom - half_height + self.border,
        };
        self.visible = true;
        self.frame = Some(frame);
        Some(frame)
    }
}
