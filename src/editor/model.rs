use std::io::Cursor;
use std::sync::Arc;

use image::ImageReader;

use super::history::{HistoryResult, HistoryStack};
use super::tools::{BrushOptions, SelectionStore};
use crate::geometry::{ElementBox, ImageSize};

/// An encoded bitmap (PNG, JPEG, ...) together with its natural size. Bytes
/// are shared so snapshots are cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Arc<[u8]>,
    media_type: String,
    size: ImageSize,
}

impl EncodedImage {
    /// Reads the header to learn the natural size; pixel data is not decoded.
    pub fn from_bytes(
        bytes: impl Into<Arc<[u8]>>,
        media_type: impl Into<String>,
    ) -> image::ImageResult<Self> {
        let bytes = bytes.into();
        let (width, height) = ImageReader::new(Cursor::new(&bytes[..]))
            .with_guessed_format()?
            .into_dimensions()?;
        Ok(Self {
            bytes,
            media_type: media_type.into(),
            size: ImageSize::new(width, height),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn size(&self) -> ImageSize {
        self.size
    }
}

/// The first uploaded source of a session, kept for naming exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalFile {
    pub name: String,
    pub media_type: String,
}

/// Single-owner state of one editing session. Only the controller mutates
/// it; collaborators read through the accessors.
#[derive(Debug, Default)]
pub struct EditSession {
    current_image: Option<EncodedImage>,
    original_file: Option<OriginalFile>,
    revision: u64,
    image_box: Option<ElementBox>,
    selection: SelectionStore,
    history: HistoryStack<EncodedImage>,
    brush: BrushOptions,
    compare_result: Option<EncodedImage>,
    processed: bool,
}

impl EditSession {
    pub fn new(brush: BrushOptions) -> Self {
        Self {
            brush,
            ..Self::default()
        }
    }

    pub fn current_image(&self) -> Option<&EncodedImage> {
        self.current_image.as_ref()
    }

    pub fn original_file(&self) -> Option<&OriginalFile> {
        self.original_file.as_ref()
    }

    /// Bumped every time `current_image` is replaced.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn image_box(&self) -> Option<ElementBox> {
        self.image_box
    }

    pub fn natural_size(&self) -> Option<ImageSize> {
        self.current_image.as_ref().map(EncodedImage::size)
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn history(&self) -> &HistoryStack<EncodedImage> {
        &self.history
    }

    pub fn brush(&self) -> BrushOptions {
        self.brush
    }

    pub fn compare_result(&self) -> Option<&EncodedImage> {
        self.compare_result.as_ref()
    }

    /// Whether a brush-mode result has replaced the source at least once.
    pub fn has_processed_image(&self) -> bool {
        self.processed
    }

    pub(crate) fn begin(&mut self, image: EncodedImage, original: OriginalFile) {
        self.current_image = Some(image);
        self.original_file = Some(original);
        self.revision = self.revision.wrapping_add(1);
        self.image_box = None;
        self.selection.clear();
        self.history.clear();
        self.compare_result = None;
        self.processed = false;
    }

    pub(crate) fn set_image_box(&mut self, image_box: ElementBox) {
        self.image_box = Some(image_box);
    }

    pub(crate) fn selection_mut(&mut self) -> &mut SelectionStore {
        &mut self.selection
    }

    pub(crate) fn brush_mut(&mut self) -> &mut BrushOptions {
        &mut self.brush
    }

    /// Pushes the image being replaced onto the history and installs the
    /// processed one.
    pub(crate) fn apply_in_place(&mut self, image: EncodedImage) {
        if let Some(previous) = self.current_image.replace(image) {
            self.history.push(previous);
        }
        self.revision = self.revision.wrapping_add(1);
        self.processed = true;
    }

    pub(crate) fn undo(&mut self) -> HistoryResult<&EncodedImage> {
        let previous = self.history.pop()?;
        self.revision = self.revision.wrapping_add(1);
        let restored: &EncodedImage = self.current_image.insert(previous);
        Ok(restored)
    }

    pub(crate) fn set_compare_result(&mut self, image: EncodedImage) {
        self.compare_result = Some(image);
    }
}

#[cfg(test)]
pub(crate) mod test_images {
    use super::EncodedImage;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    pub(crate) fn png_bytes(width: u32, height: u32, shade: u8) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([shade, shade, shade, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("png encoding should succeed");
        bytes
    }

    pub(crate) fn png(width: u32, height: u32, shade: u8) -> EncodedImage {
        EncodedImage::from_bytes(png_bytes(width, height, shade), "image/png")
            .expect("generated png should decode")
    }
}
