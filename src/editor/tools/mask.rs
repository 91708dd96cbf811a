use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use imageproc::point::Point as PolygonPoint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{ImageSize, Point};

pub const BRUSH_SIZE_MIN: u32 = 1;
pub const BRUSH_SIZE_MAX: u32 = 200;
pub const DEFAULT_BRUSH_SIZE: u32 = 20;

const ERASE_STROKE_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const MOSAIC_STROKE_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// What the removal service should do with the masked pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    #[default]
    Erase,
    Mosaic,
}

impl ActionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Erase => "erase",
            Self::Mosaic => "mosaic",
        }
    }

    /// Mosaic strokes are opaque black; erase strokes use red so the two are
    /// distinguishable on screen.
    pub const fn stroke_color(self) -> Rgba<u8> {
        match self {
            Self::Erase => ERASE_STROKE_COLOR,
            Self::Mosaic => MOSAIC_STROKE_COLOR,
        }
    }
}

impl std::str::FromStr for ActionType {
    type Err = MaskError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "erase" | "remove" => Ok(Self::Erase),
            "mosaic" => Ok(Self::Mosaic),
            other => Err(MaskError::UnknownAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushOptions {
    size: u32,
    action: ActionType,
}

impl Default for BrushOptions {
    fn default() -> Self {
        Self {
            size: DEFAULT_BRUSH_SIZE,
            action: ActionType::default(),
        }
    }
}

impl BrushOptions {
    pub fn new(size: u32, action: ActionType) -> Self {
        let mut options = Self::default();
        options.set_size(size);
        options.set_action(action);
        options
    }

    pub const fn size(&self) -> u32 {
        self.size
    }

    pub const fn action(&self) -> ActionType {
        self.action
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = size.clamp(BRUSH_SIZE_MIN, BRUSH_SIZE_MAX);
    }

    pub fn set_action(&mut self, action: ActionType) {
        self.action = action;
    }
}

#[derive(Debug, Error)]
pub enum MaskError {
    #[error("failed to encode mask surface as PNG: {0}")]
    Encode(#[from] image::ImageError),
    #[error("unknown brush action `{0}`; expected `erase` or `mosaic`")]
    UnknownAction(String),
}

pub type MaskResult<T> = std::result::Result<T, MaskError>;

#[derive(Debug, Clone, PartialEq)]
pub struct MaskStroke {
    pub id: u64,
    pub points: Vec<Point>,
    pub color: Rgba<u8>,
    pub width: u32,
    pub finalized: bool,
}

impl MaskStroke {
    fn new(id: u64, start: Point, color: Rgba<u8>, width: u32) -> Self {
        Self {
            id,
            points: vec![start],
            color,
            width,
            finalized: false,
        }
    }
}

/// Drawable surface collecting freehand strokes at the displayed size of the
/// working image. Strokes are kept as paths alongside the raster so that a
/// subset of them can be retired after a round-trip.
#[derive(Debug, Clone)]
pub struct MaskSurface {
    raster: RgbaImage,
    strokes: Vec<MaskStroke>,
    next_id: u64,
    active_stroke: Option<u64>,
    color: Rgba<u8>,
    line_width: u32,
}

impl MaskSurface {
    pub fn new(size: ImageSize, options: BrushOptions) -> Self {
        Self {
            raster: RgbaImage::from_pixel(size.width, size.height, BACKGROUND),
            strokes: Vec::new(),
            next_id: 1,
            active_stroke: None,
            color: options.action().stroke_color(),
            line_width: options.size(),
        }
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.raster.width(), self.raster.height())
    }

    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    pub fn strokes(&self) -> &[MaskStroke] {
        &self.strokes
    }

    pub fn has_strokes(&self) -> bool {
        !self.strokes.is_empty()
    }

    pub fn is_drawing(&self) -> bool {
        self.active_stroke.is_some()
    }

    pub fn last_stroke_id(&self) -> Option<u64> {
        self.strokes.last().map(|stroke| stroke.id)
    }

    /// Applies to strokes started after the call.
    pub fn set_action(&mut self, action: ActionType) {
        self.color = action.stroke_color();
    }

    pub fn set_line_width(&mut self, width: u32) {
        self.line_width = width.clamp(BRUSH_SIZE_MIN, BRUSH_SIZE_MAX);
    }

    pub fn begin_stroke(&mut self, point: Point) -> u64 {
        if self.active_stroke.is_some() {
            self.end_stroke();
        }
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        let stroke = MaskStroke::new(id, point, self.color, self.line_width);
        stamp_segment(&mut self.raster, point, point, stroke.width, stroke.color);
        self.strokes.push(stroke);
        self.active_stroke = Some(id);
        id
    }

    /// Draws a round-capped segment from the previous anchor to `point` and
    /// moves the anchor there. Ignored when no stroke is active.
    pub fn extend_stroke(&mut self, point: Point) -> bool {
        let Some(active_id) = self.active_stroke else {
            return false;
        };
        let Some(stroke) = self.strokes.iter_mut().rev().find(|s| s.id == active_id) else {
            self.active_stroke = None;
            return false;
        };
        let Some(&anchor) = stroke.points.last() else {
            return false;
        };
        stamp_segment(&mut self.raster, anchor, point, stroke.width, stroke.color);
        stroke.points.push(point);
        true
    }

    pub fn end_stroke(&mut self) -> Option<u64> {
        let active_id = self.active_stroke.take()?;
        if let Some(stroke) = self.strokes.iter_mut().find(|s| s.id == active_id) {
            stroke.finalized = true;
        }
        Some(active_id)
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.active_stroke = None;
        fill_background(&mut self.raster);
    }

    /// Retires every stroke with an id up to and including `last_id`, keeping
    /// anything drawn afterwards.
    pub fn clear_through(&mut self, last_id: u64) {
        let before = self.strokes.len();
        self.strokes.retain(|stroke| stroke.id > last_id);
        if self
            .active_stroke
            .is_some_and(|active| !self.strokes.iter().any(|s| s.id == active))
        {
            self.active_stroke = None;
        }
        if self.strokes.len() != before {
            self.redraw();
        }
    }

    /// Encodes the surface as a PNG with the same pixel dimensions; untouched
    /// pixels stay fully transparent.
    pub fn serialize(&self) -> MaskResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.raster
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    fn redraw(&mut self) {
        fill_background(&mut self.raster);
        for stroke in &self.strokes {
            let mut anchor = stroke.points[0];
            stamp_segment(&mut self.raster, anchor, anchor, stroke.width, stroke.color);
            for &point in &stroke.points[1..] {
                stamp_segment(&mut self.raster, anchor, point, stroke.width, stroke.color);
                anchor = point;
            }
        }
    }
}

fn fill_background(raster: &mut RgbaImage) {
    for pixel in raster.pixels_mut() {
        *pixel = BACKGROUND;
    }
}

fn stamp_segment(raster: &mut RgbaImage, from: Point, to: Point, width: u32, color: Rgba<u8>) {
    let half_width = f64::from(width.max(1)) / 2.0;
    let radius = half_width.round() as i32;
    draw_filled_circle_mut(raster, round_point(from), radius, color);
    draw_filled_circle_mut(raster, round_point(to), radius, color);

    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length = dx.hypot(dy);
    if length < 1.0 {
        return;
    }
    let nx = -dy / length * half_width;
    let ny = dx / length * half_width;
    let body = [
        polygon_point(from.x + nx, from.y + ny),
        polygon_point(to.x + nx, to.y + ny),
        polygon_point(to.x - nx, to.y - ny),
        polygon_point(from.x - nx, from.y - ny),
    ];
    if body[0] != body[3] {
        draw_polygon_mut(raster, &body, color);
    }
}

fn round_point(point: Point) -> (i32, i32) {
    (point.x.round() as i32, point.y.round() as i32)
}

fn polygon_point(x: f64, y: f64) -> PolygonPoint<i32> {
    PolygonPoint::new(x.round() as i32, y.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(width: u32, height: u32) -> MaskSurface {
        MaskSurface::new(ImageSize::new(width, height), BrushOptions::default())
    }

    fn painted(surface: &MaskSurface, x: u32, y: u32) -> bool {
        surface.raster().get_pixel(x, y)[3] != 0
    }

    #[test]
    fn brush_size_is_clamped_to_supported_range() {
        let mut options = BrushOptions::default();
        assert_eq!(options.size(), DEFAULT_BRUSH_SIZE);
        options.set_size(0);
        assert_eq!(options.size(), BRUSH_SIZE_MIN);
        options.set_size(10_000);
        assert_eq!(options.size(), BRUSH_SIZE_MAX);
    }

    #[test]
    fn action_type_parses_wire_names() {
        assert_eq!("erase".parse::<ActionType>().unwrap(), ActionType::Erase);
        assert_eq!("Mosaic".parse::<ActionType>().unwrap(), ActionType::Mosaic);
        assert!("blur".parse::<ActionType>().is_err());
        assert_eq!(ActionType::Mosaic.as_str(), "mosaic");
    }

    #[test]
    fn stroke_paints_continuous_segment_between_points() {
        let mut mask = surface(120, 60);
        mask.begin_stroke(Point::new(10.0, 30.0));
        assert!(mask.extend_stroke(Point::new(100.0, 30.0)));
        assert_eq!(mask.end_stroke(), Some(1));

        for x in (10..=100).step_by(5) {
            assert!(painted(&mask, x, 30), "pixel {x},30 should be painted");
        }
        assert!(!painted(&mask, 60, 5));
        assert!(mask.strokes()[0].finalized);
    }

    #[test]
    fn extend_without_active_stroke_is_ignored() {
        let mut mask = surface(50, 50);
        assert!(!mask.extend_stroke(Point::new(10.0, 10.0)));
        assert!(!mask.has_strokes());
        assert!(!painted(&mask, 10, 10));
    }

    #[test]
    fn stroke_color_follows_action_at_stroke_start() {
        let mut mask = surface(100, 40);
        mask.begin_stroke(Point::new(10.0, 20.0));
        mask.end_stroke();
        mask.set_action(ActionType::Mosaic);
        mask.begin_stroke(Point::new(80.0, 20.0));
        mask.end_stroke();

        assert_eq!(*mask.raster().get_pixel(10, 20), ERASE_STROKE_COLOR);
        assert_eq!(*mask.raster().get_pixel(80, 20), MOSAIC_STROKE_COLOR);
    }

    #[test]
    fn clear_through_keeps_later_strokes() {
        let mut mask = surface(100, 40);
        let first = mask.begin_stroke(Point::new(10.0, 20.0));
        mask.end_stroke();
        mask.begin_stroke(Point::new(80.0, 20.0));
        mask.end_stroke();

        mask.clear_through(first);
        assert_eq!(mask.strokes().len(), 1);
        assert!(!painted(&mask, 10, 20));
        assert!(painted(&mask, 80, 20));

        mask.clear();
        assert!(!mask.has_strokes());
        assert!(!painted(&mask, 80, 20));
    }

    #[test]
    fn serialize_produces_png_with_surface_dimensions() {
        let mut mask = surface(400, 300);
        mask.begin_stroke(Point::new(200.0, 150.0));
        mask.extend_stroke(Point::new(220.0, 160.0));
        mask.end_stroke();

        let bytes = mask.serialize().expect("mask should encode");
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
            .expect("encoded mask should decode");
        let rgba = decoded.to_rgba8();
        assert_eq!(rgba.dimensions(), (400, 300));
        assert_eq!(rgba.get_pixel(0, 0)[3], 0);
        assert_eq!(*rgba.get_pixel(200, 150), ERASE_STROKE_COLOR);
    }
}
