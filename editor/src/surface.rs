use image::RgbaImage;
use maskpaint_shared::{clamp_stroke_width, BrushSettings, Color, Dimensions, Point, Stroke};

use crate::data_uri;
use crate::error::EditorError;
use crate::raster;

/// Freehand drawing surface laid over the displayed image.
///
/// Coordinates are display pixels. `revision` increases on every change to
/// what `export` would produce, which lets callers tell whether a raster
/// computed earlier is still current.
#[derive(Clone, Debug)]
pub struct MaskSurface {
    size: Dimensions,
    brush: BrushSettings,
    strokes: Vec<Stroke>,
    active: Option<Stroke>,
    revision: u64,
}

impl MaskSurface {
    pub fn new(size: Dimensions) -> Self {
        Self::with_brush(size, BrushSettings::default())
    }

    pub fn with_brush(size: Dimensions, brush: BrushSettings) -> Self {
        Self {
            size,
            brush: BrushSettings {
                color: brush.color,
                width: clamp_stroke_width(brush.width),
            },
            strokes: Vec::new(),
            active: None,
            revision: 0,
        }
    }

    pub fn size(&self) -> Dimensions {
        self.size
    }

    pub fn brush(&self) -> BrushSettings {
        self.brush
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Completed strokes, oldest first.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.active.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.active.is_none()
    }

    /// Applies to the next stroke; strokes already drawn keep their color.
    pub fn set_color(&mut self, color: Color) {
        self.brush.color = color;
    }

    /// Applies to the next stroke. Returns the width actually used after
    /// clamping into the supported range.
    pub fn set_width(&mut self, width: u32) -> u32 {
        self.brush.width = clamp_stroke_width(width);
        self.brush.width
    }

    pub fn begin_stroke(&mut self, point: Point) -> bool {
        if !point.is_finite() {
            return false;
        }
        if self.active.is_some() {
            self.end_stroke();
        }
        self.active = Some(Stroke::new(self.brush, point));
        self.revision += 1;
        true
    }

    pub fn extend_stroke(&mut self, point: Point) -> bool {
        if !point.is_finite() {
            return false;
        }
        let Some(stroke) = self.active.as_mut() else {
            return false;
        };
        if stroke.points.last() == Some(&point) {
            return false;
        }
        stroke.points.push(point);
        self.revision += 1;
        true
    }

    pub fn end_stroke(&mut self) -> Option<&Stroke> {
        let stroke = self.active.take()?;
        self.strokes.push(stroke);
        self.strokes.last()
    }

    /// Removes the most recently completed stroke. A no-op without strokes.
    pub fn undo(&mut self) -> Option<Stroke> {
        let removed = self.strokes.pop()?;
        self.revision += 1;
        Some(removed)
    }

    /// Removes every stroke, including one still being drawn.
    pub fn clear(&mut self) {
        if self.is_empty() {
            return;
        }
        self.strokes.clear();
        self.active = None;
        self.revision += 1;
    }

    /// Replaces the stroke list, dropping non-finite points and strokes left
    /// without any point.
    pub fn load_strokes(&mut self, strokes: Vec<Stroke>) {
        self.strokes = strokes
            .into_iter()
            .filter_map(|mut stroke| {
                stroke.points.retain(|point| point.is_finite());
                stroke.width = clamp_stroke_width(stroke.width);
                (!stroke.points.is_empty()).then_some(stroke)
            })
            .collect();
        self.active = None;
        self.revision += 1;
    }

    /// Rasterizes every current stroke onto a transparent background at the
    /// surface size.
    pub fn export(&self) -> RgbaImage {
        let mut canvas = raster::rasterize(&self.strokes, self.size);
        if let Some(active) = &self.active {
            raster::paint_stroke(&mut canvas, active);
        }
        canvas
    }

    pub fn export_data_uri(&self) -> Result<String, EditorError> {
        data_uri::png_data_uri(&self.export())
    }
}
