//! Editor session: the state behind one editing view.
//!
//! Asynchronous steps are split into `begin_*`, which snapshots what the
//! step needs and takes a request token, and `finish_*`, which applies the
//! result only if that token is still the latest. Callers can await between
//! the two without holding a borrow of the session.

use std::sync::Arc;

use image::RgbaImage;
use maskpaint_shared::{
    BrushSettings, Color, Dimensions, MaskDraft, Point, Stroke, UploadRequest, UploadResponse,
};

use crate::api::ApiClient;
use crate::compositor::{scale_to, Compositor};
use crate::config::{EditorConfig, MaskPayload};
use crate::data_uri;
use crate::error::{ApiError, EditorError};
use crate::lifecycle::{RequestSequence, RequestToken};
use crate::loader::LoadedImage;
use crate::notice::{self, Notice};
use crate::surface::MaskSurface;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorPhase {
    Empty,
    ImageLoaded,
    Drawing,
    PreviewReady,
    Submitting,
}

/// A flattened preview at the original's native resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositePreview {
    pub data_uri: String,
    pub size: Dimensions,
    /// Surface revision the mask was exported at.
    pub revision: u64,
}

/// Everything needed to render a preview away from the session.
pub struct PreviewTicket {
    pub token: RequestToken,
    pub revision: u64,
    pub original: Arc<RgbaImage>,
    pub mask: RgbaImage,
}

impl PreviewTicket {
    pub fn render(&self, compositor: &mut Compositor) -> Result<CompositePreview, EditorError> {
        let composite = compositor.compose(&self.original, &self.mask);
        Ok(CompositePreview {
            data_uri: data_uri::png_data_uri(composite)?,
            size: Dimensions::new(composite.width(), composite.height()),
            revision: self.revision,
        })
    }
}

#[derive(Debug)]
pub enum PreviewOutcome {
    Ready,
    Failed(EditorError),
    Stale,
}

#[derive(Clone, Debug)]
pub struct SubmitTicket {
    pub token: RequestToken,
    pub request: UploadRequest,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved(UploadResponse),
    Failed(ApiError),
    /// A newer submission or a reset superseded this one.
    Stale,
}

impl SubmitOutcome {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            SubmitOutcome::Saved(_) => Some(Notice::success(notice::SAVE_SUCCEEDED)),
            SubmitOutcome::Failed(_) => Some(Notice::failure(notice::SAVE_FAILED)),
            SubmitOutcome::Stale => None,
        }
    }
}

pub struct EditorSession {
    max_display_width: u32,
    mask_payload: MaskPayload,
    brush: BrushSettings,
    image: Option<LoadedImage>,
    surface: Option<MaskSurface>,
    preview: Option<CompositePreview>,
    compositor: Compositor,
    previews: RequestSequence,
    submissions: RequestSequence,
    in_flight: Option<RequestToken>,
}

impl EditorSession {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            max_display_width: config.max_display_width,
            mask_payload: config.mask_payload,
            brush: BrushSettings::default(),
            image: None,
            surface: None,
            preview: None,
            compositor: Compositor::new(),
            previews: RequestSequence::new(),
            submissions: RequestSequence::new(),
            in_flight: None,
        }
    }

    pub fn phase(&self) -> EditorPhase {
        let Some(surface) = &self.surface else {
            return EditorPhase::Empty;
        };
        if self.image.is_none() {
            return EditorPhase::Empty;
        }
        if self.in_flight.is_some() {
            return EditorPhase::Submitting;
        }
        if self.current_preview().is_some() {
            return EditorPhase::PreviewReady;
        }
        if surface.revision() > 0 {
            return EditorPhase::Drawing;
        }
        EditorPhase::ImageLoaded
    }

    pub fn image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    pub fn surface(&self) -> Option<&MaskSurface> {
        self.surface.as_ref()
    }

    pub fn preview(&self) -> Option<&CompositePreview> {
        self.preview.as_ref()
    }

    /// The preview, if it was computed from the strokes currently on the
    /// surface.
    pub fn current_preview(&self) -> Option<&CompositePreview> {
        let surface = self.surface.as_ref()?;
        self.preview
            .as_ref()
            .filter(|preview| preview.revision == surface.revision())
    }

    pub fn brush(&self) -> BrushSettings {
        self.brush
    }

    pub fn mask_payload(&self) -> MaskPayload {
        self.mask_payload
    }

    pub fn set_mask_payload(&mut self, payload: MaskPayload) {
        self.mask_payload = payload;
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Replaces the current image and starts a fresh surface sized to its
    /// display dimensions. Pending previews and submissions become stale.
    pub fn load_image(&mut self, image: LoadedImage) {
        log::info!(
            "Editing image natural={} display={}",
            image.natural,
            image.display
        );
        self.surface = Some(MaskSurface::with_brush(image.display, self.brush));
        self.image = Some(image);
        self.preview = None;
        self.previews.invalidate();
        self.submissions.invalidate();
        self.in_flight = None;
    }

    /// Decodes `bytes` and loads the result. On failure the session is left
    /// exactly as it was.
    pub fn load_image_bytes(&mut self, bytes: &[u8]) -> Result<&LoadedImage, EditorError> {
        let image = LoadedImage::from_bytes(bytes, self.max_display_width).map_err(|error| {
            log::warn!("Ignoring image that failed to load: {error}");
            error
        })?;
        self.load_image(image);
        self.image.as_ref().ok_or(EditorError::NoImage)
    }

    pub fn set_color(&mut self, color: Color) {
        self.brush.color = color;
        if let Some(surface) = self.surface.as_mut() {
            surface.set_color(color);
        }
    }

    pub fn set_width(&mut self, width: u32) -> u32 {
        self.brush.width = maskpaint_shared::clamp_stroke_width(width);
        if let Some(surface) = self.surface.as_mut() {
            surface.set_width(width);
        }
        self.brush.width
    }

    pub fn begin_stroke(&mut self, point: Point) -> bool {
        self.surface
            .as_mut()
            .is_some_and(|surface| surface.begin_stroke(point))
    }

    pub fn extend_stroke(&mut self, point: Point) -> bool {
        self.surface
            .as_mut()
            .is_some_and(|surface| surface.extend_stroke(point))
    }

    pub fn end_stroke(&mut self) -> bool {
        self.surface
            .as_mut()
            .is_some_and(|surface| surface.end_stroke().is_some())
    }

    pub fn undo(&mut self) -> Option<Stroke> {
        self.surface.as_mut()?.undo()
    }

    pub fn clear(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
        }
    }

    /// Replays a saved draft, rescaling it when it was drawn at a different
    /// display size.
    pub fn load_draft(&mut self, draft: &MaskDraft) -> Result<(), EditorError> {
        let surface = self.surface.as_mut().ok_or(EditorError::NoImage)?;
        let target = surface.size();
        let strokes = match draft.display {
            Some(source) if source != target && !source.is_empty() => {
                let sx = target.width as f32 / source.width as f32;
                let sy = target.height as f32 / source.height as f32;
                draft
                    .strokes
                    .iter()
                    .map(|stroke| Stroke {
                        color: stroke.color,
                        width: ((stroke.width as f32 * sx.min(sy)).round() as u32).max(1),
                        points: stroke.points.iter().map(|p| p.scale(sx, sy)).collect(),
                    })
                    .collect()
            }
            _ => draft.strokes.clone(),
        };
        surface.load_strokes(strokes);
        Ok(())
    }

    pub fn draft(&self) -> Option<MaskDraft> {
        let surface = self.surface.as_ref()?;
        Some(MaskDraft {
            display: Some(surface.size()),
            strokes: surface.strokes().to_vec(),
        })
    }

    /// Exports the mask and snapshots the original for compositing.
    pub fn begin_preview(&mut self) -> Result<PreviewTicket, EditorError> {
        let image = self.image.as_ref().ok_or(EditorError::NoImage)?;
        let surface = self.surface.as_ref().ok_or(EditorError::NoImage)?;
        Ok(PreviewTicket {
            token: self.previews.next(),
            revision: surface.revision(),
            original: image.shared_pixels(),
            mask: surface.export(),
        })
    }

    pub fn finish_preview(
        &mut self,
        token: RequestToken,
        result: Result<CompositePreview, EditorError>,
    ) -> PreviewOutcome {
        if !self.previews.is_latest(token) {
            log::debug!("Discarding stale preview token={}", token.value());
            return PreviewOutcome::Stale;
        }
        match result {
            Ok(preview) => {
                log::debug!(
                    "Preview ready size={} revision={}",
                    preview.size,
                    preview.revision
                );
                self.preview = Some(preview);
                PreviewOutcome::Ready
            }
            Err(error) => {
                log::warn!("Preview failed: {error}");
                PreviewOutcome::Failed(error)
            }
        }
    }

    /// Renders a preview in place with the session's own compositor.
    pub fn render_preview(&mut self) -> Result<&CompositePreview, EditorError> {
        let ticket = self.begin_preview()?;
        let result = ticket.render(&mut self.compositor);
        match self.finish_preview(ticket.token, result) {
            PreviewOutcome::Failed(error) => Err(error),
            PreviewOutcome::Ready => self.preview.as_ref().ok_or(EditorError::NoImage),
            // Unreachable in practice: the ticket was issued above under the
            // same borrow, so it is still the latest.
            PreviewOutcome::Stale => Err(EditorError::PreviewSuperseded),
        }
    }

    /// Builds the upload for the current image and strokes. The composite is
    /// re-rendered first whenever the strokes changed after the last
    /// preview, so a stale preview is never submitted.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, EditorError> {
        if self.image.is_none() {
            return Err(EditorError::NoImage);
        }
        if self.current_preview().is_none() {
            log::debug!("Preview missing or stale, rendering before submit");
            self.render_preview()?;
        }
        let image = self.image.as_ref().ok_or(EditorError::NoImage)?;
        let mask_image = match self.mask_payload {
            MaskPayload::Composite => {
                let preview = self.preview.as_ref().ok_or(EditorError::NoImage)?;
                data_uri::strip_prefix(&preview.data_uri).to_string()
            }
            MaskPayload::Mask => {
                let surface = self.surface.as_ref().ok_or(EditorError::NoImage)?;
                let mask = surface.export();
                let native = scale_to(&mask, image.natural.width, image.natural.height);
                data_uri::strip_prefix(&data_uri::png_data_uri(&native)?).to_string()
            }
        };
        let request = UploadRequest {
            original_image: data_uri::strip_prefix(&image.data_uri).to_string(),
            mask_image,
        };
        let token = self.submissions.next();
        self.in_flight = Some(token);
        log::info!(
            "Submitting image pair token={} payload={}",
            token.value(),
            self.mask_payload
        );
        Ok(SubmitTicket { token, request })
    }

    pub fn finish_submit(
        &mut self,
        token: RequestToken,
        result: Result<UploadResponse, ApiError>,
    ) -> SubmitOutcome {
        if !self.submissions.is_latest(token) || self.in_flight != Some(token) {
            log::debug!("Discarding stale submission token={}", token.value());
            return SubmitOutcome::Stale;
        }
        self.in_flight = None;
        match result {
            Ok(response) => {
                log::info!("Image pair saved");
                self.reset();
                SubmitOutcome::Saved(response)
            }
            Err(error) => {
                log::error!("Error saving images: {error}");
                SubmitOutcome::Failed(error)
            }
        }
    }

    /// Submits and waits for the backend in one step.
    pub async fn submit(&mut self, api: &ApiClient) -> Result<SubmitOutcome, EditorError> {
        let ticket = self.begin_submit()?;
        let result = api.upload(&ticket.request).await;
        Ok(self.finish_submit(ticket.token, result))
    }

    /// Back to `Empty`. Brush settings survive.
    /// Forgets the submission in flight, keeping the image and strokes. Its
    /// result, if it still arrives, is discarded as stale.
    pub fn abandon_submit(&mut self) -> bool {
        let Some(token) = self.in_flight.take() else {
            return false;
        };
        log::warn!("Abandoning submission token={}", token.value());
        self.submissions.invalidate();
        true
    }

    pub fn reset(&mut self) {
        self.image = None;
        self.surface = None;
        self.preview = None;
        self.previews.invalidate();
        self.submissions.invalidate();
        self.in_flight = None;
    }
}
