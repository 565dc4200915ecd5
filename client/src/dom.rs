use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlButtonElement, HtmlCanvasElement, HtmlElement, HtmlImageElement,
    HtmlInputElement, HtmlSpanElement, PointerEvent, Window,
};

use maskpaint_editor::{EditorPhase, Notice, NoticeKind};
use maskpaint_shared::{Dimensions, Point};

use crate::palette::render_palette;
use crate::state::State;

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

/// Handles to every element the app updates after it starts.
#[derive(Clone)]
pub struct Ui {
    pub document: Document,
    pub file_input: HtmlInputElement,
    pub editor_panel: HtmlElement,
    pub stage: HtmlElement,
    pub palette: HtmlElement,
    pub color_input: HtmlInputElement,
    pub size_input: HtmlInputElement,
    pub size_value: HtmlSpanElement,
    pub undo_button: HtmlButtonElement,
    pub clear_button: HtmlButtonElement,
    pub preview_button: HtmlButtonElement,
    pub save_button: HtmlButtonElement,
    pub preview_panel: HtmlElement,
    pub preview_original: HtmlImageElement,
    pub preview_composite: HtmlImageElement,
    pub preview_close: HtmlButtonElement,
    pub gallery_list: HtmlElement,
    pub gallery_refresh: HtmlButtonElement,
    pub status: Element,
}

impl Ui {
    pub fn from_document(document: &Document) -> Result<Self, JsValue> {
        Ok(Self {
            document: document.clone(),
            file_input: get_element(document, "imageFile")?,
            editor_panel: get_element(document, "editor")?,
            stage: get_element(document, "stage")?,
            palette: get_element(document, "palette")?,
            color_input: get_element(document, "color")?,
            size_input: get_element(document, "size")?,
            size_value: get_element(document, "sizeValue")?,
            undo_button: get_element(document, "undo")?,
            clear_button: get_element(document, "clear")?,
            preview_button: get_element(document, "preview")?,
            save_button: get_element(document, "save")?,
            preview_panel: get_element(document, "previewPanel")?,
            preview_original: get_element(document, "previewOriginal")?,
            preview_composite: get_element(document, "previewComposite")?,
            preview_close: get_element(document, "previewClose")?,
            gallery_list: get_element(document, "gallery")?,
            gallery_refresh: get_element(document, "galleryRefresh")?,
            status: get_element(document, "status")?,
        })
    }
}

pub fn set_hidden(element: &HtmlElement, hidden: bool) {
    element.set_hidden(hidden);
}

pub fn update_size_label(input: &HtmlInputElement, value: &HtmlSpanElement) {
    value.set_text_content(Some(&format!("{}px", input.value())));
}

pub fn set_status(status: &Element, state: &str, text: &str) {
    let _ = status.set_attribute("data-state", state);
    status.set_text_content(Some(text));
}

/// Shows a notice in the status line and as a blocking alert, the way the
/// page reports save and delete results.
pub fn show_notice(window: &Window, status: &Element, notice: &Notice) {
    let state = match notice.kind {
        NoticeKind::Success => "ok",
        NoticeKind::Failure => "error",
    };
    set_status(status, state, &notice.message);
    let _ = window.alert_with_message(&notice.message);
}

/// Sizes the stage and drawing canvas to the display dimensions and puts the
/// original image behind the canvas.
pub fn fit_stage(stage: &HtmlElement, canvas: &HtmlCanvasElement, display: Dimensions, src: &str) {
    canvas.set_width(display.width);
    canvas.set_height(display.height);
    let width = format!("{}px", display.width);
    let height = format!("{}px", display.height);
    let style = stage.style();
    let _ = style.set_property("width", &width);
    let _ = style.set_property("height", &height);
    let _ = style.set_property("background-image", &format!("url(\"{src}\")"));
    let _ = style.set_property("background-size", "contain");
    let _ = style.set_property("background-repeat", "no-repeat");
    let canvas_style = canvas.style();
    let _ = canvas_style.set_property("width", &width);
    let _ = canvas_style.set_property("height", &height);
}

pub fn clear_stage(stage: &HtmlElement) {
    let _ = stage.style().remove_property("background-image");
}

/// Maps a pointer position to mask surface coordinates.
pub fn event_to_point(canvas: &HtmlCanvasElement, event: &PointerEvent) -> Option<Point> {
    let rect = canvas.get_bounding_client_rect();
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    let scale_x = canvas.width() as f64 / rect.width();
    let scale_y = canvas.height() as f64 / rect.height();
    let x = (event.client_x() as f64 - rect.left()) * scale_x;
    let y = (event.client_y() as f64 - rect.top()) * scale_y;
    Some(Point::new(x as f32, y as f32))
}

/// Brings every control in line with the session.
pub fn sync_editor_ui(ui: &Ui, state: &State) {
    let phase = state.session.phase();
    set_hidden(&ui.editor_panel, phase == EditorPhase::Empty);
    let brush = state.session.brush();
    ui.size_input.set_value(&brush.width.to_string());
    update_size_label(&ui.size_input, &ui.size_value);
    ui.color_input
        .set_value(&brush.color.to_hex()[..7].to_ascii_lowercase());
    render_palette(&ui.document, &ui.palette, brush.color);

    let has_strokes = state
        .session
        .surface()
        .is_some_and(|surface| !surface.strokes().is_empty());
    let submitting = phase == EditorPhase::Submitting;
    ui.undo_button.set_disabled(!has_strokes || submitting);
    ui.clear_button.set_disabled(!has_strokes || submitting);
    ui.preview_button.set_disabled(submitting);
    ui.save_button
        .set_disabled(matches!(phase, EditorPhase::Empty | EditorPhase::Submitting));
    ui.save_button.set_text_content(Some(if submitting {
        "Saving..."
    } else {
        "Save Images"
    }));
}
