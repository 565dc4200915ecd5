use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Event, FileReader, HtmlCanvasElement, KeyboardEvent, PointerEvent,
    ProgressEvent, Window,
};

use maskpaint_editor::notice::DELETE_CONFIRMATION;
use maskpaint_editor::{EditorSession, GalleryState, LoadOutcome, SubmitOutcome, ViewScope};
use maskpaint_shared::Color;

use crate::dom::{
    clear_stage, event_to_point, fit_stage, get_element, set_hidden, set_status, show_notice,
    sync_editor_ui, update_size_label, Ui,
};
use crate::gallery::{gallery_action_from_event, render_gallery, GalleryAction};
use crate::logger;
use crate::net::{api_client, debug_enabled, editor_config};
use crate::palette::{palette_action_from_event, PaletteAction};
use crate::render::{draw_stroke_tail, redraw};
use crate::state::{FileRead, State};

fn document_ready_state(document: &web_sys::Document) -> Option<String> {
    Reflect::get(document.as_ref(), &JsValue::from_str("readyState"))
        .ok()?
        .as_string()
}

fn page_transition_persisted(event: &Event) -> Option<bool> {
    Reflect::get(event.as_ref(), &JsValue::from_str("persisted"))
        .ok()?
        .as_bool()
}

fn read_file_bytes(event: &ProgressEvent) -> Option<Vec<u8>> {
    let reader: FileReader = event.target()?.dyn_into().ok()?;
    let buffer = reader.result().ok()?;
    Some(Uint8Array::new(&buffer).to_vec())
}

fn listen<E: FromWasmAbi + 'static>(
    target: &web_sys::EventTarget,
    name: &str,
    handler: impl FnMut(E) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(E)>::new(handler);
    target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    logger::init(debug_enabled(&window));
    let started = Rc::new(Cell::new(false));

    if document_ready_state(&document).as_deref() == Some("complete") {
        started.set(true);
        return start_app();
    }

    let onload_started = started.clone();
    listen(&window, "load", move |_: Event| {
        if onload_started.replace(true) {
            return;
        }
        if let Err(err) = start_app() {
            web_sys::console::error_1(&err);
        }
    })
}

fn refresh_gallery(state: &Rc<RefCell<State>>, ui: &Ui) {
    let (token, api, handle) = {
        let mut state = state.borrow_mut();
        let token = state.gallery.begin_load();
        render_gallery(&ui.document, &ui.gallery_list, &state.gallery);
        (token, state.api.clone(), state.scope.handle())
    };
    let state = state.clone();
    let ui = ui.clone();
    wasm_bindgen_futures::spawn_local(async move {
        let result = api.list_images().await;
        handle.deliver(result, |result| {
            let mut state = state.borrow_mut();
            if let LoadOutcome::Failed(_) = state.gallery.finish_load(token, result) {
                set_status(&ui.status, "error", "Could not load saved images.");
            }
            render_gallery(&ui.document, &ui.gallery_list, &state.gallery);
        });
    });
}

fn reset_view(ui: &Ui, state: &State) {
    clear_stage(&ui.stage);
    set_hidden(&ui.preview_panel, true);
    ui.file_input.set_value("");
    redraw(state);
    sync_editor_ui(ui, state);
}

fn start_app() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;

    let ui = Ui::from_document(&document)?;
    let canvas: HtmlCanvasElement = get_element(&document, "mask")?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing canvas context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    ctx.set_line_cap("round");
    ctx.set_line_join("round");

    let config = editor_config(&document);
    log::info!("Using backend at {}", config.api_base_url);
    let api = api_client(&config)?;

    let state = Rc::new(RefCell::new(State {
        canvas: canvas.clone(),
        ctx,
        session: EditorSession::new(&config),
        gallery: GalleryState::new(),
        api,
        active_pointer: None,
        file_read: FileRead::default(),
        scope: ViewScope::new(),
    }));

    set_hidden(&ui.preview_panel, true);
    sync_editor_ui(&ui, &state.borrow());
    set_status(&ui.status, "idle", "Choose an image to start.");
    refresh_gallery(&state, &ui);

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        listen(&ui.file_input, "change", move |_: Event| {
            let Some(file) = ui_cb.file_input.files().and_then(|list| list.get(0)) else {
                return;
            };
            if state.borrow().is_loading_file() {
                return;
            }
            let Ok(reader) = FileReader::new() else {
                return;
            };
            let onload_state = state.clone();
            let onload_ui = ui_cb.clone();
            let onload = Closure::<dyn FnMut(ProgressEvent)>::new(move |event: ProgressEvent| {
                let mut state = onload_state.borrow_mut();
                state.finish_file_load();
                let Some(bytes) = read_file_bytes(&event) else {
                    set_status(&onload_ui.status, "error", "Could not read that file.");
                    return;
                };
                let loaded = state
                    .session
                    .load_image_bytes(&bytes)
                    .map(|image| (image.display, image.data_uri.clone()));
                match loaded {
                    Ok((display, data_uri)) => {
                        state.active_pointer = None;
                        fit_stage(&onload_ui.stage, &state.canvas, display, &data_uri);
                        set_hidden(&onload_ui.preview_panel, true);
                        set_status(&onload_ui.status, "idle", "Paint the mask over the image.");
                    }
                    Err(error) => {
                        set_status(&onload_ui.status, "error", &error.to_string());
                    }
                }
                redraw(&state);
                sync_editor_ui(&onload_ui, &state);
            });
            let onerror_state = state.clone();
            let onerror_ui = ui_cb.clone();
            let onerror = Closure::<dyn FnMut(ProgressEvent)>::new(move |event: ProgressEvent| {
                log::warn!("File read ended with {}", event.type_());
                let mut state = onerror_state.borrow_mut();
                state.finish_file_load();
                onerror_ui.file_input.set_value("");
                set_status(&onerror_ui.status, "error", "Could not read that file.");
                sync_editor_ui(&onerror_ui, &state);
            });
            reader.set_onload(Some(onload.as_ref().unchecked_ref()));
            reader.set_onerror(Some(onerror.as_ref().unchecked_ref()));
            reader.set_onabort(Some(onerror.as_ref().unchecked_ref()));
            if reader.read_as_array_buffer(&file).is_err() {
                set_status(&ui_cb.status, "error", "Could not read that file.");
                return;
            }
            state.borrow_mut().file_read.start(reader, vec![onload, onerror]);
        })?;
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        listen(&ui.palette, "click", move |event: Event| {
            let Some(PaletteAction::Select(color)) = palette_action_from_event(&event) else {
                return;
            };
            let mut state = state.borrow_mut();
            state.session.set_color(color);
            sync_editor_ui(&ui_cb, &state);
        })?;
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        listen(&ui.color_input, "input", move |_: Event| {
            let Ok(color) = ui_cb.color_input.value().parse::<Color>() else {
                return;
            };
            let mut state = state.borrow_mut();
            state.session.set_color(color);
            sync_editor_ui(&ui_cb, &state);
        })?;
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        listen(&ui.size_input, "input", move |_: Event| {
            let Ok(width) = ui_cb.size_input.value().parse::<u32>() else {
                return;
            };
            state.borrow_mut().session.set_width(width);
            update_size_label(&ui_cb.size_input, &ui_cb.size_value);
        })?;
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        listen(&ui.undo_button, "click", move |_: Event| {
            let mut state = state.borrow_mut();
            if state.session.undo().is_some() {
                redraw(&state);
            }
            sync_editor_ui(&ui_cb, &state);
        })?;
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        listen(&ui.clear_button, "click", move |_: Event| {
            let mut state = state.borrow_mut();
            state.session.clear();
            redraw(&state);
            sync_editor_ui(&ui_cb, &state);
        })?;
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        listen(&window, "keydown", move |event: KeyboardEvent| {
            let undo = (event.ctrl_key() || event.meta_key())
                && !event.shift_key()
                && event.key().eq_ignore_ascii_case("z");
            if !undo {
                return;
            }
            event.prevent_default();
            let mut state = state.borrow_mut();
            if state.session.undo().is_some() {
                redraw(&state);
                sync_editor_ui(&ui_cb, &state);
            }
        })?;
    }

    {
        let state = state.clone();
        let down_canvas = canvas.clone();
        listen(&canvas, "pointerdown", move |event: PointerEvent| {
            if event.button() != 0 {
                return;
            }
            let mut state = state.borrow_mut();
            if state.active_pointer.is_some() {
                return;
            }
            let Some(point) = event_to_point(&down_canvas, &event) else {
                return;
            };
            if !state.session.begin_stroke(point) {
                return;
            }
            event.prevent_default();
            state.active_pointer = Some(event.pointer_id());
            let _ = down_canvas.set_pointer_capture(event.pointer_id());
            if let Some(stroke) = state.session.surface().and_then(|s| s.active_stroke()) {
                draw_stroke_tail(&state.ctx, stroke);
            }
        })?;
    }

    {
        let state = state.clone();
        let move_canvas = canvas.clone();
        listen(&canvas, "pointermove", move |event: PointerEvent| {
            let mut state = state.borrow_mut();
            if state.active_pointer != Some(event.pointer_id()) {
                return;
            }
            let Some(point) = event_to_point(&move_canvas, &event) else {
                return;
            };
            event.prevent_default();
            if state.session.extend_stroke(point) {
                if let Some(stroke) = state.session.surface().and_then(|s| s.active_stroke()) {
                    draw_stroke_tail(&state.ctx, stroke);
                }
            }
        })?;
    }

    for name in ["pointerup", "pointercancel"] {
        let state = state.clone();
        let ui_cb = ui.clone();
        let up_canvas = canvas.clone();
        listen(&canvas, name, move |event: PointerEvent| {
            let mut state = state.borrow_mut();
            if state.active_pointer != Some(event.pointer_id()) {
                return;
            }
            state.active_pointer = None;
            let _ = up_canvas.release_pointer_capture(event.pointer_id());
            state.session.end_stroke();
            redraw(&state);
            sync_editor_ui(&ui_cb, &state);
        })?;
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        listen(&ui.preview_button, "click", move |_: Event| {
            let mut state = state.borrow_mut();
            let rendered = state
                .session
                .render_preview()
                .map(|preview| preview.data_uri.clone());
            match rendered {
                Ok(composite) => {
                    if let Some(image) = state.session.image() {
                        ui_cb.preview_original.set_src(&image.data_uri);
                    }
                    ui_cb.preview_composite.set_src(&composite);
                    set_hidden(&ui_cb.preview_panel, false);
                }
                Err(error) => {
                    log::warn!("Preview failed: {error}");
                    set_status(&ui_cb.status, "error", &error.to_string());
                }
            }
            sync_editor_ui(&ui_cb, &state);
        })?;
    }

    {
        let ui_cb = ui.clone();
        listen(&ui.preview_close, "click", move |_: Event| {
            set_hidden(&ui_cb.preview_panel, true);
        })?;
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        let window_cb = window.clone();
        listen(&ui.save_button, "click", move |_: Event| {
            save(&state, &ui_cb, &window_cb);
        })?;
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        listen(&ui.gallery_refresh, "click", move |_: Event| {
            refresh_gallery(&state, &ui_cb);
        })?;
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        let window_cb = window.clone();
        listen(&ui.gallery_list, "click", move |event: Event| {
            let Some(GalleryAction::Delete(id)) = gallery_action_from_event(&event) else {
                return;
            };
            delete_pair(&state, &ui_cb, &window_cb, id);
        })?;
    }

    {
        let state = state.clone();
        listen(&window, "pagehide", move |event: Event| {
            // Pages kept in the back/forward cache, or hidden on a tab switch,
            // keep receiving results.
            if page_transition_persisted(&event).unwrap_or(false) {
                log::debug!("Page hidden but persisted");
                return;
            }
            log::debug!("Page unloading, dropping pending results");
            state.borrow().scope.close();
        })?;
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        listen(&window, "pageshow", move |_: Event| {
            let reopened = {
                let mut state = state.borrow_mut();
                let reopened = state.reopen_scope();
                if reopened {
                    log::info!("Page shown again, reopening view scope");
                    sync_editor_ui(&ui_cb, &state);
                }
                reopened
            };
            if reopened {
                refresh_gallery(&state, &ui_cb);
            }
        })?;
    }

    log::info!("Mask editor ready");
    Ok(())
}

fn save(state: &Rc<RefCell<State>>, ui: &Ui, window: &Window) {
    let (ticket, api, handle) = {
        let mut state = state.borrow_mut();
        let ticket = match state.session.begin_submit() {
            Ok(ticket) => ticket,
            Err(error) => {
                set_status(&ui.status, "error", &error.to_string());
                return;
            }
        };
        sync_editor_ui(ui, &state);
        (ticket, state.api.clone(), state.scope.handle())
    };
    set_status(&ui.status, "busy", "Saving...");
    let state = state.clone();
    let ui = ui.clone();
    let window = window.clone();
    wasm_bindgen_futures::spawn_local(async move {
        let result = api.upload(&ticket.request).await;
        let saved = handle.deliver(result, |result| {
            let outcome = {
                let mut state = state.borrow_mut();
                let outcome = state.session.finish_submit(ticket.token, result);
                if state.session.image().is_none() {
                    reset_view(&ui, &state);
                } else {
                    sync_editor_ui(&ui, &state);
                }
                outcome
            };
            if let Some(notice) = outcome.notice() {
                show_notice(&window, &ui.status, &notice);
            }
            matches!(outcome, SubmitOutcome::Saved(_))
        });
        if saved == Some(true) {
            refresh_gallery(&state, &ui);
        }
    });
}

fn delete_pair(state: &Rc<RefCell<State>>, ui: &Ui, window: &Window, id: i64) {
    let confirmed = window
        .confirm_with_message(DELETE_CONFIRMATION)
        .unwrap_or(false);
    let (ticket, api, handle) = {
        let state = state.borrow();
        let Some(ticket) = state.gallery.begin_delete(id, confirmed) else {
            return;
        };
        (ticket, state.api.clone(), state.scope.handle())
    };
    let state = state.clone();
    let ui = ui.clone();
    let window = window.clone();
    wasm_bindgen_futures::spawn_local(async move {
        let result = api.delete_image(ticket.id).await;
        handle.deliver(result, |result| {
            let outcome = {
                let mut state = state.borrow_mut();
                let outcome = state.gallery.finish_delete(ticket, result);
                render_gallery(&ui.document, &ui.gallery_list, &state.gallery);
                outcome
            };
            if let Some(notice) = outcome.notice() {
                show_notice(&window, &ui.status, &notice);
            }
        });
    });
}
