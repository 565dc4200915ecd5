use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlElement};

use maskpaint_editor::GalleryState;
use maskpaint_shared::ImagePair;

pub enum GalleryAction {
    Delete(i64),
}

pub fn render_gallery(document: &Document, list_el: &HtmlElement, gallery: &GalleryState) {
    list_el.set_inner_html("");
    if gallery.is_loading() && gallery.is_empty() {
        list_el.set_text_content(Some("Loading..."));
        return;
    }
    for pair in gallery.pairs() {
        if let Some(card) = render_pair(document, pair) {
            let _ = list_el.append_child(&card);
        }
    }
}

fn render_pair(document: &Document, pair: &ImagePair) -> Option<Element> {
    let card = document.create_element("div").ok()?;
    let _ = card.set_attribute("class", "pair");

    let header = document.create_element("div").ok()?;
    let _ = header.set_attribute("class", "pair-header");
    let created = document.create_element("span").ok()?;
    created.set_text_content(Some(&format!("Created: {}", pair.created_label())));
    let _ = header.append_child(&created);
    let delete = document.create_element("button").ok()?;
    let _ = delete.set_attribute("type", "button");
    let _ = delete.set_attribute("class", "pair-delete");
    let _ = delete.set_attribute("data-action", "delete");
    let _ = delete.set_attribute("data-id", &pair.id.to_string());
    let _ = delete.set_attribute("aria-label", "Delete image pair");
    delete.set_text_content(Some("Delete"));
    let _ = header.append_child(&delete);
    let _ = card.append_child(&header);

    let images = document.create_element("div").ok()?;
    let _ = images.set_attribute("class", "pair-images");
    for (title, src, alt) in [
        ("Original Image", &pair.original_url, "Original"),
        ("Mask Image", &pair.mask_url, "Mask"),
    ] {
        let figure = document.create_element("figure").ok()?;
        let caption = document.create_element("figcaption").ok()?;
        caption.set_text_content(Some(title));
        let image = document.create_element("img").ok()?;
        let _ = image.set_attribute("src", src);
        let _ = image.set_attribute("alt", alt);
        let _ = figure.append_child(&caption);
        let _ = figure.append_child(&image);
        let _ = images.append_child(&figure);
    }
    let _ = card.append_child(&images);
    Some(card)
}

pub fn gallery_action_from_event(event: &Event) -> Option<GalleryAction> {
    let mut current = event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok());
    while let Some(element) = current {
        if element.get_attribute("data-action").as_deref() == Some("delete") {
            let id = element.get_attribute("data-id")?.parse::<i64>().ok()?;
            return Some(GalleryAction::Delete(id));
        }
        current = element.parent_element();
    }
    None
}
