use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlButtonElement, HtmlElement};

use maskpaint_shared::{Color, SWATCHES};

pub enum PaletteAction {
    Select(Color),
}

pub fn render_palette(document: &Document, palette_el: &HtmlElement, selected: Color) {
    palette_el.set_inner_html("");
    for (index, color) in SWATCHES.iter().enumerate() {
        let Ok(element) = document.create_element("button") else {
            continue;
        };
        let Ok(button) = element.dyn_into::<HtmlButtonElement>() else {
            continue;
        };
        let hex = color.to_hex();
        let _ = button.set_attribute("type", "button");
        let _ = button.set_attribute("data-index", &index.to_string());
        let _ = button.set_attribute("title", &hex);
        let _ = button.set_attribute("aria-label", &format!("Use color {hex}"));
        let class_name = if *color == selected {
            "swatch active"
        } else {
            "swatch"
        };
        let _ = button.set_attribute("class", class_name);
        let _ = button.style().set_property("background", &hex);
        if *color == Color::WHITE {
            let _ = button
                .style()
                .set_property("box-shadow", "inset 0 0 0 1px #E5E7EB");
        }
        let _ = palette_el.append_child(&button);
    }
}

pub fn palette_action_from_event(event: &Event) -> Option<PaletteAction> {
    let mut current = event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok());
    while let Some(element) = current {
        if let Some(index) = element.get_attribute("data-index") {
            let color = index
                .parse::<usize>()
                .ok()
                .and_then(|index| SWATCHES.get(index).copied())?;
            return Some(PaletteAction::Select(color));
        }
        current = element.parent_element();
    }
    None
}
