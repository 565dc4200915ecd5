use wasm_bindgen::JsValue;
use web_sys::{Document, Window};

use maskpaint_editor::{ApiClient, EditorConfig};

const API_URL_ATTRIBUTE: &str = "data-api-url";

/// Backend base URL: the page's `data-api-url` attribute on `<html>` or
/// `<body>` wins over the value baked in at build time.
pub fn api_base_url(document: &Document) -> Option<String> {
    let from_page = [document.document_element(), document.body().map(Into::into)]
        .into_iter()
        .flatten()
        .find_map(|element| element.get_attribute(API_URL_ATTRIBUTE))
        .filter(|value| !value.trim().is_empty());
    from_page.or_else(|| option_env!("MASKPAINT_API_URL").map(str::to_string))
}

pub fn editor_config(document: &Document) -> EditorConfig {
    let config = EditorConfig::default();
    match api_base_url(document) {
        Some(url) => config.with_api_base_url(url),
        None => config,
    }
}

pub fn api_client(config: &EditorConfig) -> Result<ApiClient, JsValue> {
    ApiClient::new(config).map_err(|error| JsValue::from_str(&error.to_string()))
}

pub fn debug_enabled(window: &Window) -> bool {
    let search = window.location().search().ok().unwrap_or_default();
    search.contains("debug=1") || search.contains("debug=true")
}
