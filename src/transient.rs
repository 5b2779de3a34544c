//! Short-lived object URLs over in-memory bytes. The URL is revoked when the
//! returned `ObjectUrl` is dropped.

use gloo_file::{Blob, ObjectUrl};
use wasm_bindgen::JsCast;
use web_sys::HtmlAnchorElement;

pub fn object_url(bytes: &[u8], content_type: &str) -> ObjectUrl {
    ObjectUrl::from(Blob::new_with_options(bytes, Some(content_type)))
}

/// Hands `bytes` to the browser as a download named `filename`.
pub fn save_as(bytes: &[u8], content_type: &str, filename: &str) -> Result<(), String> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or("no document available")?;
    let body = document.body().ok_or("document has no body")?;

    let url = object_url(bytes, content_type);
    let anchor = document
        .create_element("a")
        .map_err(|e| format!("failed to create anchor: {:?}", e))?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|_| "created element is not an anchor".to_string())?;
    anchor.set_href(&url);
    anchor.set_download(filename);

    body.append_child(&anchor)
        .map_err(|e| format!("failed to attach anchor: {:?}", e))?;
    anchor.click();
    anchor.remove();

    log::debug!("saved {} ({} bytes)", filename, bytes.len());
    Ok(())
}
