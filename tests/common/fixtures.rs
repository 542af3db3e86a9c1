//! Source items and mock service responses

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use std::time::Duration;
use upscale_batch::SourceItem;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// JPEG start-of-image marker, enough for the payload to look like a photo
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];

/// Source payload for `name`: a JPEG marker followed by the name
pub fn payload(name: &str) -> Vec<u8> {
    let mut data = JPEG_MAGIC.to_vec();
    data.extend_from_slice(name.as_bytes());
    data
}

/// What the mock service returns for `name`
pub fn processed_payload(name: &str) -> Vec<u8> {
    let mut data = payload(name);
    data.extend_from_slice(b"-upscaled");
    data
}

/// A JPEG source item whose payload is derived from its name
pub fn jpeg_item(name: &str) -> SourceItem {
    SourceItem::new(name, "image/jpeg", payload(name))
}

/// Match single-item requests carrying `name`'s payload
fn process_request_for(name: &str) -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path("/api/process"))
        .and(body_partial_json(json!({ "image": STANDARD.encode(payload(name)) })))
}

/// Respond to `name` with its processed payload
pub async fn mount_success(server: &MockServer, name: &str) {
    process_request_for(name)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "image": STANDARD.encode(processed_payload(name)),
            "content_type": "image/jpeg",
        })))
        .mount(server)
        .await;
}

/// Respond to `name` with `status` and a JSON body
pub async fn mount_error(server: &MockServer, name: &str, status: u16, body: serde_json::Value) {
    process_request_for(name)
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Respond to `name` successfully, but only after `delay`
pub async fn mount_slow(server: &MockServer, name: &str, delay: Duration) {
    process_request_for(name)
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "success": true,
                    "image": STANDARD.encode(processed_payload(name)),
                }))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Respond to the multi-item endpoint with `body`
pub async fn mount_multiple(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/process-multiple"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// `data:<mime>;base64,...` URL of `data`
pub fn data_url(mime: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(data))
}
