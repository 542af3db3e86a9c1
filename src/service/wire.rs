//! JSON wire types for the transformation service contracts

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::ProcessingError;
use crate::types::{ResizeMode, UpscaleMethod};

/// Single-item request body
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransformRequest {
    /// Base64-encoded source image
    pub image: String,
    /// Resize preset
    pub mode: ResizeMode,
    /// Upscale method
    pub upscale_method: UpscaleMethod,
}

/// Single-item response body
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransformResponse {
    /// Whether the service reports success
    #[serde(default)]
    pub success: bool,
    /// Base64-encoded output image
    #[serde(default)]
    pub image: Option<String>,
    /// MIME type of the output image
    #[serde(default)]
    pub content_type: Option<String>,
    /// Error message when `success` is false
    #[serde(default)]
    pub error: Option<String>,
}

/// One image in a multi-item request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultiTransformImage {
    /// Base64-encoded source image
    pub image: String,
    /// Source filename
    pub filename: String,
}

/// Multi-item request body
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultiTransformRequest {
    /// Images in submission order
    pub images: Vec<MultiTransformImage>,
    /// Resize preset shared by every image
    pub mode: ResizeMode,
    /// Upscale method
    pub upscale_method: UpscaleMethod,
}

/// One processed image in a multi-item response
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultiTransformImageResult {
    /// Source filename
    pub filename: String,
    /// `data:<mime>;base64,<payload>` URL of the output
    pub data: String,
    /// MIME type of the output
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Multi-item response body
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MultiTransformResponse {
    /// Successfully processed images
    #[serde(default)]
    pub images: Vec<MultiTransformImageResult>,
    /// `data:application/zip;base64,<payload>` URL of the bundled outputs
    #[serde(default)]
    pub zip_data: Option<String>,
    /// Suggested archive filename
    #[serde(default)]
    pub zip_filename: Option<String>,
    /// Per-item failures as `"<filename>: <message>"`
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

/// Map a non-success HTTP response to a [`ProcessingError`].
///
/// The message is taken from `error` (with `received_method` / `request_keys`
/// debug fields appended), then `detail`, then `message`. A JSON string body is
/// used verbatim. Anything else becomes [`ProcessingError::Unknown`] carrying the
/// raw status.
pub fn error_from_body(status: StatusCode, body: &[u8]) -> ProcessingError {
    let unknown = || ProcessingError::Unknown {
        status: Some(status.as_u16()),
        message: format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )
        .trim_end()
        .to_string(),
    };

    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return unknown();
    };

    match value {
        serde_json::Value::String(message) if !message.is_empty() => {
            ProcessingError::ServerRejected { message }
        }
        serde_json::Value::Object(fields) => {
            if let Some(error) = fields.get("error").and_then(non_empty_text) {
                let mut message = error;
                if let Some(method) = fields.get("received_method").and_then(non_empty_text) {
                    message.push_str(&format!(" (received method: {})", method));
                }
                if let Some(keys) = fields.get("request_keys").and_then(|v| v.as_array()) {
                    let keys: Vec<String> = keys.iter().filter_map(non_empty_text).collect();
                    message.push_str(&format!(" (request keys: {})", keys.join(", ")));
                }
                return ProcessingError::ServerRejected { message };
            }
            ["detail", "message"]
                .iter()
                .find_map(|key| fields.get(*key).and_then(non_empty_text))
                .map(|message| ProcessingError::ServerRejected { message })
                .unwrap_or_else(unknown)
        }
        _ => unknown(),
    }
}

/// Text of a JSON value: strings as-is, other non-null values rendered as JSON
fn non_empty_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
