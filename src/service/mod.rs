//! Remote transformation service access
//!
//! The core abstraction is the [`TransformService`] trait: one call per request,
//! no retries, every failure mapped into a [`ProcessingError`]. The shipped
//! implementation, [`HttpTransformService`], speaks the JSON-over-HTTP contracts:
//!
//! - single item: `POST {base_url}{process_path}`
//!   `{ image, mode, upscale_method }` -> `{ success, image, content_type? }`
//! - multiple items: `POST {base_url}{process_multiple_path}`
//!   `{ images: [{ image, filename }], mode, upscale_method }` ->
//!   `{ images: [{ filename, data, content_type }], zip_data, zip_filename, errors? }`
//!
//! Alternative transports (or test doubles) only need to implement the trait.

mod http;
pub mod wire;

pub use http::HttpTransformService;
pub use wire::{
    MultiTransformRequest, MultiTransformResponse, TransformRequest, TransformResponse,
};

use async_trait::async_trait;
use std::time::Duration;

use crate::error::ProcessingError;

/// Access to the remote transformation service
///
/// Implementations must not retry; each call corresponds to exactly one request.
#[async_trait]
pub trait TransformService: Send + Sync {
    /// Transform a single image.
    ///
    /// Exceeding `deadline` yields [`ProcessingError::Timeout`].
    async fn transform(
        &self,
        request: &TransformRequest,
        deadline: Duration,
    ) -> Result<TransformResponse, ProcessingError>;

    /// Transform several images in one server-side batch.
    async fn transform_batch(
        &self,
        request: &MultiTransformRequest,
        deadline: Duration,
    ) -> Result<MultiTransformResponse, ProcessingError>;
}
