//! Server-side batching over the multi-item endpoint

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::BatchOrchestrator;
use crate::error::{Error, ProcessingError, Result};
use crate::service::wire::{MultiTransformImage, MultiTransformImageResult};
use crate::service::{MultiTransformRequest, MultiTransformResponse};
use crate::types::{BatchRequest, BatchResult, NonEmpty, ProcessedImage};
use crate::utils::{decode_data_url, is_plain_file_name};

impl BatchOrchestrator {
    /// Process a batch with a single call to the multi-item endpoint
    ///
    /// Validation is the same as for
    /// [`process_batch`](Self::process_batch). The service shares one resize mode
    /// across the request, so the first item's mode is used. The deadline is the
    /// per-item deadline times the number of items. No progress events are emitted.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the submission is refused
    /// - [`Error::Processing`] if the call itself fails or its payload is undecodable
    /// - [`Error::AllItemsFailed`] if the service returned no images
    pub async fn process_batch_remote(&self, request: &BatchRequest) -> Result<BatchResult> {
        self.validator.preflight(request)?;

        let items = request.items();
        let method = request.method();
        let mode = items.first().map(|item| item.mode).unwrap_or_default();
        if items.iter().any(|item| item.mode != mode) {
            tracing::warn!(%mode, "items disagree on resize mode, using the first item's");
        }

        let body = MultiTransformRequest {
            images: items
                .iter()
                .map(|item| MultiTransformImage {
                    image: STANDARD.encode(&item.data),
                    filename: item.filename.clone(),
                })
                .collect(),
            mode,
            upscale_method: method,
        };

        let per_item = self.config.timeouts.for_method(method);
        let deadline = per_item.saturating_mul(u32::try_from(items.len()).unwrap_or(u32::MAX));
        tracing::info!(items = items.len(), %method, ?deadline, "submitting remote batch");

        let call = self.service.transform_batch(&body, deadline);
        let response = tokio::time::timeout(deadline, call)
            .await
            .unwrap_or(Err(ProcessingError::Timeout { after: deadline }))
            .map_err(|e| {
                tracing::error!(code = e.error_code(), error = %e, "remote batch failed");
                Error::Processing(e)
            })?;

        self.remote_result(response)
    }

    fn remote_result(&self, response: MultiTransformResponse) -> Result<BatchResult> {
        let MultiTransformResponse {
            images,
            zip_data,
            zip_filename,
            errors,
        } = response;

        let failures: Vec<String> = errors
            .unwrap_or_default()
            .into_iter()
            .filter(|e| !e.is_empty())
            .collect();

        if images.is_empty() {
            tracing::error!(failed = failures.len(), "remote batch returned no images");
            return Err(Error::AllItemsFailed { failures });
        }

        let successes = images
            .into_iter()
            .map(decode_image)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let archive = match zip_data.filter(|z| !z.is_empty()) {
            Some(url) => decode_data_url(&url)?.1,
            None => {
                tracing::debug!("service sent no archive, bundling locally");
                self.archive.build(&successes)?
            }
        };

        tracing::info!(
            succeeded = successes.len(),
            failed = failures.len(),
            archive_bytes = archive.len(),
            "remote batch complete"
        );

        Ok(BatchResult {
            successes,
            archive,
            archive_filename: self.remote_archive_filename(zip_filename),
            errors: NonEmpty::from_vec(failures),
        })
    }

    /// The service's archive name if it is a bare file name, else the configured one
    fn remote_archive_filename(&self, suggested: Option<String>) -> String {
        match suggested.filter(|name| !name.is_empty()) {
            Some(name) if is_plain_file_name(&name) => name,
            Some(name) => {
                tracing::warn!(name = %name, "ignoring unsafe archive filename from service");
                self.archive.archive_filename().to_string()
            }
            None => self.archive.archive_filename().to_string(),
        }
    }
}

fn decode_image(
    result: MultiTransformImageResult,
) -> std::result::Result<ProcessedImage, ProcessingError> {
    let (embedded_type, data) = decode_data_url(&result.data)?;
    Ok(ProcessedImage {
        filename: result.filename,
        data,
        content_type: result
            .content_type
            .filter(|c| !c.is_empty())
            .unwrap_or(embedded_type),
    })
}
