//! Single-item processing against the remote transformation service

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;

use crate::config::TimeoutConfig;
use crate::error::ProcessingError;
use crate::service::{TransformRequest, TransformResponse, TransformService};
use crate::types::{DEFAULT_OUTPUT_CONTENT_TYPE, ProcessedImage, SourceItem, UpscaleMethod};
use crate::utils::decode_base64;
use crate::validation::Validator;

/// Transforms exactly one item per call
///
/// The item is re-checked against the limits first, so a violation surfaces as
/// [`ProcessingError::InvalidItem`] for that item alone. No retries are performed.
#[derive(Clone)]
pub struct ItemProcessor {
    service: Arc<dyn TransformService>,
    timeouts: TimeoutConfig,
    validator: Validator,
}

impl ItemProcessor {
    /// Create a processor
    pub fn new(
        service: Arc<dyn TransformService>,
        timeouts: TimeoutConfig,
        validator: Validator,
    ) -> Self {
        Self {
            service,
            timeouts,
            validator,
        }
    }

    /// Transform `item` with `method`.
    ///
    /// The deadline depends on the method (see [`TimeoutConfig::for_method`]).
    pub async fn process(
        &self,
        item: &SourceItem,
        method: UpscaleMethod,
    ) -> Result<ProcessedImage, ProcessingError> {
        self.validator
            .validate_item(item)
            .map_err(ProcessingError::InvalidItem)?;

        let request = TransformRequest {
            image: STANDARD.encode(&item.data),
            mode: item.mode,
            upscale_method: method,
        };
        let deadline = self.timeouts.for_method(method);

        tracing::debug!(
            filename = %item.filename,
            mode = %item.mode,
            method = %method,
            bytes = item.data.len(),
            ?deadline,
            "dispatching item"
        );

        let response = tokio::time::timeout(deadline, self.service.transform(&request, deadline))
            .await
            .map_err(|_| ProcessingError::Timeout { after: deadline })??;

        decode_response(&item.filename, response)
    }
}

/// Turn a 2xx service response into the item's output
fn decode_response(
    filename: &str,
    response: TransformResponse,
) -> Result<ProcessedImage, ProcessingError> {
    let TransformResponse {
        success,
        image,
        content_type,
        error,
    } = response;

    let image = match image {
        Some(image) if success && !image.is_empty() => image,
        _ => {
            return Err(match error.filter(|e| !e.is_empty()) {
                Some(message) => ProcessingError::ServerRejected { message },
                None => ProcessingError::Unknown {
                    status: None,
                    message: "service reported failure without an error message".to_string(),
                },
            });
        }
    };

    Ok(ProcessedImage {
        filename: filename.to_string(),
        data: decode_base64(&image)?,
        content_type: content_type
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_OUTPUT_CONTENT_TYPE.to_string()),
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::service::{MultiTransformRequest, MultiTransformResponse};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays one canned reply and records every request
    struct Canned {
        reply: Result<TransformResponse, ProcessingError>,
        delay: Duration,
        seen: Mutex<Vec<(TransformRequest, Duration)>>,
    }

    impl Canned {
        fn new(reply: Result<TransformResponse, ProcessingError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TransformService for Canned {
        async fn transform(
            &self,
            request: &TransformRequest,
            deadline: Duration,
        ) -> Result<TransformResponse, ProcessingError> {
            self.seen.lock().unwrap().push((request.clone(), deadline));
            tokio::time::sleep(self.delay).await;
            self.reply.clone()
        }

        async fn transform_batch(
            &self,
            _request: &MultiTransformRequest,
            _deadline: Duration,
        ) -> Result<MultiTransformResponse, ProcessingError> {
            unreachable!("single-item tests only")
        }
    }

    fn ok(image: &str, content_type: Option<&str>) -> Result<TransformResponse, ProcessingError> {
        Ok(TransformResponse {
            success: true,
            image: Some(image.to_string()),
            content_type: content_type.map(str::to_string),
            error: None,
        })
    }

    fn processor(service: Arc<Canned>) -> ItemProcessor {
        ItemProcessor::new(service, TimeoutConfig::default(), Validator::default())
    }

    fn item() -> SourceItem {
        SourceItem::new("cat.png", "image/png", b"meow".to_vec())
            .with_mode(crate::types::ResizeMode::Horizontal)
    }

    #[tokio::test]
    async fn encodes_the_payload_and_decodes_the_output() {
        let service = Canned::new(ok("cHVycg==", Some("image/webp")));
        let output = processor(service.clone())
            .process(&item(), UpscaleMethod::Simple)
            .await
            .unwrap();

        assert_eq!(output.filename, "cat.png");
        assert_eq!(output.data, b"purr");
        assert_eq!(output.content_type, "image/webp");

        let seen = service.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.image, "bWVvdw==");
        assert_eq!(seen[0].0.mode, crate::types::ResizeMode::Horizontal);
        assert_eq!(seen[0].1, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn missing_content_type_defaults_to_jpeg() {
        let service = Canned::new(ok("cHVycg==", None));
        let output = processor(service)
            .process(&item(), UpscaleMethod::Simple)
            .await
            .unwrap();
        assert_eq!(output.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn ai_method_uses_its_own_deadline() {
        let service = Canned::new(ok("AA==", None));
        processor(service.clone())
            .process(&item(), UpscaleMethod::Ai)
            .await
            .unwrap();
        assert_eq!(service.seen.lock().unwrap()[0].1, Duration::from_secs(120));
    }

    #[tokio::test]
    async fn unsuccessful_body_with_error_is_server_rejected() {
        let service = Canned::new(Ok(TransformResponse {
            success: false,
            error: Some("cannot decode image".into()),
            ..Default::default()
        }));
        let err = processor(service)
            .process(&item(), UpscaleMethod::Simple)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProcessingError::ServerRejected {
                message: "cannot decode image".into()
            }
        );
    }

    #[tokio::test]
    async fn success_without_image_is_unknown() {
        let service = Canned::new(Ok(TransformResponse {
            success: true,
            ..Default::default()
        }));
        let err = processor(service)
            .process(&item(), UpscaleMethod::Simple)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Unknown { status: None, .. }));
    }

    #[tokio::test]
    async fn service_errors_pass_through_unchanged() {
        let reason = ProcessingError::Unreachable {
            reason: "connection refused".into(),
        };
        let service = Canned::new(Err(reason.clone()));
        let err = processor(service)
            .process(&item(), UpscaleMethod::Simple)
            .await
            .unwrap_err();
        assert_eq!(err, reason);
    }

    #[tokio::test]
    async fn invalid_item_fails_without_calling_the_service() {
        let service = Canned::new(ok("AA==", None));
        let empty = SourceItem::new("blank.png", "image/png", vec![]);

        let err = processor(service.clone())
            .process(&empty, UpscaleMethod::Simple)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProcessingError::InvalidItem(ValidationError::Empty {
                filename: "blank.png".into()
            })
        );
        assert!(service.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn slow_service_is_cut_off_at_the_deadline() {
        let service = Arc::new(Canned {
            reply: ok("AA==", None),
            delay: Duration::from_millis(500),
            seen: Mutex::new(Vec::new()),
        });
        let timeouts = TimeoutConfig {
            simple: Duration::from_millis(20),
            ai: Duration::from_millis(20),
        };
        let processor = ItemProcessor::new(service, timeouts, Validator::default());

        let err = processor
            .process(&item(), UpscaleMethod::Simple)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProcessingError::Timeout {
                after: Duration::from_millis(20)
            }
        );
    }
}
