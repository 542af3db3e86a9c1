//! HTTP implementation of [`TransformService`]

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use super::TransformService;
use super::wire::{
    MultiTransformRequest, MultiTransformResponse, TransformRequest, TransformResponse,
    error_from_body,
};
use crate::config::ServiceConfig;
use crate::error::{Error, ProcessingError, Result};

/// JSON-over-HTTP client for the transformation service
#[derive(Clone, Debug)]
pub struct HttpTransformService {
    client: reqwest::Client,
    process_url: Url,
    process_multiple_url: Url,
}

impl HttpTransformService {
    /// Create a client for the endpoints in `config`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an endpoint URL cannot be built, or
    /// [`Error::Network`] if the HTTP client cannot be initialized.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("upscale-batch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(client, config)
    }

    /// Create a service on top of an existing HTTP client
    pub fn with_client(client: reqwest::Client, config: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            client,
            process_url: endpoint(
                &config.base_url,
                &config.process_path,
                "service.process_path",
            )?,
            process_multiple_url: endpoint(
                &config.base_url,
                &config.process_multiple_path,
                "service.process_multiple_path",
            )?,
        })
    }

    /// URL of the single-item endpoint
    pub fn process_url(&self) -> &Url {
        &self.process_url
    }

    /// URL of the multi-item endpoint
    pub fn process_multiple_url(&self) -> &Url {
        &self.process_multiple_url
    }

    async fn post_json<B, R>(
        &self,
        url: &Url,
        body: &B,
        deadline: Duration,
    ) -> std::result::Result<R, ProcessingError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let request = self.client.post(url.clone()).json(body).timeout(deadline);

        let response = match tokio::time::timeout(deadline, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::debug!(url = %url, error = %e, "transform request failed");
                return Err(ProcessingError::from_transport(&e, deadline));
            }
            Err(_) => {
                tracing::debug!(url = %url, ?deadline, "transform request timed out");
                return Err(ProcessingError::Timeout { after: deadline });
            }
        };

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProcessingError::from_transport(&e, deadline))?;

        if !status.is_success() {
            tracing::debug!(
                url = %url,
                status = status.as_u16(),
                "transform service returned an error status"
            );
            return Err(error_from_body(status, &body));
        }

        serde_json::from_slice(&body).map_err(|e| ProcessingError::Unknown {
            status: Some(status.as_u16()),
            message: format!("could not parse service response: {}", e),
        })
    }
}

#[async_trait]
impl TransformService for HttpTransformService {
    async fn transform(
        &self,
        request: &TransformRequest,
        deadline: Duration,
    ) -> std::result::Result<TransformResponse, ProcessingError> {
        self.post_json(&self.process_url, request, deadline).await
    }

    async fn transform_batch(
        &self,
        request: &MultiTransformRequest,
        deadline: Duration,
    ) -> std::result::Result<MultiTransformResponse, ProcessingError> {
        self.post_json(&self.process_multiple_url, request, deadline)
            .await
    }
}

/// Join `base` and `path` without dropping a path prefix on `base`
fn endpoint(base: &str, path: &str, key: &str) -> Result<Url> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| Error::Config {
        message: format!("invalid endpoint URL {:?}: {}", joined, e),
        key: Some(key.to_string()),
    })
}
