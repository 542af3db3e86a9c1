//! Sequential batch orchestration
//!
//! [`BatchOrchestrator`] is the entry point of the crate. It validates a
//! submission, runs every item through the remote service one at a time, isolates
//! per-item failures, reports progress and bundles the successful outputs into a
//! ZIP archive.

mod aggregator;
mod progress;
mod remote;

pub use aggregator::ResultAggregator;

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::archive::ArchiveBuilder;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::processor::ItemProcessor;
use crate::service::{HttpTransformService, TransformService};
use crate::types::{
    BatchRequest, BatchResult, NonEmpty, ProcessedImage, ProcessingOutcome, ProgressEvent,
    SourceItem, UpscaleMethod,
};
use crate::validation::Validator;
use progress::ProgressTracker;

/// Buffered progress events per subscriber before the oldest are dropped
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Batch front-end for a remote resize/upscale service
///
/// Cloning is cheap; clones share the service client and the progress channel.
///
/// # Example
///
/// ```no_run
/// use upscale_batch::{BatchOrchestrator, BatchRequest, Config, SourceItem, UpscaleMethod};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let orchestrator = BatchOrchestrator::new(Config::default())?;
///
/// let request = BatchRequest::new(
///     vec![
///         SourceItem::new("a.jpg", "image/jpeg", std::fs::read("a.jpg")?),
///         SourceItem::new("b.png", "image/png", std::fs::read("b.png")?),
///     ],
///     UpscaleMethod::Simple,
/// );
///
/// let result = orchestrator
///     .process_batch_with_progress(&request, |event| {
///         println!("{}/{} {} {:?}", event.current, event.total, event.filename, event.status);
///     })
///     .await?;
///
/// if let Some(warning) = result.warning() {
///     eprintln!("{warning}");
/// }
/// result.save_archive(std::path::Path::new("out")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BatchOrchestrator {
    config: Arc<Config>,
    validator: Validator,
    processor: ItemProcessor,
    archive: ArchiveBuilder,
    service: Arc<dyn TransformService>,
    event_tx: broadcast::Sender<ProgressEvent>,
}

impl BatchOrchestrator {
    /// Create an orchestrator talking HTTP to the configured service
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is inconsistent and
    /// [`Error::Network`] if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let service = HttpTransformService::new(&config.service)?;
        Self::with_service(config, Arc::new(service))
    }

    /// Create an orchestrator over any [`TransformService`] implementation
    pub fn with_service(config: Config, service: Arc<dyn TransformService>) -> Result<Self> {
        config.validate()?;

        let validator = Validator::from_config(&config);
        let processor =
            ItemProcessor::new(service.clone(), config.timeouts.clone(), validator.clone());
        let archive = ArchiveBuilder::new(&config.archive);
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config: Arc::new(config),
            validator,
            processor,
            archive,
            service,
            event_tx,
        })
    }

    /// Current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribe to progress events of every batch run through this orchestrator
    ///
    /// Events are delivered in the same order as to the progress callback. Slow
    /// subscribers lag and lose the oldest events rather than blocking processing.
    ///
    /// Clones of an orchestrator share one channel, and [`ProgressEvent`] carries no
    /// batch identity. Batches run concurrently on clones therefore interleave on
    /// every receiver; use
    /// [`process_batch_with_progress`](Self::process_batch_with_progress) to observe
    /// one batch in isolation.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.event_tx.subscribe()
    }

    /// Transform exactly one item
    ///
    /// The item is validated up front regardless of the submission policy. There is
    /// no aggregation, no archive and no progress events; a failure is returned as
    /// [`Error::Processing`].
    pub async fn process_single(
        &self,
        item: &SourceItem,
        method: UpscaleMethod,
    ) -> Result<ProcessedImage> {
        self.validator.validate_method(method)?;
        self.validator.validate_item(item)?;

        self.processor.process(item, method).await.map_err(|e| {
            tracing::warn!(filename = %item.filename, error = %e, "item failed");
            Error::Processing(e)
        })
    }

    /// Process a batch without observing progress
    ///
    /// See [`process_batch_with_progress`](Self::process_batch_with_progress).
    pub async fn process_batch(&self, request: &BatchRequest) -> Result<BatchResult> {
        self.process_batch_with_progress(request, |_| {}).await
    }

    /// Process a batch strictly sequentially, reporting progress
    ///
    /// For every item `on_progress` receives a `processing` event before its
    /// request is sent and exactly one `completed` or `error` event once it
    /// settles, `2 * n` events in total. The same events go to every
    /// [`subscribe`](Self::subscribe) receiver.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the submission is refused before any work starts
    /// - [`Error::AllItemsFailed`] if no item succeeded
    /// - [`Error::Archive`] if the archive cannot be written
    pub async fn process_batch_with_progress<F>(
        &self,
        request: &BatchRequest,
        on_progress: F,
    ) -> Result<BatchResult>
    where
        F: FnMut(&ProgressEvent) + Send,
    {
        self.validator.preflight(request)?;

        let total = request.len();
        let method = request.method();
        tracing::info!(items = total, %method, "starting batch");

        let mut tracker = ProgressTracker::new(total, &self.event_tx, on_progress);
        let mut results = ResultAggregator::with_capacity(total);

        for (index, item) in request.items().iter().enumerate() {
            tracker.begin(index, &item.filename);

            match self.processor.process(item, method).await {
                Ok(image) => {
                    results.record(ProcessingOutcome::Success(image));
                    tracker.finish(index, &item.filename, true);
                }
                Err(e) => {
                    tracing::warn!(
                        filename = %item.filename,
                        code = e.error_code(),
                        error = %e,
                        "item failed"
                    );
                    results.record(ProcessingOutcome::Failure {
                        filename: item.filename.clone(),
                        message: e.item_message(),
                    });
                    tracker.finish(index, &item.filename, false);
                }
            }
        }

        self.finalize(results)
    }

    /// Aggregate outcomes into the final result or the all-failed error
    fn finalize(&self, results: ResultAggregator) -> Result<BatchResult> {
        let (successes, failures) = results.partition();

        if successes.is_empty() {
            tracing::error!(failed = failures.len(), "every item in the batch failed");
            return Err(Error::AllItemsFailed { failures });
        }

        let archive = self.archive.build(&successes)?;
        tracing::info!(
            succeeded = successes.len(),
            failed = failures.len(),
            archive_bytes = archive.len(),
            "batch complete"
        );

        Ok(BatchResult {
            successes,
            archive,
            archive_filename: self.archive.archive_filename().to_string(),
            errors: NonEmpty::from_vec(failures),
        })
    }
}
