//! # upscale-batch
//!
//! Batch client for a remote image resize/upscale service.
//!
//! ## Design Philosophy
//!
//! upscale-batch is designed to be:
//! - **Failure-isolating** - One bad item never aborts the rest of the batch
//! - **Strictly ordered** - Items are processed one at a time, outcomes and progress
//!   events follow input order
//! - **Sensible defaults** - Works out of the box against a local service
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//!
//! ## Quick Start
//!
//! ```no_run
//! use upscale_batch::{BatchOrchestrator, BatchRequest, Config, SourceItem, UpscaleMethod};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = BatchOrchestrator::new(Config::default())?;
//!
//!     // Subscribe to progress events
//!     let mut events = orchestrator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("{} {:?}", event.filename, event.status);
//!         }
//!     });
//!
//!     let request = BatchRequest::new(
//!         vec![SourceItem::new("cat.jpg", "image/jpeg", std::fs::read("cat.jpg")?)],
//!         UpscaleMethod::Simple,
//!     );
//!     let result = orchestrator.process_batch(&request).await?;
//!     result.save_archive(std::path::Path::new("output")).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// ZIP archive assembly
pub mod archive;
/// Batch orchestration, aggregation and progress
pub mod batch;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Single-item processing
pub mod processor;
/// Remote transformation service contract and HTTP client
pub mod service;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;
/// Submission validation
pub mod validation;

// Re-export commonly used types
pub use archive::ArchiveBuilder;
pub use batch::{BatchOrchestrator, ResultAggregator};
pub use config::{
    ArchiveCompression, ArchiveConfig, Config, FileCollisionAction, LimitsConfig, ServiceConfig,
    SubmissionPolicy, TimeoutConfig,
};
pub use error::{Error, ProcessingError, Result, ValidationError};
pub use processor::ItemProcessor;
pub use service::{HttpTransformService, TransformService};
pub use types::{
    BatchRequest, BatchResult, ItemState, NonEmpty, ProcessedImage, ProcessingOutcome,
    ProgressEvent, ProgressStatus, ResizeMode, SourceItem, UpscaleMethod,
};
pub use validation::{Limits, Validator};
