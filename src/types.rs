//! Core types for upscale-batch

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Default MIME type assumed when the service does not report one
pub const DEFAULT_OUTPUT_CONTENT_TYPE: &str = "image/jpeg";

/// Target aspect preset requested for an item's resize
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Portrait, 1080x1350
    #[default]
    Vertical,
    /// Landscape, 1350x1080
    Horizontal,
}

impl ResizeMode {
    /// Output dimensions (width, height) the service produces for this preset
    pub fn target_size(&self) -> (u32, u32) {
        match self {
            ResizeMode::Vertical => (1080, 1350),
            ResizeMode::Horizontal => (1350, 1080),
        }
    }

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ResizeMode::Vertical => "vertical",
            ResizeMode::Horizontal => "horizontal",
        }
    }
}

impl std::fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution enhancement algorithm, shared by every item of a batch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpscaleMethod {
    /// Plain resampling
    #[default]
    Simple,
    /// AI-based upscaling (slower, may be disabled)
    Ai,
}

impl UpscaleMethod {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UpscaleMethod::Simple => "simple",
            UpscaleMethod::Ai => "ai",
        }
    }
}

impl std::fmt::Display for UpscaleMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One image submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceItem {
    /// Original filename, also used as the archive entry name
    pub filename: String,
    /// Declared MIME type (must start with `image/`)
    pub mime_type: String,
    /// Raw image bytes
    pub data: Vec<u8>,
    /// Resize preset for this item
    pub mode: ResizeMode,
}

impl SourceItem {
    /// Create an item with the default (vertical) resize preset
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            data,
            mode: ResizeMode::default(),
        }
    }

    /// Set the resize preset
    pub fn with_mode(mut self, mode: ResizeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Payload size in bytes
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// An immutable batch submission
#[derive(Clone, Debug)]
pub struct BatchRequest {
    items: Vec<SourceItem>,
    method: UpscaleMethod,
}

impl BatchRequest {
    /// Build a batch. Limits are enforced by the validator, not here.
    pub fn new(items: Vec<SourceItem>, method: UpscaleMethod) -> Self {
        Self { items, method }
    }

    /// Items in submission order
    pub fn items(&self) -> &[SourceItem] {
        &self.items
    }

    /// Shared upscale method
    pub fn method(&self) -> UpscaleMethod {
        self.method
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the batch holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Output of a successfully transformed item
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedImage {
    /// Filename of the source item
    pub filename: String,
    /// Transformed image bytes
    pub data: Vec<u8>,
    /// MIME type of `data`
    pub content_type: String,
}

impl ProcessedImage {
    /// Displayable `data:<mime>;base64,<payload>` form
    pub fn to_data_url(&self) -> String {
        crate::utils::to_data_url(&self.content_type, &self.data)
    }
}

/// Per-item result of attempting remote transformation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// Item transformed
    Success(ProcessedImage),
    /// Item failed; the batch carried on
    Failure {
        /// Filename of the source item
        filename: String,
        /// Human-readable error message
        message: String,
    },
}

impl ProcessingOutcome {
    /// Filename of the item this outcome belongs to
    pub fn filename(&self) -> &str {
        match self {
            ProcessingOutcome::Success(image) => &image.filename,
            ProcessingOutcome::Failure { filename, .. } => filename,
        }
    }

    /// Whether the item succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingOutcome::Success(_))
    }
}

/// Status reported in a [`ProgressEvent`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    /// The item's remote call is in flight
    Processing,
    /// The item succeeded
    Completed,
    /// The item failed
    Error,
}

/// Progress notification emitted while a batch runs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// 1-based index of the item
    pub current: usize,
    /// Batch size
    pub total: usize,
    /// Filename of the item
    pub filename: String,
    /// What happened
    pub status: ProgressStatus,
}

/// Lifecycle of an item inside a running batch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemState {
    /// Not yet dispatched
    Pending,
    /// Remote call in flight
    Processing,
    /// Terminal: succeeded
    Completed,
    /// Terminal: failed
    Failed,
}

impl ItemState {
    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: ItemState) -> bool {
        matches!(
            (self, next),
            (ItemState::Pending, ItemState::Processing)
                | (ItemState::Processing, ItemState::Completed)
                | (ItemState::Processing, ItemState::Failed)
        )
    }

    /// Whether the state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemState::Completed | ItemState::Failed)
    }

    /// Progress status reported when entering this state (`None` for `Pending`)
    pub fn progress_status(&self) -> Option<ProgressStatus> {
        match self {
            ItemState::Pending => None,
            ItemState::Processing => Some(ProgressStatus::Processing),
            ItemState::Completed => Some(ProgressStatus::Completed),
            ItemState::Failed => Some(ProgressStatus::Error),
        }
    }
}

/// A vector holding at least one element
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NonEmpty<T>(Vec<T>);

impl<T> NonEmpty<T> {
    /// `None` when `items` is empty
    pub fn from_vec(items: Vec<T>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self(items))
        }
    }

    /// First element
    pub fn first(&self) -> &T {
        &self.0[0]
    }

    /// Number of elements (always >= 1)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with slices
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Borrow as a slice
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// Iterate over the elements
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    /// Unwrap into the underlying vector
    pub fn into_vec(self) -> Vec<T> {
        self.0
    }
}

/// Final result of a batch with at least one successful item
#[derive(Clone, Debug)]
pub struct BatchResult {
    /// Successful items in input order
    pub successes: Vec<ProcessedImage>,
    /// ZIP archive holding every successful payload
    pub archive: Vec<u8>,
    /// Suggested filename for the archive
    pub archive_filename: String,
    /// One `"<filename>: <message>"` entry per failed item, absent when none failed
    pub errors: Option<NonEmpty<String>>,
}

impl BatchResult {
    /// Combined partial-failure warning, if any item failed
    pub fn warning(&self) -> Option<String> {
        self.errors.as_ref().map(|errors| {
            format!(
                "some images could not be processed:\n{}",
                errors.as_slice().join("\n")
            )
        })
    }

    /// Write the archive into `dir` under [`archive_filename`](Self::archive_filename)
    ///
    /// Returns the path of the written file. An archive filename that is not a
    /// plain file name is refused with [`std::io::ErrorKind::InvalidInput`].
    pub async fn save_archive(&self, dir: &Path) -> Result<PathBuf> {
        if !crate::utils::is_plain_file_name(&self.archive_filename) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "archive filename {:?} is not a plain file name",
                    self.archive_filename
                ),
            )
            .into());
        }
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.archive_filename);
        tokio::fs::write(&path, &self.archive).await?;
        tracing::debug!(path = %path.display(), bytes = self.archive.len(), "archive saved");
        Ok(path)
    }

    /// Archive as a `data:application/zip;base64,...` URL
    pub fn archive_data_url(&self) -> String {
        format!("data:application/zip;base64,{}", STANDARD.encode(&self.archive))
    }
}
