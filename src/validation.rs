//! Submission validation
//!
//! The [`Validator`] is a pure function of the submitted items and the configured
//! limits: the same input always produces the same accept/reject decision, and no
//! network work happens here.
//!
//! Two granularities are supported:
//! - [`Validator::validate_batch`] - reject-on-submit; the first violating item aborts
//!   the whole submission
//! - [`Validator::validate_item`] - a single item check, used inside the processing
//!   loop when the submission policy isolates violations as item failures

use std::collections::HashSet;

use crate::config::{Config, FileCollisionAction, SubmissionPolicy};
use crate::error::ValidationError;
use crate::types::{BatchRequest, SourceItem, UpscaleMethod};

/// Count and size limits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of items in one batch
    pub max_count: usize,
    /// Maximum size of one item in bytes
    pub max_size: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_count: 8,
            max_size: 50 * 1024 * 1024,
        }
    }
}

/// Checks submissions against count, size, type and method limits
#[derive(Clone, Debug)]
pub struct Validator {
    limits: Limits,
    ai_enabled: bool,
    unique_filenames: bool,
    policy: SubmissionPolicy,
}

impl Validator {
    /// Validator with the given limits; every method allowed, duplicates allowed,
    /// reject-on-submit policy
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            ai_enabled: true,
            unique_filenames: false,
            policy: SubmissionPolicy::RejectOnSubmit,
        }
    }

    /// Validator derived from the crate configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            limits: Limits {
                max_count: config.limits.max_items,
                max_size: config.limits.max_item_bytes,
            },
            ai_enabled: config.service.ai_enabled,
            unique_filenames: config.archive.collision == FileCollisionAction::Reject,
            policy: config.limits.submission,
        }
    }

    /// Configured limits
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Configured submission policy
    pub fn policy(&self) -> SubmissionPolicy {
        self.policy
    }

    /// Check the item count (1..=max_count)
    pub fn validate_count(&self, count: usize) -> Result<(), ValidationError> {
        if count == 0 {
            return Err(ValidationError::NoItems);
        }
        if count > self.limits.max_count {
            return Err(ValidationError::CountExceeded {
                count,
                max: self.limits.max_count,
            });
        }
        Ok(())
    }

    /// Check that the upscale method is enabled
    pub fn validate_method(&self, method: UpscaleMethod) -> Result<(), ValidationError> {
        if method == UpscaleMethod::Ai && !self.ai_enabled {
            return Err(ValidationError::MethodDisabled { method });
        }
        Ok(())
    }

    /// Check one item's type and size
    pub fn validate_item(&self, item: &SourceItem) -> Result<(), ValidationError> {
        if !item.mime_type.starts_with("image/") {
            return Err(ValidationError::InvalidType {
                filename: item.filename.clone(),
                mime_type: item.mime_type.clone(),
            });
        }
        let size = item.size();
        if size > self.limits.max_size {
            return Err(ValidationError::SizeExceeded {
                filename: item.filename.clone(),
                size,
                max: self.limits.max_size,
            });
        }
        if size == 0 {
            return Err(ValidationError::Empty {
                filename: item.filename.clone(),
            });
        }
        Ok(())
    }

    /// Check that no two items share a filename
    pub fn validate_unique_filenames(&self, items: &[SourceItem]) -> Result<(), ValidationError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in items {
            if !seen.insert(item.filename.as_str()) {
                return Err(ValidationError::DuplicateFilename {
                    filename: item.filename.clone(),
                });
            }
        }
        Ok(())
    }

    /// Reject-on-submit: method, count, uniqueness (when required) and every item
    pub fn validate_batch(&self, request: &BatchRequest) -> Result<(), ValidationError> {
        self.validate_method(request.method())?;
        self.validate_count(request.len())?;
        if self.unique_filenames {
            self.validate_unique_filenames(request.items())?;
        }
        request
            .items()
            .iter()
            .try_for_each(|item| self.validate_item(item))
    }

    /// Pre-flight check according to the configured submission policy.
    ///
    /// Under [`SubmissionPolicy::IsolateOnProcess`] per-item violations are left for
    /// the processing loop; batch-wide checks still apply.
    pub fn preflight(&self, request: &BatchRequest) -> Result<(), ValidationError> {
        match self.policy {
            SubmissionPolicy::RejectOnSubmit => self.validate_batch(request),
            SubmissionPolicy::IsolateOnProcess => {
                self.validate_method(request.method())?;
                self.validate_count(request.len())?;
                if self.unique_filenames {
                    self.validate_unique_filenames(request.items())?;
                }
                Ok(())
            }
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}
