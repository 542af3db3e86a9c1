//! Ordered accumulation of per-item outcomes

use crate::types::{ProcessedImage, ProcessingOutcome};

/// Collects one [`ProcessingOutcome`] per item in arrival order
#[derive(Debug, Default)]
pub struct ResultAggregator {
    outcomes: Vec<ProcessingOutcome>,
}

impl ResultAggregator {
    /// Aggregator sized for `capacity` items
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(capacity),
        }
    }

    /// Append the next outcome
    pub fn record(&mut self, outcome: ProcessingOutcome) {
        self.outcomes.push(outcome);
    }

    /// Outcomes recorded so far, in arrival order
    pub fn outcomes(&self) -> &[ProcessingOutcome] {
        &self.outcomes
    }

    /// Number of recorded outcomes
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of successful outcomes
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// One `"<filename>: <message>"` line per failure, in arrival order
    pub fn error_lines(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                ProcessingOutcome::Failure { filename, message } => {
                    Some(format!("{}: {}", filename, message))
                }
                ProcessingOutcome::Success(_) => None,
            })
            .collect()
    }

    /// Human-readable summary of every failure, one line each
    pub fn error_summary(&self) -> String {
        self.error_lines().join("\n")
    }

    /// Split into successes and `"<filename>: <message>"` failure lines, both in
    /// arrival order
    pub fn partition(self) -> (Vec<ProcessedImage>, Vec<String>) {
        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for outcome in self.outcomes {
            match outcome {
                ProcessingOutcome::Success(image) => successes.push(image),
                ProcessingOutcome::Failure { filename, message } => {
                    failures.push(format!("{}: {}", filename, message));
                }
            }
        }
        (successes, failures)
    }
}
