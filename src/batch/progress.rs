//! Per-item state tracking and progress emission

use tokio::sync::broadcast;

use crate::types::{ItemState, ProgressEvent};

/// Drives every item through `Pending -> Processing -> {Completed | Failed}` and
/// emits one [`ProgressEvent`] per transition, to the callback first and then to
/// the broadcast channel.
pub(crate) struct ProgressTracker<'a, F>
where
    F: FnMut(&ProgressEvent),
{
    states: Vec<ItemState>,
    event_tx: &'a broadcast::Sender<ProgressEvent>,
    on_progress: F,
}

impl<'a, F> ProgressTracker<'a, F>
where
    F: FnMut(&ProgressEvent),
{
    /// Tracker for `total` items, all pending
    pub(crate) fn new(
        total: usize,
        event_tx: &'a broadcast::Sender<ProgressEvent>,
        on_progress: F,
    ) -> Self {
        Self {
            states: vec![ItemState::Pending; total],
            event_tx,
            on_progress,
        }
    }

    /// Item `index` entered `Processing`
    pub(crate) fn begin(&mut self, index: usize, filename: &str) {
        self.advance(index, filename, ItemState::Processing);
    }

    /// Item `index` reached a terminal state
    pub(crate) fn finish(&mut self, index: usize, filename: &str, succeeded: bool) {
        let next = if succeeded {
            ItemState::Completed
        } else {
            ItemState::Failed
        };
        self.advance(index, filename, next);
    }

    /// Current state of every item
    #[cfg(test)]
    pub(crate) fn states(&self) -> &[ItemState] {
        &self.states
    }

    fn advance(&mut self, index: usize, filename: &str, next: ItemState) -> bool {
        let Some(current) = self.states.get(index).copied() else {
            tracing::error!(index, total = self.states.len(), "progress for unknown item");
            return false;
        };
        if !current.can_transition_to(next) {
            tracing::error!(index, ?current, ?next, "illegal item state transition");
            return false;
        }
        self.states[index] = next;

        if let Some(status) = next.progress_status() {
            let event = ProgressEvent {
                current: index + 1,
                total: self.states.len(),
                filename: filename.to_string(),
                status,
            };
            (self.on_progress)(&event);
            // No subscribers is fine
            self.event_tx.send(event).ok();
        }
        true
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProgressStatus;

    #[test]
    fn emits_one_event_per_transition() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut seen = Vec::new();
        {
            let mut tracker =
                ProgressTracker::new(2, &tx, |e: &ProgressEvent| seen.push(e.clone()));
            tracker.begin(0, "a.jpg");
            tracker.finish(0, "a.jpg", true);
            tracker.begin(1, "b.jpg");
            tracker.finish(1, "b.jpg", false);
            assert_eq!(tracker.states(), &[ItemState::Completed, ItemState::Failed]);
        }

        let statuses: Vec<_> = seen.iter().map(|e| (e.current, e.status)).collect();
        assert_eq!(
            statuses,
            vec![
                (1, ProgressStatus::Processing),
                (1, ProgressStatus::Completed),
                (2, ProgressStatus::Processing),
                (2, ProgressStatus::Error),
            ]
        );
        assert!(seen.iter().all(|e| e.total == 2));

        for expected in &seen {
            assert_eq!(&rx.try_recv().unwrap(), expected);
        }
    }

    #[test]
    fn refuses_illegal_transitions_without_emitting() {
        let (tx, _rx) = broadcast::channel(16);
        let mut count = 0;
        {
            let mut tracker = ProgressTracker::new(1, &tx, |_: &ProgressEvent| count += 1);
            // finishing before starting is illegal
            tracker.finish(0, "a.jpg", true);
            assert_eq!(tracker.states(), &[ItemState::Pending]);

            tracker.begin(0, "a.jpg");
            tracker.begin(0, "a.jpg");
            // out of range
            tracker.begin(5, "z.jpg");
            assert_eq!(tracker.states(), &[ItemState::Processing]);
        }
        assert_eq!(count, 1);
    }
}
