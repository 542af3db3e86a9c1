//! Custom test assertions for batch results and progress streams

use tokio::sync::broadcast;
use upscale_batch::archive::read_entries;
use upscale_batch::{BatchResult, ProgressEvent, ProgressStatus};
use wiremock::MockServer;

/// Drain every event currently buffered in `rx`
pub fn drain_events(rx: &mut broadcast::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Assert the `2 * n` progress sequence for `expected`, given as
/// `(filename, succeeded)` in input order
pub fn assert_progress_sequence(events: &[ProgressEvent], expected: &[(&str, bool)]) {
    assert_eq!(
        events.len(),
        expected.len() * 2,
        "expected two events per item, got {:#?}",
        events
    );

    for (index, (pair, (filename, succeeded))) in
        events.chunks(2).zip(expected.iter()).enumerate()
    {
        let terminal = if *succeeded {
            ProgressStatus::Completed
        } else {
            ProgressStatus::Error
        };
        for (event, status) in pair.iter().zip([ProgressStatus::Processing, terminal]) {
            assert_eq!(event.current, index + 1, "event {:?}", event);
            assert_eq!(event.total, expected.len(), "event {:?}", event);
            assert_eq!(event.filename, *filename, "event {:?}", event);
            assert_eq!(event.status, status, "event {:?}", event);
        }
    }
}

/// Assert the archive holds exactly `expected` entries, in order
pub fn assert_archive_entries(result: &BatchResult, expected: &[(&str, Vec<u8>)]) {
    let entries = read_entries(&result.archive).expect("archive should be readable");
    let expected: Vec<(String, Vec<u8>)> = expected
        .iter()
        .map(|(name, data)| (name.to_string(), data.clone()))
        .collect();
    assert_eq!(entries, expected);
}

/// Number of requests the mock service has received
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}
