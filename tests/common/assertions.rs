//! Event collection helpers

use std::time::Duration;
use tvlinker::{DownloadEvent, DownloadHandle};

/// Upper bound for any single mock-backed action
pub const STEP_TIMEOUT: Duration = Duration::from_secs(10);

/// Read download events until the terminal one, with a timeout
///
/// Returns every event seen, the terminal event last.
pub async fn collect_download_events(handle: &mut DownloadHandle) -> Vec<DownloadEvent> {
    let mut events = Vec::new();
    let result = tokio::time::timeout(STEP_TIMEOUT, async {
        while let Some(event) = handle.next_event().await {
            let done = event.is_terminal();
            events.push(event);
            if done {
                break;
            }
        }
    })
    .await;
    assert!(result.is_ok(), "download did not finish within {STEP_TIMEOUT:?}");
    events
}

/// Assert that progress samples never move backwards
pub fn assert_monotonic_progress(events: &[DownloadEvent]) {
    let mut last = 0u64;
    for event in events {
        if let DownloadEvent::Progress(progress) = event {
            assert!(
                progress.bytes_done >= last,
                "progress went backwards: {} after {}",
                progress.bytes_done,
                last
            );
            last = progress.bytes_done;
        }
    }
}
