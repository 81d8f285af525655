//! Test helper utilities for scanner integration tests

use std::sync::Arc;
use std::time::Duration;

use scanner::{ScanSession, ScannerConfig};
use tokio::sync::Mutex;

use crate::fixtures::{RecordingNotifier, RecordingStore};

/// Config with a short poll so tests finish quickly
pub fn test_config() -> ScannerConfig {
    ScannerConfig {
        poll_timeout: Duration::from_millis(10),
        ..ScannerConfig::default()
    }
}

/// Session wired to recording collaborators
pub fn recording_session(
    config: ScannerConfig,
    store: &RecordingStore,
    notifier: &RecordingNotifier,
) -> ScanSession<RecordingStore, RecordingNotifier> {
    ScanSession::new(config, Some(Arc::new(store.clone())), Some(Arc::new(notifier.clone()))).unwrap()
}

/// Wait until a recorded list reaches `expected` entries
pub async fn wait_for_len<T>(items: &Mutex<Vec<T>>, expected: usize, timeout_ms: u64) -> bool {
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    loop {
        if items.lock().await.len() >= expected {
            return true;
        }

        if start.elapsed() > timeout {
            return false;
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
