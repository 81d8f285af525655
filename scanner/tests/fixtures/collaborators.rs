//! In-memory collaborators that record what the dispatcher sent them

use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::Mutex;

use scanner::{AttendanceStore, Notifier, RegistrySource, ScannerError, ScannerResult};
use shared::{AttendanceRow, NormalizedPhone};

/// Attendance store keeping rows in memory
#[derive(Clone, Default)]
pub struct RecordingStore {
    pub rows: Arc<Mutex<Vec<AttendanceRow>>>,
    pub fail: bool,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub async fn names(&self) -> Vec<String> {
        self.rows.lock().await.iter().map(|row| row.name.clone()).collect()
    }
}

#[async_trait]
impl AttendanceStore for RecordingStore {
    async fn append_row(&self, row: &AttendanceRow) -> ScannerResult<()> {
        if self.fail {
            return Err(ScannerError::storage("sheet unavailable"));
        }
        self.rows.lock().await.push(row.clone());
        Ok(())
    }
}

/// Notifier keeping sent messages in memory
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub messages: Arc<Mutex<Vec<(NormalizedPhone, String)>>>,
    pub fail: bool,
}

#[allow(dead_code)]
impl RecordingNotifier {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub async fn recipients(&self) -> Vec<String> {
        self.messages.lock().await.iter().map(|(to, _)| to.to_string()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_message(&self, to: &NormalizedPhone, body: &str) -> ScannerResult<()> {
        if self.fail {
            return Err(ScannerError::notification("HTTP 503: service unavailable"));
        }
        self.messages.lock().await.push((to.clone(), body.to_string()));
        Ok(())
    }
}

/// Registry returning a fixed list of phone cells
pub struct StaticRegistry(pub Vec<String>);

#[async_trait]
impl RegistrySource for StaticRegistry {
    async fn load_registered(&self) -> ScannerResult<Vec<String>> {
        Ok(self.0.clone())
    }
}
