//! Collaborator traits for dependency injection

use async_trait::async_trait;

use shared::{AttendanceRow, NormalizedPhone};
use crate::error::ScannerResult;

/// Append-only attendance table
#[mockall::automock]
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Append one `[name, phone, timestamp, status]` row
    async fn append_row(&self, row: &AttendanceRow) -> ScannerResult<()>;
}

/// Outbound message to an attendee
#[mockall::automock]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a text message to the phone
    async fn send_message(&self, to: &NormalizedPhone, body: &str) -> ScannerResult<()>;
}

/// Source of phones registered before this session
#[mockall::automock]
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Raw phone cells; callers normalize them
    async fn load_registered(&self) -> ScannerResult<Vec<String>>;
}
