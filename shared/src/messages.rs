//! Messages exchanged between the frame source, the intake worker and the dispatcher

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{NormalizedPhone, RawPayload};

/// One non-empty decode from the external QR decoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedFrame {
    pub payload: RawPayload,
    pub decoded_at: DateTime<Utc>,
}

impl DecodedFrame {
    pub fn new(payload: impl Into<RawPayload>, decoded_at: DateTime<Utc>) -> Self {
        Self {
            payload: payload.into(),
            decoded_at,
        }
    }

    pub fn now(payload: impl Into<RawPayload>) -> Self {
        Self::new(payload, Utc::now())
    }
}

/// Commands sent back to the intake worker, which owns the dedup gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateCommand {
    /// A row for this phone was persisted
    MarkRegistered(NormalizedPhone),

    /// Operator cleared the scan history
    Reset,
}

/// Result of one collaborator call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    Delivered,
    Failed { reason: String },
    /// Collaborator not configured, or nothing to deliver to
    Skipped,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// What the dispatcher did with one check-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub event_id: Uuid,
    pub name: String,
    pub stored: DeliveryOutcome,
    pub notified: DeliveryOutcome,
}
