//! Intake pipeline: dedup gate followed by normalization

use chrono::{DateTime, Utc};
use shared::{AttendeeRecord, CheckInEvent, ScanVerdict};

use crate::core::gate::DedupGate;
use crate::core::normalizer::normalize;

/// Gate decision plus the check-in it produced, if accepted
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub verdict: ScanVerdict,
    pub event: Option<CheckInEvent>,
}

/// Turns decoded payloads into at most one check-in per accepted scan
///
/// Owns its gate; nothing else reads or writes the gate state.
pub struct IntakePipeline {
    gate: DedupGate,
}

impl IntakePipeline {
    pub fn new(gate: DedupGate) -> Self {
        Self { gate }
    }

    /// Attendee for an accepted payload, `None` when suppressed
    pub fn on_decoded(&mut self, raw: &str, now: DateTime<Utc>) -> Option<AttendeeRecord> {
        if !self.gate.accept(raw, now) {
            return None;
        }
        Some(normalize(raw))
    }

    /// Full decision for the intake worker
    pub fn process(&mut self, raw: &str, now: DateTime<Utc>) -> ScanOutcome {
        let verdict = self.gate.evaluate(raw, now);

        let event = verdict.is_accepted().then(|| {
            let record = normalize(raw);
            let phone = self.gate.phone_rule().normalize(&record.phone);
            CheckInEvent::new(raw.to_string(), record, phone, now)
        });

        ScanOutcome { verdict, event }
    }

    pub fn gate(&self) -> &DedupGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut DedupGate {
        &mut self.gate
    }
}

impl Default for IntakePipeline {
    fn default() -> Self {
        Self::new(DedupGate::default())
    }
}
