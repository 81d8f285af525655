//! Scan de-duplication
//!
//! The gate decides whether a decoded payload is a new check-in or a repeat
//! of something handled recently. A camera keeps decoding the same code on
//! every frame while it stays in view, so repeats inside the cooldown window
//! are suppressed. Phones in the registered set are suppressed for good.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use shared::{NormalizedPhone, RawPayload, ScanVerdict};

use crate::core::normalizer::extract_digits;
use crate::core::phone::PhoneRule;

/// Default cooldown between two acceptances of the same payload
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Last acceptance of a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    pub payload: RawPayload,
    pub first_seen_at: DateTime<Utc>,
}

/// Statistics about gate decisions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateStats {
    pub total_evaluated: u64,
    pub accepted: u64,
    pub cooling_down: u64,
    pub already_registered: u64,
}

/// Stateful dedup policy, owned by a single intake pipeline
pub struct DedupGate {
    cooldown: Duration,

    /// Used to match payloads against the registered set
    phone_rule: PhoneRule,

    /// Payload -> last acceptance
    scans: HashMap<RawPayload, ScanRecord>,

    /// Phones that never check in again
    registered: HashSet<NormalizedPhone>,

    stats: GateStats,
}

impl DedupGate {
    pub fn new(cooldown: Duration, phone_rule: PhoneRule) -> Self {
        Self {
            cooldown,
            phone_rule,
            scans: HashMap::new(),
            registered: HashSet::new(),
            stats: GateStats::default(),
        }
    }

    /// Gate with the default cooldown and phone rule
    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self::new(cooldown, PhoneRule::default())
    }

    /// Whether `payload` should be treated as a new scan at `now`
    pub fn accept(&mut self, payload: &str, now: DateTime<Utc>) -> bool {
        self.evaluate(payload, now).is_accepted()
    }

    /// Decide on `payload` and record the acceptance if there is one
    ///
    /// A suppressed payload leaves its stored timestamp untouched. A `now`
    /// that is not after the stored timestamp counts as inside the cooldown.
    pub fn evaluate(&mut self, payload: &str, now: DateTime<Utc>) -> ScanVerdict {
        self.stats.total_evaluated += 1;

        if let Some(phone) = self.registered_phone(payload) {
            self.stats.already_registered += 1;
            return ScanVerdict::AlreadyRegistered { phone };
        }

        if let Some(record) = self.scans.get_mut(payload) {
            if let Some(remaining) = remaining_cooldown(self.cooldown, record.first_seen_at, now) {
                self.stats.cooling_down += 1;
                return ScanVerdict::CoolingDown { remaining };
            }
            record.first_seen_at = now;
        } else {
            self.scans.insert(
                payload.to_string(),
                ScanRecord {
                    payload: payload.to_string(),
                    first_seen_at: now,
                },
            );
        }

        self.stats.accepted += 1;
        ScanVerdict::Accepted
    }

    /// Registered phone matching the payload's digits, if any
    fn registered_phone(&self, payload: &str) -> Option<NormalizedPhone> {
        if self.registered.is_empty() {
            return None;
        }

        // same rule the pipeline applies to the event phone
        let digits = extract_digits(payload);
        if digits.is_empty() {
            return None;
        }
        let phone = self.phone_rule.normalize(&digits);
        self.registered.contains(&phone).then_some(phone)
    }

    /// Add phones loaded from persisted storage, returns how many were new
    pub fn seed_registered<I>(&mut self, phones: I) -> usize
    where
        I: IntoIterator<Item = NormalizedPhone>,
    {
        phones.into_iter().filter(|phone| self.registered.insert(phone.clone())).count()
    }

    /// Mark one phone as checked in
    pub fn mark_registered(&mut self, phone: NormalizedPhone) -> bool {
        self.registered.insert(phone)
    }

    pub fn is_registered(&self, phone: &NormalizedPhone) -> bool {
        self.registered.contains(phone)
    }

    /// Clear the scan history; the registered set is kept
    pub fn reset(&mut self) {
        self.scans.clear();
    }

    pub fn record(&self, payload: &str) -> Option<&ScanRecord> {
        self.scans.get(payload)
    }

    /// Number of payloads with a scan record
    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn phone_rule(&self) -> &PhoneRule {
        &self.phone_rule
    }

    pub fn get_stats(&self) -> &GateStats {
        &self.stats
    }
}

impl Default for DedupGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN, PhoneRule::default())
    }
}

/// Time left in the cooldown window, `None` once it has expired
fn remaining_cooldown(cooldown: Duration, last: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
    match (now - last).to_std() {
        Ok(elapsed) if elapsed > cooldown => None,
        Ok(elapsed) => Some(cooldown - elapsed),
        // clock went backwards
        Err(_) => Some(cooldown),
    }
}
