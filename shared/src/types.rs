//! Core shared types and identifiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::errors::{SharedError, SharedResult};

/// Placeholder name used when a payload carries no name text
pub const UNKNOWN_NAME: &str = "Unknown";

/// Raw text decoded from a QR code
pub type RawPayload = String;

/// Component identifier used to tag log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentId {
    /// Frame-decode side that owns the dedup gate
    Intake,
    /// Consumer side that talks to the sheet and the notifier
    Dispatcher,
    /// Binary wiring and startup
    Host,
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentId::Intake => write!(f, "intake"),
            ComponentId::Dispatcher => write!(f, "dispatcher"),
            ComponentId::Host => write!(f, "host"),
        }
    }
}

/// Attendee extracted from a payload, before country-code normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeRecord {
    /// Never empty, falls back to [`UNKNOWN_NAME`]
    pub name: String,
    /// ASCII digits only, possibly empty
    pub phone: String,
}

impl AttendeeRecord {
    pub fn has_phone(&self) -> bool {
        !self.phone.is_empty()
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_NAME
    }
}

/// Country calling code, stored without the leading `+`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl FromStr for CountryCode {
    type Err = SharedError;

    /// Accepts `+964` or `964`; 1 to 4 ASCII digits
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);

        if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(SharedError::InvalidCountryCode { input: s.to_string() });
        }

        Ok(Self(digits.to_string()))
    }
}

impl Default for CountryCode {
    fn default() -> Self {
        Self("964".to_string())
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{}", self.0)
    }
}

/// Phone number in `+<digits>` form
///
/// Every constructor discards non-digit input, so the value always starts
/// with `+` followed only by ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NormalizedPhone(String);

impl NormalizedPhone {
    /// Digits that already carry a country code
    pub fn international(digits: &str) -> Self {
        let mut phone = String::with_capacity(digits.len() + 1);
        phone.push('+');
        phone.extend(digits.chars().filter(|c| c.is_ascii_digit()));
        Self(phone)
    }

    /// National digits prefixed with a country code
    pub fn with_country_code(code: &CountryCode, national: &str) -> Self {
        let mut phone = String::with_capacity(code.digits().len() + national.len() + 1);
        phone.push('+');
        phone.push_str(code.digits());
        phone.extend(national.chars().filter(|c| c.is_ascii_digit()));
        Self(phone)
    }

    /// Strict parse of an already normalized string
    pub fn parse(s: &str) -> SharedResult<Self> {
        match s.strip_prefix('+') {
            Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
                Ok(Self(s.to_string()))
            }
            _ => Err(SharedError::InvalidPhone { input: s.to_string() }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The number without its `+`
    pub fn digits(&self) -> &str {
        &self.0[1..]
    }
}

impl fmt::Display for NormalizedPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Gate decision for a single decoded payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanVerdict {
    /// New scan, forwarded downstream
    Accepted,
    /// Seen within the cooldown window
    CoolingDown { remaining: Duration },
    /// Phone already checked in
    AlreadyRegistered { phone: NormalizedPhone },
}

impl ScanVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ScanVerdict::Accepted)
    }

    /// Short overlay label for a camera preview
    pub fn label(&self) -> &'static str {
        match self {
            ScanVerdict::Accepted => "SCANNED!",
            ScanVerdict::CoolingDown { .. } => "Wait...",
            ScanVerdict::AlreadyRegistered { .. } => "Already checked in",
        }
    }
}

/// Accepted scan handed from the intake side to the dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInEvent {
    pub id: Uuid,
    pub payload: RawPayload,
    pub record: AttendeeRecord,
    pub phone: NormalizedPhone,
    pub scanned_at: DateTime<Utc>,
}

impl CheckInEvent {
    pub fn new(payload: RawPayload, record: AttendeeRecord, phone: NormalizedPhone, scanned_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            record,
            phone,
            scanned_at,
        }
    }

    pub fn to_json(&self) -> SharedResult<String> {
        serde_json::to_string(self).map_err(|e| SharedError::SerializationError { message: e.to_string() })
    }
}

/// Attendance status written to the sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckInStatus {
    Arrived,
}

impl fmt::Display for CheckInStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckInStatus::Arrived => write!(f, "ARRIVED"),
        }
    }
}

/// One row of the attendance sheet: `[name, phone, timestamp, status]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRow {
    pub name: String,
    pub phone: String,
    pub timestamp: String,
    pub status: CheckInStatus,
}

impl AttendanceRow {
    pub const TIMESTAMP_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";

    pub fn from_event(event: &CheckInEvent) -> Self {
        Self {
            name: event.record.name.clone(),
            phone: if event.record.has_phone() {
                event.phone.to_string()
            } else {
                String::new()
            },
            timestamp: event.scanned_at.format(Self::TIMESTAMP_FORMAT).to_string(),
            status: CheckInStatus::Arrived,
        }
    }

    pub fn fields(&self) -> [String; 4] {
        [
            self.name.clone(),
            self.phone.clone(),
            self.timestamp.clone(),
            self.status.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_country_code_parsing() {
        assert_eq!("+964".parse::<CountryCode>().unwrap().digits(), "964");
        assert_eq!("44".parse::<CountryCode>().unwrap().to_string(), "+44");
        assert!("".parse::<CountryCode>().is_err());
        assert!("+".parse::<CountryCode>().is_err());
        assert!("+12345".parse::<CountryCode>().is_err());
        assert!("+9a4".parse::<CountryCode>().is_err());
    }

    #[test]
    fn test_normalized_phone_constructors_keep_invariant() {
        let code = CountryCode::default();
        let phone = NormalizedPhone::with_country_code(&code, "770-123 4567");
        assert_eq!(phone.as_str(), "+9647701234567");
        assert_eq!(phone.digits(), "9647701234567");

        let intl = NormalizedPhone::international("00 44 7911");
        assert_eq!(intl.as_str(), "+00447911");
    }

    #[test]
    fn test_normalized_phone_parse() {
        assert!(NormalizedPhone::parse("+9647701234567").is_ok());
        assert!(NormalizedPhone::parse("9647701234567").is_err());
        assert!(NormalizedPhone::parse("+").is_err());
        assert!(NormalizedPhone::parse("+964 770").is_err());
    }

    #[test]
    fn test_attendance_row_from_event() {
        let scanned_at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 5, 7).unwrap();
        let record = AttendeeRecord { name: "John Doe".to_string(), phone: "07701234567".to_string() };
        let phone = NormalizedPhone::parse("+9647701234567").unwrap();
        let event = CheckInEvent::new("John Doe 07701234567".to_string(), record, phone, scanned_at);

        let row = AttendanceRow::from_event(&event);
        assert_eq!(
            row.fields(),
            [
                "John Doe".to_string(),
                "+9647701234567".to_string(),
                "2025-03-14 09:05:07".to_string(),
                "ARRIVED".to_string(),
            ]
        );
    }

    #[test]
    fn test_verdict_labels() {
        assert_eq!(ScanVerdict::Accepted.label(), "SCANNED!");
        assert_eq!(ScanVerdict::CoolingDown { remaining: Duration::from_secs(1) }.label(), "Wait...");
        assert!(!ScanVerdict::CoolingDown { remaining: Duration::ZERO }.is_accepted());
    }

    #[test]
    fn test_component_display() {
        assert_eq!(ComponentId::Intake.to_string(), "intake");
        assert_eq!(ComponentId::Dispatcher.to_string(), "dispatcher");
        assert_eq!(ComponentId::Host.to_string(), "host");
    }
}
