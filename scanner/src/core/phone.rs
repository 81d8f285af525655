//! Country-code normalization for extracted phone digits
//!
//! This is a length heuristic, not an E.164 parse: numbers up to
//! `local_max_len` digits are treated as national numbers, anything longer
//! is assumed to already carry a country code.

use serde::{Deserialize, Serialize};
use shared::{CountryCode, NormalizedPhone};

use crate::core::normalizer::extract_digits;

/// Longest digit string still treated as a national number
pub const DEFAULT_LOCAL_MAX_LEN: usize = 11;

/// Rule applied to phone digits before external dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneRule {
    pub country_code: CountryCode,
    pub local_max_len: usize,
}

impl PhoneRule {
    pub fn new(country_code: CountryCode, local_max_len: usize) -> Self {
        Self { country_code, local_max_len }
    }

    /// Normalize a digits-only phone
    pub fn normalize(&self, digits: &str) -> NormalizedPhone {
        if digits.len() > self.local_max_len {
            return NormalizedPhone::international(digits);
        }

        let national = digits.strip_prefix('0').unwrap_or(digits);
        NormalizedPhone::with_country_code(&self.country_code, national)
    }

    /// Normalize a free-form phone string, e.g. a cell read back from the sheet
    ///
    /// Text starting with `+` already carries its country code and only
    /// loses its separators. Returns `None` when the input has no digits.
    pub fn normalize_text(&self, text: &str) -> Option<NormalizedPhone> {
        let digits = extract_digits(text);
        if digits.is_empty() {
            None
        } else if text.trim_start().starts_with('+') {
            Some(NormalizedPhone::international(&digits))
        } else {
            Some(self.normalize(&digits))
        }
    }
}

impl Default for PhoneRule {
    fn default() -> Self {
        Self::new(CountryCode::default(), DEFAULT_LOCAL_MAX_LEN)
    }
}
