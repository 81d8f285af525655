//! Payload normalization into attendee records

use shared::{AttendeeRecord, UNKNOWN_NAME};

/// Characters stripped from the name besides digits
const NAME_SEPARATORS: [char; 3] = [',', '.', '-'];

/// Map a decimal digit to its ASCII form
///
/// Covers ASCII, Arabic-Indic (U+0660..U+0669) and Extended Arabic-Indic
/// (U+06F0..U+06F9) digits. Anything else is not a digit here.
pub fn ascii_digit(c: char) -> Option<char> {
    match c {
        '0'..='9' => Some(c),
        '\u{0660}'..='\u{0669}' => char::from_digit(c as u32 - 0x0660, 10),
        '\u{06F0}'..='\u{06F9}' => char::from_digit(c as u32 - 0x06F0, 10),
        _ => None,
    }
}

/// All digits of `raw` in order, as ASCII
pub fn extract_digits(raw: &str) -> String {
    raw.chars().filter_map(ascii_digit).collect()
}

/// Turn decoded QR text into an attendee record
///
/// Total over any input: the phone keeps every digit in order, the name is
/// whatever is left after removing digits and `, . -`, trimmed, or
/// [`UNKNOWN_NAME`] if nothing is left.
pub fn normalize(raw: &str) -> AttendeeRecord {
    let phone = extract_digits(raw);

    let stripped: String = raw
        .chars()
        .filter(|c| ascii_digit(*c).is_none() && !NAME_SEPARATORS.contains(c))
        .collect();
    let trimmed = stripped.trim();

    let name = if trimmed.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        trimmed.to_string()
    };

    AttendeeRecord { name, phone }
}
