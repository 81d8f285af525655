//! Decoded frame factories

use chrono::{DateTime, TimeZone, Utc};
use shared::DecodedFrame;

/// Fixed session start so tests control the clock
pub fn session_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap()
}

/// Frame decoded `millis` after session start
pub fn frame_at(payload: &str, millis: i64) -> DecodedFrame {
    DecodedFrame::new(payload, session_start() + chrono::Duration::milliseconds(millis))
}

/// A code held in front of the camera: one frame every 33 ms for `duration_ms`
#[allow(dead_code)]
pub fn held_code(payload: &str, start_ms: i64, duration_ms: i64) -> Vec<DecodedFrame> {
    (start_ms..start_ms + duration_ms)
        .step_by(33)
        .map(|millis| frame_at(payload, millis))
        .collect()
}
