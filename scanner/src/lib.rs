//! Event check-in scanner
//!
//! Turns text decoded from attendee QR codes into check-ins: repeats of the
//! same code are suppressed for a cooldown window, each accepted code is
//! split into a name and a phone number, and the result is written to an
//! attendance sheet and answered with a WhatsApp welcome message.

pub mod core;
pub mod error;
pub mod types;
pub mod traits;
pub mod services;

// Re-export main types
pub use error::{ScannerError, ScannerResult};
pub use types::*;
pub use traits::*;
pub use crate::core::*;
pub use services::*;
