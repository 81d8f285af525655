//! Shared types for the event check-in scanner
//!
//! Contains the attendee and check-in types that cross the boundary
//! between the intake (producer) side and the dispatch (consumer) side,
//! plus the logging setup every binary uses.

pub mod types;
pub mod errors;
pub mod logging;
pub mod messages;

pub use types::*;
pub use errors::*;

pub use messages::{
    // Frame source -> intake
    DecodedFrame,

    // Dispatcher -> intake feedback
    GateCommand,

    // Dispatcher results
    DispatchReport, DeliveryOutcome,
};
