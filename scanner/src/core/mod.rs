//! Scanner core logic

pub mod dispatcher;
pub mod gate;
pub mod normalizer;
pub mod phone;
pub mod pipeline;
pub mod session;
pub mod worker;

pub use dispatcher::{DispatchStats, Dispatcher};
pub use gate::{DedupGate, GateStats, ScanRecord, DEFAULT_COOLDOWN};
pub use normalizer::{extract_digits, normalize};
pub use phone::{PhoneRule, DEFAULT_LOCAL_MAX_LEN};
pub use pipeline::{IntakePipeline, ScanOutcome};
pub use session::{ScanSession, SessionHandle, SessionSummary};
pub use worker::{IntakeStats, IntakeWorker};
