//! Scanner collaborator implementations

pub mod attendance_sheet;
pub mod line_source;
pub mod whatsapp;

#[cfg(test)]
pub mod tests;

pub use attendance_sheet::*;
pub use line_source::*;
pub use whatsapp::*;
