//! Test fixtures and utilities

pub mod collaborators;
pub mod frames;

#[allow(unused_imports)]
pub use collaborators::*;
#[allow(unused_imports)]
pub use frames::*;
