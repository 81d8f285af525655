//! Shared error types for the check-in scanner

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid phone number: {input}")]
    InvalidPhone { input: String },

    #[error("Invalid country code: {input}")]
    InvalidCountryCode { input: String },

    #[error("Serialization failed: {message}")]
    SerializationError { message: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
