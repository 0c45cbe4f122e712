//! Error types for pingate.
//!
//! Every variant is a distinct failure mode of the PIN gate. Messages signal
//! *what* failed without revealing *why* in ways that could leak key or PIN
//! state. `WrongPin` and `DecryptionFailed` are kept apart here so tests can
//! tell them apart, and are collapsed into one message at the UI boundary via
//! [`PinGateError::user_message`] and [`AccessOutcome`].

use thiserror::Error;

use crate::mapping::ItemRef;

/// Result type alias for pingate operations.
pub type Result<T> = std::result::Result<T, PinGateError>;

/// Message shown to the user for any denial, whichever check failed.
pub const INCORRECT_PIN_MESSAGE: &str = "incorrect PIN";

/// The single error type for all pingate operations.
#[derive(Debug, Error)]
pub enum PinGateError {
    /// The PIN is shorter than the minimum length. Checked before hashing.
    #[error("PIN must be at least {min} characters")]
    InvalidPin { min: usize },

    /// The PIN does not match the group's stored digest.
    #[error("wrong PIN")]
    WrongPin,

    /// Authentication tag mismatch, malformed blob, or base64 corruption.
    #[error("decryption failed")]
    DecryptionFailed,

    /// A mapping or caller referenced a group id absent from the store.
    #[error("unknown PIN group: {0}")]
    UnknownGroup(String),

    /// Open/verify was requested for an item with no binding.
    #[error("no access mapping for {0}")]
    NoMapping(ItemRef),

    /// A mapping was marked protected without naming its group.
    #[error("protected mapping for {0} has no group")]
    MissingGroup(ItemRef),

    /// A group name was empty after trimming.
    #[error("group name must not be empty")]
    InvalidGroupName,

    /// The AEAD seal operation failed.
    #[error("encryption failed")]
    EncryptionFailure,

    /// The system's random number generator failed to produce bytes.
    #[error("randomness source failed")]
    RandomnessFailure,

    /// The persistence port could not read or write a collection.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PinGateError {
    /// True for the two failures the user sees as "incorrect PIN".
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::WrongPin | Self::DecryptionFailed)
    }

    /// Message safe to show at the UI boundary.
    ///
    /// `WrongPin` and `DecryptionFailed` map to the same text so the UI cannot
    /// distinguish "right PIN, bad data" from "wrong PIN".
    pub fn user_message(&self) -> String {
        if self.is_denial() {
            INCORRECT_PIN_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<serde_json::Error> for PinGateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<std::io::Error> for PinGateError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// What the UI gets back from a gated action.
///
/// Every error degrades to `Denied`; the distinct kinds stay available on the
/// `Result` the gate returns for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    Granted(String),
    Denied,
}

impl AccessOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }
}

impl<T: Into<String>> From<Result<T>> for AccessOutcome {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Granted(value.into()),
            Err(_) => Self::Denied,
        }
    }
}
