//! Error types for the BLEIO client.
//!
//! Validation errors are raised before the transport is touched. Transport
//! statuses are mapped through [`GattFailure`] so `?` on a transport call
//! yields the caller-visible variant directly.

use crate::infrastructure::bluetooth::codec::DecodeError;
use crate::infrastructure::bluetooth::transport::GattFailure;
use thiserror::Error;
use uuid::Uuid;

/// Top-level error type used across the client.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    // Discovery / resolution
    /// Scan completed but no peripheral matched the selector.
    #[error("device '{selector}' not found")]
    DeviceNotFound { selector: String },

    /// The MAC address text is not six colon-separated hex octets.
    #[error("invalid MAC address '{input}' (expected aa:bb:cc:dd:ee:ff)")]
    AddressParse { input: String },

    /// A configured UUID string could not be parsed.
    #[error("invalid UUID '{value}'")]
    InvalidUuid { value: String },

    #[error("service {uuid} not found")]
    ServiceNotFound { uuid: Uuid },

    #[error("characteristic {uuid} not found")]
    CharacteristicNotFound { uuid: Uuid },

    /// The connected firmware does not expose what this operation needs.
    #[error("{feature} is not available on this peripheral")]
    FeatureUnavailable { feature: &'static str },

    /// Operation attempted while the session is not ready.
    #[error("not connected to the device")]
    NotConnected,

    // Validation
    #[error("command count must be within 1-24 (got {count})")]
    InvalidBatchSize { count: usize },

    /// The pin cannot be used for the requested function.
    #[error("GPIO{pin} does not support {function}")]
    InvalidPin { pin: u8, function: &'static str },

    #[error("{name} out of range: {value}")]
    OutOfRange { name: &'static str, value: f64 },

    // Mapped transport statuses
    /// The peripheral is unreachable (the link was probably dropped).
    #[error("device unreachable (link lost)")]
    LinkLost,

    #[error("GATT protocol error")]
    ProtocolFault,

    #[error("GATT access denied")]
    PermissionDenied,

    #[error("transport failure (status {code})")]
    TransportFailure { code: i32 },

    /// The read succeeded but the payload did not decode.
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] DecodeError),

    // Legacy single-pin protocol
    #[error("pin selector write failed: {0}")]
    WriteFailed(GattFailure),

    #[error("no complete response after {attempts} read attempts")]
    ReadTimeout { attempts: u32 },
}

impl From<GattFailure> for Error {
    fn from(failure: GattFailure) -> Self {
        match failure {
            GattFailure::Unreachable => Error::LinkLost,
            GattFailure::ProtocolError => Error::ProtocolFault,
            GattFailure::AccessDenied => Error::PermissionDenied,
            GattFailure::Other(code) => Error::TransportFailure { code },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
