//! Error types for the bus bridge

use shared_bus::BusError;
use thiserror::Error;

/// Failure cause recorded on an inbound unit.
///
/// The bridge never returns these from its processing entry point; they are
/// attached to the unit so the routing engine can decide what to do.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Body conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Completion callback dropped before it was invoked")]
    CompletionDropped,
}

impl BridgeError {
    /// The underlying bus error, if any.
    pub fn as_bus_error(&self) -> Option<&BusError> {
        match self {
            Self::Bus(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors from body transformation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Body is not valid UTF-8: {0}")]
    InvalidUtf8(String),

    #[error("Body is not valid JSON: {0}")]
    InvalidJson(String),
}

/// Errors from mapping and bridge configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Mapping for {uri:?} has an empty address")]
    EmptyAddress { uri: String },

    #[error("Mapping has an empty uri")]
    EmptyUri,

    #[error("Duplicate mapping uri: {0}")]
    DuplicateUri(String),

    #[error("Invalid send timeout: {0}")]
    InvalidTimeout(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Failed to read configuration: {0}")]
    Io(String),
}
