/*!
 * Error types for dialect negotiation and share listing
 */

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NegotiationError>;

/// Errors surfaced by the negotiation layer and the SMB capability beneath it
#[derive(Error, Debug)]
pub enum NegotiationError {
    /// Endpoint identity could not be parsed
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Credentials rejected by the server
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Negotiation or transport failure
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Server name could not be resolved
    #[error("address resolution failed: {0}")]
    AddressResolution(String),

    /// Negotiation property set rejected while building a context.
    /// Recovered inside the context factory, never returned to callers.
    #[error("negotiation configuration build failed: {0}")]
    ConfigurationBuild(String),

    /// Configuration file or logging setup error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl NegotiationError {
    /// Check if the server rejected the supplied credentials
    pub fn is_authentication(&self) -> bool {
        matches!(self, NegotiationError::Authentication(_))
    }

    /// Check if this is a negotiation/transport failure
    pub fn is_protocol(&self) -> bool {
        matches!(self, NegotiationError::Protocol(_))
    }

    /// Check if this error is fatal to the request (retrying cannot help)
    pub fn is_fatal(&self) -> bool {
        match self {
            NegotiationError::InvalidAddress(_) => true,
            NegotiationError::Authentication(_) => true,
            NegotiationError::Config(_) => true,
            NegotiationError::ConfigurationBuild(_) => true,

            NegotiationError::Protocol(_) => false,
            NegotiationError::AddressResolution(_) => false,
            NegotiationError::Io(_) => false,
        }
    }
}
