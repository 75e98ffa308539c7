//! Error types for arpspoof

use std::net::Ipv4Addr;
use thiserror::Error;

/// Result type alias for arpspoof operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for arpspoof
#[derive(Error, Debug)]
pub enum Error {
    /// Network I/O error
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The capture/injection handle could not be opened
    #[error("Couldn't open device {interface} ({reason})")]
    TransportOpen { interface: String, reason: String },

    /// Injecting a frame failed
    #[error("Failed to send frame: {0}")]
    Send(String),

    /// Captured buffer shorter than the layout being decoded
    #[error("Malformed frame: expected at least {expected} bytes, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },

    /// No ARP reply arrived for an address within the allowed attempts
    #[error("No ARP reply from {ip} after {attempts} attempt(s)")]
    ResolutionTimeout { ip: Ipv4Addr, attempts: u32 },

    /// Interface not found
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    /// Interface error
    #[error("Interface error: {0}")]
    Interface(String),

    /// Capture error
    #[error("Packet capture error: {0}")]
    Capture(String),

    /// Invalid parameter error
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Execution failed
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Operation interrupted
    #[error("Operation interrupted: {0}")]
    Interrupted(String),
}

impl Error {
    /// Create a malformed-frame error for a buffer of `actual` bytes
    pub fn malformed(expected: usize, actual: usize) -> Self {
        Error::MalformedFrame { expected, actual }
    }

    /// Create a send error with a custom message
    pub fn send<S: Into<String>>(msg: S) -> Self {
        Error::Send(msg.into())
    }

    /// Create a transport-open error
    pub fn transport_open<S: Into<String>, R: Into<String>>(interface: S, reason: R) -> Self {
        Error::TransportOpen {
            interface: interface.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Errors that must abort the process before any session starts
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::TransportOpen { .. } | Error::InterfaceNotFound(_) | Error::Interface(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display() {
        let err = Error::malformed(42, 20);
        assert_eq!(
            err.to_string(),
            "Malformed frame: expected at least 42 bytes, got 20"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::transport_open("eth0", "permission denied").is_fatal());
        assert!(Error::InterfaceNotFound("eth9".into()).is_fatal());
        assert!(!Error::send("buffer full").is_fatal());
        assert!(!Error::ResolutionTimeout {
            ip: Ipv4Addr::new(10, 0, 0, 1),
            attempts: 3
        }
        .is_fatal());
    }
}
