//! Process-level error taxonomy.
//!
//! These errors are fatal at startup (`ConfigMissing`, `InvalidConfig`,
//! `TransportListenFailed`, `TransportDialFailed`) or local to one publisher
//! call (`SubmitFailed`). Per-connection delivery failures live in the hub
//! crate and never surface here.

use thiserror::Error;

/// Errors surfaced by the hub and client processes.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A required configuration value is absent.
    #[error("missing required configuration value `{key}`")]
    ConfigMissing {
        /// Environment key that was looked up.
        key: String,
    },

    /// A configuration value is present but unusable.
    #[error("invalid value `{value}` for configuration key `{key}`")]
    InvalidConfig {
        /// Environment key.
        key: String,
        /// Raw value found.
        value: String,
    },

    /// Could not bind the hub listener.
    #[error("failed to listen on {addr}: {cause}")]
    TransportListenFailed {
        /// Address the hub tried to bind.
        addr: String,
        /// Underlying I/O error.
        #[source]
        cause: std::io::Error,
    },

    /// Could not open a subscription stream to the hub.
    #[error("failed to connect to {target}: {cause}")]
    TransportDialFailed {
        /// Hub address the client dialed.
        target: String,
        /// Description of the underlying failure.
        cause: String,
    },

    /// A message submission did not reach the hub.
    #[error("failed to submit message: {cause}")]
    SubmitFailed {
        /// Description of the underlying failure.
        cause: String,
    },
}

impl RelayError {
    /// Whether the error should terminate the process.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::SubmitFailed { .. })
    }
}

/// Result alias for process-level operations.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn config_missing_display() {
        let err = RelayError::ConfigMissing { key: "PORT".into() };
        assert_eq!(err.to_string(), "missing required configuration value `PORT`");
    }

    #[test]
    fn listen_failed_keeps_source() {
        let err = RelayError::TransportListenFailed {
            addr: "0.0.0.0:80".into(),
            cause: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("0.0.0.0:80"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn submit_failed_is_not_fatal() {
        let err = RelayError::SubmitFailed {
            cause: "connection refused".into(),
        };
        assert!(!err.is_fatal());
        assert_matches!(err, RelayError::SubmitFailed { .. });
    }

    #[test]
    fn startup_errors_are_fatal() {
        assert!(RelayError::ConfigMissing { key: "PORT".into() }.is_fatal());
        assert!(
            RelayError::TransportDialFailed {
                target: "localhost:1".into(),
                cause: "refused".into(),
            }
            .is_fatal()
        );
    }
}
