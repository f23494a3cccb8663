//! Delivery error types.

use std::time::Duration;

use thiserror::Error;

/// Why a single send to one subscriber failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SendError {
    /// The transport is already closed (or was released by its handler).
    #[error("transport closed")]
    Closed,
    /// The send did not complete within the configured timeout.
    #[error("send timed out after {0:?}")]
    TimedOut(Duration),
    /// The message could not be encoded for the transport.
    #[error("encode failed: {0}")]
    Encode(String),
    /// The transport reported a write error.
    #[error("transport error: {0}")]
    Transport(String),
}

impl SendError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::TimedOut(_) => "timeout",
            Self::Encode(_) => "encode",
            Self::Transport(_) => "transport",
        }
    }
}

/// Errors returned by hub operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// A broadcast send to this subscription failed; the subscription is
    /// deactivated and its stream should be torn down.
    #[error("delivery to {connection_id} failed: {cause}")]
    StreamDeliveryFailed {
        /// Subscriber ID of the failed connection.
        connection_id: String,
        /// The send failure.
        #[source]
        cause: SendError,
    },
}
