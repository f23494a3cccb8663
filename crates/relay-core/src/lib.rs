//! # relay-core
//!
//! Shared vocabulary for the Relay broadcast hub and its clients.
//!
//! - **Wire types**: [`User`], [`Message`], [`Connect`], [`Close`]
//! - **Identity**: [`identity::derive_user_id`] hashes a display name into a stable ID
//! - **Errors**: [`RelayError`] for process-level failures (config, dial, listen, submit)
//! - **Logging**: [`logging::init_subscriber`] installs the stderr `tracing` subscriber

#![deny(unsafe_code)]

pub mod errors;
pub mod identity;
pub mod logging;
pub mod types;

pub use errors::{RelayError, Result};
pub use types::{Close, Connect, Message, User};
