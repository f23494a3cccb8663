//! # relay-hub
//!
//! The hub's connection registry and fan-out delivery engine.
//!
//! - [`ConnectionRecord`]: one subscriber: identity, one-way `active` flag,
//!   transport sink behind a send lock, one-shot error signal
//! - [`ConnectionRegistry`]: append-only arena of records in subscribe order,
//!   with best-effort compaction of inactive records
//! - [`Hub::subscribe`]: registers a record and holds until the connection
//!   fails or its transport is cancelled
//! - [`Hub::broadcast`]: one serialized fan-out round per message; failures
//!   deactivate the failing record and never reach the publisher
//! - [`MessageSink`]: the transport seam ("send to one connection")

#![deny(unsafe_code)]

pub mod errors;
pub mod hub;
pub mod metrics;
pub mod record;
pub mod registry;
pub mod sink;

pub use errors::{HubError, SendError};
pub use hub::{Hub, HubConfig, RoundReport, spawn_compaction};
pub use record::ConnectionRecord;
pub use registry::ConnectionRegistry;
pub use sink::MessageSink;
