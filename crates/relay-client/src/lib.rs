//! # relay-client
//!
//! Terminal chat client for the Relay hub.
//!
//! - [`RelayClient`]: dials the hub's stream endpoint and submits messages
//! - [`listener::run_listener`]: prints every pushed message as `sender: content`
//! - [`publisher::run_publisher`]: turns input lines into broadcast submissions

#![deny(unsafe_code)]

pub mod client;
pub mod listener;
pub mod publisher;

pub use client::{RelayClient, Subscription};
pub use listener::ListenError;
pub use publisher::Publish;
