//! # relay-settings
//!
//! Configuration for the Relay hub and client, loaded in layers (lowest
//! priority first):
//! 1. **Compiled defaults**: [`HubSettings`] / [`ClientSettings`] field defaults
//! 2. **`.env` file**: loaded into the process environment via `dotenvy`
//! 3. **Process environment**: `PORT`, `HOST`, `HUB_HOST`, `RELAY_*`
//!
//! `PORT` has no default: a missing port is a fatal startup error.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{DotenvStatus, load_dotenv, log_level_from};
pub use types::{ClientSettings, HubSettings};
