//! Client identity derivation.

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::types::User;

/// Derive a user ID as the hex SHA-256 of `name` followed by `timestamp`.
///
/// Two clients with the same display name started at different instants get
/// different IDs.
pub fn derive_user_id(name: &str, timestamp: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(timestamp.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Format a start time the way clients stamp their messages.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Build a [`User`] for `name` started at `timestamp`.
pub fn derive_user(name: &str, timestamp: &str) -> User {
    User::new(derive_user_id(name, timestamp), name)
}
