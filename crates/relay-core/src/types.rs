//! Wire types exchanged between clients and the hub.
//!
//! All types serialize as camelCase JSON. A [`Message`] accepts `id` as an
//! alias for `senderId` so older clients that send the sender under `id`
//! still decode.

use serde::{Deserialize, Serialize};

/// A chat participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier, caller-supplied or derived from the display name.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl User {
    /// Create a user from an ID and display name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A chat message submitted by a publisher and fanned out to every listener.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// ID of the user who sent the message.
    #[serde(alias = "id")]
    pub sender_id: String,
    /// Message text.
    pub content: String,
    /// Serialized send time.
    pub timestamp: String,
}

impl Message {
    /// Create a message.
    pub fn new(
        sender_id: impl Into<String>,
        content: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            content: content.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// Subscribe request: the first frame a client sends on a stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connect {
    /// The subscribing user.
    pub user: User,
    /// Whether the subscriber intends the stream to be live.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Connect {
    /// Build an active subscribe request for `user`.
    pub fn active(user: User) -> Self {
        Self { user, active: true }
    }
}

/// Empty acknowledgement returned once a broadcast round completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Close {}
