//! Server configuration.

use std::time::Duration;

use relay_hub::HubConfig;
use relay_settings::HubSettings;
use serde::{Deserialize, Serialize};

/// Configuration for the relay server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Upper bound on one `WebSocket` write to one subscriber, in milliseconds.
    pub send_timeout_ms: u64,
    /// Interval between registry compaction passes, in seconds.
    pub compact_interval_secs: u64,
    /// How long a new stream may take to send its `Connect` frame, in seconds.
    pub handshake_timeout_secs: u64,
    /// Max inbound `WebSocket` message size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            send_timeout_ms: HubSettings::DEFAULT_SEND_TIMEOUT_MS,
            compact_interval_secs: HubSettings::DEFAULT_COMPACT_INTERVAL_SECS,
            handshake_timeout_secs: 10,
            max_message_size: 64 * 1024,
        }
    }
}

impl ServerConfig {
    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Hub tuning derived from this config.
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            send_timeout: Duration::from_millis(self.send_timeout_ms),
        }
    }

    /// Compaction interval as a [`Duration`].
    pub fn compact_interval(&self) -> Duration {
        Duration::from_secs(self.compact_interval_secs)
    }

    /// Handshake timeout as a [`Duration`].
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }
}

impl From<&HubSettings> for ServerConfig {
    fn from(settings: &HubSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            send_timeout_ms: settings.send_timeout_ms,
            compact_interval_secs: settings.compact_interval_secs,
            ..Self::default()
        }
    }
}
