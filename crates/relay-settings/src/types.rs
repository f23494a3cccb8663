//! Resolved settings structs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the hub process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubSettings {
    /// Interface to bind.
    pub host: String,
    /// Port to bind. Required.
    pub port: u16,
    /// Upper bound on a single send to one subscriber, in milliseconds.
    pub send_timeout_ms: u64,
    /// Interval between registry compaction passes, in seconds.
    pub compact_interval_secs: u64,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl HubSettings {
    /// Default bind interface.
    pub const DEFAULT_HOST: &'static str = "0.0.0.0";
    /// Default send timeout.
    pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 10_000;
    /// Default compaction interval.
    pub const DEFAULT_COMPACT_INTERVAL_SECS: u64 = 60;
    /// Default log filter.
    pub const DEFAULT_LOG_LEVEL: &'static str = "info";

    /// Settings with defaults for everything but the port.
    pub fn with_port(port: u16) -> Self {
        Self {
            host: Self::DEFAULT_HOST.into(),
            port,
            send_timeout_ms: Self::DEFAULT_SEND_TIMEOUT_MS,
            compact_interval_secs: Self::DEFAULT_COMPACT_INTERVAL_SECS,
            log_level: Self::DEFAULT_LOG_LEVEL.into(),
        }
    }

    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Send timeout as a [`Duration`].
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Compaction interval as a [`Duration`].
    pub fn compact_interval(&self) -> Duration {
        Duration::from_secs(self.compact_interval_secs)
    }
}

/// Settings for the chat client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Hub host name.
    pub hub_host: String,
    /// Hub port. Required.
    pub port: u16,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl ClientSettings {
    /// Default hub host.
    pub const DEFAULT_HUB_HOST: &'static str = "localhost";
    /// Default log filter. Kept quiet so logs don't interleave with chat.
    pub const DEFAULT_LOG_LEVEL: &'static str = "warn";

    /// Settings with defaults for everything but the port.
    pub fn with_port(port: u16) -> Self {
        Self {
            hub_host: Self::DEFAULT_HUB_HOST.into(),
            port,
            log_level: Self::DEFAULT_LOG_LEVEL.into(),
        }
    }

    /// `host:port` of the hub.
    pub fn target(&self) -> String {
        format!("{}:{}", self.hub_host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_defaults() {
        let s = HubSettings::with_port(5000);
        assert_eq!(s.host, "0.0.0.0");
        assert_eq!(s.bind_addr(), "0.0.0.0:5000");
        assert_eq!(s.send_timeout(), Duration::from_secs(10));
        assert_eq!(s.compact_interval(), Duration::from_secs(60));
        assert_eq!(s.log_level, "info");
    }

    #[test]
    fn client_defaults() {
        let s = ClientSettings::with_port(5000);
        assert_eq!(s.target(), "localhost:5000");
        assert_eq!(s.log_level, "warn");
    }

    #[test]
    fn hub_settings_serde_roundtrip() {
        let s = HubSettings::with_port(7000);
        let json = serde_json::to_string(&s).unwrap();
        let back: HubSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
