//! Settings loading from `.env` and the process environment.
//!
//! Loading flow:
//! 1. [`load_dotenv`] copies `.env` entries into the process environment
//!    (existing variables win) and reports what it found as a
//!    [`DotenvStatus`], to be logged once a subscriber is installed
//! 2. Required keys are read strictly: absent or unparsable is an error
//! 3. Optional keys are range-checked: invalid values are ignored with a
//!    warning and the compiled default is kept
//!
//! The `*_from` functions take a lookup closure so they can be exercised
//! without touching the real environment.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::{ClientSettings, HubSettings};

/// Outcome of looking for a `.env` file.
#[derive(Debug)]
pub enum DotenvStatus {
    /// Entries were loaded from this file.
    Loaded(PathBuf),
    /// No `.env` file exists.
    NotFound,
    /// A file exists but could not be read or parsed.
    Failed(String),
}

impl DotenvStatus {
    fn from_result(result: std::result::Result<PathBuf, dotenvy::Error>) -> Self {
        match result {
            Ok(path) => Self::Loaded(path),
            Err(e) if e.not_found() => Self::NotFound,
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    /// Emit the outcome through `tracing`.
    pub fn log(&self) {
        match self {
            Self::Loaded(path) => debug!(path = %path.display(), "loaded .env"),
            Self::NotFound => debug!(".env not found, using process environment"),
            Self::Failed(error) => warn!(%error, "failed to load .env, using process environment"),
        }
    }
}

/// Load `.env` from the current directory or its ancestors, if present.
///
/// Runs before logging is configured, so the outcome is returned rather than
/// logged.
pub fn load_dotenv() -> DotenvStatus {
    DotenvStatus::from_result(dotenvy::dotenv())
}

/// Log level from `RELAY_LOG`, or `default`.
///
/// Read ahead of the full settings so that setting warnings are visible.
pub fn log_level_from(lookup: impl Fn(&str) -> Option<String>, default: &str) -> String {
    read_string(&lookup, "RELAY_LOG").unwrap_or_else(|| default.to_owned())
}

/// Resolve hub settings through `lookup`.
pub fn hub_settings_from(lookup: impl Fn(&str) -> Option<String>) -> Result<HubSettings> {
    let port = required_port(&lookup)?;
    let mut settings = HubSettings::with_port(port);

    if let Some(v) = read_string(&lookup, "HOST") {
        settings.host = v;
    }
    if let Some(v) = read_u64(&lookup, "RELAY_SEND_TIMEOUT_MS", 100, 600_000) {
        settings.send_timeout_ms = v;
    }
    if let Some(v) = read_u64(&lookup, "RELAY_COMPACT_INTERVAL_SECS", 1, 86_400) {
        settings.compact_interval_secs = v;
    }
    settings.log_level = log_level_from(&lookup, HubSettings::DEFAULT_LOG_LEVEL);
    Ok(settings)
}

/// Resolve client settings through `lookup`.
pub fn client_settings_from(lookup: impl Fn(&str) -> Option<String>) -> Result<ClientSettings> {
    let port = required_port(&lookup)?;
    let mut settings = ClientSettings::with_port(port);

    if let Some(v) = read_string(&lookup, "HUB_HOST") {
        settings.hub_host = v;
    }
    settings.log_level = log_level_from(&lookup, ClientSettings::DEFAULT_LOG_LEVEL);
    Ok(settings)
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Lookup readers ──────────────────────────────────────────────────────────

fn required_port(lookup: &impl Fn(&str) -> Option<String>) -> Result<u16> {
    let raw = read_string(lookup, "PORT").ok_or_else(|| SettingsError::Missing("PORT".into()))?;
    parse_u16_range(&raw, 1, u16::MAX).ok_or(SettingsError::InvalidValue {
        key: "PORT".into(),
        value: raw,
    })
}

fn read_string(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.trim().is_empty())
}

fn read_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    min: u64,
    max: u64,
) -> Option<u64> {
    let val = lookup(name)?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        warn!(key = name, value = %val, "invalid u64 setting, ignoring");
    }
    result
}
