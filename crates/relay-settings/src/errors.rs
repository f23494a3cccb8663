//! Settings error types.

use relay_core::RelayError;
use thiserror::Error;

/// Errors that can occur when resolving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A required key is not set (or is empty).
    #[error("required setting `{0}` is not set")]
    Missing(String),
    /// A required key is set but could not be parsed or is out of range.
    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue {
        /// Environment key.
        key: String,
        /// Raw value found.
        value: String,
    },
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

impl From<SettingsError> for RelayError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Missing(key) => Self::ConfigMissing { key },
            SettingsError::InvalidValue { key, value } => Self::InvalidConfig { key, value },
        }
    }
}
