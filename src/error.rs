//! Error types for recgate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecError>;

#[derive(Debug, Error)]
pub enum RecError {
    /// A live settings read failed or produced an unusable value.
    #[error("configuration unavailable: {0}")]
    ConfigurationUnavailable(String),

    /// A persisted key/value write was rejected by the backing store.
    #[error("persisted write failed for {key}: {reason}")]
    PersistedWrite { key: String, reason: String },

    /// An external collaborator (fetcher, UI surface) failed.
    #[error("collaborator failure: {0}")]
    Collaborator(String),

    #[error("telemetry sink failure: {0}")]
    Telemetry(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("missing config: {0}")]
    MissingConfig(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("replay script error: {0}")]
    Replay(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl RecError {
    /// Stable machine-readable code used in robot output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ConfigurationUnavailable(_) => "configuration_unavailable",
            Self::PersistedWrite { .. } => "persisted_write",
            Self::Collaborator(_) => "collaborator",
            Self::Telemetry(_) => "telemetry",
            Self::Config(_) => "config",
            Self::MissingConfig(_) => "missing_config",
            Self::Serialization(_) => "serialization",
            Self::Replay(_) => "replay",
            Self::Io(_) => "io",
            Self::Sqlite(_) => "sqlite",
        }
    }
}
