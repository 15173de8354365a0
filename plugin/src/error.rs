//! Error types for host-side plugin wiring.

use thiserror::Error;

/// Result type alias for plugin operations.
pub type Result<T> = std::result::Result<T, PluginError>;

/// Errors that can occur while loading settings for plugins.
#[derive(Error, Debug)]
pub enum PluginError {
    /// Reading or merging the configuration sources failed.
    #[error("settings error: {0}")]
    Settings(#[from] config::ConfigError),
}
