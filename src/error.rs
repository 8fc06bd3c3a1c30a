use thiserror::Error;

/// Failure reported by a windowing widget when a command cannot be applied.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("widget is no longer available")]
    Unavailable,

    #[error("widget command `{command}` failed: {message}")]
    Command {
        command: &'static str,
        message: String,
    },
}

impl WidgetError {
    pub fn command(command: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Command {
            command,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no tokio runtime available to drive the panel registry")]
    NoRuntime,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
