#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    /// A route template that cannot be expanded into routes.
    #[error("Route template '{suffix}': {reason}")]
    Template { suffix: String, reason: String },
}
