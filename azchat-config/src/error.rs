use std::path::PathBuf;

/// Errors raised while loading configuration or property resources.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A property resource or config file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A property resource contains a malformed line
    #[error("{source_name}:{line}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        message: String,
    },

    /// The YAML bootstrap config is invalid
    #[error("invalid configuration: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// A required property is not configured
    #[error("required property '{0}' is not configured")]
    Missing(String),
}
