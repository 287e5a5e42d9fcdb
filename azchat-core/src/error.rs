use azchat_config::ConfigError;

/// Boxed error returned by [`Connector`](crate::Connector) implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the utilities can report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The assertion is not well-formed XML
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The assertion bytes are not UTF-8
    #[error("input is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A node the caller asked for is absent from the assertion
    #[error("{0} not found in assertion")]
    ClaimNotFound(String),

    /// A node path expression could not be parsed
    #[error("invalid node path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A connection string value cannot be represented safely
    #[error("invalid value for connection string key '{key}': {reason}")]
    InvalidConnectionValue { key: String, reason: &'static str },

    /// The configured driver does not match the connector in use
    #[error("database driver '{configured}' is not available (connector provides '{available}')")]
    DriverUnavailable {
        configured: String,
        available: String,
    },

    #[error("database connection failed: {0}")]
    Connect(#[source] BoxError),

    /// Digit extraction produced nothing parseable
    #[error("'{input}' does not contain a valid number: {source}")]
    NumberFormat {
        input: String,
        #[source]
        source: std::num::ParseIntError,
    },
}
