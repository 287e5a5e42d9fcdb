use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

mod error;
pub mod properties;
mod store;

pub use error::ConfigError;
pub use properties::Properties;
pub use store::{BUNDLED_MESSAGES, BUNDLED_PROPERTIES, PropertySource, PropertyStore};

/// AZChat bootstrap configuration loaded from YAML.
///
/// This names the property resources to load and how the command line tool
/// sets up logging. Every section is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Property resource locations (defaults to the packaged resources)
    #[serde(default)]
    pub resources: Resources,
    /// Log output settings
    #[serde(default)]
    pub logging: Logging,
}

/// Locations of the two property resources.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct Resources {
    /// Application properties file (database settings, assertion paths)
    #[serde(default)]
    pub properties: Option<PathBuf>,
    /// Message texts file (error messages keyed by error code)
    #[serde(default)]
    pub messages: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Logging {
    /// Default filter directive when `RUST_LOG` is not set (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human readable output (default: false)
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    ///
    /// Relative resource paths are resolved against the directory that
    /// contains the configuration file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use azchat_config::Config;
    /// use std::path::Path;
    ///
    /// let config = Config::from_file(Path::new("config.yaml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&contents)?;
        if let Some(base) = path.parent() {
            config.resources.resolve_against(base);
        }
        Ok(config)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Examples
    ///
    /// ```
    /// use azchat_config::Config;
    ///
    /// let yaml = r#"
    /// resources:
    ///   properties: "/etc/azchat/azchat.properties"
    /// logging:
    ///   level: debug
    /// "#;
    ///
    /// let config = Config::parse(yaml).unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// assert!(config.resources.messages.is_none());
    /// ```
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config = serde_yaml_ng::from_str(contents)?;
        Ok(config)
    }
}

impl Resources {
    fn resolve_against(&mut self, base: &Path) {
        for path in [&mut self.properties, &mut self.messages].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
