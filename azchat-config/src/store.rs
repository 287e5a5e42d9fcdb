//! Once-loaded property store
//!
//! A [`PropertyStore`] owns the list of property resources and reads them the
//! first time a value is requested. The loaded map is kept for the lifetime
//! of the store and never re-read, so changes to the files on disk are only
//! picked up by building a new store.

use std::borrow::Cow;
use std::fs;
use std::path::PathBuf;

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::{Config, ConfigError, Properties};

/// Application properties packaged with the crate.
pub const BUNDLED_PROPERTIES: &str = include_str!("../resources/azchat.properties");
/// Message texts packaged with the crate.
pub const BUNDLED_MESSAGES: &str = include_str!("../resources/messages.properties");

/// Where a property resource is read from.
#[derive(Debug, Clone)]
pub enum PropertySource {
    /// Resource compiled into the binary
    Embedded {
        name: &'static str,
        contents: &'static str,
    },
    /// Resource read from disk on first access
    File(PathBuf),
}

impl PropertySource {
    /// The packaged application properties.
    pub fn bundled_properties() -> Self {
        PropertySource::Embedded {
            name: "azchat.properties",
            contents: BUNDLED_PROPERTIES,
        }
    }

    /// The packaged message texts.
    pub fn bundled_messages() -> Self {
        PropertySource::Embedded {
            name: "messages.properties",
            contents: BUNDLED_MESSAGES,
        }
    }

    /// Name used in log lines and error messages.
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            PropertySource::Embedded { name, .. } => Cow::Borrowed(*name),
            PropertySource::File(path) => path.to_string_lossy(),
        }
    }

    fn read(&self) -> Result<Cow<'static, str>, ConfigError> {
        match self {
            PropertySource::Embedded { contents, .. } => Ok(Cow::Borrowed(*contents)),
            PropertySource::File(path) => fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                }),
        }
    }
}

/// Property map loaded on first access from an ordered list of resources.
///
/// Later resources override earlier ones on duplicate keys. Loading is
/// guarded by a one-time cell, so concurrent first callers block until the
/// map is complete and never see partial state. A failed load is not cached.
#[derive(Debug)]
pub struct PropertyStore {
    sources: Vec<PropertySource>,
    loaded: OnceCell<Properties>,
}

impl PropertyStore {
    /// Creates a store over the application properties and message resources.
    pub fn new(properties: PropertySource, messages: PropertySource) -> Self {
        Self::with_sources(vec![properties, messages])
    }

    /// Creates a store over an arbitrary ordered list of resources.
    pub fn with_sources(sources: Vec<PropertySource>) -> Self {
        Self {
            sources,
            loaded: OnceCell::new(),
        }
    }

    /// Store backed by the resources packaged with the crate.
    pub fn bundled() -> Self {
        Self::new(
            PropertySource::bundled_properties(),
            PropertySource::bundled_messages(),
        )
    }

    /// Store using the resource files named in `config`, falling back to the
    /// packaged resources for any that are not set.
    pub fn from_config(config: &Config) -> Self {
        let properties = config
            .resources
            .properties
            .clone()
            .map_or_else(PropertySource::bundled_properties, PropertySource::File);
        let messages = config
            .resources
            .messages
            .clone()
            .map_or_else(PropertySource::bundled_messages, PropertySource::File);
        Self::new(properties, messages)
    }

    /// Store that is already loaded with `properties`.
    ///
    /// # Examples
    ///
    /// ```
    /// use azchat_config::{Properties, PropertyStore};
    ///
    /// let store = PropertyStore::preloaded(Properties::from_pairs([("db.user", "u1")]));
    /// assert_eq!(store.get("db.user").unwrap(), Some("u1"));
    /// ```
    pub fn preloaded(properties: Properties) -> Self {
        Self {
            sources: Vec::new(),
            loaded: OnceCell::with_value(properties),
        }
    }

    /// Returns the loaded property map, reading the resources if needed.
    pub fn properties(&self) -> Result<&Properties, ConfigError> {
        self.loaded.get_or_try_init(|| self.load())
    }

    /// Looks up a property, loading the resources on first use.
    ///
    /// Returns `Ok(None)` when the key is not configured.
    pub fn get(&self, key: &str) -> Result<Option<&str>, ConfigError> {
        Ok(self.properties()?.get(key))
    }

    /// Looks up a property that must be configured.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)?
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    /// Whether the resources have been read.
    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    fn load(&self) -> Result<Properties, ConfigError> {
        let mut properties = Properties::new();
        for source in &self.sources {
            let contents = source.read()?;
            properties.load(&source.name(), &contents)?;
            debug!(source = %source.name(), "Loaded property resource");
        }
        info!(entries = properties.len(), "Properties loaded");
        Ok(properties)
    }
}
