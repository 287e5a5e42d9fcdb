//! Database connection strings and the connector seam
//!
//! Settings are read from the property store and rendered as a
//! semicolon-delimited SQL Server connection string:
//!
//! ```text
//! <url>;database=<db>;user=<u>;password=<p>;encrypt=<flag>;hostNameInCertificate=<host>;loginTimeout=<secs>;
//! ```

use std::fmt;

use azchat_config::PropertyStore;
use tracing::{debug, info};

use crate::convert::is_empty_or_null;
use crate::{BoxError, Error, Result};

pub const DB_DRIVER: &str = "db.driver";
pub const DB_URL: &str = "db.url";
pub const DB_DATABASE: &str = "db.database";
pub const DB_USER: &str = "db.user";
pub const DB_PASSWORD: &str = "db.password";
pub const DB_ENCRYPT: &str = "db.encrypt";
pub const DB_HOST_NAME_IN_CERTIFICATE: &str = "db.hostNameInCertificate";
pub const DB_LOGIN_TIMEOUT: &str = "db.loginTimeout";

/// Login timeout in seconds used when `db.loginTimeout` is unset or empty.
pub const DEFAULT_LOGIN_TIMEOUT: &str = "30";

const SEPARATOR: char = ';';

/// Database settings read from the property store.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub url: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub encrypt: String,
    pub host_name_in_certificate: String,
    pub login_timeout: String,
}

impl DatabaseSettings {
    /// Reads the `db.*` properties.
    ///
    /// # Errors
    ///
    /// Every key except `db.loginTimeout` is required; a missing key is
    /// reported as [`Error::Config`].
    pub fn from_store(store: &PropertyStore) -> Result<Self> {
        let login_timeout = store
            .get(DB_LOGIN_TIMEOUT)?
            .filter(|value| !is_empty_or_null(Some(*value)))
            .unwrap_or(DEFAULT_LOGIN_TIMEOUT);

        Ok(Self {
            url: store.require(DB_URL)?.to_string(),
            database: store.require(DB_DATABASE)?.to_string(),
            user: store.require(DB_USER)?.to_string(),
            password: store.require(DB_PASSWORD)?.to_string(),
            encrypt: store.require(DB_ENCRYPT)?.to_string(),
            host_name_in_certificate: store.require(DB_HOST_NAME_IN_CERTIFICATE)?.to_string(),
            login_timeout: login_timeout.to_string(),
        })
    }

    /// Renders the settings as a connection string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConnectionValue`] when the url contains `;`.
    pub fn connection_string(&self) -> Result<String> {
        Ok(ConnectionStringBuilder::new(&self.url)?
            .push("database", &self.database)
            .push("user", &self.user)
            .push("password", &self.password)
            .push("encrypt", &self.encrypt)
            .push("hostNameInCertificate", &self.host_name_in_certificate)
            .push("loginTimeout", &self.login_timeout)
            .build())
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("encrypt", &self.encrypt)
            .field("host_name_in_certificate", &self.host_name_in_certificate)
            .field("login_timeout", &self.login_timeout)
            .finish()
    }
}

/// Builds `url;key=value;key=value;` strings.
///
/// Values containing `;`, `{` or `}`, or with leading or trailing whitespace,
/// are wrapped in braces with any `}` doubled, which is how SQL Server
/// drivers read a literal value. Other values are written as they are.
///
/// # Examples
///
/// ```
/// use azchat_core::ConnectionStringBuilder;
///
/// let s = ConnectionStringBuilder::new("jdbc:sqlserver://db:1433")
///     .unwrap()
///     .push("user", "chat")
///     .push("password", "p;ss}")
///     .build();
/// assert_eq!(s, "jdbc:sqlserver://db:1433;user=chat;password={p;ss}}};");
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionStringBuilder {
    buf: String,
}

impl ConnectionStringBuilder {
    /// Starts a connection string with the server url.
    ///
    /// The url is the only unkeyed segment and cannot be brace-quoted, so a
    /// `;` in it is rejected.
    pub fn new(url: &str) -> Result<Self> {
        if url.contains(SEPARATOR) {
            return Err(Error::InvalidConnectionValue {
                key: "url".to_string(),
                reason: "url must not contain ';'",
            });
        }
        let mut buf = String::with_capacity(url.len() + 128);
        buf.push_str(url);
        buf.push(SEPARATOR);
        Ok(Self { buf })
    }

    /// Appends `key=value;`.
    pub fn push(mut self, key: &str, value: &str) -> Self {
        debug_assert!(
            !key.contains([SEPARATOR, '=']),
            "connection string keys are literals"
        );
        self.buf.push_str(key);
        self.buf.push('=');
        if needs_quoting(value) {
            self.buf.push('{');
            self.buf.push_str(&value.replace('}', "}}"));
            self.buf.push('}');
        } else {
            self.buf.push_str(value);
        }
        self.buf.push(SEPARATOR);
        self
    }

    pub fn build(self) -> String {
        self.buf
    }
}

fn needs_quoting(value: &str) -> bool {
    value.contains([SEPARATOR, '{', '}']) || value.trim() != value
}

/// Builds the connection string from the `db.*` properties.
///
/// # Examples
///
/// ```
/// use azchat_config::{Properties, PropertyStore};
/// use azchat_core::build_connection_string;
///
/// let store = PropertyStore::preloaded(Properties::from_pairs([
///     ("db.url", "host1"),
///     ("db.database", "db1"),
///     ("db.user", "u1"),
///     ("db.password", "p1"),
///     ("db.encrypt", "true"),
///     ("db.hostNameInCertificate", "h1"),
/// ]));
/// assert_eq!(
///     build_connection_string(&store).unwrap(),
///     "host1;database=db1;user=u1;password=p1;encrypt=true;hostNameInCertificate=h1;loginTimeout=30;"
/// );
/// ```
pub fn build_connection_string(store: &PropertyStore) -> Result<String> {
    let settings = DatabaseSettings::from_store(store)?;
    debug!(settings = ?settings, "Building connection string");
    settings.connection_string()
}

/// Opens database connections for a specific driver.
///
/// Implemented by the data access layer; this crate never holds on to the
/// connections it opens.
pub trait Connector {
    type Connection;

    /// Driver identifier, compared against `db.driver`.
    fn driver(&self) -> &str;

    fn connect(&self, connection_string: &str) -> std::result::Result<Self::Connection, BoxError>;
}

/// Opens a new connection using the configured settings.
///
/// Every call builds a fresh connection string and returns a connection owned
/// by the caller. There is no pooling and no retry.
///
/// # Errors
///
/// - [`Error::Config`] when `db.driver` or a connection setting is missing
/// - [`Error::DriverUnavailable`] when `db.driver` does not match the connector
/// - [`Error::Connect`] when the connector fails
pub fn connect<C: Connector>(store: &PropertyStore, connector: &C) -> Result<C::Connection> {
    let configured = store.require(DB_DRIVER)?;
    if configured != connector.driver() {
        return Err(Error::DriverUnavailable {
            configured: configured.to_string(),
            available: connector.driver().to_string(),
        });
    }

    let connection_string = build_connection_string(store)?;
    info!(driver = configured, "Opening database connection");
    connector.connect(&connection_string).map_err(Error::Connect)
}
