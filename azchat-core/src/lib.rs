pub mod assertion;
mod claims;
pub mod connection;
pub mod convert;
mod error;
pub mod report;
mod selector;

pub use assertion::{AssertionPaths, Identity, extract_identity, name_id, user_attributes};
pub use claims::{Claim, ClaimMap};
pub use connection::{
    ConnectionStringBuilder, Connector, DatabaseSettings, build_connection_string, connect,
};
pub use error::{BoxError, Error, Result};
pub use report::{ErrorCode, ErrorList, Reportable, populate_errors};
pub use selector::{LocalNamePath, NodeSelector};
