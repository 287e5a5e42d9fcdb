//! Error reports handed to the response layer
//!
//! A report carries one error code and a list of messages. Every call to
//! [`populate_errors`] replaces whatever report the target held before.

use core::fmt;

use azchat_config::PropertyStore;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Error;

/// Stable codes for every [`Error`] variant.
///
/// Codes are SCREAMING_SNAKE_CASE and double as the suffix of the message
/// key looked up in the messages resource (`error.<CODE>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    XmlParse,
    InvalidEncoding,
    ClaimNotFound,
    InvalidPath,
    Configuration,
    InvalidConnectionValue,
    DriverUnavailable,
    ConnectionFailed,
    NumberFormat,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::XmlParse => "XML_PARSE",
            Self::InvalidEncoding => "INVALID_ENCODING",
            Self::ClaimNotFound => "CLAIM_NOT_FOUND",
            Self::InvalidPath => "INVALID_PATH",
            Self::Configuration => "CONFIGURATION",
            Self::InvalidConnectionValue => "INVALID_CONNECTION_VALUE",
            Self::DriverUnavailable => "DRIVER_UNAVAILABLE",
            Self::ConnectionFailed => "CONNECTION_FAILED",
            Self::NumberFormat => "NUMBER_FORMAT",
        }
    }

    /// Key of the client-facing message in the messages resource.
    pub fn message_key(self) -> String {
        format!("error.{}", self.as_str())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&Error> for ErrorCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Xml(_) => Self::XmlParse,
            Error::Utf8(_) => Self::InvalidEncoding,
            Error::ClaimNotFound(_) => Self::ClaimNotFound,
            Error::InvalidPath { .. } => Self::InvalidPath,
            Error::Config(_) => Self::Configuration,
            Error::InvalidConnectionValue { .. } => Self::InvalidConnectionValue,
            Error::DriverUnavailable { .. } => Self::DriverUnavailable,
            Error::Connect(_) => Self::ConnectionFailed,
            Error::NumberFormat { .. } => Self::NumberFormat,
        }
    }
}

/// A single reported message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub message: String,
}

/// An error code with its messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorList {
    pub code: String,
    pub errors: Vec<ErrorEntry>,
}

impl ErrorList {
    /// A list holding exactly one message.
    pub fn single(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            errors: vec![ErrorEntry {
                message: message.into(),
            }],
        }
    }
}

/// Response payloads that can carry an error report.
pub trait Reportable {
    fn set_error_list(&mut self, errors: ErrorList);

    fn error_list(&self) -> Option<&ErrorList>;
}

/// Minimal payload consisting only of an optional report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_list: Option<ErrorList>,
}

impl Reportable for ErrorResponse {
    fn set_error_list(&mut self, errors: ErrorList) {
        self.error_list = Some(errors);
    }

    fn error_list(&self) -> Option<&ErrorList> {
        self.error_list.as_ref()
    }
}

/// Attaches a fresh report with one `code` and one `message` to `bean`,
/// replacing any earlier report.
///
/// # Examples
///
/// ```
/// use azchat_core::report::{ErrorResponse, Reportable, populate_errors};
///
/// let mut response = ErrorResponse::default();
/// populate_errors(&mut response, "AUTH_FAILED", "Login failed");
///
/// let list = response.error_list().unwrap();
/// assert_eq!(list.code, "AUTH_FAILED");
/// assert_eq!(list.errors.len(), 1);
/// assert_eq!(list.errors[0].message, "Login failed");
/// ```
pub fn populate_errors<B>(bean: &mut B, code: impl Into<String>, message: impl Into<String>)
where
    B: Reportable + ?Sized,
{
    bean.set_error_list(ErrorList::single(code, message));
}

/// Reports `err` on `bean` using its [`ErrorCode`].
///
/// The message comes from `error.<CODE>` in `messages`; when that key is
/// unset, or the messages cannot be loaded, the error's own text is used.
pub fn populate_from_error<B>(bean: &mut B, err: &Error, messages: &PropertyStore)
where
    B: Reportable + ?Sized,
{
    let code = ErrorCode::from(err);
    let message = match messages.get(&code.message_key()) {
        Ok(Some(text)) => text.to_string(),
        Ok(None) => err.to_string(),
        Err(load_err) => {
            warn!(error = %load_err, "Messages unavailable, reporting raw error text");
            err.to_string()
        }
    };
    populate_errors(bean, code.as_str(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use azchat_config::{Properties, PropertySource};

    #[test]
    fn test_populate_replaces_previous_report() {
        let mut response = ErrorResponse::default();
        populate_errors(&mut response, "FIRST", "first message");
        populate_errors(&mut response, "SECOND", "second message");

        let list = response.error_list().unwrap();
        assert_eq!(list.code, "SECOND");
        assert_eq!(list.errors, vec![ErrorEntry { message: "second message".into() }]);
    }

    #[test]
    fn test_report_json_shape() {
        let mut response = ErrorResponse::default();
        populate_errors(&mut response, "CLAIM_NOT_FOUND", "missing");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "errorList": { "code": "CLAIM_NOT_FOUND", "errors": [{ "message": "missing" }] }
            })
        );

        let empty = serde_json::to_string(&ErrorResponse::default()).unwrap();
        assert_eq!(empty, "{}");
    }

    #[test]
    fn test_error_codes() {
        let err = Error::ClaimNotFound("name identifier".into());
        assert_eq!(ErrorCode::from(&err), ErrorCode::ClaimNotFound);
        assert_eq!(ErrorCode::ClaimNotFound.message_key(), "error.CLAIM_NOT_FOUND");

        let json = serde_json::to_string(&ErrorCode::InvalidConnectionValue).unwrap();
        assert_eq!(json, "\"INVALID_CONNECTION_VALUE\"");
    }

    #[test]
    fn test_populate_from_error_uses_messages() {
        let messages = PropertyStore::bundled();
        let mut response = ErrorResponse::default();
        populate_from_error(&mut response, &Error::ClaimNotFound("x".into()), &messages);

        let list = response.error_list().unwrap();
        assert_eq!(list.code, "CLAIM_NOT_FOUND");
        assert_eq!(
            list.errors[0].message,
            "The authentication token is missing a required claim."
        );
    }

    #[test]
    fn test_populate_from_error_falls_back_to_error_text() {
        let messages = PropertyStore::preloaded(Properties::new());
        let mut response = ErrorResponse::default();
        let err = crate::convert::numbers(Some("abc")).unwrap_err();
        populate_from_error(&mut response, &err, &messages);

        let list = response.error_list().unwrap();
        assert_eq!(list.code, "NUMBER_FORMAT");
        assert_eq!(list.errors[0].message, err.to_string());
    }

    #[test]
    fn test_populate_from_error_with_unloadable_messages() {
        let messages = PropertyStore::with_sources(vec![PropertySource::File(
            "/nonexistent/messages.properties".into(),
        )]);
        let mut response = ErrorResponse::default();
        let err = Error::ClaimNotFound("name identifier".into());
        populate_from_error(&mut response, &err, &messages);

        let list = response.error_list().unwrap();
        assert_eq!(list.errors[0].message, "name identifier not found in assertion");
    }
}
