//! Identity claims carried in an assertion

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The identity claims the chat backend reads from an assertion.
///
/// Claims are identified by the last `/`-separated segment of the attribute
/// name, compared case-insensitively, so both
/// `http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress` and a
/// bare `EmailAddress` resolve to [`Claim::EmailAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Claim {
    /// Identity provider that authenticated the user
    IdentityProvider,
    /// User email address
    EmailAddress,
    /// User display name
    Name,
}

/// Claims extracted from one assertion. Rebuilt on every extraction.
pub type ClaimMap = BTreeMap<Claim, String>;

impl Claim {
    pub const ALL: [Claim; 3] = [Claim::IdentityProvider, Claim::EmailAddress, Claim::Name];

    /// The claim identifier as it appears at the end of an attribute name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Claim::IdentityProvider => "identityprovider",
            Claim::EmailAddress => "emailaddress",
            Claim::Name => "name",
        }
    }

    /// Resolves a full attribute name to a recognized claim.
    ///
    /// # Examples
    ///
    /// ```
    /// use azchat_core::Claim;
    ///
    /// let name = "http://schemas.microsoft.com/accesscontrolservice/2010/07/claims/IdentityProvider";
    /// assert_eq!(Claim::from_attribute_name(name), Some(Claim::IdentityProvider));
    /// assert_eq!(Claim::from_attribute_name("urn:example/role"), None);
    /// ```
    pub fn from_attribute_name(attribute_name: &str) -> Option<Claim> {
        let suffix = attribute_name
            .rsplit_once('/')
            .map_or(attribute_name, |(_, last)| last);
        Claim::ALL
            .into_iter()
            .find(|claim| claim.as_str().eq_ignore_ascii_case(suffix))
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
