//! SAML assertion parsing and claim extraction
//!
//! Reads the name identifier and the user attribute claims from an
//! assertion issued by the identity provider. The assertion is only parsed,
//! never validated: signatures, conditions and replay are the caller's
//! concern.

use azchat_config::PropertyStore;
use roxmltree::{Document, Node};
use serde::Serialize;
use tracing::debug;

use crate::{Claim, ClaimMap, Error, LocalNamePath, NodeSelector, Result};

/// Attribute holding the claim URI on an `Attribute` element.
pub const NAME_ATTRIBUTE: &str = "Name";

/// Default location of the name identifier.
pub const DEFAULT_NAME_ID_PATH: &str = "//Subject/NameID";
/// Default location of the user attribute elements.
pub const DEFAULT_ATTRIBUTE_PATH: &str = "//AttributeStatement/Attribute";

/// Property overriding [`DEFAULT_NAME_ID_PATH`].
pub const NAME_ID_PATH_KEY: &str = "saml.path.nameid";
/// Property overriding [`DEFAULT_ATTRIBUTE_PATH`].
pub const ATTRIBUTE_PATH_KEY: &str = "saml.path.attribute";

/// Parses assertion text into a navigable document.
///
/// DTDs are rejected, so entity expansion cannot be triggered by the token.
///
/// # Examples
///
/// ```
/// use azchat_core::assertion::parse_document;
///
/// let doc = parse_document("<Assertion><Subject/></Assertion>").unwrap();
/// assert_eq!(doc.root_element().tag_name().name(), "Assertion");
/// assert!(parse_document("<Assertion>").is_err());
/// ```
pub fn parse_document(text: &str) -> Result<Document<'_>> {
    debug!(len = text.len(), "Parsing assertion document");
    Ok(Document::parse(text)?)
}

/// Parses raw assertion bytes, which must be UTF-8.
pub fn parse_document_bytes(bytes: &[u8]) -> Result<Document<'_>> {
    let text = std::str::from_utf8(bytes)?;
    parse_document(text)
}

/// Concatenated text of all descendant text nodes, untrimmed.
pub fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Returns the text of the first node matched by `selector`.
///
/// # Errors
///
/// Returns [`Error::ClaimNotFound`] when nothing matches.
pub fn name_id<S>(selector: &S, doc: &Document<'_>) -> Result<String>
where
    S: NodeSelector + ?Sized,
{
    let node = selector
        .select_first(doc)
        .ok_or_else(|| Error::ClaimNotFound("name identifier".to_string()))?;
    let value = text_content(node);
    debug!(len = value.len(), "Extracted name identifier");
    Ok(value)
}

/// Collects the recognized claims from the attribute nodes matched by `selector`.
///
/// Each node's `Name` attribute is resolved with [`Claim::from_attribute_name`].
/// The value is the text of the node's first child element (its
/// `AttributeValue`), or the node's own text when it has no child element.
/// Nodes without a name and unrecognized claims are skipped. When a claim
/// appears more than once the last occurrence wins.
pub fn user_attributes<S>(selector: &S, doc: &Document<'_>) -> ClaimMap
where
    S: NodeSelector + ?Sized,
{
    let mut claims = ClaimMap::new();

    for attribute in selector.select(doc) {
        let Some(attribute_name) = attribute.attribute(NAME_ATTRIBUTE) else {
            debug!("Skipping attribute without a name");
            continue;
        };
        let Some(claim) = Claim::from_attribute_name(attribute_name) else {
            debug!(attribute = attribute_name, "Skipping unrecognized claim");
            continue;
        };

        let value = attribute
            .first_element_child()
            .map_or_else(|| text_content(attribute), text_content);
        claims.insert(claim, value);
    }

    debug!(count = claims.len(), "Extracted user attribute claims");
    claims
}

/// Where to find the identity elements in an assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionPaths {
    pub name_id: LocalNamePath,
    pub attribute: LocalNamePath,
}

impl Default for AssertionPaths {
    fn default() -> Self {
        Self {
            name_id: LocalNamePath::descendant(&["Subject", "NameID"]),
            attribute: LocalNamePath::descendant(&["AttributeStatement", "Attribute"]),
        }
    }
}

impl AssertionPaths {
    /// Reads the paths from `saml.path.nameid` and `saml.path.attribute`,
    /// keeping the defaults for unset or empty keys.
    pub fn from_properties(store: &PropertyStore) -> Result<Self> {
        let mut paths = Self::default();
        if let Some(expr) = store.get(NAME_ID_PATH_KEY)?.filter(|v| !v.trim().is_empty()) {
            paths.name_id = LocalNamePath::parse(expr)?;
        }
        if let Some(expr) = store.get(ATTRIBUTE_PATH_KEY)?.filter(|v| !v.trim().is_empty()) {
            paths.attribute = LocalNamePath::parse(expr)?;
        }
        Ok(paths)
    }
}

/// The identity asserted by one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub name_id: String,
    pub claims: ClaimMap,
}

/// Parses `text` once and extracts the name identifier and claims.
///
/// # Examples
///
/// ```
/// use azchat_core::{AssertionPaths, Claim, extract_identity};
///
/// let xml = r#"<Assertion>
///   <Subject><NameID>user-42</NameID></Subject>
///   <AttributeStatement>
///     <Attribute Name="http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name">
///       <AttributeValue>Ada</AttributeValue>
///     </Attribute>
///   </AttributeStatement>
/// </Assertion>"#;
///
/// let identity = extract_identity(xml, &AssertionPaths::default()).unwrap();
/// assert_eq!(identity.name_id, "user-42");
/// assert_eq!(identity.claims[&Claim::Name], "Ada");
/// ```
pub fn extract_identity(text: &str, paths: &AssertionPaths) -> Result<Identity> {
    let doc = parse_document(text)?;
    Ok(Identity {
        name_id: name_id(&paths.name_id, &doc)?,
        claims: user_attributes(&paths.attribute, &doc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use azchat_config::Properties;

    const TOKEN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_a1" Version="2.0">
  <saml:Issuer>https://azchat.accesscontrol.windows.net/</saml:Issuer>
  <saml:Subject>
    <saml:NameID>Aq3gYtVmSU2bW3kq</saml:NameID>
  </saml:Subject>
  <saml:AttributeStatement>
    <saml:Attribute Name="http://schemas.microsoft.com/accesscontrolservice/2010/07/claims/identityprovider">
      <saml:AttributeValue>Google</saml:AttributeValue>
    </saml:Attribute>
    <saml:Attribute Name="http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress">
      <saml:AttributeValue>ada@example.com</saml:AttributeValue>
    </saml:Attribute>
    <saml:Attribute Name="http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name">
      <saml:AttributeValue>Ada Lovelace</saml:AttributeValue>
    </saml:Attribute>
    <saml:Attribute Name="http://schemas.microsoft.com/ws/2008/06/identity/claims/role">
      <saml:AttributeValue>admin</saml:AttributeValue>
    </saml:Attribute>
  </saml:AttributeStatement>
</saml:Assertion>"#;

    #[test]
    fn test_name_id_extraction() {
        let doc = parse_document(TOKEN).unwrap();
        let paths = AssertionPaths::default();
        assert_eq!(name_id(&paths.name_id, &doc).unwrap(), "Aq3gYtVmSU2bW3kq");
    }

    #[test]
    fn test_name_id_missing() {
        let doc = parse_document("<Assertion><Subject/></Assertion>").unwrap();
        let paths = AssertionPaths::default();
        assert!(matches!(
            name_id(&paths.name_id, &doc),
            Err(Error::ClaimNotFound(_))
        ));
    }

    #[test]
    fn test_name_id_text_not_trimmed() {
        let doc = parse_document("<A><Subject><NameID> spaced <![CDATA[x]]></NameID></Subject></A>")
            .unwrap();
        let paths = AssertionPaths::default();
        assert_eq!(name_id(&paths.name_id, &doc).unwrap(), " spaced x");
    }

    #[test]
    fn test_user_attributes() {
        let doc = parse_document(TOKEN).unwrap();
        let claims = user_attributes(&AssertionPaths::default().attribute, &doc);

        assert_eq!(claims.len(), 3);
        assert_eq!(claims[&Claim::IdentityProvider], "Google");
        assert_eq!(claims[&Claim::EmailAddress], "ada@example.com");
        assert_eq!(claims[&Claim::Name], "Ada Lovelace");
    }

    #[test]
    fn test_attribute_without_value_element() {
        let xml = r#"<A><AttributeStatement>
  <Attribute Name="claims/name">Inline</Attribute>
  <Attribute Name="claims/emailaddress"/>
  <Attribute>nameless</Attribute>
</AttributeStatement></A>"#;
        let doc = parse_document(xml).unwrap();
        let claims = user_attributes(&AssertionPaths::default().attribute, &doc);

        assert_eq!(claims.len(), 2);
        assert_eq!(claims[&Claim::Name], "Inline");
        assert_eq!(claims[&Claim::EmailAddress], "");
    }

    #[test]
    fn test_duplicate_claim_last_wins() {
        let xml = r#"<A><AttributeStatement>
  <Attribute Name="x/name"><AttributeValue>first</AttributeValue></Attribute>
  <Attribute Name="x/NAME"><AttributeValue>second</AttributeValue></Attribute>
</AttributeStatement></A>"#;
        let doc = parse_document(xml).unwrap();
        let claims = user_attributes(&AssertionPaths::default().attribute, &doc);
        assert_eq!(claims[&Claim::Name], "second");
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(parse_document("<open>"), Err(Error::Xml(_))));
        assert!(matches!(parse_document("not xml"), Err(Error::Xml(_))));
    }

    #[test]
    fn test_dtd_rejected() {
        let xml = r#"<!DOCTYPE a [<!ENTITY e "boom">]><a>&e;</a>"#;
        assert!(matches!(parse_document(xml), Err(Error::Xml(_))));
    }

    #[test]
    fn test_invalid_utf8() {
        let bytes = b"<a>\xff\xfe</a>";
        assert!(matches!(parse_document_bytes(bytes), Err(Error::Utf8(_))));
    }

    #[test]
    fn test_extract_identity() {
        let identity = extract_identity(TOKEN, &AssertionPaths::default()).unwrap();
        assert_eq!(identity.name_id, "Aq3gYtVmSU2bW3kq");
        assert_eq!(identity.claims.len(), 3);

        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["nameId"], "Aq3gYtVmSU2bW3kq");
        assert_eq!(json["claims"]["identityprovider"], "Google");
    }

    #[test]
    fn test_paths_from_properties() {
        let store = PropertyStore::preloaded(Properties::from_pairs([
            (NAME_ID_PATH_KEY, "//Subject/NameIdentifier"),
            (ATTRIBUTE_PATH_KEY, "  "),
        ]));
        let paths = AssertionPaths::from_properties(&store).unwrap();
        assert_eq!(paths.name_id.as_str(), "//Subject/NameIdentifier");
        assert_eq!(paths.attribute.as_str(), DEFAULT_ATTRIBUTE_PATH);
    }

    #[test]
    fn test_paths_from_properties_invalid() {
        let store = PropertyStore::preloaded(Properties::from_pairs([(NAME_ID_PATH_KEY, "//a[1]")]));
        assert!(matches!(
            AssertionPaths::from_properties(&store),
            Err(Error::InvalidPath { .. })
        ));
    }
}
