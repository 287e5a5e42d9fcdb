//! Node selection over parsed assertions
//!
//! Extraction functions take any [`NodeSelector`], so callers can plug in their
//! own lookup logic. [`LocalNamePath`] covers the common case: an XPath-like
//! chain of element names matched by local name, ignoring namespaces.

use std::fmt;

use roxmltree::{Document, Node};

use crate::{Error, Result};

/// Finds nodes in a parsed document.
pub trait NodeSelector {
    /// Returns all matching nodes in document order.
    fn select<'a, 'input>(&self, doc: &'a Document<'input>) -> Vec<Node<'a, 'input>>;

    /// Returns the first matching node in document order.
    fn select_first<'a, 'input>(&self, doc: &'a Document<'input>) -> Option<Node<'a, 'input>> {
        self.select(doc).into_iter().next()
    }
}

/// An element path such as `//Subject/NameID`, matched by local name.
///
/// Supported forms:
/// - `//A/B` - any `B` element whose parent is an `A` element
/// - `A/B` - same as `//A/B`
/// - `/A/B` - `B` directly under the root element `A`
///
/// Namespace prefixes in the expression (`saml:NameID`) are accepted and
/// ignored. Wildcards, predicates and axes are not supported.
///
/// # Examples
///
/// ```
/// use azchat_core::{LocalNamePath, NodeSelector};
///
/// let xml = r#"<a:Root xmlns:a="urn:x"><a:Item>1</a:Item><a:Item>2</a:Item></a:Root>"#;
/// let doc = roxmltree::Document::parse(xml).unwrap();
/// let path = LocalNamePath::parse("//Root/Item").unwrap();
/// assert_eq!(path.select(&doc).len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNamePath {
    expression: String,
    segments: Vec<String>,
    anchored: bool,
}

impl LocalNamePath {
    /// Parses a path expression.
    pub fn parse(expression: &str) -> Result<Self> {
        let trimmed = expression.trim();
        let invalid = |reason| Error::InvalidPath {
            path: expression.to_string(),
            reason,
        };

        let (anchored, body) = if let Some(rest) = trimmed.strip_prefix("//") {
            (false, rest)
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            (true, rest)
        } else {
            (false, trimmed)
        };

        if body.is_empty() {
            return Err(invalid("empty path"));
        }

        let mut segments = Vec::new();
        for segment in body.split('/') {
            if segment.is_empty() {
                return Err(invalid("empty path segment"));
            }
            if segment.contains(['*', '[', ']', '(', ')', '@', '.', ' ']) {
                return Err(invalid("only element names are supported"));
            }
            let local = segment.rsplit_once(':').map_or(segment, |(_, name)| name);
            if local.is_empty() {
                return Err(invalid("empty element name"));
            }
            segments.push(local.to_string());
        }

        Ok(Self {
            expression: trimmed.to_string(),
            segments,
            anchored,
        })
    }

    /// Builds `//a/b/...` from element names known to be valid.
    pub(crate) fn descendant(names: &[&str]) -> Self {
        Self {
            expression: format!("//{}", names.join("/")),
            segments: names.iter().map(|name| name.to_string()).collect(),
            anchored: false,
        }
    }

    /// The expression this path was parsed from.
    pub fn as_str(&self) -> &str {
        &self.expression
    }

    fn matches(&self, node: Node<'_, '_>) -> bool {
        let mut current = Some(node);
        for segment in self.segments.iter().rev() {
            match current {
                Some(n) if n.is_element() && n.tag_name().name() == segment.as_str() => {
                    current = n.parent();
                }
                _ => return false,
            }
        }
        !self.anchored || current.is_some_and(|parent| parent.is_root())
    }
}

impl NodeSelector for LocalNamePath {
    fn select<'a, 'input>(&self, doc: &'a Document<'input>) -> Vec<Node<'a, 'input>> {
        doc.descendants()
            .filter(|n| n.is_element() && self.matches(*n))
            .collect()
    }
}

impl fmt::Display for LocalNamePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl std::str::FromStr for LocalNamePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
