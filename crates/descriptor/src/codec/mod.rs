//! # Descriptor codec
//!
//! Every document kind implements [`Descriptor`], which pairs the in-memory
//! model with its canonical XML form.
//!
//! ## Placement rules
//!
//! - Identity and classification scalars are attributes on their element.
//! - The one free-text payload of an element (a metadata body, a password
//!   hash) is that element's text content.
//! - Absent optional fields are omitted, never written as empty attributes.
//! - Boolean flags are empty elements: present means `true`, absent `false`.
//! - Collections that need to be told apart (group members vs member groups)
//!   sit under their own wrapper element.
//!
//! The element and attribute names for each kind are listed in that kind's
//! `wire` table.

mod metadata;
mod policy;
mod roles;
pub(crate) mod xml;

use std::fmt;

use serde::Serialize;

use crate::error::DescriptorError;
use crate::metadata::MetadataDocument;
use crate::policy::PolicyDocument;
use crate::roles::RoleGraph;

/// The three descriptor kinds carried by a bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    Metadata,
    Policies,
    Roles,
}

impl DescriptorKind {
    pub const ALL: [DescriptorKind; 3] = [Self::Metadata, Self::Policies, Self::Roles];

    /// Root element of the serialized document.
    pub fn root_element(&self) -> &'static str {
        match self {
            Self::Metadata => metadata::wire::ROOT,
            Self::Policies => policy::wire::ROOT,
            Self::Roles => roles::wire::ROOT,
        }
    }

    /// Conventional file name inside a bag.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Metadata => "metadata.xml",
            Self::Policies => "policies.xml",
            Self::Roles => "roles.xml",
        }
    }

    pub fn from_root_element(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.root_element() == name)
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metadata => write!(f, "metadata"),
            Self::Policies => write!(f, "policies"),
            Self::Roles => write!(f, "roles"),
        }
    }
}

/// A document with a canonical serialized form.
pub trait Descriptor: Sized {
    const KIND: DescriptorKind;

    /// Serialize to canonical UTF-8 XML.
    fn to_xml(&self) -> Result<Vec<u8>, DescriptorError>;

    /// Parse canonical XML, rejecting malformed input.
    fn from_xml(bytes: &[u8]) -> Result<Self, DescriptorError>;
}

/// Any descriptor, decoded by looking at its root element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "document", rename_all = "snake_case")]
pub enum AnyDescriptor {
    Metadata(MetadataDocument),
    Policies(PolicyDocument),
    Roles(RoleGraph),
}

impl AnyDescriptor {
    pub fn decode(bytes: &[u8]) -> Result<Self, DescriptorError> {
        let root = xml::root_name(bytes)?;
        let kind = DescriptorKind::from_root_element(&root).ok_or_else(|| {
            DescriptorError::malformed("descriptor", format!("unknown root element <{}>", root))
        })?;
        tracing::debug!(kind = %kind, len = bytes.len(), "decoding descriptor");
        Ok(match kind {
            DescriptorKind::Metadata => Self::Metadata(MetadataDocument::from_xml(bytes)?),
            DescriptorKind::Policies => Self::Policies(PolicyDocument::from_xml(bytes)?),
            DescriptorKind::Roles => Self::Roles(RoleGraph::from_xml(bytes)?),
        })
    }

    pub fn kind(&self) -> DescriptorKind {
        match self {
            Self::Metadata(_) => DescriptorKind::Metadata,
            Self::Policies(_) => DescriptorKind::Policies,
            Self::Roles(_) => DescriptorKind::Roles,
        }
    }

    pub fn to_xml(&self) -> Result<Vec<u8>, DescriptorError> {
        match self {
            Self::Metadata(doc) => doc.to_xml(),
            Self::Policies(doc) => doc.to_xml(),
            Self::Roles(graph) => graph.to_xml(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Value;

    #[test]
    fn test_decode_dispatches_on_root() {
        let doc: MetadataDocument = [Value::new("dc", "title", "t")].into_iter().collect();
        let bytes = doc.to_xml().unwrap();
        let any = AnyDescriptor::decode(&bytes).unwrap();
        assert_eq!(any.kind(), DescriptorKind::Metadata);
        assert_eq!(any, AnyDescriptor::Metadata(doc));
    }

    #[test]
    fn test_decode_unknown_root() {
        let err = AnyDescriptor::decode(b"<mets/>").unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("<mets>"));
    }

    #[test]
    fn test_file_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            DescriptorKind::ALL.iter().map(|k| k.file_name()).collect();
        assert_eq!(names.len(), 3);
    }
}
