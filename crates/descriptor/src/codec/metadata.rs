//! `<metadata>` documents.
//!
//! ```xml
//! <metadata>
//!   <value schema="dc" element="title" qualifier="alternative" language="en">text</value>
//! </metadata>
//! ```

use super::xml::{XmlReader, XmlWriter};
use super::{Descriptor, DescriptorKind};
use crate::error::DescriptorError;
use crate::metadata::{MetadataDocument, Value};

pub(crate) mod wire {
    pub const ROOT: &str = "metadata";
    pub const VALUE: &str = "value";
    pub const SCHEMA: &str = "schema";
    pub const ELEMENT: &str = "element";
    pub const QUALIFIER: &str = "qualifier";
    pub const LANGUAGE: &str = "language";
}

const DOCUMENT: &str = "metadata";

impl Descriptor for MetadataDocument {
    const KIND: DescriptorKind = DescriptorKind::Metadata;

    fn to_xml(&self) -> Result<Vec<u8>, DescriptorError> {
        let mut w = XmlWriter::new()?;
        w.start(wire::ROOT, &[])?;
        for value in self {
            w.text(
                wire::VALUE,
                &[
                    (wire::SCHEMA, Some(value.schema())),
                    (wire::ELEMENT, Some(value.element())),
                    (wire::QUALIFIER, value.qualifier()),
                    (wire::LANGUAGE, value.language()),
                ],
                value.body(),
            )?;
        }
        w.end(wire::ROOT)?;
        Ok(w.finish())
    }

    fn from_xml(bytes: &[u8]) -> Result<Self, DescriptorError> {
        let mut r = XmlReader::new(bytes, DOCUMENT);
        let root = r.root(wire::ROOT)?;
        let mut values = Vec::new();

        if !root.empty {
            while let Some(mut el) = r.child(wire::ROOT)? {
                if el.name != wire::VALUE {
                    return Err(r.malformed(format!("unexpected <{}> in <metadata>", el.name)));
                }
                let schema = el.attrs.require(DOCUMENT, wire::SCHEMA)?;
                let element = el.attrs.require(DOCUMENT, wire::ELEMENT)?;
                let qualifier = el.attrs.take(wire::QUALIFIER);
                let language = el.attrs.take(wire::LANGUAGE);
                let body = r.body(&el)?;
                el.attrs.finish();

                let mut value = Value::new(schema, element, body);
                if let Some(q) = qualifier {
                    value = value.with_qualifier(q);
                }
                if let Some(l) = language {
                    value = value.with_language(l);
                }
                values.push(value);
            }
        }
        r.finish()?;

        Ok(MetadataDocument::new(values))
    }
}
