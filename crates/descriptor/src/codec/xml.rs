//! Thin reader/writer layer over `quick-xml`.
//!
//! The writer enforces the placement rules shared by every document kind:
//! absent optional attributes are never written, and an empty body is written
//! as a self-closing element. The reader yields only structural events and
//! reports anything else as a malformed document.

use std::collections::BTreeMap;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::DescriptorError;

/// Attribute list for one element; `None` values are skipped.
pub(crate) type AttrList<'a> = [(&'static str, Option<&'a str>)];

pub(crate) struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, DescriptorError> {
        let mut writer = Self {
            inner: Writer::new_with_indent(Vec::new(), b' ', 2),
        };
        writer.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(writer)
    }

    fn emit(&mut self, event: Event<'_>) -> Result<(), DescriptorError> {
        self.inner
            .write_event(event)
            .map_err(|e| DescriptorError::Xml(e.to_string()))
    }

    fn element<'a>(name: &'a str, attrs: &AttrList<'a>) -> BytesStart<'a> {
        let mut start = BytesStart::new(name);
        for (key, value) in attrs {
            if let Some(value) = value {
                start.push_attribute((*key, *value));
            }
        }
        start
    }

    pub fn start(&mut self, name: &str, attrs: &AttrList<'_>) -> Result<(), DescriptorError> {
        self.emit(Event::Start(Self::element(name, attrs)))
    }

    pub fn end(&mut self, name: &str) -> Result<(), DescriptorError> {
        self.emit(Event::End(BytesEnd::new(name)))
    }

    pub fn empty(&mut self, name: &str, attrs: &AttrList<'_>) -> Result<(), DescriptorError> {
        self.emit(Event::Empty(Self::element(name, attrs)))
    }

    /// Element whose text content is `body`.
    pub fn text(
        &mut self,
        name: &str,
        attrs: &AttrList<'_>,
        body: &str,
    ) -> Result<(), DescriptorError> {
        if body.is_empty() {
            return self.empty(name, attrs);
        }
        self.emit(Event::Start(Self::element(name, attrs)))?;
        self.emit(Event::Text(BytesText::new(body)))?;
        self.emit(Event::End(BytesEnd::new(name)))
    }

    /// Start a wrapper element only when it will hold children.
    pub fn wrapped<T>(
        &mut self,
        name: &str,
        items: &[T],
        mut each: impl FnMut(&mut Self, &T) -> Result<(), DescriptorError>,
    ) -> Result<(), DescriptorError> {
        if items.is_empty() {
            return Ok(());
        }
        self.start(name, &[])?;
        for item in items {
            each(self, item)?;
        }
        self.end(name)
    }

    pub fn finish(self) -> Vec<u8> {
        let mut bytes = self.inner.into_inner();
        bytes.push(b'\n');
        bytes
    }
}

/// Attributes of one element, consumed by name.
#[derive(Debug)]
pub(crate) struct Attrs {
    element: String,
    values: BTreeMap<String, String>,
}

impl Attrs {
    pub fn take(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn require(&mut self, document: &'static str, key: &str) -> Result<String, DescriptorError> {
        self.take(key).ok_or_else(|| {
            DescriptorError::malformed(
                document,
                format!("<{}> is missing required attribute '{}'", self.element, key),
            )
        })
    }

    /// Drop unconsumed attributes; unknown names are tolerated.
    pub fn finish(self) {
        for key in self.values.keys() {
            tracing::debug!(element = %self.element, attribute = %key, "ignoring unknown attribute");
        }
    }
}

/// A structural element as seen by the reader.
#[derive(Debug)]
pub(crate) struct Element {
    pub name: String,
    pub attrs: Attrs,
    /// True for `<name/>`; such an element has no children and no end tag.
    pub empty: bool,
}

#[derive(Debug)]
pub(crate) enum Node {
    Open(Element),
    Close(String),
    Eof,
}

pub(crate) struct XmlReader<'a> {
    inner: Reader<&'a [u8]>,
    document: &'static str,
}

impl<'a> XmlReader<'a> {
    pub fn new(bytes: &'a [u8], document: &'static str) -> Self {
        let mut inner = Reader::from_reader(bytes);
        inner.config_mut().trim_text(false);
        Self { inner, document }
    }

    pub fn malformed(&self, reason: impl Into<String>) -> DescriptorError {
        DescriptorError::malformed(self.document, reason)
    }

    fn xml_error(&self, err: impl std::fmt::Display) -> DescriptorError {
        DescriptorError::Xml(format!("at byte {}: {}", self.inner.buffer_position(), err))
    }

    fn element(&self, start: &BytesStart<'_>, empty: bool) -> Result<Element, DescriptorError> {
        let name = decode_name(start.name().as_ref()).map_err(|e| self.xml_error(e))?;
        let mut values = BTreeMap::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.xml_error(e))?;
            let key = decode_name(attr.key.as_ref()).map_err(|e| self.xml_error(e))?;
            let value = attr.unescape_value().map_err(|e| self.xml_error(e))?;
            values.insert(key, value.into_owned());
        }
        Ok(Element {
            attrs: Attrs {
                element: name.clone(),
                values,
            },
            name,
            empty,
        })
    }

    /// Next structural node, skipping declarations, comments and
    /// whitespace between elements.
    pub fn next(&mut self) -> Result<Node, DescriptorError> {
        loop {
            let event = self.inner.read_event().map_err(|e| self.xml_error(e))?;
            match event {
                Event::Start(start) => return Ok(Node::Open(self.element(&start, false)?)),
                Event::Empty(start) => return Ok(Node::Open(self.element(&start, true)?)),
                Event::End(end) => {
                    let name = decode_name(end.name().as_ref()).map_err(|e| self.xml_error(e))?;
                    return Ok(Node::Close(name));
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| self.xml_error(e))?;
                    if !text.trim().is_empty() {
                        return Err(self.malformed(format!("unexpected text '{}'", text.trim())));
                    }
                }
                Event::CData(_) => return Err(self.malformed("unexpected CDATA section")),
                Event::Eof => return Ok(Node::Eof),
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            }
        }
    }

    /// Open the document's root element, which must be `root`.
    pub fn root(&mut self, root: &str) -> Result<Element, DescriptorError> {
        match self.next()? {
            Node::Open(element) if element.name == root => Ok(element),
            Node::Open(element) => Err(self.malformed(format!(
                "expected root <{}>, found <{}>",
                root, element.name
            ))),
            Node::Close(name) => Err(self.malformed(format!("unexpected </{}>", name))),
            Node::Eof => Err(self.malformed("empty document")),
        }
    }

    /// Read the children of an open element, stopping at its end tag.
    ///
    /// Returns `None` once the parent closes.
    pub fn child(&mut self, parent: &str) -> Result<Option<Element>, DescriptorError> {
        match self.next()? {
            Node::Open(element) => Ok(Some(element)),
            Node::Close(name) if name == parent => Ok(None),
            Node::Close(name) => Err(self.malformed(format!("unexpected </{}>", name))),
            Node::Eof => Err(self.malformed(format!("unterminated <{}>", parent))),
        }
    }

    /// Text content of `element`, exactly as written.
    pub fn body(&mut self, element: &Element) -> Result<String, DescriptorError> {
        if element.empty {
            return Ok(String::new());
        }
        let mut body = String::new();
        loop {
            let event = self.inner.read_event().map_err(|e| self.xml_error(e))?;
            match event {
                Event::Text(text) => {
                    body.push_str(&text.unescape().map_err(|e| self.xml_error(e))?)
                }
                Event::CData(data) => {
                    let data = std::str::from_utf8(&data).map_err(|e| self.xml_error(e))?;
                    body.push_str(data);
                }
                Event::End(_) => return Ok(body),
                Event::Comment(_) | Event::PI(_) => {}
                Event::Start(_) | Event::Empty(_) => {
                    return Err(self.malformed(format!(
                        "<{}> must contain text only",
                        element.name
                    )))
                }
                Event::Eof => {
                    return Err(self.malformed(format!("unterminated <{}>", element.name)))
                }
                Event::Decl(_) | Event::DocType(_) => {
                    return Err(self.malformed("declaration inside element"))
                }
            }
        }
    }

    /// Require that `element` has no children.
    pub fn leaf(&mut self, element: &Element) -> Result<(), DescriptorError> {
        if element.empty {
            return Ok(());
        }
        match self.next()? {
            Node::Close(name) if name == element.name => Ok(()),
            Node::Open(child) => Err(self.malformed(format!(
                "<{}> does not allow child <{}>",
                element.name, child.name
            ))),
            Node::Close(name) => Err(self.malformed(format!("unexpected </{}>", name))),
            Node::Eof => Err(self.malformed(format!("unterminated <{}>", element.name))),
        }
    }

    /// Require end of input after the root element closes.
    pub fn finish(&mut self) -> Result<(), DescriptorError> {
        match self.next()? {
            Node::Eof => Ok(()),
            Node::Open(element) => Err(self.malformed(format!(
                "content after root element: <{}>",
                element.name
            ))),
            Node::Close(name) => Err(self.malformed(format!("unexpected </{}>", name))),
        }
    }
}

fn decode_name(bytes: &[u8]) -> Result<String, std::str::Utf8Error> {
    std::str::from_utf8(bytes).map(str::to_owned)
}

/// Reads only the name of the first element in `bytes`.
pub(crate) fn root_name(bytes: &[u8]) -> Result<String, DescriptorError> {
    let mut reader = XmlReader::new(bytes, "descriptor");
    match reader.next()? {
        Node::Open(element) => Ok(element.name),
        _ => Err(reader.malformed("no root element")),
    }
}

/// Treat a presence-only flag as a boolean.
pub(crate) fn set_flag(
    reader: &mut XmlReader<'_>,
    element: &Element,
    flag: &mut bool,
) -> Result<(), DescriptorError> {
    if *flag {
        return Err(reader.malformed(format!("duplicate <{}>", element.name)));
    }
    reader.leaf(element)?;
    *flag = true;
    Ok(())
}

pub(crate) fn opt(value: &Option<String>) -> Option<&str> {
    value.as_deref()
}
