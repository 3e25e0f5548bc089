//! # Metadata values
//!
//! A [`MetadataDocument`] is the ordered list of metadata statements recorded
//! for an entity. Statement order reflects the order in the repository and is
//! preserved through encoding.

use serde::{Deserialize, Serialize};

/// One metadata statement, e.g. `dc.title = "Example Title"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Value {
    schema: String,
    element: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    qualifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    /// Free text payload. May be empty.
    body: String,
}

impl Value {
    pub fn new(
        schema: impl Into<String>,
        element: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            element: element.into(),
            qualifier: None,
            language: None,
            body: body.into(),
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Dotted field name, `schema.element[.qualifier]`.
    pub fn field(&self) -> String {
        match &self.qualifier {
            Some(q) => format!("{}.{}.{}", self.schema, self.element, q),
            None => format!("{}.{}", self.schema, self.element),
        }
    }
}

/// Ordered sequence of metadata statements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataDocument {
    values: Vec<Value>,
}

impl MetadataDocument {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All values recorded under the given dotted field name, in order.
    pub fn by_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.values.iter().filter(move |v| v.field() == field)
    }
}

impl FromIterator<Value> for MetadataDocument {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MetadataDocument {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
