//! Error types for descriptor documents.

/// Errors raised while building, encoding or decoding descriptor documents.
///
/// None of these are transient: a malformed document stays malformed, so
/// callers must never retry on them.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    /// A serialized document is structurally invalid or misses a required field
    #[error("malformed {document} descriptor: {reason}")]
    Malformed {
        document: &'static str,
        reason: String,
    },

    /// A document violates a model invariant at construction time
    #[error("invalid {document} descriptor: {reason}")]
    Invalid {
        document: &'static str,
        reason: String,
    },

    /// The underlying XML could not be tokenized or written
    #[error("xml error: {0}")]
    Xml(String),
}

impl DescriptorError {
    pub(crate) fn malformed(document: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            document,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(document: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            document,
            reason: reason.into(),
        }
    }

    /// True for errors that indicate bad input bytes rather than a bad model.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::Xml(_))
    }
}
