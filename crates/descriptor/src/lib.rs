//! Descriptor documents embedded in replica bags.
//!
//! A bag carries three descriptor documents next to the entity's content:
//!
//! - [`MetadataDocument`]: ordered metadata statements ([`Value`])
//! - [`PolicyDocument`]: ordered access-control rules ([`Policy`])
//! - [`RoleGraph`]: the identity snapshot (groups, memberships, people)
//!
//! Each document kind is an immutable value type with an explicit XML codec
//! ([`Descriptor`]). Serialization is canonical: the same document always
//! produces the same bytes, and `from_xml(to_xml(d)) == d`.
//!
//! ```rust
//! use descriptor::{Descriptor, MetadataDocument, Value};
//!
//! let doc: MetadataDocument = [
//!     Value::new("dc", "title", "Example Title"),
//!     Value::new("dc", "creator", "Jane Doe").with_language("en"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let bytes = doc.to_xml().unwrap();
//! assert_eq!(MetadataDocument::from_xml(&bytes).unwrap(), doc);
//! ```

/**
 * Canonical XML encoding for every document kind.
 *  Placement rules (attribute vs body vs wrapped
 *  collection) live here, not on the model types.
 */
pub mod codec;
mod error;
/**
 * Metadata value statements.
 */
pub mod metadata;
/**
 * Access-control policies.
 */
pub mod policy;
/**
 * Groups, memberships and people.
 */
pub mod roles;

pub use codec::{AnyDescriptor, Descriptor, DescriptorKind};
pub use error::DescriptorError;
pub use metadata::{MetadataDocument, Value};
pub use policy::{Policy, PolicyDocument, PolicySubject};
pub use roles::{AssociatedGroup, Member, Password, Person, RoleGraph, RoleGraphBuilder};

pub mod prelude {
    pub use crate::codec::{AnyDescriptor, Descriptor, DescriptorKind};
    pub use crate::error::DescriptorError;
    pub use crate::metadata::{MetadataDocument, Value};
    pub use crate::policy::{Policy, PolicyDocument, PolicySubject};
    pub use crate::roles::{AssociatedGroup, Member, Password, Person, RoleGraph};
}
