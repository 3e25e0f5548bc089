//! # Role graph
//!
//! A [`RoleGraph`] is a snapshot of a site's identities: every group with its
//! direct memberships, and every person those memberships refer to.
//!
//! ## Memberships
//!
//! A group keeps two independent member sets:
//!
//! - **members**: people who belong to the group directly
//! - **member groups**: groups nested inside this group
//!
//! ## Closure
//!
//! A graph is only constructed through [`RoleGraphBuilder::build`], which
//! checks that every member reference resolves to a person or group inside
//! the same snapshot. A graph handed to the codec is therefore always closed.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::DescriptorError;

const DOCUMENT: &str = "role graph";

/// A reference from a group to a person or to another group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    /// Display name of the referenced entity (email for people).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Member {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }
}

/// A group and its direct memberships.
///
/// Identity is the group `id`: equality, ordering and hashing ignore every
/// other field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociatedGroup {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default)]
    members: BTreeMap<String, Member>,
    #[serde(default)]
    member_groups: BTreeMap<String, Member>,
}

impl AssociatedGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: None,
            members: BTreeMap::new(),
            member_groups: BTreeMap::new(),
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Add a person member. A later entry with the same id replaces the earlier one.
    pub fn with_member(mut self, member: Member) -> Self {
        self.members.insert(member.id.clone(), member);
        self
    }

    /// Add a nested group member.
    pub fn with_member_group(mut self, member: Member) -> Self {
        self.member_groups.insert(member.id.clone(), member);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Direct person members, ordered by id.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    /// Direct group members, ordered by id.
    pub fn member_groups(&self) -> impl Iterator<Item = &Member> {
        self.member_groups.values()
    }

    pub fn has_member(&self, person_id: &str) -> bool {
        self.members.contains_key(person_id)
    }

    pub fn has_member_group(&self, group_id: &str) -> bool {
        self.member_groups.contains_key(group_id)
    }

    /// Field-by-field comparison. `==` only compares ids.
    pub fn same_contents(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.kind == other.kind
            && self.members == other.members
            && self.member_groups == other.member_groups
    }
}

impl PartialEq for AssociatedGroup {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AssociatedGroup {}

impl Hash for AssociatedGroup {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for AssociatedGroup {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AssociatedGroup {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

/// Stored credential for a person.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Password {
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
}

impl Password {
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            salt: None,
            algorithm: None,
        }
    }

    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }
}

/// A person (eperson) known to the site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub can_login: bool,
    #[serde(default)]
    pub self_registered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Password>,
}

impl Person {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_net_id(mut self, net_id: impl Into<String>) -> Self {
        self.net_id = Some(net_id.into());
        self
    }

    pub fn with_names(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn can_login(mut self, can_login: bool) -> Self {
        self.can_login = can_login;
        self
    }

    pub fn self_registered(mut self, self_registered: bool) -> Self {
        self.self_registered = self_registered;
        self
    }

    pub fn with_password(mut self, password: Password) -> Self {
        self.password = Some(password);
        self
    }
}

/// Closed snapshot of groups and people.
///
/// Two graphs are equal when they hold the same people and the same groups
/// with the same names, kinds and member sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "RawRoleGraph")]
pub struct RoleGraph {
    groups: BTreeMap<String, AssociatedGroup>,
    persons: BTreeMap<String, Person>,
}

impl PartialEq for RoleGraph {
    fn eq(&self, other: &Self) -> bool {
        self.persons == other.persons
            && self.groups.len() == other.groups.len()
            && self
                .groups
                .values()
                .zip(other.groups.values())
                .all(|(a, b)| a.same_contents(b))
    }
}

impl Eq for RoleGraph {}

/// Deserialized form of a [`RoleGraph`], validated through the builder.
#[derive(Deserialize)]
struct RawRoleGraph {
    #[serde(default)]
    groups: BTreeMap<String, AssociatedGroup>,
    #[serde(default)]
    persons: BTreeMap<String, Person>,
}

impl TryFrom<RawRoleGraph> for RoleGraph {
    type Error = DescriptorError;

    fn try_from(raw: RawRoleGraph) -> Result<Self, Self::Error> {
        let mut builder = RoleGraph::builder();
        for (key, person) in raw.persons {
            if key != person.id {
                return Err(DescriptorError::invalid(
                    DOCUMENT,
                    format!("person keyed as {} has id {}", key, person.id),
                ));
            }
            builder = builder.person(person);
        }
        for (key, group) in raw.groups {
            if key != group.id {
                return Err(DescriptorError::invalid(
                    DOCUMENT,
                    format!("group keyed as {} has id {}", key, group.id),
                ));
            }
            let mislabeled = group
                .members
                .iter()
                .chain(group.member_groups.iter())
                .find(|(key, member)| **key != member.id);
            if let Some((key, member)) = mislabeled {
                return Err(DescriptorError::invalid(
                    DOCUMENT,
                    format!("group {} keys member {} as {}", group.id, member.id, key),
                ));
            }
            builder = builder.group(group);
        }
        builder.build()
    }
}

impl RoleGraph {
    pub fn builder() -> RoleGraphBuilder {
        RoleGraphBuilder::default()
    }

    pub fn group(&self, id: &str) -> Option<&AssociatedGroup> {
        self.groups.get(id)
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.persons.get(id)
    }

    /// Groups ordered by id.
    pub fn groups(&self) -> impl Iterator<Item = &AssociatedGroup> {
        self.groups.values()
    }

    /// People ordered by id.
    pub fn persons(&self) -> impl Iterator<Item = &Person> {
        self.persons.values()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.persons.is_empty()
    }

    /// Groups that list `person_id` as a direct member.
    pub fn groups_of<'a>(
        &'a self,
        person_id: &'a str,
    ) -> impl Iterator<Item = &'a AssociatedGroup> + 'a {
        self.groups.values().filter(move |g| g.has_member(person_id))
    }

    /// Every person reachable from `group_id` through nested groups.
    ///
    /// Returns `None` when the group is unknown. Cycles are visited once.
    pub fn effective_members(&self, group_id: &str) -> Option<BTreeSet<&str>> {
        self.groups.get(group_id)?;

        let mut seen = BTreeSet::new();
        let mut stack = vec![group_id];
        let mut people = BTreeSet::new();

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(group) = self.groups.get(id) else {
                continue;
            };
            people.extend(group.members.keys().map(String::as_str));
            stack.extend(group.member_groups.keys().map(String::as_str));
        }

        Some(people)
    }
}

/// Collects groups and people, then validates closure in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct RoleGraphBuilder {
    groups: Vec<AssociatedGroup>,
    persons: Vec<Person>,
}

impl RoleGraphBuilder {
    pub fn group(mut self, group: AssociatedGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn person(mut self, person: Person) -> Self {
        self.persons.push(person);
        self
    }

    pub fn build(self) -> Result<RoleGraph, DescriptorError> {
        let mut persons = BTreeMap::new();
        for person in self.persons {
            if person.id.is_empty() {
                return Err(DescriptorError::invalid(DOCUMENT, "person with empty id"));
            }
            if persons.contains_key(&person.id) {
                return Err(DescriptorError::invalid(
                    DOCUMENT,
                    format!("duplicate person id {}", person.id),
                ));
            }
            persons.insert(person.id.clone(), person);
        }

        let mut groups = BTreeMap::new();
        for group in self.groups {
            if group.id.is_empty() {
                return Err(DescriptorError::invalid(DOCUMENT, "group with empty id"));
            }
            if groups.contains_key(&group.id) {
                return Err(DescriptorError::invalid(
                    DOCUMENT,
                    format!("duplicate group id {}", group.id),
                ));
            }
            groups.insert(group.id.clone(), group);
        }

        for group in groups.values() {
            if let Some(missing) = group.members.keys().find(|id| !persons.contains_key(*id)) {
                return Err(DescriptorError::invalid(
                    DOCUMENT,
                    format!("group {} references unknown person {}", group.id, missing),
                ));
            }
            if group.member_groups.contains_key(&group.id) {
                return Err(DescriptorError::invalid(
                    DOCUMENT,
                    format!("group {} lists itself as a member group", group.id),
                ));
            }
            if let Some(missing) = group
                .member_groups
                .keys()
                .find(|id| !groups.contains_key(*id))
            {
                return Err(DescriptorError::invalid(
                    DOCUMENT,
                    format!("group {} references unknown group {}", group.id, missing),
                ));
            }
        }

        Ok(RoleGraph { groups, persons })
    }
}
