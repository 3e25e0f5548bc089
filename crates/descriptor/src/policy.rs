//! # Access policies
//!
//! A [`PolicyDocument`] lists the access-control rules attached to an entity,
//! in the order the repository reports them.
//!
//! Each [`Policy`] names at most one identity, either a group or an eperson.
//! Rules with no identity ("type-only" rules) are allowed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DescriptorError;

/// The identity a policy grants an action to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicySubject {
    /// A group, referenced by name.
    Group(String),
    /// A single person, referenced by email or netid.
    EPerson(String),
}

/// One access-control rule.
///
/// Built through [`Policy::builder`]; deserialization goes through the same
/// checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPolicy")]
pub struct Policy {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<PolicySubject>,
    action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Deserialize)]
struct RawPolicy {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    subject: Option<PolicySubject>,
    action: String,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    end_date: Option<NaiveDate>,
    #[serde(default)]
    description: Option<String>,
}

impl TryFrom<RawPolicy> for Policy {
    type Error = DescriptorError;

    fn try_from(raw: RawPolicy) -> Result<Self, Self::Error> {
        PolicyBuilder {
            policy: Policy {
                name: raw.name,
                kind: raw.kind,
                subject: raw.subject,
                action: raw.action,
                start_date: raw.start_date,
                end_date: raw.end_date,
                description: raw.description,
            },
        }
        .build()
    }
}

impl Policy {
    pub fn builder(action: impl Into<String>) -> PolicyBuilder {
        PolicyBuilder {
            policy: Policy {
                name: None,
                kind: None,
                subject: None,
                action: action.into(),
                start_date: None,
                end_date: None,
                description: None,
            },
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn subject(&self) -> Option<&PolicySubject> {
        self.subject.as_ref()
    }

    pub fn group(&self) -> Option<&str> {
        match &self.subject {
            Some(PolicySubject::Group(g)) => Some(g),
            _ => None,
        }
    }

    pub fn eperson(&self) -> Option<&str> {
        match &self.subject {
            Some(PolicySubject::EPerson(e)) => Some(e),
            _ => None,
        }
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether the rule is in force on `date`. Bounds are inclusive and an
    /// absent bound is open-ended.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| start <= date)
            && self.end_date.map_or(true, |end| date <= end)
    }
}

/// Builder for [`Policy`]; `build` checks the date range.
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    policy: Policy,
}

impl PolicyBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.policy.name = Some(name.into());
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.policy.kind = Some(kind.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.policy.subject = Some(PolicySubject::Group(group.into()));
        self
    }

    pub fn eperson(mut self, eperson: impl Into<String>) -> Self {
        self.policy.subject = Some(PolicySubject::EPerson(eperson.into()));
        self
    }

    pub fn subject(mut self, subject: Option<PolicySubject>) -> Self {
        self.policy.subject = subject;
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.policy.start_date = Some(date);
        self
    }

    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.policy.end_date = Some(date);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.policy.description = Some(description.into());
        self
    }

    pub fn build(self) -> Result<Policy, DescriptorError> {
        if let (Some(start), Some(end)) = (self.policy.start_date, self.policy.end_date) {
            if end < start {
                return Err(DescriptorError::invalid(
                    "policy",
                    format!("end date {end} precedes start date {start}"),
                ));
            }
        }
        Ok(self.policy)
    }
}

/// Ordered sequence of access policies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyDocument {
    policies: Vec<Policy>,
}

impl PolicyDocument {
    pub fn new(policies: Vec<Policy>) -> Self {
        Self { policies }
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Policy> {
        self.policies.iter()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl FromIterator<Policy> for PolicyDocument {
    fn from_iter<I: IntoIterator<Item = Policy>>(iter: I) -> Self {
        Self {
            policies: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PolicyDocument {
    type Item = &'a Policy;
    type IntoIter = std::slice::Iter<'a, Policy>;

    fn into_iter(self) -> Self::IntoIter {
        self.policies.iter()
    }
}
