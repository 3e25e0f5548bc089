//! `<policies>` documents.
//!
//! ```xml
//! <policies>
//!   <policy name="embargo" type="TYPE_CUSTOM" group="Anonymous" action="READ" start-date="2030-01-01"/>
//! </policies>
//! ```
//!
//! A policy has no free-text payload, so every field is an attribute and
//! each `<policy>` is an empty element.

use chrono::NaiveDate;

use super::xml::{opt, Element, XmlReader, XmlWriter};
use super::{Descriptor, DescriptorKind};
use crate::error::DescriptorError;
use crate::policy::{Policy, PolicyDocument, PolicySubject};

pub(crate) mod wire {
    pub const ROOT: &str = "policies";
    pub const POLICY: &str = "policy";
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const GROUP: &str = "group";
    pub const EPERSON: &str = "eperson";
    pub const ACTION: &str = "action";
    pub const START_DATE: &str = "start-date";
    pub const END_DATE: &str = "end-date";
    pub const DESCRIPTION: &str = "description";
}

const DOCUMENT: &str = "policy";
const DATE_FORMAT: &str = "%Y-%m-%d";

impl Descriptor for PolicyDocument {
    const KIND: DescriptorKind = DescriptorKind::Policies;

    fn to_xml(&self) -> Result<Vec<u8>, DescriptorError> {
        let mut w = XmlWriter::new()?;
        w.start(wire::ROOT, &[])?;
        for policy in self {
            let start = policy.start_date().map(|d| d.format(DATE_FORMAT).to_string());
            let end = policy.end_date().map(|d| d.format(DATE_FORMAT).to_string());
            w.empty(
                wire::POLICY,
                &[
                    (wire::NAME, policy.name()),
                    (wire::TYPE, policy.kind()),
                    (wire::GROUP, policy.group()),
                    (wire::EPERSON, policy.eperson()),
                    (wire::ACTION, Some(policy.action())),
                    (wire::START_DATE, opt(&start)),
                    (wire::END_DATE, opt(&end)),
                    (wire::DESCRIPTION, policy.description()),
                ],
            )?;
        }
        w.end(wire::ROOT)?;
        Ok(w.finish())
    }

    fn from_xml(bytes: &[u8]) -> Result<Self, DescriptorError> {
        let mut r = XmlReader::new(bytes, DOCUMENT);
        let root = r.root(wire::ROOT)?;
        let mut policies = Vec::new();

        if !root.empty {
            while let Some(el) = r.child(wire::ROOT)? {
                if el.name != wire::POLICY {
                    return Err(r.malformed(format!("unexpected <{}> in <policies>", el.name)));
                }
                policies.push(read_policy(&mut r, el)?);
            }
        }
        r.finish()?;

        Ok(PolicyDocument::new(policies))
    }
}

fn read_policy(r: &mut XmlReader<'_>, mut el: Element) -> Result<Policy, DescriptorError> {
    r.leaf(&el)?;
    let attrs = &mut el.attrs;

    let action = attrs.require(DOCUMENT, wire::ACTION)?;
    let subject = match (attrs.take(wire::GROUP), attrs.take(wire::EPERSON)) {
        (Some(_), Some(_)) => {
            return Err(r.malformed("policy names both a group and an eperson"));
        }
        (Some(group), None) => Some(PolicySubject::Group(group)),
        (None, Some(eperson)) => Some(PolicySubject::EPerson(eperson)),
        (None, None) => None,
    };

    let mut builder = Policy::builder(action).subject(subject);
    if let Some(name) = attrs.take(wire::NAME) {
        builder = builder.name(name);
    }
    if let Some(kind) = attrs.take(wire::TYPE) {
        builder = builder.kind(kind);
    }
    if let Some(date) = attrs.take(wire::START_DATE) {
        builder = builder.start_date(parse_date(r, wire::START_DATE, &date)?);
    }
    if let Some(date) = attrs.take(wire::END_DATE) {
        builder = builder.end_date(parse_date(r, wire::END_DATE, &date)?);
    }
    if let Some(description) = attrs.take(wire::DESCRIPTION) {
        builder = builder.description(description);
    }
    el.attrs.finish();

    builder.build().map_err(|e| r.malformed(e.to_string()))
}

fn parse_date(r: &XmlReader<'_>, attr: &str, value: &str) -> Result<NaiveDate, DescriptorError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| r.malformed(format!("invalid {} '{}': {}", attr, value, e)))
}
