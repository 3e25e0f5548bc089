//! `<role-graph>` documents.
//!
//! ```xml
//! <role-graph>
//!   <groups>
//!     <group id="1" name="Administrator">
//!       <members>
//!         <member id="2" name="admin@localhost"/>
//!       </members>
//!       <member-groups>
//!         <member id="0" name="Anonymous"/>
//!       </member-groups>
//!     </group>
//!   </groups>
//!   <epersons>
//!     <eperson id="2" email="admin@localhost" language="en">
//!       <can-login/>
//!       <password salt="5a1t" algorithm="SHA-512">c0ffee</password>
//!     </eperson>
//!   </epersons>
//! </role-graph>
//! ```
//!
//! Person members and group members live under separate wrappers so a
//! reader never has to resolve a reference to know which kind it is.
//! Flags (`can-login`, `self-registered`) are empty elements whose presence
//! means `true`.

use super::xml::{opt, set_flag, Element, XmlReader, XmlWriter};
use super::{Descriptor, DescriptorKind};
use crate::error::DescriptorError;
use crate::roles::{AssociatedGroup, Member, Password, Person, RoleGraph};

pub(crate) mod wire {
    pub const ROOT: &str = "role-graph";
    pub const GROUPS: &str = "groups";
    pub const GROUP: &str = "group";
    pub const MEMBERS: &str = "members";
    pub const MEMBER_GROUPS: &str = "member-groups";
    pub const MEMBER: &str = "member";
    pub const EPERSONS: &str = "epersons";
    pub const EPERSON: &str = "eperson";
    pub const CAN_LOGIN: &str = "can-login";
    pub const SELF_REGISTERED: &str = "self-registered";
    pub const PASSWORD: &str = "password";

    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const EMAIL: &str = "email";
    pub const NET_ID: &str = "netid";
    pub const FIRST_NAME: &str = "first-name";
    pub const LAST_NAME: &str = "last-name";
    pub const LANGUAGE: &str = "language";
    pub const SALT: &str = "salt";
    pub const ALGORITHM: &str = "algorithm";
}

const DOCUMENT: &str = "role graph";

impl Descriptor for RoleGraph {
    const KIND: DescriptorKind = DescriptorKind::Roles;

    fn to_xml(&self) -> Result<Vec<u8>, DescriptorError> {
        let mut w = XmlWriter::new()?;
        w.start(wire::ROOT, &[])?;

        let groups: Vec<_> = self.groups().collect();
        w.wrapped(wire::GROUPS, &groups, |w, group| write_group(w, group))?;

        let persons: Vec<_> = self.persons().collect();
        w.wrapped(wire::EPERSONS, &persons, |w, person| write_person(w, person))?;

        w.end(wire::ROOT)?;
        Ok(w.finish())
    }

    fn from_xml(bytes: &[u8]) -> Result<Self, DescriptorError> {
        let mut r = XmlReader::new(bytes, DOCUMENT);
        let root = r.root(wire::ROOT)?;
        let mut builder = RoleGraph::builder();

        if !root.empty {
            while let Some(el) = r.child(wire::ROOT)? {
                match el.name.as_str() {
                    wire::GROUPS => {
                        for group in read_list(&mut r, &el, wire::GROUP, read_group)? {
                            builder = builder.group(group);
                        }
                    }
                    wire::EPERSONS => {
                        for person in read_list(&mut r, &el, wire::EPERSON, read_person)? {
                            builder = builder.person(person);
                        }
                    }
                    other => {
                        return Err(r.malformed(format!("unexpected <{}> in <role-graph>", other)))
                    }
                }
            }
        }
        r.finish()?;

        builder.build().map_err(|e| match e {
            DescriptorError::Invalid { reason, .. } => r.malformed(reason),
            other => other,
        })
    }
}

fn write_group(w: &mut XmlWriter, group: &AssociatedGroup) -> Result<(), DescriptorError> {
    w.start(
        wire::GROUP,
        &[
            (wire::ID, Some(group.id())),
            (wire::NAME, Some(group.name())),
            (wire::TYPE, group.kind()),
        ],
    )?;
    let members: Vec<_> = group.members().collect();
    w.wrapped(wire::MEMBERS, &members, |w, m| write_member(w, m))?;
    let member_groups: Vec<_> = group.member_groups().collect();
    w.wrapped(wire::MEMBER_GROUPS, &member_groups, |w, m| write_member(w, m))?;
    w.end(wire::GROUP)
}

fn write_member(w: &mut XmlWriter, member: &Member) -> Result<(), DescriptorError> {
    w.empty(
        wire::MEMBER,
        &[(wire::ID, Some(member.id.as_str())), (wire::NAME, opt(&member.name))],
    )
}

fn write_person(w: &mut XmlWriter, person: &Person) -> Result<(), DescriptorError> {
    let attrs = [
        (wire::ID, Some(person.id.as_str())),
        (wire::EMAIL, opt(&person.email)),
        (wire::NET_ID, opt(&person.net_id)),
        (wire::FIRST_NAME, opt(&person.first_name)),
        (wire::LAST_NAME, opt(&person.last_name)),
        (wire::LANGUAGE, opt(&person.language)),
    ];
    if !person.can_login && !person.self_registered && person.password.is_none() {
        return w.empty(wire::EPERSON, &attrs);
    }

    w.start(wire::EPERSON, &attrs)?;
    if person.can_login {
        w.empty(wire::CAN_LOGIN, &[])?;
    }
    if person.self_registered {
        w.empty(wire::SELF_REGISTERED, &[])?;
    }
    if let Some(password) = &person.password {
        w.text(
            wire::PASSWORD,
            &[
                (wire::SALT, opt(&password.salt)),
                (wire::ALGORITHM, opt(&password.algorithm)),
            ],
            &password.hash,
        )?;
    }
    w.end(wire::EPERSON)
}

/// Read every `item` child of a wrapper element.
fn read_list<T>(
    r: &mut XmlReader<'_>,
    wrapper: &Element,
    item: &str,
    mut read: impl FnMut(&mut XmlReader<'_>, Element) -> Result<T, DescriptorError>,
) -> Result<Vec<T>, DescriptorError> {
    let mut out = Vec::new();
    if wrapper.empty {
        return Ok(out);
    }
    while let Some(el) = r.child(&wrapper.name)? {
        if el.name != item {
            return Err(r.malformed(format!(
                "unexpected <{}> in <{}>",
                el.name, wrapper.name
            )));
        }
        out.push(read(r, el)?);
    }
    Ok(out)
}

fn read_member(r: &mut XmlReader<'_>, mut el: Element) -> Result<Member, DescriptorError> {
    r.leaf(&el)?;
    let id = el.attrs.require(DOCUMENT, wire::ID)?;
    let name = el.attrs.take(wire::NAME);
    el.attrs.finish();
    Ok(Member { id, name })
}

fn read_group(r: &mut XmlReader<'_>, mut el: Element) -> Result<AssociatedGroup, DescriptorError> {
    let id = el.attrs.require(DOCUMENT, wire::ID)?;
    let name = el.attrs.require(DOCUMENT, wire::NAME)?;
    let kind = el.attrs.take(wire::TYPE);

    let mut group = AssociatedGroup::new(id, name);
    if let Some(kind) = kind {
        group = group.with_kind(kind);
    }

    if !el.empty {
        let mut seen_members = false;
        let mut seen_member_groups = false;
        while let Some(child) = r.child(wire::GROUP)? {
            match child.name.as_str() {
                wire::MEMBERS if !seen_members => {
                    seen_members = true;
                    for member in read_list(r, &child, wire::MEMBER, read_member)? {
                        group = group.with_member(member);
                    }
                }
                wire::MEMBER_GROUPS if !seen_member_groups => {
                    seen_member_groups = true;
                    for member in read_list(r, &child, wire::MEMBER, read_member)? {
                        group = group.with_member_group(member);
                    }
                }
                other => {
                    return Err(r.malformed(format!(
                        "unexpected or repeated <{}> in <group>",
                        other
                    )))
                }
            }
        }
    }
    el.attrs.finish();
    Ok(group)
}

fn read_person(r: &mut XmlReader<'_>, mut el: Element) -> Result<Person, DescriptorError> {
    let mut person = Person::new(el.attrs.require(DOCUMENT, wire::ID)?);
    person.email = el.attrs.take(wire::EMAIL);
    person.net_id = el.attrs.take(wire::NET_ID);
    person.first_name = el.attrs.take(wire::FIRST_NAME);
    person.last_name = el.attrs.take(wire::LAST_NAME);
    person.language = el.attrs.take(wire::LANGUAGE);

    if !el.empty {
        while let Some(mut child) = r.child(wire::EPERSON)? {
            match child.name.as_str() {
                wire::CAN_LOGIN => set_flag(r, &child, &mut person.can_login)?,
                wire::SELF_REGISTERED => set_flag(r, &child, &mut person.self_registered)?,
                wire::PASSWORD => {
                    if person.password.is_some() {
                        return Err(r.malformed("duplicate <password>"));
                    }
                    let salt = child.attrs.take(wire::SALT);
                    let algorithm = child.attrs.take(wire::ALGORITHM);
                    let hash = r.body(&child)?;
                    child.attrs.finish();
                    person.password = Some(Password {
                        hash,
                        salt,
                        algorithm,
                    });
                }
                other => {
                    return Err(r.malformed(format!("unexpected <{}> in <eperson>", other)))
                }
            }
        }
    }
    el.attrs.finish();
    Ok(person)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: &str) -> Person {
        Person::new(id).with_email(format!("{id}@localhost"))
    }

    #[test]
    fn test_flags_are_presence_only() {
        let graph = RoleGraph::builder()
            .person(person("1").can_login(true))
            .person(person("2").self_registered(true))
            .person(person("3"))
            .build()
            .unwrap();

        let xml = String::from_utf8(graph.to_xml().unwrap()).unwrap();
        assert_eq!(xml.matches("<can-login/>").count(), 1);
        assert_eq!(xml.matches("<self-registered/>").count(), 1);
        assert!(!xml.contains("true"));
        assert!(!xml.contains("false"));
        assert!(xml.contains(r#"<eperson id="3" email="3@localhost"/>"#));

        let back = RoleGraph::from_xml(xml.as_bytes()).unwrap();
        assert!(back.person("1").unwrap().can_login);
        assert!(!back.person("1").unwrap().self_registered);
        assert!(back.person("2").unwrap().self_registered);
        assert!(!back.person("3").unwrap().can_login);
        assert_eq!(back, graph);
    }

    #[test]
    fn test_password_hash_is_body() {
        let graph = RoleGraph::builder()
            .person(
                person("5").with_password(
                    Password::new("9f86d081884c7d65").with_salt("abc").with_algorithm("SHA-512"),
                ),
            )
            .person(person("6").with_password(Password::new("legacy-md5")))
            .build()
            .unwrap();

        let xml = String::from_utf8(graph.to_xml().unwrap()).unwrap();
        assert!(xml.contains(r#"<password salt="abc" algorithm="SHA-512">9f86d081884c7d65</password>"#));
        assert!(xml.contains("<password>legacy-md5</password>"));

        let back = RoleGraph::from_xml(xml.as_bytes()).unwrap();
        assert_eq!(back.person("5"), graph.person("5"));
        assert_eq!(back.person("6").unwrap().password, Some(Password::new("legacy-md5")));
    }

    #[test]
    fn test_member_wrappers_omitted_when_empty() {
        let graph = RoleGraph::builder()
            .group(AssociatedGroup::new("0", "Anonymous"))
            .build()
            .unwrap();
        let xml = String::from_utf8(graph.to_xml().unwrap()).unwrap();
        assert!(!xml.contains("<members>"));
        assert!(!xml.contains("<member-groups>"));
        assert!(!xml.contains("<epersons>"));
        assert_eq!(RoleGraph::from_xml(xml.as_bytes()).unwrap(), graph);
    }

    #[test]
    fn test_missing_person_id_rejected() {
        let err = RoleGraph::from_xml(
            br#"<role-graph><epersons><eperson email="x@y"/></epersons></role-graph>"#,
        )
        .unwrap_err();
        assert!(matches!(err, DescriptorError::Malformed { .. }));
        assert!(err.to_string().contains("'id'"));
    }

    #[test]
    fn test_dangling_member_rejected_as_malformed() {
        let err = RoleGraph::from_xml(
            br#"<role-graph>
                  <groups>
                    <group id="1" name="Administrator">
                      <members><member id="99"/></members>
                    </group>
                  </groups>
                </role-graph>"#,
        )
        .unwrap_err();
        assert!(matches!(err, DescriptorError::Malformed { .. }));
        assert!(err.to_string().contains("unknown person 99"));
    }

    #[test]
    fn test_flag_with_content_rejected() {
        let err = RoleGraph::from_xml(
            br#"<role-graph><epersons><eperson id="1"><can-login>true</can-login></eperson></epersons></role-graph>"#,
        )
        .unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_repeated_wrapper_rejected() {
        let err = RoleGraph::from_xml(
            br#"<role-graph>
                  <groups>
                    <group id="1" name="A"><members/><members/></group>
                  </groups>
                </role-graph>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("repeated <members>"));
    }
}
