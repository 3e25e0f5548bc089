//! Shared fixtures for descriptor integration tests
#![allow(dead_code)]

use descriptor::{AssociatedGroup, Member, Password, Person, RoleGraph};

/// A small site: anonymous and administrator groups, one admin, one
/// self-registered user.
pub fn site_roles() -> RoleGraph {
    RoleGraph::builder()
        .group(AssociatedGroup::new("0", "Anonymous"))
        .group(
            AssociatedGroup::new("1", "Administrator")
                .with_member(Member::named("2", "admin@localhost"))
                .with_member_group(Member::named("0", "Anonymous")),
        )
        .group(
            AssociatedGroup::new("7", "COLLECTION_12_SUBMIT")
                .with_kind("COLLECTION")
                .with_member(Member::named("3", "jdoe@example.org")),
        )
        .person(
            Person::new("2")
                .with_email("admin@localhost")
                .with_names("Site", "Admin")
                .with_language("en")
                .can_login(true)
                .with_password(
                    Password::new("2c26b46b68ffc68ff99b453c1d304134")
                        .with_salt("f00d")
                        .with_algorithm("SHA-512"),
                ),
        )
        .person(
            Person::new("3")
                .with_email("jdoe@example.org")
                .with_net_id("jdoe")
                .self_registered(true),
        )
        .build()
        .unwrap()
}
