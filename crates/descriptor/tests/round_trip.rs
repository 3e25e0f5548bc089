//! Integration tests for encoding and decoding descriptor documents

mod common;

use descriptor::prelude::*;

#[test]
fn test_metadata_scenario() {
    let doc: MetadataDocument = [
        Value::new("dc", "name", "Example Title").with_qualifier("unqualified"),
        Value::new("dc", "creator", "Jane Doe").with_language("en"),
    ]
    .into_iter()
    .collect();

    let xml = doc.to_xml().unwrap();
    let text = String::from_utf8(xml.clone()).unwrap();
    let title = text.find("Example Title").unwrap();
    let creator = text.find("Jane Doe").unwrap();
    assert!(title < creator);

    let back = MetadataDocument::from_xml(&xml).unwrap();
    assert_eq!(back.len(), 2);
    assert_eq!(back, doc);
    assert_eq!(back.values()[0].qualifier(), Some("unqualified"));
    assert_eq!(back.values()[1].language(), Some("en"));
}

#[test]
fn test_metadata_serialization_is_canonical() {
    let doc = MetadataDocument::new(vec![Value::new("dc", "title", "Same")]);
    let once = doc.to_xml().unwrap();
    let twice = MetadataDocument::from_xml(&once).unwrap().to_xml().unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_role_graph_scenario() {
    let graph = common::site_roles();
    let xml = graph.to_xml().unwrap();
    let back = RoleGraph::from_xml(&xml).unwrap();

    assert_eq!(back, graph);

    let admin = back.group("1").unwrap();
    assert_eq!(admin.name(), "Administrator");
    let members: Vec<_> = admin.members().collect();
    let member_groups: Vec<_> = admin.member_groups().collect();
    assert_eq!(members, vec![&Member::named("2", "admin@localhost")]);
    assert_eq!(member_groups, vec![&Member::named("0", "Anonymous")]);

    for group in graph.groups() {
        assert!(back.group(group.id()).unwrap().same_contents(group));
    }
    for person in graph.persons() {
        assert_eq!(back.person(&person.id), Some(person));
    }
}

#[test]
fn test_role_graph_with_dropped_memberships_is_unequal() {
    let graph = common::site_roles();
    let xml = String::from_utf8(graph.to_xml().unwrap()).unwrap();
    let start = xml.find("<member-groups>").unwrap();
    let end = xml.find("</member-groups>").unwrap() + "</member-groups>".len();
    let trimmed = format!("{}{}", &xml[..start], &xml[end..]);

    let back = RoleGraph::from_xml(trimmed.as_bytes()).unwrap();
    assert_eq!(back.group("1"), graph.group("1"));
    assert_ne!(back, graph);
    assert_ne!(AnyDescriptor::Roles(back), AnyDescriptor::Roles(graph));
}

#[test]
fn test_role_graph_wrappers_distinguish_member_kinds() {
    let xml = String::from_utf8(common::site_roles().to_xml().unwrap()).unwrap();
    let group = &xml[xml.find(r#"<group id="1""#).unwrap()..];
    let group = &group[..group.find("</group>").unwrap()];

    let members = group.find("<members>").unwrap();
    let member_groups = group.find("<member-groups>").unwrap();
    assert!(group[members..member_groups].contains(r#"<member id="2" name="admin@localhost"/>"#));
    assert!(group[member_groups..].contains(r#"<member id="0" name="Anonymous"/>"#));
}

#[test]
fn test_policy_round_trip_preserves_order() {
    let doc: PolicyDocument = [
        Policy::builder("READ").kind("TYPE_INHERITED").group("Anonymous"),
        Policy::builder("WRITE").eperson("admin@localhost"),
        Policy::builder("ADMIN").name("collection admin").group("COLLECTION_12_ADMIN"),
    ]
    .into_iter()
    .map(|b| b.build().unwrap())
    .collect();

    let back = PolicyDocument::from_xml(&doc.to_xml().unwrap()).unwrap();
    assert_eq!(back, doc);
    let actions: Vec<_> = back.iter().map(|p| p.action()).collect();
    assert_eq!(actions, vec!["READ", "WRITE", "ADMIN"]);
}

#[test]
fn test_decode_any_kind() {
    let docs = [
        AnyDescriptor::Metadata(MetadataDocument::new(vec![Value::new("dc", "title", "t")])),
        AnyDescriptor::Policies(PolicyDocument::new(vec![Policy::builder("READ")
            .build()
            .unwrap()])),
        AnyDescriptor::Roles(common::site_roles()),
    ];
    for doc in docs {
        let bytes = doc.to_xml().unwrap();
        let decoded = AnyDescriptor::decode(&bytes).unwrap();
        assert_eq!(decoded.kind(), doc.kind());
        assert_eq!(decoded, doc);
    }
}

#[test]
fn test_malformed_xml_is_not_retryable_input() {
    let cases: [&[u8]; 5] = [
        b"",
        b"<metadata>",
        b"<metadata><value schema=\"dc\" element=\"t\">x</metadata>",
        b"<metadata></metadata><metadata/>",
        b"<role-graph><groups><group name=\"no id\"/></groups></role-graph>",
    ];
    for bytes in cases {
        let err = AnyDescriptor::decode(bytes).unwrap_err();
        assert!(err.is_malformed(), "{:?} -> {}", String::from_utf8_lossy(bytes), err);
    }
}

#[test]
fn test_model_renders_as_json() {
    let json = serde_json::to_value(common::site_roles()).unwrap();
    assert_eq!(json["persons"]["2"]["email"], "admin@localhost");
    assert_eq!(json["persons"]["3"]["self_registered"], true);
}
