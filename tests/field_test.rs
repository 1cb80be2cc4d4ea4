//! Field matcher behavior through whole descriptor sets.

mod common;

use common::*;
use proto_breaking::FindingCategory;
use protobuf::descriptor::DescriptorProto;
use protobuf::descriptor::FileDescriptorSet;
use protobuf::descriptor::field_descriptor_proto::Type;

const BOOK: &str = "example.googleapis.com/Book";
const SHELF: &str = "example.googleapis.com/Shelf";

fn single(package: &str, messages: Vec<DescriptorProto>) -> FileDescriptorSet {
    let path = format!("{}/api.proto", package.replace('.', "/"));
    descriptor_set(vec![with_messages(file(&path, package), messages)])
}

#[test]
fn test_field_rename_is_single_name_change() {
    let original = single("example.v1", vec![message("Book", vec![string_field("title", 1)])]);
    let update = single("example.v1", vec![message("Book", vec![string_field("name", 1)])]);

    let store = detect(&original, &update);
    let findings = store.all_findings();
    assert_eq!(categories(&findings), vec![FindingCategory::FieldNameChange]);
    assert_eq!(findings[0].subject, "name");
    assert_eq!(findings[0].oldsubject.as_deref(), Some("title"));
    assert_eq!(findings[0].context.as_deref(), Some("Book"));
}

#[test]
fn test_field_addition_and_removal() {
    let original = single("example.v1", vec![message("Book", vec![string_field("title", 1)])]);
    let update = single("example.v1", vec![message("Book", vec![string_field("author", 2)])]);

    let store = detect(&original, &update);
    let found = categories(&store.all_findings());
    assert!(found.contains(&FindingCategory::FieldRemoval));
    assert!(found.contains(&FindingCategory::FieldAddition));
    assert_eq!(categories(&store.breaking_findings()), vec![FindingCategory::FieldRemoval]);
}

#[test]
fn test_primitive_type_and_label_change() {
    let original = single("example.v1", vec![message("Book", vec![int32_field("pages", 1)])]);
    let update = single(
        "example.v1",
        vec![message("Book", vec![repeated(scalar("pages", 1, Type::TYPE_INT64))])],
    );

    let store = detect(&original, &update);
    let findings = store.breaking_findings();
    assert_eq!(count(&findings, FindingCategory::FieldTypeChange), 1);
    assert_eq!(count(&findings, FindingCategory::FieldRepeatedChange), 1);
    let type_change = findings
        .iter()
        .find(|f| f.category == FindingCategory::FieldTypeChange)
        .unwrap();
    assert_eq!(type_change.type_.as_deref(), Some("int64"));
    assert_eq!(type_change.oldtype.as_deref(), Some("int32"));
}

#[test]
fn test_version_tolerant_type_rename() {
    let original = single(
        "example.v1",
        vec![
            message("Foo", vec![]),
            message("Bar", vec![message_field("foo", 1, ".example.v1.Foo")]),
        ],
    );
    let update = single(
        "example.v1beta1",
        vec![
            message("Foo", vec![]),
            message("Bar", vec![message_field("foo", 1, ".example.v1beta1.Foo")]),
        ],
    );
    let store = detect(&original, &update);
    assert_eq!(count(&store.all_findings(), FindingCategory::FieldTypeChange), 0);

    let renamed = single(
        "example.v1beta1",
        vec![
            message("FooRenamed", vec![]),
            message("Bar", vec![message_field("foo", 1, ".example.v1beta1.FooRenamed")]),
        ],
    );
    let store = detect(&original, &renamed);
    assert_eq!(count(&store.all_findings(), FindingCategory::FieldTypeChange), 1);
}

#[test]
fn test_major_version_rename_is_breaking() {
    let original = single(
        "example.v1",
        vec![
            message("Foo", vec![]),
            message("Bar", vec![message_field("foo", 1, ".example.v1.Foo")]),
        ],
    );
    let update = single(
        "example.v2",
        vec![
            message("Foo", vec![]),
            message("Bar", vec![message_field("foo", 1, ".other.v1.Foo")]),
        ],
    );
    let store = detect(&original, &update);
    assert_eq!(count(&store.breaking_findings(), FindingCategory::FieldTypeChange), 1);
}

#[test]
fn test_required_only_when_tightened() {
    let optional = single("example.v1", vec![message("Book", vec![string_field("name", 1)])]);
    let tightened = single(
        "example.v1",
        vec![message("Book", vec![required(string_field("name", 1))])],
    );

    let store = detect(&optional, &tightened);
    assert_eq!(
        categories(&store.all_findings()),
        vec![FindingCategory::FieldBehaviorChange]
    );

    let store = detect(&tightened, &optional);
    assert!(store.is_empty());
}

#[test]
fn test_oneof_moves() {
    let plain = single(
        "example.v1",
        vec![message("Book", vec![string_field("isbn", 1), string_field("ean", 2)])],
    );
    let in_oneof = single(
        "example.v1",
        vec![with_oneof(
            message("Book", vec![string_field("isbn", 1), string_field("ean", 2)]),
            "code",
            &[1, 2],
        )],
    );

    let store = detect(&plain, &in_oneof);
    assert_eq!(count(&store.breaking_findings(), FindingCategory::FieldOneofMoveIn), 2);

    let store = detect(&in_oneof, &plain);
    assert_eq!(count(&store.breaking_findings(), FindingCategory::FieldOneofRemoval), 2);
}

#[test]
fn test_proto3_optional_is_not_a_oneof_move() {
    let plain = single("example.v1", vec![message("Book", vec![string_field("title", 1)])]);
    let optional = single(
        "example.v1",
        vec![with_proto3_optional(
            message("Book", vec![string_field("title", 1)]),
            1,
        )],
    );

    let store = detect(&plain, &optional);
    let findings = store.all_findings();
    assert_eq!(
        categories(&findings),
        vec![FindingCategory::FieldProto3OptionalChange]
    );
}

#[test]
fn test_map_value_type_change() {
    let build = |value_type: Type| {
        single(
            "example.v1",
            vec![with_map_field(
                message("Book", vec![]),
                ".example.v1.Book",
                "labels",
                1,
                string_field("key", 1),
                scalar("value", 2, value_type),
            )],
        )
    };
    let original = build(Type::TYPE_STRING);

    let store = detect(&original, &build(Type::TYPE_STRING));
    assert!(store.is_empty());

    let store = detect(&original, &build(Type::TYPE_INT32));
    let findings = store.breaking_findings();
    assert_eq!(categories(&findings), vec![FindingCategory::FieldTypeChange]);
    assert_eq!(findings[0].type_.as_deref(), Some("map<string, int32>"));
    assert_eq!(findings[0].oldtype.as_deref(), Some("map<string, string>"));
}

#[test]
fn test_map_entry_is_not_compared_as_message() {
    let original = single(
        "example.v1",
        vec![with_map_field(
            message("Book", vec![]),
            ".example.v1.Book",
            "labels",
            1,
            string_field("key", 1),
            string_field("value", 2),
        )],
    );
    let update = single(
        "example.v1",
        vec![message("Book", vec![repeated(string_field("labels", 1))])],
    );

    let store = detect(&original, &update);
    let found = categories(&store.all_findings());
    assert!(found.contains(&FindingCategory::FieldTypeChange));
    assert!(!found.contains(&FindingCategory::MessageRemoval));
}

#[test]
fn test_resource_reference_addition_and_removal() {
    let plain = single("example.v1", vec![message("GetBookRequest", vec![string_field("name", 1)])]);
    let referenced = single(
        "example.v1",
        vec![message(
            "GetBookRequest",
            vec![with_reference_type(string_field("name", 1), BOOK)],
        )],
    );

    let store = detect(&plain, &referenced);
    assert_eq!(
        categories(&store.all_findings()),
        vec![FindingCategory::ResourceReferenceAddition]
    );

    let store = detect(&referenced, &plain);
    assert_eq!(
        categories(&store.breaking_findings()),
        vec![FindingCategory::ResourceReferenceRemoval]
    );
}

#[test]
fn test_resource_reference_moved_to_message() {
    let original = single(
        "example.v1",
        vec![message("Book", vec![with_reference_type(string_field("name", 1), BOOK)])],
    );
    let update = single(
        "example.v1",
        vec![with_resource(
            message("Book", vec![string_field("name", 1)]),
            BOOK,
            &["books/{book}"],
        )],
    );

    let store = detect(&original, &update);
    let found = categories(&store.all_findings());
    assert!(found.contains(&FindingCategory::ResourceReferenceMoved));
    assert!(!found.contains(&FindingCategory::ResourceReferenceRemoval));
    assert!(!store.has_breaking_changes());
}

fn library(messages: Vec<DescriptorProto>) -> FileDescriptorSet {
    let api = with_resource_definition(
        with_resource_definition(file("example/v1/api.proto", "example.v1"), SHELF, &["shelves/{shelf}"]),
        BOOK,
        &["shelves/{shelf}/books/{book}"],
    );
    descriptor_set(vec![with_messages(api, messages)])
}

#[test]
fn test_type_and_child_type_resolve_through_parents() {
    let by_type = library(vec![message(
        "ListBooksRequest",
        vec![with_reference_type(string_field("parent", 1), SHELF)],
    )]);
    let by_child_type = library(vec![message(
        "ListBooksRequest",
        vec![with_reference_child_type(string_field("parent", 1), BOOK)],
    )]);

    let store = detect(&by_type, &by_child_type);
    assert!(store.is_empty());
    let store = detect(&by_child_type, &by_type);
    assert!(store.is_empty());

    let unrelated = library(vec![message(
        "ListBooksRequest",
        vec![with_reference_child_type(string_field("parent", 1), SHELF)],
    )]);
    let store = detect(&by_type, &unrelated);
    assert_eq!(
        categories(&store.breaking_findings()),
        vec![FindingCategory::ResourceReferenceChange]
    );
}

#[test]
fn test_format_change() {
    let plain = single("example.v1", vec![message("Book", vec![string_field("id", 1)])]);
    let uuid = single("example.v1", vec![message("Book", vec![with_format(string_field("id", 1), 1)])]);
    let ipv4 = single("example.v1", vec![message("Book", vec![with_format(string_field("id", 1), 2)])]);

    let store = detect(&plain, &uuid);
    assert_eq!(categories(&store.all_findings()), vec![FindingCategory::FieldFormatChange]);

    let store = detect(&uuid, &ipv4);
    let findings = store.all_findings();
    assert_eq!(categories(&findings), vec![FindingCategory::FieldFormatChange]);
    assert_eq!(findings[0].type_.as_deref(), Some("IPV4"));
    assert_eq!(findings[0].oldtype.as_deref(), Some("UUID4"));

    let store = detect(&uuid, &plain);
    assert!(store.is_empty());
}
