//! End-to-end detection from `.proto` sources compiled with protobuf-parse.

use proto_breaking::compat::{ChangeType, ConventionalCommitTag};
use proto_breaking::{
    ApiDefinition, CompilerBackend, Compatibility, DetectorConfig, FindingCategory, report,
};

const LIBRARY_V1: &str = r#"
syntax = "proto3";

package example.library.v1;

option java_package = "com.example.library.v1";

service Library {
  rpc GetBook(GetBookRequest) returns (Book);
  rpc DeleteBook(DeleteBookRequest) returns (Book);
}

message GetBookRequest {
  string name = 1;
}

message DeleteBookRequest {
  string name = 1;
}

message Book {
  string name = 1;
  string title = 2;
  int32 pages = 3;
  State state = 4;
}

enum State {
  STATE_UNSPECIFIED = 0;
  DRAFT = 1;
  PUBLISHED = 2;
}
"#;

fn check(original: &str, update: &str, config: &DetectorConfig) -> proto_breaking::FindingStore {
    let original = ApiDefinition::from_proto_sources(&[("example/library/v1/library.proto", original)])
        .expect("Failed to compile original");
    let update = ApiDefinition::from_proto_sources(&[("example/library/v1/library.proto", update)])
        .expect("Failed to compile update");
    original
        .check_breaking_changes(&update, config)
        .expect("Failed to compare")
}

#[test]
fn test_unchanged_definition() {
    let store = check(LIBRARY_V1, LIBRARY_V1, &DetectorConfig::default());
    assert!(store.is_empty());
    assert_eq!(store.compatibility(), Compatibility::Green);
}

#[test]
fn test_field_deletion_breaking_change() {
    let update = LIBRARY_V1.replace("  int32 pages = 3;\n", "");
    let store = check(LIBRARY_V1, &update, &DetectorConfig::default());

    assert!(store.has_breaking_changes());
    assert_eq!(store.compatibility(), Compatibility::Red);
    let findings = store.breaking_findings();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].category, FindingCategory::FieldRemoval);
    assert_eq!(findings[0].subject, "pages");
    assert_eq!(findings[0].context.as_deref(), Some("Book"));
    assert_eq!(findings[0].location.proto_file_name, "example/library/v1/library.proto");
}

#[test]
fn test_method_and_enum_value_removal() {
    let update = LIBRARY_V1
        .replace("  rpc DeleteBook(DeleteBookRequest) returns (Book);\n", "")
        .replace("  PUBLISHED = 2;\n", "");
    let store = check(LIBRARY_V1, &update, &DetectorConfig::default());

    let found: Vec<_> = store.breaking_findings().iter().map(|f| f.category).collect();
    assert!(found.contains(&FindingCategory::MethodRemoval));
    assert!(found.contains(&FindingCategory::EnumValueRemoval));
    // DeleteBookRequest stays declared at top level, so it is still part of the surface
    assert!(!found.contains(&FindingCategory::MessageRemoval));
}

#[test]
fn test_additions_are_not_breaking() {
    let update = LIBRARY_V1
        .replace("  State state = 4;\n", "  State state = 4;\n  string author = 5;\n")
        .replace("  PUBLISHED = 2;\n", "  PUBLISHED = 2;\n  ARCHIVED = 3;\n");
    let store = check(LIBRARY_V1, &update, &DetectorConfig::default());

    assert!(!store.has_breaking_changes());
    assert_eq!(store.compatibility(), Compatibility::Yellow);
    let summary = store.summary();
    assert_eq!(summary.get(&FindingCategory::FieldAddition), Some(&1));
    assert_eq!(summary.get(&FindingCategory::EnumValueAddition), Some(&1));
}

#[test]
fn test_version_bump_is_tolerated() {
    let update = LIBRARY_V1.replace("v1", "v1beta1");
    let original = ApiDefinition::from_proto_sources(&[("example/library/v1/library.proto", LIBRARY_V1)])
        .unwrap();
    let update =
        ApiDefinition::from_proto_sources(&[("example/library/v1beta1/library.proto", &update)])
            .unwrap();

    let store = original
        .check_breaking_changes(&update, &DetectorConfig::default())
        .unwrap();
    assert!(store.is_empty());
}

#[test]
fn test_except_categories() {
    let update = LIBRARY_V1.replace("string title = 2;", "string headline = 2;");
    let store = check(LIBRARY_V1, &update, &DetectorConfig::default());
    assert_eq!(
        store.breaking_findings()[0].category,
        FindingCategory::FieldNameChange
    );

    let config = DetectorConfig {
        except_categories: vec![FindingCategory::FieldNameChange],
        ..DetectorConfig::default()
    };
    let store = check(LIBRARY_V1, &update, &config);
    assert!(store.is_empty());
}

#[test]
fn test_reports() {
    let update = LIBRARY_V1.replace("  string title = 2;\n", "");
    let store = check(LIBRARY_V1, &update, &DetectorConfig::default());
    let findings = store.breaking_findings();

    let text = report::human_readable(&findings, false);
    assert_eq!(
        text,
        "example/library/v1/library.proto: An existing field `title` is removed from message `Book`.\n"
    );

    let json: serde_json::Value = serde_json::from_str(&report::to_json(&findings).unwrap()).unwrap();
    let finding = &json[0];
    assert_eq!(finding["category"], "FIELD_REMOVAL");
    assert_eq!(finding["change_type"], "MAJOR");
    assert_eq!(finding["conventional_commit_tag"], "fix!");
    assert_eq!(finding["subject"], "title");
    assert_eq!(finding["context"], "Book");
    assert_eq!(finding["location"]["source_code_line"], 23);

    let text = report::human_readable(&findings, true);
    assert!(text.starts_with("example/library/v1/library.proto L23: "));
}

#[test]
fn test_comment_change_reported_with_line() {
    let original = LIBRARY_V1.replace("message Book {", "// A book.\nmessage Book {");
    let update = LIBRARY_V1.replace("message Book {", "// A published book.\nmessage Book {");
    let store = check(&original, &update, &DetectorConfig::default());

    assert!(!store.has_breaking_changes());
    let findings = store.all_findings();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].category, FindingCategory::CommentChange);
    assert_eq!(findings[0].subject, "Book");
    assert_eq!(findings[0].change_type, ChangeType::Patch);
    assert_eq!(findings[0].conventional_commit_tag, ConventionalCommitTag::Docs);
    assert_eq!(findings[0].location.source_code_line, Some(22));
}

#[test]
fn test_pure_backend_has_no_lines() {
    let compile = |source: &str| {
        ApiDefinition::from_proto_sources_with(
            &[("example/library/v1/library.proto", source)],
            CompilerBackend::Pure,
        )
        .unwrap()
    };
    let original = compile(LIBRARY_V1);
    let update = compile(&LIBRARY_V1.replace("  string title = 2;\n", ""));
    let store = original
        .check_breaking_changes(&update, &DetectorConfig::default())
        .unwrap();

    let findings = store.breaking_findings();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].category, FindingCategory::FieldRemoval);
    assert_eq!(findings[0].location.source_code_line, None);
}

#[test]
fn test_descriptor_set_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.pb");
    let definition =
        ApiDefinition::from_proto_sources(&[("example/library/v1/library.proto", LIBRARY_V1)]).unwrap();
    definition.write_descriptor_set_file(&path).unwrap();

    let loaded = ApiDefinition::from_descriptor_set_file(&path).unwrap();
    assert_eq!(loaded.descriptor_set(), definition.descriptor_set());
}

#[test]
fn test_invalid_source_fails_to_compile() {
    let result = ApiDefinition::from_proto_sources(&[("broken.proto", "syntax = \"proto3\"; message {")]);
    assert!(matches!(
        result,
        Err(proto_breaking::DetectorError::InvocationFailed { .. })
    ));
}
