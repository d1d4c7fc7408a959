//! 端到端集成测试
//!
//! 从原始表面构建快照，经过持久化往返后比较，检查报告内容

mod test_data;

use pretty_assertions::assert_eq;
use surface_diff_core::{
    AttributeChange, Change, ChangeAggregator, ChangeKind, ComparisonResult, DiffEngine,
    JsonSnapshotCodec, MemberDescriptor, MemberKind, SnapshotBuilder, SnapshotCodec,
    SnapshotFilter, SurfaceSnapshot, attr,
};
use tempfile::TempDir;
use test_data::{http_v1, http_v2};

fn build(source: &dyn surface_diff_core::SurfaceSource, exclude: Option<&str>) -> SurfaceSnapshot {
    let filter = SnapshotFilter::new(exclude).expect("valid pattern");
    SnapshotBuilder::new(filter)
        .build(source)
        .expect("fixture snapshots are valid")
}

fn compare_fixtures(exclude: Option<&str>) -> ComparisonResult {
    let old = build(&http_v1(), exclude);
    let new = build(&http_v2(), exclude);
    DiffEngine::new().compare(&old, &new)
}

fn change_kinds(result: &ComparisonResult) -> Vec<(&str, Option<ChangeKind>)> {
    result
        .types
        .iter()
        .map(|t| (t.qualified_name.as_str(), t.change_kind()))
        .collect()
}

#[test]
fn test_full_release_comparison() {
    let result = compare_fixtures(None);

    assert_eq!(result.name, "Acme.Http");
    assert_eq!(result.old_version, "1.0.0");
    assert_eq!(result.new_version, "2.0.0");
    assert_eq!(
        change_kinds(&result),
        vec![
            ("Acme.Http.HttpClient", None),
            ("Acme.Http.Request", None),
            ("Acme.Http.Headers", Some(ChangeKind::Added)),
            ("Acme.Http.Response", None),
            ("Acme.Http.IRetryPolicy", Some(ChangeKind::Modified)),
            ("Acme.Http.Generated.Serializers", Some(ChangeKind::Added)),
            ("Acme.Http.LegacyProxy", Some(ChangeKind::Removed)),
        ]
    );

    let client = result.find_type("Acme.Http.HttpClient").unwrap();
    let members: Vec<(&str, Option<ChangeKind>)> = client
        .members
        .iter()
        .map(|m| (m.signature_key.as_str(), m.change_kind()))
        .collect();
    assert_eq!(
        members,
        vec![
            ("constructor:.ctor()", None),
            ("method:Get(System.String)", None),
            ("method:Get(System.Uri)", Some(ChangeKind::Added)),
            ("property:Timeout", Some(ChangeKind::Modified)),
            ("method:Send(Acme.Http.Request)", Some(ChangeKind::Removed)),
        ]
    );

    let summary = ChangeAggregator::summarize(&result);
    assert_eq!(summary.types_added, 2);
    assert_eq!(summary.types_removed, 1);
    assert_eq!(summary.types_modified, 1);
    assert_eq!(summary.members_added, 1);
    assert_eq!(summary.members_removed, 1);
    assert_eq!(summary.members_modified, 1);
    assert!(ChangeAggregator::has_changes(&result));
}

#[test]
fn test_member_modification_carries_all_differences() {
    let result = compare_fixtures(None);
    let client = result.find_type("Acme.Http.HttpClient").unwrap();
    let timeout = client
        .members
        .iter()
        .find(|m| m.signature_key == "property:Timeout")
        .unwrap();

    assert_eq!(
        timeout.changes,
        vec![Change::modified(vec![
            AttributeChange {
                attribute: attr::OBSOLETE.to_string(),
                old_value: None,
                new_value: Some("true".to_string()),
            },
            AttributeChange {
                attribute: attr::RETURN_TYPE.to_string(),
                old_value: Some("System.Int32".to_string()),
                new_value: Some("System.TimeSpan".to_string()),
            },
        ])]
    );
    // 其他成员不受影响
    let get = client
        .members
        .iter()
        .find(|m| m.signature_key == "method:Get(System.String)")
        .unwrap();
    assert!(get.changes.is_empty());
}

#[test]
fn test_non_public_entities_never_appear() {
    let result = compare_fixtures(None);

    assert!(result.find_type("Acme.Http.ConnectionPool").is_none());
    let client = result.find_type("Acme.Http.HttpClient").unwrap();
    assert!(client.members.iter().all(|m| m.signature_key != "field:_pool"));
}

#[test]
fn test_exclusion_pattern_hides_type_from_both_sides() {
    let result = compare_fixtures(Some(r"\.Generated\.|LegacyProxy$"));

    assert!(result.find_type("Acme.Http.Generated.Serializers").is_none());
    assert!(result.find_type("Acme.Http.LegacyProxy").is_none());
    let summary = ChangeAggregator::summarize(&result);
    assert_eq!(summary.types_added, 1);
    assert_eq!(summary.types_removed, 0);
}

#[test]
fn test_identical_releases_after_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("acme.http.json");
    let codec = JsonSnapshotCodec::new();
    let snapshot = build(&http_v1(), None);

    codec.save_to_path(&snapshot, &path).unwrap();
    let reloaded = codec.load_from_path(&path).unwrap();

    assert_eq!(reloaded, snapshot);
    let result = DiffEngine::new().compare(&snapshot, &reloaded);
    assert!(!ChangeAggregator::has_changes(&result));
    assert!(result.types.iter().all(|t| t.changes.is_empty()
        && t.members.iter().all(|m| m.changes.is_empty())));
}

#[test]
fn test_comparison_is_deterministic_through_persistence() {
    let codec = JsonSnapshotCodec::compact();
    let old = build(&http_v1(), None);
    let new = build(&http_v2(), None);

    let old_reloaded = codec.load_str(&codec.save_string(&old).unwrap()).unwrap();
    let new_reloaded = codec.load_str(&codec.save_string(&new).unwrap()).unwrap();

    let direct = codec.report_string(&DiffEngine::new().compare(&old, &new)).unwrap();
    let again = codec.report_string(&DiffEngine::new().compare(&old, &new)).unwrap();
    let reloaded = codec
        .report_string(&DiffEngine::new().compare(&old_reloaded, &new_reloaded))
        .unwrap();

    assert_eq!(direct, again);
    assert_eq!(direct, reloaded);
}

#[test]
fn test_member_change_propagates_to_owner_and_assembly() {
    let mut old = SurfaceSnapshot::new("Acme.Http", "1.0.0");
    let mut new = SurfaceSnapshot::new("Acme.Http", "1.0.1");
    for (snapshot, return_type) in [(&mut old, "System.Int32"), (&mut new, "System.Int64")] {
        let mut client = surface_diff_core::TypeDescriptor::new(
            "Acme.Http.HttpClient",
            surface_diff_core::TypeKind::Class,
        );
        client
            .add_member(
                MemberDescriptor::new("property:Timeout", MemberKind::Property)
                    .with_attribute(attr::RETURN_TYPE, return_type),
            )
            .unwrap();
        snapshot.add_type(client).unwrap();
        snapshot
            .add_type(surface_diff_core::TypeDescriptor::new(
                "Acme.Http.Request",
                surface_diff_core::TypeKind::Class,
            ))
            .unwrap();
    }

    let result = DiffEngine::new().compare(&old, &new);

    let client = result.find_type("Acme.Http.HttpClient").unwrap();
    let request = result.find_type("Acme.Http.Request").unwrap();
    assert!(client.changes.is_empty());
    assert!(ChangeAggregator::type_has_changes(client));
    assert!(!ChangeAggregator::type_has_changes(request));
    assert!(ChangeAggregator::has_changes(&result));
}
