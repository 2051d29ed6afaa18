//! Replace, merge and JSON import/export through the registry service.

use super::helpers::{TestContext, assert_contiguous_ranks, context, two_servers};
use chrono::Duration;
use rstest::rstest;
use serverdeck::registry::{
    domain::{RegistryDomainError, parse_server_list},
    services::{ImportStrategy, ServerRegistryServiceError},
};

#[rstest]
fn merged_record_wins_and_keeps_position(mut two_servers: TestContext) {
    let imported =
        parse_server_list(r#"[{"name": "Y2", "address": "http://y"}]"#).expect("valid import");
    let b_id = two_servers
        .service
        .registry()
        .iter()
        .find(|record| record.address() == "http://y")
        .map(|record| record.id())
        .expect("B exists");

    let total = two_servers
        .service
        .merge_import(imported)
        .expect("merge should succeed");

    assert_eq!(total, 2);
    assert_eq!(
        two_servers.names_and_ranks(),
        vec![("A".to_owned(), 1), ("Y2".to_owned(), 2)]
    );
    let merged = two_servers.service.get(b_id).expect("identity is inherited");
    assert_eq!(merged.address(), "http://y");
}

#[rstest]
fn merge_is_idempotent(mut two_servers: TestContext) {
    let payload = r#"[
      {"name": "Y2", "address": "http://y", "tags": ["movies"]},
      {"name": "Z", "address": "http://z", "isFavorite": true}
    ]"#;

    two_servers
        .service
        .import_json(payload, ImportStrategy::Merge)
        .expect("first merge");
    let once = two_servers.service.registry().clone();
    two_servers
        .service
        .import_json(payload, ImportStrategy::Merge)
        .expect("second merge");

    assert_eq!(two_servers.service.registry(), &once);
    assert_eq!(once.len(), 3);
    assert_contiguous_ranks(once.records());
}

#[rstest]
fn repeated_merge_keeps_ids_when_carried_id_is_taken(mut context: TestContext) {
    let first = context.add("A", "http://x");
    let payload = format!(
        r#"[{{"id": {}, "name": "N", "address": "http://new"}}]"#,
        first.value()
    );

    context
        .service
        .import_json(&payload, ImportStrategy::Merge)
        .expect("first merge");
    let once = context.service.registry().clone();
    context.clock.advance(Duration::seconds(1));
    context
        .service
        .import_json(&payload, ImportStrategy::Merge)
        .expect("second merge");

    assert_eq!(context.service.registry(), &once);
    assert!(context.service.get(first).is_some_and(|record| record.address() == "http://x"));
}

#[rstest]
fn replace_discards_existing_records(mut two_servers: TestContext) {
    let total = two_servers
        .service
        .import_json(
            r#"[{"name": "Only", "address": "http://only", "category": "live"}]"#,
            ImportStrategy::Replace,
        )
        .expect("replace should succeed");

    assert_eq!(total, 1);
    let only = two_servers
        .service
        .registry()
        .records()
        .first()
        .expect("one record");
    assert_eq!(only.name(), "Only");
    assert_eq!(only.rank(), 1);
    assert!(only.has_tag("live"));
}

#[rstest]
#[case(r#"{"servers": []}"#)]
#[case("not json at all")]
#[case(r#"[{"name": "No address"}]"#)]
fn invalid_import_leaves_registry_untouched(mut two_servers: TestContext, #[case] text: &str) {
    let before = two_servers.service.registry().clone();

    let result = two_servers.service.import_json(text, ImportStrategy::Replace);

    assert!(matches!(
        result,
        Err(ServerRegistryServiceError::Validation(
            RegistryDomainError::ImportNotArray
                | RegistryDomainError::MalformedImport(_)
                | RegistryDomainError::InvalidImportedRecord { .. }
        ))
    ));
    assert_eq!(two_servers.service.registry(), &before);
}

#[rstest]
fn colliding_import_ids_are_reassigned(mut context: TestContext) {
    context
        .service
        .import_json(
            r#"[
              {"id": 7, "name": "First", "address": "http://first"},
              {"id": 7, "name": "Second", "address": "http://second"}
            ]"#,
            ImportStrategy::Replace,
        )
        .expect("import should succeed");

    let ids: Vec<_> = context
        .service
        .registry()
        .iter()
        .map(|record| record.id().value())
        .collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids.first(), Some(&7));
    assert_ne!(ids.first(), ids.get(1));
}

#[rstest]
fn export_round_trips_through_replace(mut two_servers: TestContext) {
    two_servers.add("C", "http://z");
    let exported = two_servers.service.export_json().expect("export");

    let mut other = super::helpers::context();
    other
        .service
        .import_json(&exported, ImportStrategy::Replace)
        .expect("import of export");

    assert_eq!(other.service.registry(), two_servers.service.registry());
}
